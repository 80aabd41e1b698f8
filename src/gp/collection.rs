use crate::gp::ledger::Ledger;
use dashmap::DashMap;
use poise::serenity_prelude::UserId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::OwnedMutexGuard;

/// Pending ledgers, at most one per user who started a GP operation.
#[derive(Debug, Default)]
pub struct LedgerCollection {
    ledgers: HashMap<UserId, Ledger>,
}

impl LedgerCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any pending ledger for `key`, returning the discarded one.
    pub fn stage(&mut self, key: UserId, ledger: Ledger) -> Option<Ledger> {
        self.ledgers.insert(key, ledger)
    }

    pub fn get(&self, key: UserId) -> Option<&Ledger> {
        self.ledgers.get(&key)
    }

    pub fn get_mut(&mut self, key: UserId) -> Option<&mut Ledger> {
        self.ledgers.get_mut(&key)
    }

    pub fn get_or_new(&mut self, key: UserId) -> &mut Ledger {
        self.ledgers.entry(key).or_default()
    }

    pub fn take(&mut self, key: UserId) -> Option<Ledger> {
        self.ledgers.remove(&key)
    }

    /// Discards the pending ledger. Returns false if there was none.
    pub fn clear(&mut self, key: UserId) -> bool {
        self.ledgers.remove(&key).is_some()
    }
}

/// Shared [`LedgerCollection`] with one async lock per session key.
///
/// Operations that read, await and then write the ledger of a key (calculate and
/// stage, confirm and commit) must hold [`StagingArea::lock_session`] for that key.
/// Short synchronous edits can use the other methods directly.
#[derive(Debug, Default)]
pub struct StagingArea {
    ledgers: Mutex<LedgerCollection>,
    session_locks: DashMap<UserId, Arc<tokio::sync::Mutex<()>>>,
}

impl StagingArea {
    pub fn new() -> Self {
        Self {
            ledgers: Mutex::new(LedgerCollection::new()),
            session_locks: DashMap::new(),
        }
    }

    pub async fn lock_session(&self, key: UserId) -> OwnedMutexGuard<()> {
        let lock = self.session_locks.entry(key).or_default().clone();
        lock.lock_owned().await
    }

    /// Runs `f` with exclusive access to the whole collection. Never await inside `f`.
    pub fn with<R>(&self, f: impl FnOnce(&mut LedgerCollection) -> R) -> R {
        let mut ledgers = self.ledgers.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut ledgers)
    }

    pub fn stage(&self, key: UserId, ledger: Ledger) {
        if self.with(|ledgers| ledgers.stage(key, ledger)).is_some() {
            tracing::debug!("Replaced pending ledger for user {}", key);
        }
    }

    /// Copy of the pending ledger, for display.
    pub fn snapshot(&self, key: UserId) -> Option<Ledger> {
        self.with(|ledgers| ledgers.get(key).cloned())
    }

    pub fn take(&self, key: UserId) -> Option<Ledger> {
        self.with(|ledgers| ledgers.take(key))
    }

    pub fn clear(&self, key: UserId) -> bool {
        self.with(|ledgers| ledgers.clear(key))
    }
}
