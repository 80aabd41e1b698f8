use crate::error::{PageOutOfBounds, StoreError};
use crate::gp::gp_to_int;
use crate::gp::leaderboard::{page_count, paginate};
use crate::gp::store::PointStore;
use poise::serenity_prelude::{Mentionable, UserId};
use std::collections::BTreeMap;

pub const DEFAULT_LEDGER_NAME: &str = "Multi-GP list";

/// Staged GP awards for several users, committed together once confirmed.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    name: String,
    entries: BTreeMap<UserId, f64>,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new(DEFAULT_LEDGER_NAME)
    }
}

impl Ledger {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, recipient: UserId) -> Option<f64> {
        self.entries.get(&recipient).copied()
    }

    /// Increases the recipient's entry by `amount`, creating it if needed.
    pub fn add(&mut self, recipient: UserId, amount: f64) {
        *self.entries.entry(recipient).or_insert(0.0) += amount;
    }

    /// Merges every entry of `other` into this ledger.
    pub fn add_all(&mut self, other: &Ledger) {
        for (recipient, amount) in other.entries() {
            self.add(recipient, amount);
        }
    }

    pub fn remove(&mut self, recipient: UserId) {
        self.entries.remove(&recipient);
    }

    pub fn entries(&self) -> impl Iterator<Item = (UserId, f64)> + '_ {
        self.entries.iter().map(|(user, amount)| (*user, *amount))
    }

    /// Entries sorted by amount, highest first. Ties keep user ID order.
    pub fn ranked(&self) -> Vec<(UserId, f64)> {
        let mut ranked: Vec<_> = self.entries().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
        ranked
    }

    /// One `mention: amount` line per entry, highest amount first.
    ///
    /// With `use_integers` the amounts are shown the way they will be committed,
    /// and entries that would commit 0 GP are left out.
    fn lines(&self, use_integers: bool) -> Vec<String> {
        self.ranked()
            .into_iter()
            .filter_map(|(user, amount)| {
                if use_integers {
                    let points = gp_to_int(amount);
                    (points != 0).then(|| format!("{}: {}", user.mention(), points))
                } else {
                    Some(format!("{}: {}", user.mention(), amount))
                }
            })
            .collect()
    }

    /// Every line of [`Ledger::page`] in one string.
    pub fn render(&self, use_integers: bool) -> String {
        self.lines(use_integers).join("\n")
    }

    /// Pages needed to show the ledger. 0 when no entry would be shown.
    pub fn num_pages(&self, use_integers: bool) -> usize {
        page_count(self.lines(use_integers).len())
    }

    /// One page of the ranked lines, numbered like [`crate::gp::leaderboard::resolve_page`].
    pub fn page(&self, page: i64, use_integers: bool) -> Result<String, PageOutOfBounds> {
        Ok(paginate(&self.lines(use_integers), page)?.join("\n"))
    }

    /// Commits every entry to `store` as an integer amount.
    /// Returns how many users received points.
    ///
    /// Entries are removed from the ledger as they are processed. Writes are not
    /// transactional: if one fails, earlier recipients keep their points and the
    /// ledger is left holding only the entries that were not processed.
    pub async fn apply_to_store<S>(&mut self, store: &S) -> Result<usize, StoreError>
    where
        S: PointStore + ?Sized,
    {
        let recipients: Vec<UserId> = self.entries.keys().copied().collect();
        let mut committed = 0;

        for recipient in recipients {
            let Some(amount) = self.entries.get(&recipient).copied() else {
                continue;
            };
            let points = gp_to_int(amount);
            if points != 0 {
                store
                    .add_points(recipient, points as f64)
                    .await
                    .map_err(|source| StoreError::Commit {
                        recipient,
                        amount: points,
                        source: Box::new(source),
                    })?;
                committed += 1;
            }
            self.entries.remove(&recipient);
        }

        tracing::info!("Committed GP for {} user(s) from \"{}\"", committed, self.name);
        Ok(committed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Point store that fails when asked to write for `fail_for`.
    #[derive(Default)]
    struct MockStore {
        points: Mutex<HashMap<UserId, f64>>,
        writes: Mutex<Vec<(UserId, f64)>>,
        fail_for: Option<UserId>,
    }

    #[async_trait]
    impl PointStore for MockStore {
        async fn add_points(&self, recipient: UserId, amount: f64) -> Result<f64, StoreError> {
            if self.fail_for == Some(recipient) {
                return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
            }
            self.writes.lock().unwrap().push((recipient, amount));
            let mut points = self.points.lock().unwrap();
            let total = points.entry(recipient).or_insert(0.0);
            *total += amount;
            Ok(*total)
        }

        async fn get_points(&self, recipient: UserId) -> Result<f64, StoreError> {
            Ok(self.points.lock().unwrap().get(&recipient).copied().unwrap_or(0.0))
        }
    }

    fn user(id: u64) -> UserId {
        UserId::new(id)
    }

    #[test]
    fn add_merges_amounts_for_the_same_user() {
        let mut ledger = Ledger::default();
        ledger.add(user(1), 3.0);
        ledger.add(user(1), 2.0);

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get(user(1)), Some(5.0));
    }

    #[test]
    fn add_all_sums_overlapping_users() {
        let mut first = Ledger::new("first");
        first.add(user(1), 1.5);
        let mut second = Ledger::new("second");
        second.add(user(1), 1.0);
        second.add(user(2), 4.0);

        first.add_all(&second);

        assert_eq!(first.get(user(1)), Some(2.5));
        assert_eq!(first.get(user(2)), Some(4.0));
        assert_eq!(first.name(), "first");
    }

    #[test]
    fn removing_an_absent_user_is_a_no_op() {
        let mut ledger = Ledger::default();
        ledger.add(user(1), 1.0);
        ledger.remove(user(2));

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get(user(2)), None);

        ledger.remove(user(1));
        assert!(ledger.is_empty());
    }

    #[test]
    fn render_lists_highest_amount_first() {
        let mut ledger = Ledger::default();
        ledger.add(user(1), 2.0);
        ledger.add(user(2), 10.0);
        ledger.add(user(3), 5.5);

        assert_eq!(ledger.render(false), "<@2>: 10\n<@3>: 5.5\n<@1>: 2");
        assert_eq!(ledger.render(true), "<@2>: 10\n<@3>: 5\n<@1>: 2");
    }

    #[test]
    fn integer_render_hides_entries_worth_nothing() {
        let mut ledger = Ledger::default();
        ledger.add(user(1), 0.4);
        ledger.add(user(2), 1.9);

        assert_eq!(ledger.render(true), "<@2>: 1");
        assert_eq!(ledger.render(false), "<@2>: 1.9\n<@1>: 0.4");
    }

    #[test]
    fn thirty_entries_span_two_pages() {
        let mut ledger = Ledger::default();
        for id in 1..=30 {
            ledger.add(user(id), 100.0 - id as f64);
        }

        assert_eq!(ledger.num_pages(true), 2);
        assert_eq!(ledger.page(0, true).unwrap().lines().count(), 25);
        assert_eq!(
            ledger.page(-1, true).unwrap(),
            "<@26>: 74\n<@27>: 73\n<@28>: 72\n<@29>: 71\n<@30>: 70"
        );
        assert_eq!(ledger.page(2, true), Err(PageOutOfBounds { num_pages: 2 }));
    }

    #[test]
    fn ledger_worth_nothing_has_no_integer_pages() {
        let mut ledger = Ledger::default();
        ledger.add(user(1), 0.3);

        assert_eq!(ledger.num_pages(true), 0);
        assert_eq!(ledger.num_pages(false), 1);
        assert!(ledger.page(0, true).is_err());
    }

    #[test]
    fn ranked_is_strictly_descending_for_distinct_amounts() {
        let mut ledger = Ledger::default();
        for (id, amount) in [(5, 1.0), (2, 7.0), (9, 3.0), (4, -2.0)] {
            ledger.add(user(id), amount);
        }

        let ranked = ledger.ranked();
        assert!(ranked.windows(2).all(|pair| pair[0].1 > pair[1].1));
        assert_eq!(ranked[0].0, user(2));
    }

    #[tokio::test]
    async fn apply_commits_integer_amounts_and_empties_the_ledger() {
        let store = MockStore::default();
        let mut ledger = Ledger::default();
        ledger.add(user(1), 2.7);
        ledger.add(user(2), 0.3);
        ledger.add(user(3), -4.0);

        let committed = ledger.apply_to_store(&store).await.unwrap();

        assert_eq!(committed, 2);
        assert!(ledger.is_empty());
        assert_eq!(store.get_points(user(1)).await.unwrap(), 2.0);
        assert_eq!(store.get_points(user(3)).await.unwrap(), -4.0);
        // Zero amounts are never written
        assert!(store.writes.lock().unwrap().iter().all(|(u, _)| *u != user(2)));
    }

    #[tokio::test]
    async fn failed_commit_keeps_earlier_writes_and_unprocessed_entries() {
        let store = MockStore {
            fail_for: Some(user(2)),
            ..Default::default()
        };
        let mut ledger = Ledger::default();
        ledger.add(user(1), 1.0);
        ledger.add(user(2), 2.0);
        ledger.add(user(3), 3.0);

        let err = ledger.apply_to_store(&store).await.unwrap_err();

        // Not rolled back: user 1 already has their points
        assert_eq!(err.failed_recipient(), Some(user(2)));
        assert_eq!(store.get_points(user(1)).await.unwrap(), 1.0);
        assert_eq!(ledger.get(user(1)), None);
        assert_eq!(ledger.get(user(2)), Some(2.0));
        assert_eq!(ledger.get(user(3)), Some(3.0));
    }
}
