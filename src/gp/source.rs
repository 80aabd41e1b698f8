use crate::error::FetchError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use poise::serenity_prelude::{ChannelId, UserId};

/// Inclusive start, exclusive end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant < self.end
    }
}

/// Messages posted in one thread during a time range.
#[derive(Debug, Clone, PartialEq)]
pub struct ThreadActivityWindow {
    pub thread: ChannelId,
    pub owner: Option<UserId>,
    /// Messages in the whole thread, not only inside the window
    pub total_messages: u32,
    /// `(author, posted at)` in posting order
    pub messages: Vec<(UserId, DateTime<Utc>)>,
    /// Users who earn GP here even if they own the thread
    pub always_earn: Vec<UserId>,
    /// Users who never earn GP here
    pub never_earn: Vec<UserId>,
}

impl ThreadActivityWindow {
    pub fn new(thread: ChannelId, owner: Option<UserId>, total_messages: u32) -> Self {
        Self {
            thread,
            owner,
            total_messages,
            messages: Vec::new(),
            always_earn: Vec::new(),
            never_earn: Vec::new(),
        }
    }
}

/// Where thread and message data comes from. Calls may be slow; retries and timeouts
/// are up to the implementor.
#[async_trait]
pub trait MessageSource: Send + Sync {
    /// Public threads under `channel` with at least one message inside `range`.
    async fn threads_between(
        &self,
        channel: ChannelId,
        range: TimeRange,
    ) -> Result<Vec<ChannelId>, FetchError>;

    /// Activity in `thread` during `range`. Override lists are left empty.
    async fn fetch_window(
        &self,
        thread: ChannelId,
        range: TimeRange,
    ) -> Result<ThreadActivityWindow, FetchError>;
}
