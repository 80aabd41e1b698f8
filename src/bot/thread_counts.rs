use dashmap::DashMap;
use poise::serenity_prelude::ChannelId;

/// Message totals for support threads, kept up to date from gateway events.
///
/// Discord only reports a thread's message count when the thread is fetched, so
/// the first reported value seeds the counter and message create/delete events
/// move it from there. Only seeded threads are tracked.
#[derive(Debug, Default)]
pub struct ThreadMessageCounts {
    counts: DashMap<ChannelId, u32>,
}

impl ThreadMessageCounts {
    /// Current total for `thread`, seeding it with `reported` if the thread is not tracked yet.
    pub fn seed(&self, thread: ChannelId, reported: u32) -> u32 {
        *self.counts.entry(thread).or_insert(reported)
    }

    #[cfg(test)]
    pub fn get(&self, thread: ChannelId) -> Option<u32> {
        self.counts.get(&thread).map(|count| *count)
    }

    pub fn record_created(&self, thread: ChannelId) {
        if let Some(mut count) = self.counts.get_mut(&thread) {
            *count = count.saturating_add(1);
        }
    }

    pub fn record_deleted(&self, thread: ChannelId) {
        if let Some(mut count) = self.counts.get_mut(&thread) {
            *count = count.saturating_sub(1);
        }
    }

    pub fn forget(&self, thread: ChannelId) {
        self.counts.remove(&thread);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_report_seeds_the_counter() {
        let counts = ThreadMessageCounts::default();
        let thread = ChannelId::new(1);

        assert_eq!(counts.seed(thread, 10), 10);
        counts.record_created(thread);
        counts.record_created(thread);
        counts.record_deleted(thread);

        // Later reports don't override what the events told us
        assert_eq!(counts.seed(thread, 10), 11);
    }

    #[test]
    fn untracked_threads_ignore_events() {
        let counts = ThreadMessageCounts::default();
        let thread = ChannelId::new(2);

        counts.record_created(thread);
        assert_eq!(counts.get(thread), None);
    }

    #[test]
    fn count_never_goes_below_zero() {
        let counts = ThreadMessageCounts::default();
        let thread = ChannelId::new(3);
        counts.seed(thread, 0);
        counts.record_deleted(thread);

        assert_eq!(counts.get(thread), Some(0));
        counts.forget(thread);
        assert_eq!(counts.get(thread), None);
    }
}
