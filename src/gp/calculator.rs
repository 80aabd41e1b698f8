use crate::error::CalculationError;
use crate::gp::formula::support_gp;
use crate::gp::ledger::Ledger;
use crate::gp::source::{MessageSource, ThreadActivityWindow, TimeRange};
use crate::gp::store::GpOverrides;
use poise::serenity_prelude::{ChannelId, UserId};
use std::collections::{BTreeMap, HashSet};

pub const SUPPORT_LEDGER_NAME: &str = "Support Guild Points";

/// Turns activity in support threads into GP awards.
pub struct AwardCalculator;

impl AwardCalculator {
    /// Scores every window and merges the results into one ledger.
    pub fn calculate(windows: &[ThreadActivityWindow]) -> Ledger {
        let mut ledger = Ledger::new(SUPPORT_LEDGER_NAME);
        for window in windows {
            let mut thread_ledger = Ledger::default();
            for (user, turns) in Self::count_turns(window) {
                thread_ledger.add(user, support_gp(turns, window.total_messages));
            }
            ledger.add_all(&thread_ledger);
        }
        ledger
    }

    /// Turns per eligible user. Consecutive messages from the same author count once.
    pub fn count_turns(window: &ThreadActivityWindow) -> BTreeMap<UserId, u32> {
        let mut turns = BTreeMap::new();
        let mut last_author = None;
        for (author, _) in &window.messages {
            if last_author != Some(*author) {
                *turns.entry(*author).or_insert(0) += 1;
                last_author = Some(*author);
            }
        }

        for user in Self::excluded_users(window) {
            turns.remove(&user);
        }
        turns
    }

    fn excluded_users(window: &ThreadActivityWindow) -> HashSet<UserId> {
        let mut excluded: HashSet<UserId> = window.never_earn.iter().copied().collect();
        excluded.extend(window.owner);
        for user in &window.always_earn {
            excluded.remove(user);
        }
        excluded
    }

    /// Fetches one window per thread, with override lists filled in.
    /// Threads with support GP switched off are skipped.
    pub async fn collect<S, O>(
        source: &S,
        overrides: &O,
        threads: &[ChannelId],
        range: TimeRange,
    ) -> Result<Vec<ThreadActivityWindow>, CalculationError>
    where
        S: MessageSource + ?Sized,
        O: GpOverrides + ?Sized,
    {
        let mut windows = Vec::with_capacity(threads.len());
        for &thread in threads {
            if !overrides.support_gp_enabled(thread).await? {
                tracing::debug!("Support GP disabled in thread {}, skipping", thread);
                continue;
            }

            let mut window = source.fetch_window(thread, range).await?;
            window.always_earn = overrides.override_users(thread, true).await?;
            window.never_earn = overrides.override_users(thread, false).await?;
            tracing::debug!(
                "Thread {}: {} message(s) in range, {} total",
                window.thread,
                window.messages.len(),
                window.total_messages
            );
            windows.push(window);
        }
        Ok(windows)
    }

    /// Finds the threads under `channel` active during `range` and scores them.
    pub async fn calculate_channel<S, O>(
        source: &S,
        overrides: &O,
        channel: ChannelId,
        range: TimeRange,
    ) -> Result<Ledger, CalculationError>
    where
        S: MessageSource + ?Sized,
        O: GpOverrides + ?Sized,
    {
        let threads = source.threads_between(channel, range).await?;
        tracing::info!("Calculating support GP over {} thread(s)", threads.len());
        let windows = Self::collect(source, overrides, &threads, range).await?;
        Ok(Self::calculate(&windows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{FetchError, StoreError};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::collections::HashMap;

    fn user(id: u64) -> UserId {
        UserId::new(id)
    }

    fn at(minute: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::minutes(minute)
    }

    fn window(owner: u64, total: u32, authors: &[u64]) -> ThreadActivityWindow {
        let mut window = ThreadActivityWindow::new(ChannelId::new(900), Some(user(owner)), total);
        window.messages = authors
            .iter()
            .enumerate()
            .map(|(i, id)| (user(*id), at(i as i64)))
            .collect();
        window
    }

    #[test]
    fn consecutive_messages_count_as_one_turn() {
        let window = window(1, 10, &[2, 2, 2, 2, 2]);
        assert_eq!(AwardCalculator::count_turns(&window).get(&user(2)), Some(&1));
    }

    #[test]
    fn alternating_messages_count_separately() {
        let window = window(1, 10, &[2, 3, 2, 2, 3, 2]);
        let turns = AwardCalculator::count_turns(&window);
        assert_eq!(turns.get(&user(2)), Some(&3));
        assert_eq!(turns.get(&user(3)), Some(&2));
    }

    #[test]
    fn thread_owner_earns_nothing_by_default() {
        let window = window(1, 10, &[1, 2, 1, 2]);
        let ledger = AwardCalculator::calculate(&[window]);
        assert_eq!(ledger.get(user(1)), None);
        assert!(ledger.get(user(2)).is_some());
    }

    #[test]
    fn overrides_change_who_earns() {
        let mut window = window(1, 10, &[1, 2, 3, 2]);
        window.always_earn = vec![user(1)];
        window.never_earn = vec![user(3)];

        let turns = AwardCalculator::count_turns(&window);
        assert_eq!(turns.get(&user(1)), Some(&1));
        assert_eq!(turns.get(&user(2)), Some(&2));
        assert_eq!(turns.get(&user(3)), None);
    }

    #[test]
    fn single_thread_award_matches_the_formula() {
        // 4 turns for user 2, interleaved with the owner
        let window = window(1, 20, &[1, 2, 2, 1, 2, 1, 2, 2, 1, 2]);
        let ledger = AwardCalculator::calculate(&[window]);

        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.get(user(2)), Some(support_gp(4, 20)));
        assert_eq!(ledger.name(), SUPPORT_LEDGER_NAME);
    }

    #[test]
    fn awards_accumulate_across_threads() {
        let first = window(1, 20, &[2, 1, 2]);
        let second = window(3, 50, &[2, 3, 4]);
        let ledger = AwardCalculator::calculate(&[first, second]);

        assert_eq!(ledger.get(user(2)), Some(support_gp(2, 20) + support_gp(1, 50)));
        assert_eq!(ledger.get(user(4)), Some(support_gp(1, 50)));
    }

    struct FakeSource {
        windows: HashMap<ChannelId, ThreadActivityWindow>,
    }

    #[async_trait]
    impl MessageSource for FakeSource {
        async fn threads_between(
            &self,
            _channel: ChannelId,
            _range: TimeRange,
        ) -> Result<Vec<ChannelId>, FetchError> {
            let mut threads: Vec<_> = self.windows.keys().copied().collect();
            threads.sort();
            Ok(threads)
        }

        async fn fetch_window(
            &self,
            thread: ChannelId,
            _range: TimeRange,
        ) -> Result<ThreadActivityWindow, FetchError> {
            self.windows
                .get(&thread)
                .cloned()
                .ok_or(FetchError::NotAThread(thread))
        }
    }

    #[derive(Default)]
    struct FakeOverrides {
        disabled: Vec<ChannelId>,
        always: Vec<UserId>,
    }

    #[async_trait]
    impl GpOverrides for FakeOverrides {
        async fn should_user_get_gp(
            &self,
            user: UserId,
            _thread: ChannelId,
            is_owner: bool,
        ) -> Result<bool, StoreError> {
            Ok(self.always.contains(&user) || !is_owner)
        }

        async fn override_users(
            &self,
            _thread: ChannelId,
            should_get_gp: bool,
        ) -> Result<Vec<UserId>, StoreError> {
            Ok(if should_get_gp { self.always.clone() } else { Vec::new() })
        }

        async fn support_gp_enabled(&self, thread: ChannelId) -> Result<bool, StoreError> {
            Ok(!self.disabled.contains(&thread))
        }
    }

    fn source_with(windows: Vec<ThreadActivityWindow>) -> FakeSource {
        FakeSource {
            windows: windows.into_iter().map(|w| (w.thread, w)).collect(),
        }
    }

    #[tokio::test]
    async fn channel_calculation_skips_disabled_threads() {
        let mut open = window(1, 20, &[2, 1, 2]);
        open.thread = ChannelId::new(10);
        let mut closed = window(1, 20, &[3, 1, 3]);
        closed.thread = ChannelId::new(11);

        let source = source_with(vec![open, closed]);
        let overrides = FakeOverrides {
            disabled: vec![ChannelId::new(11)],
            ..Default::default()
        };
        let range = TimeRange::new(at(0), at(60));

        let ledger =
            AwardCalculator::calculate_channel(&source, &overrides, ChannelId::new(1), range)
                .await
                .unwrap();

        assert_eq!(ledger.get(user(2)), Some(support_gp(2, 20)));
        assert_eq!(ledger.get(user(3)), None);
    }

    #[tokio::test]
    async fn collect_fills_override_lists() {
        let source = source_with(vec![window(1, 20, &[1, 2])]);
        let overrides = FakeOverrides {
            always: vec![user(1)],
            ..Default::default()
        };
        let range = TimeRange::new(at(0), at(60));

        let windows = AwardCalculator::collect(&source, &overrides, &[ChannelId::new(900)], range)
            .await
            .unwrap();

        assert_eq!(windows[0].always_earn, vec![user(1)]);
        let ledger = AwardCalculator::calculate(&windows);
        assert_eq!(ledger.get(user(1)), Some(support_gp(1, 20)));
    }

    #[tokio::test]
    async fn fetch_failures_abort_the_calculation() {
        let source = source_with(Vec::new());
        let overrides = FakeOverrides::default();
        let range = TimeRange::new(at(0), at(60));

        let result =
            AwardCalculator::collect(&source, &overrides, &[ChannelId::new(42)], range).await;

        assert!(matches!(result, Err(CalculationError::Fetch(_))));
    }
}
