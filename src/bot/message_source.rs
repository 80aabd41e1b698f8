use crate::bot::thread_counts::ThreadMessageCounts;
use crate::error::FetchError;
use crate::gp::source::{MessageSource, ThreadActivityWindow, TimeRange};
use crate::utils::time::{snowflake_to_timestamp, timestamp_to_snowflake};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::collections::HashSet;

/// Threads requested per archived thread page
const ARCHIVED_THREADS_BATCH: u64 = 50;
/// Messages requested per history page (Discord maximum)
const MESSAGES_BATCH: u8 = 100;

/// [`MessageSource`] backed by the Discord HTTP API.
pub struct DiscordMessageSource<'a> {
    http: &'a serenity::Http,
    guild_id: serenity::GuildId,
    counts: &'a ThreadMessageCounts,
}

impl<'a> DiscordMessageSource<'a> {
    pub fn new(
        http: &'a serenity::Http,
        guild_id: serenity::GuildId,
        counts: &'a ThreadMessageCounts,
    ) -> Self {
        Self {
            http,
            guild_id,
            counts,
        }
    }

    /// Created before the range ends and last posted in after it starts.
    fn active_during(thread: &serenity::GuildChannel, range: TimeRange) -> bool {
        let created_at = snowflake_to_timestamp(thread.id.get());
        let last_message_at = thread
            .last_message_id
            .map(|id| snowflake_to_timestamp(id.get()));

        created_at < range.end && last_message_at.is_some_and(|last| last >= range.start)
    }
}

#[async_trait]
impl MessageSource for DiscordMessageSource<'_> {
    async fn threads_between(
        &self,
        channel: serenity::ChannelId,
        range: TimeRange,
    ) -> Result<Vec<serenity::ChannelId>, FetchError> {
        let mut seen = HashSet::new();
        let mut threads = Vec::new();

        // Active threads can only be listed for the whole guild
        let active = self.guild_id.get_active_threads(self.http).await?;
        for thread in active.threads {
            if thread.parent_id == Some(channel) && Self::active_during(&thread, range) {
                tracing::trace!("Thread \"{}\" (open) is in range", thread.name);
                seen.insert(thread.id);
                threads.push(thread.id);
            }
        }

        // Unix seconds of the oldest archive time seen so far
        let mut before: Option<u64> = None;
        'pages: loop {
            let page = channel
                .get_archived_public_threads(self.http, before, Some(ARCHIVED_THREADS_BATCH))
                .await?;

            for thread in &page.threads {
                let Some(archived_at) = thread
                    .thread_metadata
                    .as_ref()
                    .and_then(|metadata| metadata.archive_timestamp)
                    .map(|timestamp| timestamp.unix_timestamp())
                else {
                    continue;
                };
                before = Some(u64::try_from(archived_at).unwrap_or(0));

                // Sorted by archive time, newest first
                if archived_at < range.start.timestamp() {
                    break 'pages;
                }
                if !seen.insert(thread.id) {
                    tracing::warn!("Received duplicate thread \"{}\", stopping", thread.name);
                    break 'pages;
                }
                if Self::active_during(thread, range) {
                    tracing::trace!("Thread \"{}\" (archived) is in range", thread.name);
                    threads.push(thread.id);
                }
            }

            if !page.has_more || page.threads.is_empty() {
                break;
            }
        }

        Ok(threads)
    }

    async fn fetch_window(
        &self,
        thread: serenity::ChannelId,
        range: TimeRange,
    ) -> Result<ThreadActivityWindow, FetchError> {
        let channel = thread
            .to_channel(self.http)
            .await?
            .guild()
            .filter(|channel| channel.thread_metadata.is_some())
            .ok_or(FetchError::NotAThread(thread))?;

        let total_messages = self
            .counts
            .seed(thread, channel.message_count.unwrap_or(0));
        let mut window = ThreadActivityWindow::new(thread, channel.owner_id, total_messages);

        let mut after = timestamp_to_snowflake(range.start).saturating_sub(1).max(1);
        loop {
            let mut batch = thread
                .messages(
                    self.http,
                    serenity::GetMessages::new()
                        .after(serenity::MessageId::new(after))
                        .limit(MESSAGES_BATCH),
                )
                .await?;
            batch.sort_by_key(|message| message.id);

            let batch_len = batch.len();
            for message in batch {
                after = message.id.get();
                let posted_at = snowflake_to_timestamp(message.id.get());
                if !range.contains(posted_at) {
                    if posted_at >= range.end {
                        return Ok(window);
                    }
                    continue;
                }
                // Webhook messages have no user behind them
                if message.webhook_id.is_none() {
                    window.messages.push((message.author.id, posted_at));
                }
            }

            if batch_len < usize::from(MESSAGES_BATCH) {
                break;
            }
        }

        Ok(window)
    }
}
