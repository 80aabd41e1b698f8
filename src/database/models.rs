use poise::serenity_prelude::{ChannelId, UserId};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Row of the `rep` table. Discord IDs are stored as signed integers.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PointsEntry {
    pub discord_id: i64,
    pub points: f64,
}

impl PointsEntry {
    pub fn user_id(&self) -> UserId {
        UserId::new(self.discord_id as u64)
    }
}

/// Row of the `support_threads` table.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct GpOverride {
    pub user_id: i64,
    pub thread_id: i64,
    pub should_get_gp: bool,
}

impl GpOverride {
    pub fn user(&self) -> UserId {
        UserId::new(self.user_id as u64)
    }
}

pub fn user_key(user: UserId) -> i64 {
    user.get() as i64
}

pub fn channel_key(channel: ChannelId) -> i64 {
    channel.get() as i64
}
