use crate::error::StoreError;
use async_trait::async_trait;
use poise::serenity_prelude::{ChannelId, UserId};

/// Persistent per-user Guild Point totals.
#[async_trait]
pub trait PointStore: Send + Sync {
    /// Adds (or, if negative, removes) points and returns the user's new total.
    async fn add_points(&self, recipient: UserId, amount: f64) -> Result<f64, StoreError>;

    /// Current total for a user, 0 if they have never received points.
    async fn get_points(&self, recipient: UserId) -> Result<f64, StoreError>;
}

/// Per-thread exceptions to the default "everyone but the thread owner earns GP" rule.
#[async_trait]
pub trait GpOverrides: Send + Sync {
    async fn should_user_get_gp(
        &self,
        user: UserId,
        thread: ChannelId,
        is_owner: bool,
    ) -> Result<bool, StoreError>;

    /// Users explicitly set to always (`true`) or never (`false`) earn GP in the thread.
    async fn override_users(
        &self,
        thread: ChannelId,
        should_get_gp: bool,
    ) -> Result<Vec<UserId>, StoreError>;

    async fn support_gp_enabled(&self, thread: ChannelId) -> Result<bool, StoreError>;
}
