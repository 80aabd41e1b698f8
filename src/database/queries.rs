use crate::database::models::{GpOverride, PointsEntry, channel_key, user_key};
use crate::error::StoreError;
use crate::gp::store::{GpOverrides, PointStore};
use async_trait::async_trait;
use poise::serenity_prelude::{ChannelId, UserId};
use sqlx::{Row, SqlitePool};

type Result<T> = std::result::Result<T, StoreError>;

// Reputation queries
pub async fn get_points(pool: &SqlitePool, user: UserId) -> Result<f64> {
    let row = sqlx::query(
        "SELECT IFNULL((SELECT points FROM rep WHERE discord_id = ?), 0.0) AS points",
    )
    .bind(user_key(user))
    .fetch_one(pool)
    .await?;

    Ok(row.get("points"))
}

/// Adds `amount` (possibly negative) to the user's total and returns the new total.
pub async fn add_points(pool: &SqlitePool, user: UserId, amount: f64) -> Result<f64> {
    sqlx::query(
        "INSERT INTO rep (discord_id, points) VALUES (?, ?)
         ON CONFLICT(discord_id) DO UPDATE SET points = points + excluded.points",
    )
    .bind(user_key(user))
    .bind(amount)
    .execute(pool)
    .await?;

    get_points(pool, user).await
}

/// Every user with points, highest first.
pub async fn get_all_points(pool: &SqlitePool) -> Result<Vec<PointsEntry>> {
    let entries = sqlx::query_as::<_, PointsEntry>(
        "SELECT discord_id, points FROM rep ORDER BY points DESC, discord_id ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

// Support thread queries
pub async fn should_user_get_gp(
    pool: &SqlitePool,
    user: UserId,
    thread: ChannelId,
    is_owner: bool,
) -> Result<bool> {
    let row = sqlx::query(
        "SELECT IFNULL((SELECT should_get_gp FROM support_threads
                        WHERE user_id = ? AND thread_id = ?), 2) AS value",
    )
    .bind(user_key(user))
    .bind(channel_key(thread))
    .fetch_one(pool)
    .await?;

    match row.get::<i64, _>("value") {
        0 => Ok(false),
        1 => Ok(true),
        2 => Ok(!is_owner),
        other => Err(StoreError::InvalidOverride(other)),
    }
}

pub async fn get_override_users(
    pool: &SqlitePool,
    thread: ChannelId,
    should_get_gp: bool,
) -> Result<Vec<UserId>> {
    let rows = sqlx::query_as::<_, GpOverride>(
        "SELECT user_id, thread_id, should_get_gp FROM support_threads
         WHERE thread_id = ? AND should_get_gp = ?",
    )
    .bind(channel_key(thread))
    .bind(should_get_gp)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(GpOverride::user).collect())
}

/// Stores whether a user earns GP in a thread. Default values remove the override row.
pub async fn set_user_support_gp(
    pool: &SqlitePool,
    user: UserId,
    thread: ChannelId,
    should_get_gp: bool,
    is_owner: bool,
) -> Result<()> {
    if should_get_gp != is_owner {
        sqlx::query("DELETE FROM support_threads WHERE user_id = ? AND thread_id = ?")
            .bind(user_key(user))
            .bind(channel_key(thread))
            .execute(pool)
            .await?;
    } else {
        sqlx::query(
            "INSERT INTO support_threads (user_id, thread_id, should_get_gp) VALUES (?, ?, ?)
             ON CONFLICT(user_id, thread_id) DO UPDATE SET should_get_gp = excluded.should_get_gp",
        )
        .bind(user_key(user))
        .bind(channel_key(thread))
        .bind(should_get_gp)
        .execute(pool)
        .await?;
    }

    Ok(())
}

pub async fn is_support_gp_enabled(pool: &SqlitePool, thread: ChannelId) -> Result<bool> {
    let row = sqlx::query("SELECT gp_enabled FROM support_thread_settings WHERE thread_id = ?")
        .bind(channel_key(thread))
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|row| row.get("gp_enabled")).unwrap_or(true))
}

pub async fn set_support_gp_enabled(
    pool: &SqlitePool,
    thread: ChannelId,
    enabled: bool,
) -> Result<()> {
    if enabled {
        sqlx::query("DELETE FROM support_thread_settings WHERE thread_id = ?")
            .bind(channel_key(thread))
            .execute(pool)
            .await?;
    } else {
        sqlx::query(
            "INSERT INTO support_thread_settings (thread_id, gp_enabled) VALUES (?, FALSE)
             ON CONFLICT(thread_id) DO UPDATE SET gp_enabled = FALSE",
        )
        .bind(channel_key(thread))
        .execute(pool)
        .await?;
    }

    Ok(())
}

#[async_trait]
impl PointStore for SqlitePool {
    async fn add_points(&self, recipient: UserId, amount: f64) -> Result<f64> {
        add_points(self, recipient, amount).await
    }

    async fn get_points(&self, recipient: UserId) -> Result<f64> {
        get_points(self, recipient).await
    }
}

#[async_trait]
impl GpOverrides for SqlitePool {
    async fn should_user_get_gp(
        &self,
        user: UserId,
        thread: ChannelId,
        is_owner: bool,
    ) -> Result<bool> {
        should_user_get_gp(self, user, thread, is_owner).await
    }

    async fn override_users(&self, thread: ChannelId, should_get_gp: bool) -> Result<Vec<UserId>> {
        get_override_users(self, thread, should_get_gp).await
    }

    async fn support_gp_enabled(&self, thread: ChannelId) -> Result<bool> {
        is_support_gp_enabled(self, thread).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::create_test_pool;
    use crate::gp::Ledger;

    fn user(id: u64) -> UserId {
        UserId::new(id)
    }

    #[tokio::test]
    async fn unknown_users_have_zero_points() {
        let pool = create_test_pool().await.unwrap();
        assert_eq!(get_points(&pool, user(1)).await.unwrap(), 0.0);
    }

    #[tokio::test]
    async fn add_points_accumulates_and_returns_the_total() {
        let pool = create_test_pool().await.unwrap();

        assert_eq!(add_points(&pool, user(1), 5.0).await.unwrap(), 5.0);
        assert_eq!(add_points(&pool, user(1), -2.0).await.unwrap(), 3.0);
        assert_eq!(get_points(&pool, user(1)).await.unwrap(), 3.0);
    }

    #[tokio::test]
    async fn all_points_are_sorted_descending() {
        let pool = create_test_pool().await.unwrap();
        add_points(&pool, user(1), 2.0).await.unwrap();
        add_points(&pool, user(2), 9.0).await.unwrap();
        add_points(&pool, user(3), 4.0).await.unwrap();

        let ids: Vec<u64> = get_all_points(&pool)
            .await
            .unwrap()
            .iter()
            .map(|e| e.user_id().get())
            .collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[tokio::test]
    async fn ledger_commits_through_the_pool() {
        let pool = create_test_pool().await.unwrap();
        let mut ledger = Ledger::default();
        ledger.add(user(1), 3.9);
        ledger.add(user(2), 1.0);

        ledger.apply_to_store(&pool).await.unwrap();

        assert_eq!(get_points(&pool, user(1)).await.unwrap(), 3.0);
        assert_eq!(get_points(&pool, user(2)).await.unwrap(), 1.0);
    }

    #[tokio::test]
    async fn owner_does_not_get_gp_by_default() {
        let pool = create_test_pool().await.unwrap();
        let thread = ChannelId::new(50);

        assert!(!should_user_get_gp(&pool, user(1), thread, true).await.unwrap());
        assert!(should_user_get_gp(&pool, user(2), thread, false).await.unwrap());
    }

    #[tokio::test]
    async fn overrides_are_stored_only_when_not_default() {
        let pool = create_test_pool().await.unwrap();
        let thread = ChannelId::new(50);

        set_user_support_gp(&pool, user(1), thread, true, true).await.unwrap();
        set_user_support_gp(&pool, user(2), thread, false, false).await.unwrap();
        assert!(should_user_get_gp(&pool, user(1), thread, true).await.unwrap());
        assert!(!should_user_get_gp(&pool, user(2), thread, false).await.unwrap());
        assert_eq!(get_override_users(&pool, thread, true).await.unwrap(), vec![user(1)]);
        assert_eq!(get_override_users(&pool, thread, false).await.unwrap(), vec![user(2)]);

        // Back to the default removes the row
        set_user_support_gp(&pool, user(1), thread, false, true).await.unwrap();
        assert!(get_override_users(&pool, thread, true).await.unwrap().is_empty());
        assert!(!should_user_get_gp(&pool, user(1), thread, true).await.unwrap());
    }

    #[tokio::test]
    async fn support_gp_can_be_switched_off_per_thread() {
        let pool = create_test_pool().await.unwrap();
        let thread = ChannelId::new(77);

        assert!(is_support_gp_enabled(&pool, thread).await.unwrap());
        set_support_gp_enabled(&pool, thread, false).await.unwrap();
        set_support_gp_enabled(&pool, thread, false).await.unwrap();
        assert!(!is_support_gp_enabled(&pool, thread).await.unwrap());
        set_support_gp_enabled(&pool, thread, true).await.unwrap();
        assert!(is_support_gp_enabled(&pool, thread).await.unwrap());
    }
}
