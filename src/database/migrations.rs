use anyhow::Result;
use sqlx::SqlitePool;
use tracing::info;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    info!("Running database migrations...");

    create_reputation_table(pool).await?;
    create_support_threads_table(pool).await?;
    create_support_thread_settings_table(pool).await?;

    info!("Database migrations completed successfully");
    Ok(())
}

async fn create_reputation_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS rep (
            discord_id INTEGER PRIMARY KEY,
            points REAL NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Per-user exceptions to the default support GP rule. Rows only exist for non-default values.
async fn create_support_threads_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS support_threads (
            user_id INTEGER NOT NULL,
            thread_id INTEGER NOT NULL,
            should_get_gp BOOLEAN NOT NULL,
            PRIMARY KEY (user_id, thread_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_support_thread_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS support_thread_settings (
            thread_id INTEGER PRIMARY KEY,
            gp_enabled BOOLEAN NOT NULL DEFAULT TRUE
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}
