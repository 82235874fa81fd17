use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tracing::info;

use shared::constants::CONFIG_DEFAULTS;

/// Opens the SQLite database (creating the file if missing), applies the
/// idempotent schema and seeds config defaults.
pub async fn connect(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    init_schema(&pool).await?;
    info!("Database ready at {}", database_url);
    Ok(pool)
}

pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS config(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users(
            user_id INTEGER PRIMARY KEY,
            username TEXT,
            first_name TEXT,
            referrer_id INTEGER,
            free_spins INTEGER NOT NULL DEFAULT 0,
            paid_spins INTEGER NOT NULL DEFAULT 0,
            last_free_date TEXT,
            created_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE TABLE IF NOT EXISTS spins(
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            used_type TEXT NOT NULL,
            result_idx INTEGER NOT NULL,
            result_name TEXT NOT NULL,
            result_sticker TEXT,
            created_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    // Existing values win; only never-seen keys are seeded.
    for (key, value) in CONFIG_DEFAULTS {
        sqlx::query("INSERT OR IGNORE INTO config(key, value) VALUES(?, ?)")
            .bind(key)
            .bind(value)
            .execute(pool)
            .await?;
    }

    Ok(())
}

/// In-memory pool for tests. A single connection keeps every statement on
/// the same database and serializes access the way the live bot does.
#[cfg(test)]
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory sqlite");
    init_schema(&pool).await.expect("schema");
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn schema_and_seeding_are_idempotent() {
        let pool = test_pool().await;
        init_schema(&pool).await.unwrap();

        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM config")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count as usize, CONFIG_DEFAULTS.len());
    }

    #[tokio::test]
    async fn seeding_does_not_overwrite_existing_values() {
        let pool = test_pool().await;
        sqlx::query("UPDATE config SET value = '5' WHERE key = 'daily_free_spins'")
            .execute(&pool)
            .await
            .unwrap();

        init_schema(&pool).await.unwrap();

        let (value,): (String,) =
            sqlx::query_as("SELECT value FROM config WHERE key = 'daily_free_spins'")
                .fetch_one(&pool)
                .await
                .unwrap();
        assert_eq!(value, "5");
    }
}
