use sqlx::SqlitePool;
use tracing::info;

use shared::constants::{
    self, KEY_CONTACT_USERNAME, KEY_DAILY_FREE_SPINS, KEY_REF_BONUS_SPINS, KEY_REQUIRED_CHANNEL,
    KEY_SPIN_COST_PAID,
};

use crate::error::Error;

/// Reads a config value, falling back to the compiled-in default when the
/// key has never been written. The store itself performs no validation.
pub async fn get(pool: &SqlitePool, key: &str) -> Result<String, Error> {
    let row: Option<(String,)> = sqlx::query_as("SELECT value FROM config WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?;
    Ok(row
        .map(|(v,)| v)
        .unwrap_or_else(|| constants::default_for(key).to_string()))
}

/// Upserts one key. Callers validate before writing.
pub async fn set(pool: &SqlitePool, key: &str, value: &str) -> Result<(), Error> {
    sqlx::query(
        "INSERT INTO config(key, value) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;
    info!("Config updated: {} = {}", key, value);
    Ok(())
}

/// Upserts several keys in one transaction, so a multi-field edit (gift
/// name + weight + sticker) is never half-applied.
pub async fn set_many(pool: &SqlitePool, entries: &[(String, String)]) -> Result<(), Error> {
    let mut tx = pool.begin().await?;
    for (key, value) in entries {
        sqlx::query(
            "INSERT INTO config(key, value) VALUES(?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        )
        .bind(key)
        .bind(value)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    info!("Config updated: {} keys", entries.len());
    Ok(())
}

/// Numeric read with the same fallback rule; a value that fails to parse
/// behaves like an unset key.
pub async fn get_i64(pool: &SqlitePool, key: &str) -> Result<i64, Error> {
    let raw = get(pool, key).await?;
    Ok(raw
        .trim()
        .parse::<i64>()
        .unwrap_or_else(|_| constants::default_for(key).parse().unwrap_or(0)))
}

pub async fn daily_free_spins(pool: &SqlitePool) -> Result<i64, Error> {
    get_i64(pool, KEY_DAILY_FREE_SPINS).await
}

pub async fn ref_bonus_spins(pool: &SqlitePool) -> Result<i64, Error> {
    get_i64(pool, KEY_REF_BONUS_SPINS).await
}

pub async fn spin_cost_paid(pool: &SqlitePool) -> Result<i64, Error> {
    Ok(get_i64(pool, KEY_SPIN_COST_PAID).await?.max(1))
}

pub async fn required_channel(pool: &SqlitePool) -> Result<String, Error> {
    Ok(get(pool, KEY_REQUIRED_CHANNEL).await?.trim().to_string())
}

pub async fn contact_username(pool: &SqlitePool) -> Result<String, Error> {
    Ok(get(pool, KEY_CONTACT_USERNAME).await?.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use shared::constants::CHANNEL_SENTINEL;

    #[tokio::test]
    async fn get_returns_seeded_default() {
        let pool = test_pool().await;
        assert_eq!(get(&pool, KEY_REQUIRED_CHANNEL).await.unwrap(), CHANNEL_SENTINEL);
        assert_eq!(daily_free_spins(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn get_unknown_key_falls_back_to_compiled_default() {
        let pool = test_pool().await;
        sqlx::query("DELETE FROM config").execute(&pool).await.unwrap();
        assert_eq!(get(&pool, KEY_DAILY_FREE_SPINS).await.unwrap(), "1");
        assert_eq!(get(&pool, "mystery_key").await.unwrap(), "");
    }

    #[tokio::test]
    async fn set_overwrites_prior_value() {
        let pool = test_pool().await;
        set(&pool, KEY_DAILY_FREE_SPINS, "3").await.unwrap();
        set(&pool, KEY_DAILY_FREE_SPINS, "7").await.unwrap();
        assert_eq!(daily_free_spins(&pool).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn set_many_writes_all_keys() {
        let pool = test_pool().await;
        let entries = vec![
            ("gift1_name".to_string(), "Crown".to_string()),
            ("gift1_weight".to_string(), "9".to_string()),
            ("gift1_sticker".to_string(), "STICK".to_string()),
        ];
        set_many(&pool, &entries).await.unwrap();
        assert_eq!(get(&pool, "gift1_name").await.unwrap(), "Crown");
        assert_eq!(get_i64(&pool, "gift1_weight").await.unwrap(), 9);
        assert_eq!(get(&pool, "gift1_sticker").await.unwrap(), "STICK");
    }

    #[tokio::test]
    async fn unparseable_number_behaves_like_unset() {
        let pool = test_pool().await;
        set(&pool, KEY_SPIN_COST_PAID, "banana").await.unwrap();
        assert_eq!(spin_cost_paid(&pool).await.unwrap(), 1);
    }
}
