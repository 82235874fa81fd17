use chrono::Utc;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::info;

use crate::error::Error;
use crate::services::config_service;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    pub user_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub referrer_id: Option<i64>,
    pub free_spins: i64,
    pub paid_spins: i64,
    pub last_free_date: Option<String>,
    pub created_at: String,
}

/// Why a referral attempt did not grant a bonus. User-visible behavior is
/// the same for all of them: silence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferralOutcome {
    Granted { bonus: i64 },
    SelfReferral,
    AlreadyReferred,
    UnknownUser,
}

impl ReferralOutcome {
    pub fn granted_bonus(&self) -> Option<i64> {
        match self {
            ReferralOutcome::Granted { bonus } if *bonus > 0 => Some(*bonus),
            _ => None,
        }
    }
}

fn today() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// Idempotent upsert on first interaction; display fields are refreshed on
/// every call since the platform lets users rename themselves.
pub async fn ensure_user(
    pool: &SqlitePool,
    user_id: i64,
    username: Option<&str>,
    first_name: Option<&str>,
) -> Result<User, Error> {
    sqlx::query(
        "INSERT OR IGNORE INTO users(user_id, username, first_name, created_at)
         VALUES(?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(username.unwrap_or(""))
    .bind(first_name.unwrap_or(""))
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    sqlx::query("UPDATE users SET username = ?, first_name = ? WHERE user_id = ?")
        .bind(username.unwrap_or(""))
        .bind(first_name.unwrap_or(""))
        .bind(user_id)
        .execute(pool)
        .await?;

    get_user(pool, user_id)
        .await?
        .ok_or(Error::UnknownUser(user_id))
}

pub async fn get_user(pool: &SqlitePool, user_id: i64) -> Result<Option<User>, Error> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE user_id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    Ok(user)
}

/// Once per calendar day, on first access, sets `free_spins` to the
/// configured daily amount. A second call on the same day is a no-op.
pub async fn refresh_daily_free(pool: &SqlitePool, user_id: i64) -> Result<(), Error> {
    let daily = config_service::daily_free_spins(pool).await?;
    let today = today();
    sqlx::query(
        "UPDATE users SET free_spins = ?, last_free_date = ?
         WHERE user_id = ? AND (last_free_date IS NULL OR last_free_date <> ?)",
    )
    .bind(daily)
    .bind(&today)
    .bind(user_id)
    .bind(&today)
    .execute(pool)
    .await?;
    Ok(())
}

/// Admin credit. The target must have interacted with the bot before.
pub async fn credit_free(pool: &SqlitePool, user_id: i64, amount: i64) -> Result<(), Error> {
    if amount <= 0 {
        return Err(Error::InvalidConfig("Amount must be > 0".to_string()));
    }
    let result = sqlx::query("UPDATE users SET free_spins = free_spins + ? WHERE user_id = ?")
        .bind(amount)
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::UnknownUser(user_id));
    }
    info!("Credited {} free spins to user {}", amount, user_id);
    Ok(())
}

pub async fn credit_paid(pool: &SqlitePool, user_id: i64, amount: i64) -> Result<(), Error> {
    if amount <= 0 {
        return Err(Error::InvalidConfig("Amount must be > 0".to_string()));
    }
    let result = sqlx::query("UPDATE users SET paid_spins = paid_spins + ? WHERE user_id = ?")
        .bind(amount)
        .bind(user_id)
        .execute(pool)
        .await?;
    if result.rows_affected() == 0 {
        return Err(Error::UnknownUser(user_id));
    }
    info!("Credited {} paid balance to user {}", amount, user_id);
    Ok(())
}

/// One-shot referrer assignment. Records `referrer_id` only if the user has
/// none yet and is not referring themselves, then credits the configured
/// bonus to the referrer. Assignment and credit commit together.
pub async fn record_referral(
    pool: &SqlitePool,
    user_id: i64,
    referrer_id: i64,
) -> Result<ReferralOutcome, Error> {
    if referrer_id == user_id {
        return Ok(ReferralOutcome::SelfReferral);
    }

    let bonus = config_service::ref_bonus_spins(pool).await?;

    let mut tx = pool.begin().await?;

    let row: Option<(Option<i64>,)> =
        sqlx::query_as("SELECT referrer_id FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
    match row {
        None => return Ok(ReferralOutcome::UnknownUser),
        Some((Some(_),)) => return Ok(ReferralOutcome::AlreadyReferred),
        Some((None,)) => {}
    }

    sqlx::query("UPDATE users SET referrer_id = ? WHERE user_id = ?")
        .bind(referrer_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    if bonus > 0 {
        sqlx::query("UPDATE users SET free_spins = free_spins + ? WHERE user_id = ?")
            .bind(bonus)
            .bind(referrer_id)
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;
    info!(
        "Referral recorded: user {} referred by {} (bonus {})",
        user_id, referrer_id, bonus
    );
    Ok(ReferralOutcome::Granted { bonus })
}
