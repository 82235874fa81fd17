use chrono::Utc;
use rand::rngs::OsRng;
use sqlx::SqlitePool;
use tracing::info;

use shared::constants::{
    gift_name_key, gift_sticker_key, gift_weight_key, GIFT_SLOTS, KEY_LOSE_NAME, KEY_LOSE_WEIGHT,
};
use shared::roulette::{self, DrawResult, Outcome, SpinType};

use crate::error::Error;
use crate::services::config_service;

/// Assembles the current outcome table from the config store: the reserved
/// lose slot followed by gifts 1..=4. Always reflects the latest admin
/// edits; normalization clamps negative weights and applies the fallback
/// distribution when the table has no weight.
pub async fn load_outcomes(pool: &SqlitePool) -> Result<Vec<Outcome>, Error> {
    let mut outcomes = Vec::with_capacity(1 + GIFT_SLOTS as usize);

    let lose_name = config_service::get(pool, KEY_LOSE_NAME).await?;
    outcomes.push(Outcome {
        idx: 0,
        name: lose_name.trim().to_string(),
        weight: config_service::get_i64(pool, KEY_LOSE_WEIGHT).await?,
        sticker: None,
    });

    for i in 1..=GIFT_SLOTS {
        let name = config_service::get(pool, &gift_name_key(i)).await?;
        let name = name.trim();
        let sticker = config_service::get(pool, &gift_sticker_key(i)).await?;
        let sticker = sticker.trim().to_string();
        outcomes.push(Outcome {
            idx: i,
            name: if name.is_empty() {
                format!("Gift {}", i)
            } else {
                name.to_string()
            },
            weight: config_service::get_i64(pool, &gift_weight_key(i)).await?,
            sticker: if sticker.is_empty() { None } else { Some(sticker) },
        });
    }

    Ok(roulette::normalize_outcomes(outcomes))
}

/// Runs the whole draw decision for one "Spin" press:
/// daily reset, eligibility, weighted pick, debit and history append.
///
/// The debit and the spin-record insert commit as one transaction, so the
/// user is never charged without a recorded outcome or vice versa. Free
/// spins are preferred and always cost 1; a paid spend costs the configured
/// amount. An insufficient balance mutates nothing.
pub async fn attempt_draw(pool: &SqlitePool, user_id: i64) -> Result<DrawResult, Error> {
    let daily = config_service::daily_free_spins(pool).await?;
    let cost = config_service::spin_cost_paid(pool).await?;
    let outcomes = load_outcomes(pool).await?;

    let today = Utc::now().format("%Y-%m-%d").to_string();

    let mut tx = pool.begin().await?;

    sqlx::query(
        "UPDATE users SET free_spins = ?, last_free_date = ?
         WHERE user_id = ? AND (last_free_date IS NULL OR last_free_date <> ?)",
    )
    .bind(daily)
    .bind(&today)
    .bind(user_id)
    .bind(&today)
    .execute(&mut *tx)
    .await?;

    let row: Option<(i64, i64)> =
        sqlx::query_as("SELECT free_spins, paid_spins FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?;
    let (free, paid) = row.ok_or(Error::UnknownUser(user_id))?;

    let spin_type = if free > 0 {
        SpinType::Free
    } else if paid >= cost {
        SpinType::Paid
    } else {
        return Err(Error::InsufficientBalance { free, paid });
    };

    let outcome = roulette::pick_weighted(&outcomes, &mut OsRng).clone();

    match spin_type {
        SpinType::Free => {
            sqlx::query("UPDATE users SET free_spins = free_spins - 1 WHERE user_id = ?")
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
        SpinType::Paid => {
            sqlx::query("UPDATE users SET paid_spins = paid_spins - ? WHERE user_id = ?")
                .bind(cost)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }
    }

    sqlx::query(
        "INSERT INTO spins(user_id, used_type, result_idx, result_name, result_sticker, created_at)
         VALUES(?, ?, ?, ?, ?, ?)",
    )
    .bind(user_id)
    .bind(spin_type.as_str())
    .bind(outcome.idx as i64)
    .bind(&outcome.name)
    .bind(outcome.sticker.as_deref().unwrap_or(""))
    .bind(Utc::now().to_rfc3339())
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    info!(
        "User {} spun ({}) and got outcome {} ({})",
        user_id,
        spin_type.as_str(),
        outcome.idx,
        outcome.name
    );

    Ok(DrawResult { spin_type, outcome })
}
