use std::time::Duration;

use tracing::error;

use shared::constants::SPIN_ANIMATION_MS;

use crate::bot::{admin, is_subscribed, menus, render_main, Sender};
use crate::error::Error;
use crate::services::{config_service, draw_service, user_service};
use crate::AppState;

/// Handles a button press. Every press refreshes the account and the daily
/// allotment before acting.
pub async fn handle_callback(state: &AppState, sender: &Sender, data: &str) -> Result<(), Error> {
    user_service::ensure_user(
        &state.pool,
        sender.id,
        sender.username.as_deref(),
        sender.first_name.as_deref(),
    )
    .await?;
    user_service::refresh_daily_free(&state.pool, sender.id).await?;

    if let Some(rest) = data.strip_prefix("admin:") {
        return admin::handle_admin_callback(state, sender, rest).await;
    }

    match data {
        "back:menu" => {
            state.sessions.clear(sender.id);
            render_main(state, sender, "").await
        }
        "refresh" => render_main(state, sender, "").await,
        "me" => {
            let user = user_service::get_user(&state.pool, sender.id)
                .await?
                .ok_or(Error::UnknownUser(sender.id))?;
            let note = format!(
                "👤 Free: <b>{}</b> • Paid: <b>{}</b>",
                user.free_spins, user.paid_spins
            );
            render_main(state, sender, &note).await
        }
        "gifts" => {
            let outcomes = draw_service::load_outcomes(&state.pool).await?;
            let gifts: Vec<_> = outcomes.into_iter().filter(|o| !o.is_lose()).collect();
            state
                .platform
                .send_message(sender.id, &menus::gifts_text(&gifts), None)
                .await
        }
        "buy" => {
            let contact = config_service::contact_username(&state.pool).await?;
            let keyboard = menus::contact_kb("💬 Contact to Buy", &contact);
            state
                .platform
                .send_message(sender.id, &menus::buy_text(&contact), keyboard)
                .await
        }
        "contact" => {
            let contact = config_service::contact_username(&state.pool).await?;
            let keyboard = menus::contact_kb("💬 Open Chat", &contact);
            state
                .platform
                .send_message(sender.id, &menus::contact_text(&contact), keyboard)
                .await
        }
        "ref" => {
            let bot_username = state.platform.bot_username().await?;
            let bonus =
                config_service::get(&state.pool, shared::constants::KEY_REF_BONUS_SPINS).await?;
            let text = menus::referral_text(&bot_username, sender.id, bonus.trim());
            state.platform.send_message(sender.id, &text, None).await
        }
        "spin" => handle_spin(state, sender).await,
        _ => Ok(()),
    }
}

/// The draw flow: subscription gate, sticker-completeness gate, then the
/// atomic draw itself, then the announcement.
async fn handle_spin(state: &AppState, sender: &Sender) -> Result<(), Error> {
    if !is_subscribed(state, sender.id).await? {
        let channel = config_service::required_channel(&state.pool).await?;
        let text = format!(
            "🚫 You must join the required channel first:\n<code>{}</code>",
            menus::esc(&channel)
        );
        return state.platform.send_message(sender.id, &text, None).await;
    }

    let outcomes = draw_service::load_outcomes(&state.pool).await?;
    if outcomes.iter().any(|o| !o.is_lose() && o.sticker.is_none()) {
        return state
            .platform
            .send_message(
                sender.id,
                "⚠️ Some gifts are missing sticker file_id.\nAdmins must set them in the Admin Panel.",
                None,
            )
            .await;
    }

    let result = match draw_service::attempt_draw(&state.pool, sender.id).await {
        Ok(result) => result,
        Err(Error::InsufficientBalance { free, paid }) => {
            return state
                .platform
                .send_message(sender.id, &menus::insufficient_text(free, paid), None)
                .await;
        }
        Err(e) => {
            error!("Draw failed for user {}: {}", sender.id, e);
            return state
                .platform
                .send_message(sender.id, "⚠️ Something went wrong. Please try again.", None)
                .await;
        }
    };

    // Cosmetic only; the draw is already committed.
    if state.platform.send_dice(sender.id).await.is_ok() {
        tokio::time::sleep(Duration::from_millis(SPIN_ANIMATION_MS)).await;
    }

    let spin_type = result.spin_type.as_str();
    match &result.outcome.sticker {
        Some(sticker) => {
            let _ = state.platform.send_sticker(sender.id, sticker).await;
            state
                .platform
                .send_message(sender.id, &menus::win_text(&result.outcome.name, spin_type), None)
                .await
        }
        None => {
            state
                .platform
                .send_message(sender.id, &menus::lose_text(&result.outcome.name, spin_type), None)
                .await
        }
    }
}
