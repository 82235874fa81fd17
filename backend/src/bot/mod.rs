use serde::Deserialize;

use shared::constants::CHANNEL_SENTINEL;

use crate::error::Error;
use crate::services::{config_service, draw_service, user_service};
use crate::AppState;

pub mod admin;
pub mod callbacks;
pub mod commands;
pub mod menus;
pub mod session;

// Inbound update DTOs, the subset of the platform's update object the bot
// reads.

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Deserialize)]
pub struct Sender {
    pub id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub from: Sender,
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    pub from: Sender,
    pub data: Option<String>,
}

/// Linear per-update dispatch: a command, a button press or plain text
/// feeding a pending admin action.
pub async fn dispatch(state: &AppState, update: Update) -> Result<(), Error> {
    if let Some(callback) = update.callback_query {
        let data = callback.data.unwrap_or_default();
        return callbacks::handle_callback(state, &callback.from, data.trim()).await;
    }

    if let Some(message) = update.message {
        let text = message.text.unwrap_or_default();
        let text = text.trim();
        if let Some(args) = text.strip_prefix("/start") {
            // Only bare "/start" or "/start <payload>"; "/startup" is not it.
            if args.is_empty() || args.starts_with(char::is_whitespace) {
                return commands::handle_start(state, &message.from, args.trim()).await;
            }
        }
        if text == "/admin" {
            return commands::handle_admin(state, &message.from).await;
        }
        return admin::handle_text(state, &message.from, text).await;
    }

    Ok(())
}

pub fn is_admin(state: &AppState, user_id: i64) -> bool {
    state.admins.contains(&user_id)
}

/// Channel-subscription gate. Open when no channel is configured (unset
/// sentinel or empty), otherwise the membership oracle decides and any
/// oracle failure counts as "not subscribed".
pub async fn is_subscribed(state: &AppState, user_id: i64) -> Result<bool, Error> {
    let channel = config_service::required_channel(&state.pool).await?;
    if channel.is_empty() || channel == CHANNEL_SENTINEL {
        return Ok(true);
    }
    Ok(state
        .platform
        .is_channel_member(&channel, user_id)
        .await
        .unwrap_or(false))
}

async fn settings_view(state: &AppState) -> Result<menus::SettingsView, Error> {
    Ok(menus::SettingsView {
        channel: config_service::required_channel(&state.pool).await?,
        daily: config_service::get(&state.pool, shared::constants::KEY_DAILY_FREE_SPINS).await?,
        ref_bonus: config_service::get(&state.pool, shared::constants::KEY_REF_BONUS_SPINS).await?,
        cost: config_service::get(&state.pool, shared::constants::KEY_SPIN_COST_PAID).await?,
    })
}

/// Renders the main menu: account balances, gift list, current settings.
pub async fn render_main(state: &AppState, sender: &Sender, note: &str) -> Result<(), Error> {
    user_service::ensure_user(
        &state.pool,
        sender.id,
        sender.username.as_deref(),
        sender.first_name.as_deref(),
    )
    .await?;
    user_service::refresh_daily_free(&state.pool, sender.id).await?;

    let user = user_service::get_user(&state.pool, sender.id)
        .await?
        .ok_or(Error::UnknownUser(sender.id))?;
    let outcomes = draw_service::load_outcomes(&state.pool).await?;
    let gifts: Vec<_> = outcomes.iter().filter(|o| !o.is_lose()).cloned().collect();
    let settings = settings_view(state).await?;

    let text = menus::main_menu_text(&user, &gifts, &settings, note);
    let channel_url = menus::normalize_channel_to_url(&settings.channel);
    let keyboard = menus::main_menu_kb(is_admin(state, sender.id), &channel_url);

    state
        .platform
        .send_message(sender.id, &text, Some(keyboard))
        .await
}

/// Renders the admin panel with current settings and per-gift status.
pub async fn render_admin_menu(state: &AppState, sender: &Sender) -> Result<(), Error> {
    if !is_admin(state, sender.id) {
        return state
            .platform
            .send_message(sender.id, "❌ Admin panel is not available.", None)
            .await;
    }

    let outcomes = draw_service::load_outcomes(&state.pool).await?;
    let settings = settings_view(state).await?;
    let text = menus::admin_panel_text(&outcomes, &settings);
    state
        .platform
        .send_message(sender.id, &text, Some(menus::admin_menu_kb()))
        .await
}

#[cfg(test)]
pub mod testing {
    use std::sync::Arc;

    use crate::db::test_pool;
    use crate::platform::testing::RecordingPlatform;
    use crate::AppState;

    use super::Sender;

    pub async fn test_state(admins: Vec<i64>) -> (AppState, Arc<RecordingPlatform>) {
        let platform = Arc::new(RecordingPlatform::new());
        let state = AppState {
            pool: test_pool().await,
            platform: platform.clone(),
            sessions: super::session::Sessions::new(),
            admins: Arc::new(admins),
            webhook_secret: Arc::new("test-secret".to_string()),
        };
        (state, platform)
    }

    pub fn sender(id: i64) -> Sender {
        Sender {
            id,
            username: Some(format!("user{}", id)),
            first_name: Some("Test".to_string()),
        }
    }
}
