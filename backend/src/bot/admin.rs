use tracing::info;

use shared::constants::{
    gift_name_key, gift_sticker_key, gift_weight_key, KEY_CONTACT_USERNAME, KEY_DAILY_FREE_SPINS,
    KEY_LOSE_WEIGHT, KEY_REF_BONUS_SPINS, KEY_REQUIRED_CHANNEL, KEY_SPIN_COST_PAID,
};
use shared::validation;

use crate::bot::session::PendingAction;
use crate::bot::{is_admin, menus, render_admin_menu, Sender};
use crate::error::Error;
use crate::services::{config_service, user_service};
use crate::AppState;

/// Handles `admin:*` button presses: re-render the panel, open a picker or
/// arm a pending input.
pub async fn handle_admin_callback(
    state: &AppState,
    sender: &Sender,
    action: &str,
) -> Result<(), Error> {
    if !is_admin(state, sender.id) {
        return state
            .platform
            .send_message(sender.id, "❌ Not allowed.", None)
            .await;
    }

    if let Some(idx) = action.strip_prefix("setgift:") {
        let idx = match idx.parse::<u8>() {
            Ok(i @ 1..=4) => i,
            _ => return Ok(()),
        };
        state.sessions.set(sender.id, PendingAction::SetGift(idx));
        let prompt = format!(
            "🎁 Edit Gift {}\nSend 3 lines:\n<code>Name</code>\n<code>Weight</code>\n\
             <code>sticker_file_id</code>\nOr one line separated by |",
            idx
        );
        return state.platform.send_message(sender.id, &prompt, None).await;
    }

    let (pending, prompt, keyboard) = match action {
        "menu" => {
            state.sessions.clear(sender.id);
            return render_admin_menu(state, sender).await;
        }
        "gifts" => {
            state.sessions.clear(sender.id);
            (None, "🎁 Choose a gift to edit:", Some(menus::admin_gifts_kb()))
        }
        "addspins" => {
            state.sessions.clear(sender.id);
            (None, "➕ Choose:", Some(menus::admin_addspins_kb()))
        }
        "setchannel" => (
            Some(PendingAction::SetChannel),
            "📣 Send channel username starting with @ (example: @MyChannel)",
            None,
        ),
        "setcontact" => (
            Some(PendingAction::SetContact),
            "💬 Send the contact username (example: @YourSupport)\nOr a full link: https://t.me/YourSupport",
            None,
        ),
        "setdaily" => (
            Some(PendingAction::SetDaily),
            "🗓 Send daily free spins (example: 3)",
            None,
        ),
        "setref" => (
            Some(PendingAction::SetRefBonus),
            "🔗 Send referral bonus spins (example: 2)",
            None,
        ),
        "setcost" => (
            Some(PendingAction::SetCost),
            "💰 Send paid spin cost (example: 1)",
            None,
        ),
        "setlose" => (
            Some(PendingAction::SetLoseWeight),
            "❌ Send lose weight (example: 999996)",
            None,
        ),
        "addfree" => (
            Some(PendingAction::CreditFree),
            "➕ Send: user_id amount   Example: 123456 5",
            None,
        ),
        "addpaid" => (
            Some(PendingAction::CreditPaid),
            "➕ Send: user_id amount   Example: 123456 5",
            None,
        ),
        _ => return Ok(()),
    };

    if let Some(action) = pending {
        state.sessions.set(sender.id, action);
    }
    state.platform.send_message(sender.id, prompt, keyboard).await
}

/// Plain text is only meaningful while a pending admin action is armed.
/// Invalid input reports the reason and keeps the pending action so the
/// admin can retry; `cancel` abandons it.
pub async fn handle_text(state: &AppState, sender: &Sender, text: &str) -> Result<(), Error> {
    let Some(pending) = state.sessions.get(sender.id) else {
        return Ok(());
    };

    if !is_admin(state, sender.id) {
        state.sessions.clear(sender.id);
        return state
            .platform
            .send_message(sender.id, "❌ Not allowed.", None)
            .await;
    }

    if text.eq_ignore_ascii_case("cancel") {
        state.sessions.clear(sender.id);
        return state
            .platform
            .send_message(sender.id, "✅ Cancelled.", None)
            .await;
    }

    match apply_pending(state, pending, text).await {
        Ok(confirmation) => {
            state.sessions.clear(sender.id);
            info!("Admin {} applied {:?}", sender.id, pending);
            state
                .platform
                .send_message(sender.id, &confirmation, None)
                .await
        }
        Err(Error::InvalidConfig(reason)) => {
            let message = format!(
                "❌ Error: {}\nType <code>cancel</code> to cancel.",
                menus::esc(&reason)
            );
            state.platform.send_message(sender.id, &message, None).await
        }
        Err(Error::UnknownUser(id)) => {
            let message = format!(
                "❌ Error: User {} not found (they must start the bot first).\n\
                 Type <code>cancel</code> to cancel.",
                id
            );
            state.platform.send_message(sender.id, &message, None).await
        }
        Err(e) => Err(e),
    }
}

/// Validates and applies one pending input. All validation happens before
/// any write; a failure leaves the stored configuration unchanged.
async fn apply_pending(
    state: &AppState,
    pending: PendingAction,
    text: &str,
) -> Result<String, Error> {
    match pending {
        PendingAction::SetChannel => {
            validation::validate_channel(text).map_err(|e| Error::InvalidConfig(validation::reason(&e)))?;
            config_service::set(&state.pool, KEY_REQUIRED_CHANNEL, text).await?;
            Ok(format!("✅ Required channel set to: {}", text))
        }
        PendingAction::SetContact => {
            validation::validate_contact(text).map_err(|e| Error::InvalidConfig(validation::reason(&e)))?;
            config_service::set(&state.pool, KEY_CONTACT_USERNAME, text).await?;
            Ok(format!("✅ Contact username set to: {}", text))
        }
        PendingAction::SetDaily => {
            let n = validation::validate_spin_setting(text)
                .map_err(|e| Error::InvalidConfig(validation::reason(&e)))?;
            config_service::set(&state.pool, KEY_DAILY_FREE_SPINS, &n.to_string()).await?;
            Ok(format!("✅ Daily free spins = {}", n))
        }
        PendingAction::SetRefBonus => {
            let n = validation::validate_spin_setting(text)
                .map_err(|e| Error::InvalidConfig(validation::reason(&e)))?;
            config_service::set(&state.pool, KEY_REF_BONUS_SPINS, &n.to_string()).await?;
            Ok(format!("✅ Referral bonus = {}", n))
        }
        PendingAction::SetCost => {
            let n = validation::validate_paid_cost(text)
                .map_err(|e| Error::InvalidConfig(validation::reason(&e)))?;
            config_service::set(&state.pool, KEY_SPIN_COST_PAID, &n.to_string()).await?;
            Ok(format!("✅ Paid spin cost = {}", n))
        }
        PendingAction::SetLoseWeight => {
            let n = validation::validate_lose_weight(text)
                .map_err(|e| Error::InvalidConfig(validation::reason(&e)))?;
            config_service::set(&state.pool, KEY_LOSE_WEIGHT, &n.to_string()).await?;
            Ok(format!("✅ Lose weight = {}", n))
        }
        PendingAction::SetGift(idx) => {
            let edit = validation::parse_gift_edit(text)
                .map_err(|e| Error::InvalidConfig(validation::reason(&e)))?;
            let entries = vec![
                (gift_name_key(idx), edit.name.clone()),
                (gift_weight_key(idx), edit.weight.to_string()),
                (gift_sticker_key(idx), edit.sticker),
            ];
            config_service::set_many(&state.pool, &entries).await?;
            Ok(format!("✅ Gift {} updated: {}", idx, edit.name))
        }
        PendingAction::CreditFree => {
            let (user_id, amount) = validation::parse_credit(text)
                .map_err(|e| Error::InvalidConfig(validation::reason(&e)))?;
            user_service::credit_free(&state.pool, user_id, amount).await?;
            Ok(format!("✅ Added {} FREE spins to user {}", amount, user_id))
        }
        PendingAction::CreditPaid => {
            let (user_id, amount) = validation::parse_credit(text)
                .map_err(|e| Error::InvalidConfig(validation::reason(&e)))?;
            user_service::credit_paid(&state.pool, user_id, amount).await?;
            Ok(format!("✅ Added {} PAID balance to user {}", amount, user_id))
        }
    }
}
