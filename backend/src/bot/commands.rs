use tracing::warn;

use crate::bot::{menus, render_admin_menu, render_main, Sender};
use crate::error::Error;
use crate::services::user_service;
use crate::AppState;

/// `/start [referrer_id]`: ensure the account exists, run the referral flow
/// when a numeric argument is present, then show the main menu. Any pending
/// admin input is abandoned.
pub async fn handle_start(state: &AppState, sender: &Sender, args: &str) -> Result<(), Error> {
    user_service::ensure_user(
        &state.pool,
        sender.id,
        sender.username.as_deref(),
        sender.first_name.as_deref(),
    )
    .await?;

    let referrer_id = args
        .split_whitespace()
        .next()
        .and_then(|a| a.parse::<i64>().ok())
        .unwrap_or(0);
    if referrer_id > 0 {
        let outcome = user_service::record_referral(&state.pool, sender.id, referrer_id).await?;
        if let Some(bonus) = outcome.granted_bonus() {
            // Notification is best effort; the bonus is already committed.
            if let Err(e) = state
                .platform
                .send_message(referrer_id, &menus::referral_notification(bonus), None)
                .await
            {
                warn!("Could not notify referrer {}: {}", referrer_id, e);
            }
        }
    }

    state.sessions.clear(sender.id);
    render_main(state, sender, "").await
}

/// `/admin`: the panel for admins, a refusal for everyone else.
pub async fn handle_admin(state: &AppState, sender: &Sender) -> Result<(), Error> {
    if !crate::bot::is_admin(state, sender.id) {
        return state
            .platform
            .send_message(sender.id, "❌ This command is for admins only.", None)
            .await;
    }
    render_admin_menu(state, sender).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::testing::{sender, test_state};
    use crate::services::config_service;

    #[tokio::test]
    async fn start_creates_the_user_and_renders_the_menu() {
        let (state, platform) = test_state(vec![]).await;
        handle_start(&state, &sender(1), "").await.unwrap();

        assert!(user_service::get_user(&state.pool, 1).await.unwrap().is_some());
        let texts = platform.texts_to(1);
        assert_eq!(texts.len(), 1);
        assert!(texts[0].contains("Gift Roulette"));
    }

    #[tokio::test]
    async fn start_with_referrer_credits_and_notifies_once() {
        let (state, platform) = test_state(vec![]).await;
        config_service::set(&state.pool, "ref_bonus_spins", "2").await.unwrap();
        handle_start(&state, &sender(2), "").await.unwrap();

        handle_start(&state, &sender(1), "2").await.unwrap();

        let referrer = user_service::get_user(&state.pool, 2).await.unwrap().unwrap();
        // Daily refresh already granted 1; the bonus adds 2 on top.
        assert_eq!(referrer.free_spins, 3);
        let notices = platform.texts_to(2);
        assert!(notices.iter().any(|t| t.contains("New referral")));

        // A second start with a different referrer changes nothing.
        handle_start(&state, &sender(3), "").await.unwrap();
        handle_start(&state, &sender(1), "3").await.unwrap();
        let invited = user_service::get_user(&state.pool, 1).await.unwrap().unwrap();
        assert_eq!(invited.referrer_id, Some(2));
        assert!(platform.texts_to(3).iter().all(|t| !t.contains("New referral")));
    }

    #[tokio::test]
    async fn self_referral_is_silent() {
        let (state, platform) = test_state(vec![]).await;
        handle_start(&state, &sender(1), "1").await.unwrap();

        let user = user_service::get_user(&state.pool, 1).await.unwrap().unwrap();
        assert_eq!(user.referrer_id, None);
        let texts = platform.texts_to(1);
        assert_eq!(texts.len(), 1, "only the menu, no error message");
    }

    #[tokio::test]
    async fn non_numeric_start_argument_is_ignored() {
        let (state, _platform) = test_state(vec![]).await;
        handle_start(&state, &sender(1), "not-a-number").await.unwrap();
        let user = user_service::get_user(&state.pool, 1).await.unwrap().unwrap();
        assert_eq!(user.referrer_id, None);
    }

    #[tokio::test]
    async fn admin_command_is_gated() {
        let (state, platform) = test_state(vec![10]).await;
        handle_admin(&state, &sender(1)).await.unwrap();
        assert!(platform.texts_to(1)[0].contains("admins only"));

        handle_admin(&state, &sender(10)).await.unwrap();
        assert!(platform.texts_to(10)[0].contains("Admin Panel"));
    }
}
