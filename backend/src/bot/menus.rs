use serde_json::{json, Value};

use shared::roulette::Outcome;

use crate::services::user_service::User;

/// Minimal HTML escaper for user- and admin-supplied strings embedded in
/// rendered messages.
pub fn esc(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Turns a stored channel value into a clickable URL. Empty in, empty out.
pub fn normalize_channel_to_url(ch: &str) -> String {
    let ch = ch.trim();
    if ch.is_empty() {
        return String::new();
    }
    if ch.starts_with("https://t.me/") {
        return ch.to_string();
    }
    if let Some(handle) = ch.strip_prefix('@') {
        return format!("https://t.me/{}", handle);
    }
    format!("https://t.me/{}", ch)
}

/// Current admin-facing settings, read once per render.
pub struct SettingsView {
    pub channel: String,
    pub daily: String,
    pub ref_bonus: String,
    pub cost: String,
}

pub fn main_menu_kb(is_admin: bool, channel_url: &str) -> Value {
    let mut rows = vec![
        json!([{ "text": "🎡 Spin", "callback_data": "spin" }]),
        json!([
            { "text": "🎁 Gifts", "callback_data": "gifts" },
            { "text": "🛒 Buy Spins", "callback_data": "buy" }
        ]),
        json!([{ "text": "🔗 Referral Link", "callback_data": "ref" }]),
        json!([{ "text": "💬 Contact", "callback_data": "contact" }]),
    ];
    if !channel_url.is_empty() {
        rows.push(json!([{ "text": "📣 Channel", "url": channel_url }]));
    }
    rows.push(json!([
        { "text": "👤 My Account", "callback_data": "me" },
        { "text": "🔄 Refresh", "callback_data": "refresh" }
    ]));
    if is_admin {
        rows.push(json!([{ "text": "👑 Admin Panel", "callback_data": "admin:menu" }]));
    }
    Value::Array(rows)
}

pub fn admin_menu_kb() -> Value {
    json!([
        [{ "text": "📣 Set Required Channel", "callback_data": "admin:setchannel" }],
        [{ "text": "💬 Set Contact Username", "callback_data": "admin:setcontact" }],
        [
            { "text": "🗓 Daily Free Spins", "callback_data": "admin:setdaily" },
            { "text": "🔗 Referral Bonus", "callback_data": "admin:setref" }
        ],
        [{ "text": "💰 Paid Spin Cost", "callback_data": "admin:setcost" }],
        [{ "text": "❌ Lose Weight", "callback_data": "admin:setlose" }],
        [{ "text": "🎁 Edit Gifts", "callback_data": "admin:gifts" }],
        [{ "text": "➕ Add Spins (User)", "callback_data": "admin:addspins" }],
        [{ "text": "⬅️ Back", "callback_data": "back:menu" }]
    ])
}

pub fn admin_gifts_kb() -> Value {
    json!([
        [
            { "text": "Gift 1", "callback_data": "admin:setgift:1" },
            { "text": "Gift 2", "callback_data": "admin:setgift:2" }
        ],
        [
            { "text": "Gift 3", "callback_data": "admin:setgift:3" },
            { "text": "Gift 4", "callback_data": "admin:setgift:4" }
        ],
        [{ "text": "⬅️ Back", "callback_data": "admin:menu" }]
    ])
}

pub fn admin_addspins_kb() -> Value {
    json!([
        [{ "text": "Add FREE spins", "callback_data": "admin:addfree" }],
        [{ "text": "Add PAID balance", "callback_data": "admin:addpaid" }],
        [{ "text": "⬅️ Back", "callback_data": "admin:menu" }]
    ])
}

/// Single URL button pointing at the configured contact, when it is in a
/// linkable form.
pub fn contact_kb(label: &str, contact: &str) -> Option<Value> {
    let url = if let Some(handle) = contact.strip_prefix('@') {
        format!("https://t.me/{}", handle)
    } else if contact.starts_with("https://t.me/") {
        contact.to_string()
    } else {
        return None;
    };
    Some(json!([[{ "text": label, "url": url }]]))
}

pub fn main_menu_text(user: &User, gifts: &[Outcome], settings: &SettingsView, note: &str) -> String {
    let mut lines = vec!["🎁 <b>Gift Roulette</b>".to_string()];
    if !note.is_empty() {
        lines.push(note.to_string());
    }
    lines.push(String::new());
    lines.push("👤 <b>Your account</b>".to_string());
    lines.push(format!("• ID: <code>{}</code>", user.user_id));
    lines.push(format!("• Free spins today: <b>{}</b>", user.free_spins));
    lines.push(format!("• Paid balance: <b>{}</b>", user.paid_spins));
    lines.push(String::new());
    lines.push("🎁 <b>Gifts in roulette</b>".to_string());
    for gift in gifts {
        lines.push(format!("• {}", esc(&gift.name)));
    }
    lines.push(String::new());
    lines.push("⚙️ <b>Settings</b>".to_string());
    lines.push(format!("• Required channel: <code>{}</code>", esc(&settings.channel)));
    lines.push(format!("• Daily free spins: <b>{}</b>", esc(&settings.daily)));
    lines.push(format!("• Referral bonus: <b>{}</b>", esc(&settings.ref_bonus)));
    lines.push(format!("• Paid spin cost: <b>{}</b>", esc(&settings.cost)));
    lines.join("\n")
}

pub fn admin_panel_text(outcomes: &[Outcome], settings: &SettingsView) -> String {
    let lose_weight = outcomes
        .iter()
        .find(|o| o.is_lose())
        .map(|o| o.weight)
        .unwrap_or(0);

    let mut lines = vec![
        "👑 <b>Admin Panel</b>".to_string(),
        String::new(),
        format!("📣 Required channel: <code>{}</code>", esc(&settings.channel)),
        format!("🗓 Daily free spins: <b>{}</b>", esc(&settings.daily)),
        format!("🔗 Referral bonus: <b>{}</b>", esc(&settings.ref_bonus)),
        format!("💰 Paid spin cost: <b>{}</b>", esc(&settings.cost)),
        format!("❌ Lose weight: <b>{}</b>", lose_weight),
        String::new(),
        "🎁 <b>Gifts</b>".to_string(),
    ];
    for gift in outcomes.iter().filter(|o| !o.is_lose()) {
        lines.push(format!(
            "• {} | weight: <b>{}</b> | {}",
            esc(&gift.name),
            gift.weight,
            if gift.sticker.is_some() { "OK" } else { "MISSING" }
        ));
    }
    lines.join("\n")
}

pub fn gifts_text(gifts: &[Outcome]) -> String {
    let mut lines = vec!["🎁 <b>Roulette Gifts</b>".to_string(), String::new()];
    for gift in gifts {
        lines.push(format!("• {}", esc(&gift.name)));
    }
    lines.join("\n")
}

const PRICE_TABLE: &str = "💰 <b>Prices</b>\n\
    • 3 Spins   = 3 USDT\n\
    • 7 Spins   = 7 USDT\n\
    • 20 Spins  = 15 USDT\n\
    • 100 Spins = 60 USDT";

pub fn buy_text(contact: &str) -> String {
    format!(
        "🛒 <b>Buy Spins</b>\n\n{}\n\n📩 Contact: <code>{}</code>\n\n\
         After payment, the owner/admin will add your spins.",
        PRICE_TABLE,
        esc(contact)
    )
}

pub fn contact_text(contact: &str) -> String {
    format!(
        "🛒 <b>Buy Spins</b>\n\n{}\n\n📩 Contact: <code>{}</code>",
        PRICE_TABLE,
        esc(contact)
    )
}

pub fn referral_text(bot_username: &str, user_id: i64, bonus: &str) -> String {
    format!(
        "🔗 <b>Your Referral Link</b>\n<code>https://t.me/{}?start={}</code>\n\n\
         Referrer bonus: <b>{}</b> free spin(s).",
        bot_username,
        user_id,
        esc(bonus)
    )
}

pub fn win_text(name: &str, spin_type: &str) -> String {
    format!(
        "🎉 <b>You won!</b>\nGift: <b>{}</b>\nSpin type: <code>{}</code>",
        esc(name),
        spin_type
    )
}

pub fn lose_text(name: &str, spin_type: &str) -> String {
    format!(
        "🍀 <b>Better luck next time!</b>\n{}\nSpin type: <code>{}</code>",
        esc(name),
        spin_type
    )
}

pub fn referral_notification(bonus: i64) -> String {
    format!("🎉 New referral! You received <b>{}</b> free spin(s).", bonus)
}

pub fn insufficient_text(free: i64, paid: i64) -> String {
    format!(
        "🚫 Not enough spins.\nFree spins: <b>{}</b>\nPaid balance: <b>{}</b>",
        free, paid
    )
}
