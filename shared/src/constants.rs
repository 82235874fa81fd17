// Well-known configuration keys. Every key has a compiled-in default so a
// lookup never fails even on a freshly created database.

pub const KEY_REQUIRED_CHANNEL: &str = "required_channel";
pub const KEY_DAILY_FREE_SPINS: &str = "daily_free_spins";
pub const KEY_REF_BONUS_SPINS: &str = "ref_bonus_spins";
pub const KEY_SPIN_COST_PAID: &str = "spin_cost_paid";
pub const KEY_CONTACT_USERNAME: &str = "contact_username";
pub const KEY_LOSE_NAME: &str = "lose_name";
pub const KEY_LOSE_WEIGHT: &str = "lose_weight";

/// Sentinel value for `required_channel` meaning "no channel configured".
/// The subscription gate stays open while this is set.
pub const CHANNEL_SENTINEL: &str = "@YOUR_CHANNEL";

pub const GIFT_SLOTS: u8 = 4;

pub fn gift_name_key(idx: u8) -> String {
    format!("gift{}_name", idx)
}

pub fn gift_weight_key(idx: u8) -> String {
    format!("gift{}_weight", idx)
}

pub fn gift_sticker_key(idx: u8) -> String {
    format!("gift{}_sticker", idx)
}

/// Seeded into the config table at startup with `INSERT OR IGNORE`, and used
/// as the fallback when a key is absent at read time.
pub const CONFIG_DEFAULTS: &[(&str, &str)] = &[
    (KEY_REQUIRED_CHANNEL, CHANNEL_SENTINEL),
    (KEY_DAILY_FREE_SPINS, "1"),
    (KEY_REF_BONUS_SPINS, "1"),
    (KEY_SPIN_COST_PAID, "1"),
    (KEY_CONTACT_USERNAME, "@YourUsername"),
    (KEY_LOSE_NAME, "❌ Better luck next time 🍀"),
    (KEY_LOSE_WEIGHT, "999996"),
    ("gift1_name", "🐸 Frog"),
    ("gift1_weight", "1"),
    ("gift1_sticker", "CAACAgQAAxkBAANDaVwubFAKAbQ0B995A7Z_uVQwRkQAAlEVAAKRsGhSdWvnThzmAT44BA"),
    ("gift2_name", "🎩 Hat"),
    ("gift2_weight", "1"),
    ("gift2_sticker", "CAACAgQAAxkBAAMwaVu0TKSGzZ1Toee912YYD09c8ZUAAsEXAAJJOhhS-kc7biMyTbM4BA"),
    ("gift3_name", "🧸 Bear"),
    ("gift3_weight", "1"),
    ("gift3_sticker", "CAACAgQAAxkBAANHaVwuc5sIOGwIJ5WCvTBvbs6THcgAAr8VAALCaChRf_q3xzMsSfY4BA"),
    ("gift4_name", "🚀 Rocket"),
    ("gift4_weight", "1"),
    ("gift4_sticker", "CAACAgQAAxkBAANJaVwuhGDyQolwEtGYj7lUJmFNzAwAAvUhAAKSvChRB_8-1v1glj84BA"),
];

pub fn default_for(key: &str) -> &'static str {
    CONFIG_DEFAULTS
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| *v)
        .unwrap_or("")
}

// Bounds enforced on admin input before any write.
pub const MAX_SPIN_SETTING: i64 = 1_000_000;
pub const MIN_PAID_COST: i64 = 1;
pub const MAX_LOSE_WEIGHT: i64 = 1_000_000_000_000;

/// Duration of the cosmetic slot-machine animation before the result lands.
pub const SPIN_ANIMATION_MS: u64 = 2800;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_gift_slot_has_seeded_defaults() {
        for idx in 1..=GIFT_SLOTS {
            assert!(!default_for(&gift_name_key(idx)).is_empty());
            assert!(!default_for(&gift_weight_key(idx)).is_empty());
        }
    }

    #[test]
    fn unknown_key_defaults_to_empty() {
        assert_eq!(default_for("no_such_key"), "");
    }
}
