use regex::Regex;
use validator::ValidationError;

use crate::constants::{MAX_LOSE_WEIGHT, MAX_SPIN_SETTING, MIN_PAID_COST};

fn invalid(code: &'static str, message: &str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.to_string().into());
    err
}

/// Human-readable reason for a rejected admin input.
pub fn reason(err: &ValidationError) -> String {
    err.message
        .as_ref()
        .map(|m| m.to_string())
        .unwrap_or_else(|| err.code.to_string())
}

pub fn validate_channel(input: &str) -> Result<(), ValidationError> {
    let input = input.trim();
    if input.starts_with('@') && input.len() > 1 {
        return Ok(());
    }
    let url = Regex::new(r"^https://t\.me/[A-Za-z0-9_]+$").unwrap();
    if url.is_match(input) {
        return Ok(());
    }
    Err(invalid("invalid_channel", "Channel must start with @ or be a https://t.me/ link"))
}

pub fn validate_contact(input: &str) -> Result<(), ValidationError> {
    let input = input.trim();
    if (input.starts_with('@') && input.len() > 1) || input.starts_with("https://t.me/") {
        return Ok(());
    }
    Err(invalid("invalid_contact", "Send @Username or https://t.me/Username"))
}

fn parse_number(input: &str) -> Result<i64, ValidationError> {
    input
        .trim()
        .parse::<i64>()
        .map_err(|_| invalid("not_a_number", "Send a whole number"))
}

/// Daily free spins and referral bonus share the same 0..=1_000_000 range.
pub fn validate_spin_setting(input: &str) -> Result<i64, ValidationError> {
    let n = parse_number(input)?;
    if !(0..=MAX_SPIN_SETTING).contains(&n) {
        return Err(invalid("out_of_range", "Number must be between 0 and 1000000"));
    }
    Ok(n)
}

pub fn validate_paid_cost(input: &str) -> Result<i64, ValidationError> {
    let n = parse_number(input)?;
    if !(MIN_PAID_COST..=MAX_SPIN_SETTING).contains(&n) {
        return Err(invalid("out_of_range", "Cost must be between 1 and 1000000"));
    }
    Ok(n)
}

pub fn validate_lose_weight(input: &str) -> Result<i64, ValidationError> {
    let n = parse_number(input)?;
    if !(0..=MAX_LOSE_WEIGHT).contains(&n) {
        return Err(invalid("out_of_range", "Weight must be between 0 and 10^12"));
    }
    Ok(n)
}

/// Parsed gift edit: name, weight and sticker reference, written to the
/// config store as one unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GiftEdit {
    pub name: String,
    pub weight: i64,
    pub sticker: String,
}

/// Accepts either three lines or a single `Name | Weight | sticker` line.
pub fn parse_gift_edit(input: &str) -> Result<GiftEdit, ValidationError> {
    let mut parts: Vec<String> = input
        .lines()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect();
    if parts.len() == 1 && parts[0].contains('|') {
        parts = parts[0].split('|').map(|p| p.trim().to_string()).collect();
    }
    if parts.len() != 3 {
        return Err(invalid("bad_gift_format", "Send: Name / Weight / sticker_file_id"));
    }
    let weight = parse_number(&parts[1])?;
    if !(0..=MAX_LOSE_WEIGHT).contains(&weight) {
        return Err(invalid("out_of_range", "Weight must be between 0 and 10^12"));
    }
    Ok(GiftEdit {
        name: parts[0].clone(),
        weight,
        sticker: parts[2].clone(),
    })
}

/// Parses an admin credit command of the form `user_id amount`, amount > 0.
pub fn parse_credit(input: &str) -> Result<(i64, i64), ValidationError> {
    let parts: Vec<&str> = input.split_whitespace().collect();
    if parts.len() != 2 {
        return Err(invalid("bad_credit_format", "Format: user_id amount"));
    }
    let user_id = parse_number(parts[0])?;
    let amount = parse_number(parts[1])?;
    if amount <= 0 {
        return Err(invalid("out_of_range", "Amount must be > 0"));
    }
    Ok((user_id, amount))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_accepts_handle_and_link() {
        assert!(validate_channel("@MyChannel").is_ok());
        assert!(validate_channel("https://t.me/MyChannel").is_ok());
        assert!(validate_channel("MyChannel").is_err());
        assert!(validate_channel("@").is_err());
    }

    #[test]
    fn contact_requires_handle_or_link() {
        assert!(validate_contact("@Support").is_ok());
        assert!(validate_contact("https://t.me/Support").is_ok());
        assert!(validate_contact("Support").is_err());
    }

    #[test]
    fn spin_setting_bounds() {
        assert_eq!(validate_spin_setting("0").unwrap(), 0);
        assert_eq!(validate_spin_setting(" 3 ").unwrap(), 3);
        assert!(validate_spin_setting("-1").is_err());
        assert!(validate_spin_setting("1000001").is_err());
        assert!(validate_spin_setting("three").is_err());
    }

    #[test]
    fn paid_cost_rejects_zero() {
        assert!(validate_paid_cost("0").is_err());
        assert_eq!(validate_paid_cost("1").unwrap(), 1);
    }

    #[test]
    fn lose_weight_upper_bound() {
        assert_eq!(validate_lose_weight("999996").unwrap(), 999_996);
        assert!(validate_lose_weight("1000000000001").is_err());
    }

    #[test]
    fn gift_edit_three_lines() {
        let edit = parse_gift_edit("🐸 Frog\n5\nSTICKER123").unwrap();
        assert_eq!(edit.name, "🐸 Frog");
        assert_eq!(edit.weight, 5);
        assert_eq!(edit.sticker, "STICKER123");
    }

    #[test]
    fn gift_edit_pipe_form() {
        let edit = parse_gift_edit("Hat | 2 | ABC").unwrap();
        assert_eq!(edit.name, "Hat");
        assert_eq!(edit.weight, 2);
        assert_eq!(edit.sticker, "ABC");
    }

    #[test]
    fn gift_edit_rejects_bad_shapes() {
        assert!(parse_gift_edit("just a name").is_err());
        assert!(parse_gift_edit("Name\n-1\nSTICKER").is_err());
        assert!(parse_gift_edit("Name\nheavy\nSTICKER").is_err());
    }

    #[test]
    fn gift_edit_caps_the_weight() {
        assert_eq!(parse_gift_edit("Name\n1000000000000\nSTICKER").unwrap().weight, MAX_LOSE_WEIGHT);
        assert!(parse_gift_edit("Name\n1000000000001\nSTICKER").is_err());
        assert!(parse_gift_edit("Name\n9223372036854775807\nSTICKER").is_err());
    }

    #[test]
    fn credit_parse() {
        assert_eq!(parse_credit("123456 5").unwrap(), (123_456, 5));
        assert!(parse_credit("123456").is_err());
        assert!(parse_credit("123456 0").is_err());
        assert!(parse_credit("123456 -2").is_err());
    }

    #[test]
    fn reason_prefers_message() {
        let err = validate_paid_cost("0").unwrap_err();
        assert_eq!(reason(&err), "Cost must be between 1 and 1000000");
    }
}
