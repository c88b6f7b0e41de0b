//! Helper functions and utilities
//!
//! This module contains input validation and formatting helpers used by the
//! registration and task handlers.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use regex::Regex;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::sync::OnceLock;

fn name_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[\p{Alphabetic}\-]{2,50}$").expect("valid regex"))
}

/// Validate a registration name: letters only, 2-50 characters
pub fn validate_name(name: &str) -> bool {
    name_regex().is_match(name.trim())
}

/// Validate a birthdate in DD.MM.YYYY format
pub fn validate_birthdate(input: &str) -> bool {
    NaiveDate::parse_from_str(input.trim(), "%d.%m.%Y").is_ok()
}

/// Validate a free-form location: non-empty after trimming
pub fn validate_location(input: &str) -> bool {
    !input.trim().is_empty()
}

/// Parse a donation amount; accepts both comma and dot decimal separators.
/// Returns None for amounts below the 1.00 minimum.
pub fn parse_amount(input: &str) -> Option<Decimal> {
    let normalized = input.trim().replace(',', ".");
    let amount = Decimal::from_str(&normalized).ok()?;
    if amount < Decimal::ONE {
        return None;
    }
    Some(amount)
}

/// Parse the referrer id from a /start deep-link payload ("ref123456")
pub fn parse_referral_payload(payload: &str) -> Option<i64> {
    payload.strip_prefix("ref")?.parse::<i64>().ok()
}

/// Format a remaining duration as "Nh MMmin"
pub fn format_remaining(remaining: Duration) -> String {
    let hours = remaining.num_hours();
    let minutes = remaining.num_minutes() % 60;
    format!("{}h {:02}min", hours, minutes)
}

/// Format a deadline timestamp for user display
pub fn format_deadline(deadline: DateTime<Utc>) -> String {
    deadline.format("%d.%m.%Y %H:%M").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Anna"));
        assert!(validate_name("Мария"));
        assert!(validate_name("Jean-Pierre"));
        assert!(!validate_name(""));
        assert!(!validate_name("A"));
        assert!(!validate_name("Anna123"));
        assert!(!validate_name("two words"));
    }

    #[test]
    fn test_validate_birthdate() {
        assert!(validate_birthdate("01.12.1990"));
        assert!(validate_birthdate(" 29.02.2024 "));
        assert!(!validate_birthdate("1990-12-01"));
        assert!(!validate_birthdate("32.01.1990"));
        assert!(!validate_birthdate("29.02.2023"));
        assert!(!validate_birthdate("yesterday"));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("100"), Some(Decimal::from(100)));
        assert_eq!(parse_amount("99,50"), Decimal::from_str("99.50").ok());
        assert_eq!(parse_amount("1.00"), Some(Decimal::ONE));
        assert_eq!(parse_amount("0.99"), None);
        assert_eq!(parse_amount("-5"), None);
        assert_eq!(parse_amount("abc"), None);
    }

    #[test]
    fn test_parse_referral_payload() {
        assert_eq!(parse_referral_payload("ref123456"), Some(123456));
        assert_eq!(parse_referral_payload("ref"), None);
        assert_eq!(parse_referral_payload("refabc"), None);
        assert_eq!(parse_referral_payload("123456"), None);
    }

    #[test]
    fn test_format_remaining() {
        assert_eq!(format_remaining(Duration::minutes(150)), "2h 30min");
        assert_eq!(format_remaining(Duration::minutes(5)), "0h 05min");
    }
}
