//! Ready-made [`ValidationRule`] factories.
//!
//! Every factory carries a default message; use
//! [`ValidationRule::with_message`] to override it. Apart from [`required`]
//! the rules accept empty input, so an optional field can be guarded by e.g.
//! `[email()]` alone while a mandatory one uses `[required(), email()]`.

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

use super::ValidationRule;

static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

// Saudi mobile numbers: optional +966/966/0 prefix, then 9 digits starting 5-9.
static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\+966|966|0)?[5-9][0-9]{8}$").expect("valid phone regex"));

static TIME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-1]?[0-9]|2[0-3]):[0-5][0-9]$").expect("valid time regex"));

/// Date format accepted by [`date_not_past`].
pub const DATE_FORMAT: &str = "%Y-%m-%d";

pub fn required() -> ValidationRule {
    ValidationRule::new("This field is required", |value| !value.trim().is_empty())
}

pub fn numeric() -> ValidationRule {
    ValidationRule::new("Please enter a valid number", |value| {
        let value = value.trim();
        value.is_empty() || Decimal::from_str(value).is_ok()
    })
}

pub fn email() -> ValidationRule {
    ValidationRule::new("Please enter a valid email address", |value| {
        value.is_empty() || EMAIL_RE.is_match(value)
    })
}

/// Saudi mobile number. Whitespace inside the number is ignored.
pub fn phone() -> ValidationRule {
    ValidationRule::new("Please enter a valid phone number", |value| {
        let compact: String = value.chars().filter(|c| !c.is_whitespace()).collect();
        compact.is_empty() || PHONE_RE.is_match(&compact)
    })
}

/// At least `min` characters.
pub fn min_length(min: usize) -> ValidationRule {
    ValidationRule::new(format!("Must be at least {min} characters"), move |value| {
        value.is_empty() || value.chars().count() >= min
    })
}

/// At most `max` characters.
pub fn max_length(max: usize) -> ValidationRule {
    ValidationRule::new(format!("Must be at most {max} characters"), move |value| {
        value.chars().count() <= max
    })
}

/// `H:MM` or `HH:MM` on a 24 hour clock.
pub fn time_format() -> ValidationRule {
    ValidationRule::new("Please enter a valid time", |value| {
        value.is_empty() || TIME_RE.is_match(value)
    })
}

/// A `YYYY-MM-DD` date that is `today` or later. Unparseable dates fail.
pub fn date_not_past(today: NaiveDate) -> ValidationRule {
    ValidationRule::new("Date cannot be in the past", move |value| {
        let value = value.trim();
        if value.is_empty() {
            return true;
        }
        NaiveDate::parse_from_str(value, DATE_FORMAT).is_ok_and(|date| date >= today)
    })
}

/// One of the offered time slots.
pub fn time_slot_available<I, S>(slots: I) -> ValidationRule
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let slots: Vec<String> = slots.into_iter().map(Into::into).collect();
    ValidationRule::new("This time slot is not available", move |value| {
        value.is_empty() || slots.iter().any(|slot| slot == value)
    })
}

/// A number strictly greater than zero.
pub fn positive_price() -> ValidationRule {
    ValidationRule::new("Price must be greater than zero", |value| {
        let value = value.trim();
        value.is_empty() || Decimal::from_str(value).is_ok_and(|price| price > Decimal::ZERO)
    })
}
