//! Tracker Settings Unit Tests
//!
//! Tests the settings snapshot parsing:
//! - Defaults mirror the seeded values
//! - Row parsing and per-key fallback on malformed values
//! - Notify-all flag semantics

use rust_decimal::Decimal;
use solwatch::settings::{
    TrackerSettings, KEY_MAX_AMOUNT, KEY_MIN_AMOUNT, KEY_NOTIFY_ALL, KEY_TIMEZONE,
};
use std::collections::HashMap;
use std::str::FromStr;

fn rows(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_defaults_match_seeded_values() {
    let settings = TrackerSettings::default();

    assert_eq!(settings.min_amount, Decimal::from_str("0.001").unwrap());
    assert_eq!(settings.max_amount, Decimal::from(10));
    assert_eq!(settings.timezone_offset_hours, 5);
    assert!(settings.notify_all);
}

#[test]
fn test_from_rows_parses_stored_values() {
    let settings = TrackerSettings::from_rows(&rows(&[
        (KEY_MIN_AMOUNT, "0.05"),
        (KEY_MAX_AMOUNT, "250"),
        (KEY_TIMEZONE, "-11"),
        (KEY_NOTIFY_ALL, "false"),
    ]));

    assert_eq!(settings.min_amount, Decimal::from_str("0.05").unwrap());
    assert_eq!(settings.max_amount, Decimal::from(250));
    assert_eq!(settings.timezone_offset_hours, -11);
    assert!(!settings.notify_all);
}

#[test]
fn test_empty_rows_fall_back_to_defaults() {
    assert_eq!(
        TrackerSettings::from_rows(&HashMap::new()),
        TrackerSettings::default()
    );
}

#[test]
fn test_malformed_values_fall_back_per_key() {
    // One broken key must not poison the others
    let settings = TrackerSettings::from_rows(&rows(&[
        (KEY_MIN_AMOUNT, "not-a-number"),
        (KEY_MAX_AMOUNT, "42"),
        (KEY_TIMEZONE, "tomorrow"),
    ]));

    assert_eq!(
        settings.min_amount,
        TrackerSettings::default().min_amount,
        "malformed min_amount should fall back to its default"
    );
    assert_eq!(settings.max_amount, Decimal::from(42));
    assert_eq!(
        settings.timezone_offset_hours,
        TrackerSettings::default().timezone_offset_hours
    );
}

#[test]
fn test_notify_flag_is_case_insensitive() {
    for value in ["true", "True", "TRUE"] {
        let settings = TrackerSettings::from_rows(&rows(&[(KEY_NOTIFY_ALL, value)]));
        assert!(settings.notify_all, "{:?} should parse as enabled", value);
    }

    for value in ["false", "False", "0", "yes", "garbage"] {
        let settings = TrackerSettings::from_rows(&rows(&[(KEY_NOTIFY_ALL, value)]));
        assert!(!settings.notify_all, "{:?} should parse as disabled", value);
    }
}

#[test]
fn test_lamport_scale_amounts_keep_precision() {
    // One lamport expressed in SOL survives the round trip exactly
    let settings = TrackerSettings::from_rows(&rows(&[(KEY_MIN_AMOUNT, "0.000000001")]));

    assert_eq!(
        settings.min_amount,
        Decimal::from_str("0.000000001").unwrap()
    );
}

#[test]
fn test_inverted_range_is_stored_as_is() {
    // Settings are last-writer-wins scalars; an inverted window is kept
    // verbatim and simply matches nothing during analysis
    let settings = TrackerSettings::from_rows(&rows(&[
        (KEY_MIN_AMOUNT, "5"),
        (KEY_MAX_AMOUNT, "1"),
    ]));

    assert_eq!(settings.min_amount, Decimal::from(5));
    assert_eq!(settings.max_amount, Decimal::from(1));
}
