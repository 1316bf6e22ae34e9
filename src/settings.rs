//! Mutable runtime settings
//!
//! Settings live in the database so the operator can change them from the
//! bot without restarts. The watcher reads one immutable snapshot at the
//! start of each polling cycle; writes apply from the next cycle.

use crate::db::{self, DbPool};
use crate::error::AppResult;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use tracing::warn;

/// Settings key for the minimum qualifying amount (SOL)
pub const KEY_MIN_AMOUNT: &str = "min_amount";
/// Settings key for the maximum qualifying amount (SOL)
pub const KEY_MAX_AMOUNT: &str = "max_amount";
/// Settings key for the UTC offset used in alert timestamps
pub const KEY_TIMEZONE: &str = "timezone";
/// Settings key for the notify-all toggle
pub const KEY_NOTIFY_ALL: &str = "notify_all_transactions";

/// Snapshot of the tracker settings for one polling cycle
#[derive(Debug, Clone, PartialEq)]
pub struct TrackerSettings {
    /// Minimum transfer amount in SOL (inclusive)
    pub min_amount: Decimal,
    /// Maximum transfer amount in SOL (inclusive)
    pub max_amount: Decimal,
    /// UTC offset in hours for alert timestamps
    pub timezone_offset_hours: i32,
    /// Notify-all toggle; stored and surfaced in /settings but alerting
    /// is always first-seen-per-recipient
    pub notify_all: bool,
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self {
            min_amount: Decimal::new(1, 3),
            max_amount: Decimal::from(10),
            timezone_offset_hours: 5,
            notify_all: true,
        }
    }
}

impl TrackerSettings {
    /// Build a snapshot from raw settings rows
    ///
    /// Each malformed value falls back to its default; a broken row must
    /// never take the watcher down.
    pub fn from_rows(rows: &HashMap<String, String>) -> Self {
        let defaults = Self::default();

        let min_amount = parse_or(rows, KEY_MIN_AMOUNT, defaults.min_amount);
        let max_amount = parse_or(rows, KEY_MAX_AMOUNT, defaults.max_amount);
        let timezone_offset_hours =
            parse_or(rows, KEY_TIMEZONE, defaults.timezone_offset_hours);
        let notify_all = rows
            .get(KEY_NOTIFY_ALL)
            .map(|v| v.eq_ignore_ascii_case("true"))
            .unwrap_or(defaults.notify_all);

        Self {
            min_amount,
            max_amount,
            timezone_offset_hours,
            notify_all,
        }
    }

    /// Load a fresh snapshot from the database
    pub async fn load(pool: &DbPool) -> AppResult<Self> {
        let rows = db::get_settings(pool).await?;
        Ok(Self::from_rows(&rows))
    }
}

fn parse_or<T: FromStr>(rows: &HashMap<String, String>, key: &str, default: T) -> T {
    match rows.get(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Malformed setting value, using default");
            default
        }),
        None => default,
    }
}
