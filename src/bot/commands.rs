//! Command handling and dialogue state
//!
//! Each admin message maps to (next dialogue state, optional reply).
//! Multi-step commands park the dialogue in an Await state; any known
//! command interrupts a pending dialogue and starts over.

use crate::db::{self, DbPool};
use crate::error::AppResult;
use crate::settings::{
    TrackerSettings, KEY_MAX_AMOUNT, KEY_MIN_AMOUNT, KEY_NOTIFY_ALL, KEY_TIMEZONE,
};
use crate::validation::validate_solana_address;
use rust_decimal::Decimal;

/// Dialogue state for the admin chat
#[derive(Debug, Clone, PartialEq)]
pub enum Dialogue {
    /// No multi-step command in progress
    Idle,
    /// Waiting for an address to add
    AwaitAddSource,
    /// Waiting for an address (or list number) to delete
    AwaitDeleteSource,
    /// Waiting for the minimum amount
    AwaitRangeMin,
    /// Waiting for the maximum amount
    AwaitRangeMax { min: Decimal },
    /// Waiting for a timezone offset
    AwaitTimezone,
}

/// Handle one admin message and produce the next state plus a reply
pub async fn handle_message(
    db: &DbPool,
    state: Dialogue,
    text: &str,
) -> AppResult<(Dialogue, Option<String>)> {
    let text = text.trim();

    if let Some(rest) = text.strip_prefix('/') {
        let command = rest.split(['@', ' ']).next().unwrap_or(rest);
        handle_command(db, state, command).await
    } else {
        handle_reply(db, state, text).await
    }
}

async fn handle_command(
    db: &DbPool,
    state: Dialogue,
    command: &str,
) -> AppResult<(Dialogue, Option<String>)> {
    match command {
        "start" => Ok((Dialogue::Idle, Some(help_text()))),
        "addsource" => Ok((
            Dialogue::AwaitAddSource,
            Some("Enter the Solana address to add as a source:".to_string()),
        )),
        "deletesource" => {
            let sources = db::list_sources(db).await?;
            if sources.is_empty() {
                return Ok((Dialogue::Idle, Some("📭 Source list is empty".to_string())));
            }

            let reply = format!(
                "Choose the address to delete:\n\n{}\nEnter the address number or the address itself:",
                numbered_list(&sources)
            );
            Ok((Dialogue::AwaitDeleteSource, Some(reply)))
        }
        "listsources" => {
            let sources = db::list_sources(db).await?;
            if sources.is_empty() {
                return Ok((Dialogue::Idle, Some("📭 Source list is empty".to_string())));
            }

            let reply = format!("📋 Watched source addresses:\n\n{}", numbered_list(&sources));
            Ok((Dialogue::Idle, Some(reply)))
        }
        "setrange" => Ok((
            Dialogue::AwaitRangeMin,
            Some("Enter the minimum amount in SOL (e.g. 0.001):".to_string()),
        )),
        "settimezone" => Ok((
            Dialogue::AwaitTimezone,
            Some("Enter the timezone offset from UTC (e.g. 5 for UTC+5):".to_string()),
        )),
        "setnotifications" => {
            let settings = TrackerSettings::load(db).await?;
            let new_mode = !settings.notify_all;
            db::update_setting(db, KEY_NOTIFY_ALL, if new_mode { "true" } else { "false" })
                .await?;

            let mode_text = if new_mode {
                "all transactions"
            } else {
                "only first transactions"
            };
            Ok((
                Dialogue::Idle,
                Some(format!(
                    "✅ Notification mode changed:\nNow tracking {}",
                    mode_text
                )),
            ))
        }
        "clearcache" => {
            let (signatures, wallets) = db::clear_tracking_data(db).await?;
            Ok((
                Dialogue::Idle,
                Some(format!(
                    "✅ Cache cleared: {} processed transactions, {} notified wallets",
                    signatures, wallets
                )),
            ))
        }
        "settings" => {
            let reply = settings_summary(db).await?;
            Ok((Dialogue::Idle, Some(reply)))
        }
        "cancel" => Ok((Dialogue::Idle, Some("❌ Operation cancelled".to_string()))),
        // Unknown commands leave the dialogue untouched
        _ => Ok((state, None)),
    }
}

async fn handle_reply(
    db: &DbPool,
    state: Dialogue,
    text: &str,
) -> AppResult<(Dialogue, Option<String>)> {
    match state {
        Dialogue::Idle => Ok((Dialogue::Idle, None)),

        Dialogue::AwaitAddSource => {
            if validate_solana_address(text).is_err() {
                return Ok((
                    Dialogue::AwaitAddSource,
                    Some("❌ Invalid Solana address format. Try again:".to_string()),
                ));
            }

            let reply = if db::add_source(db, text).await? {
                format!("✅ Address added:\n`{}`", text)
            } else {
                "❌ Could not add the address. It may already exist.".to_string()
            };
            Ok((Dialogue::Idle, Some(reply)))
        }

        Dialogue::AwaitDeleteSource => {
            let sources = db::list_sources(db).await?;

            let address = if !text.is_empty() && text.chars().all(|c| c.is_ascii_digit()) {
                let index: usize = text.parse().unwrap_or(0);
                match index.checked_sub(1).and_then(|i| sources.get(i)) {
                    Some(address) => address.clone(),
                    None => {
                        return Ok((
                            Dialogue::AwaitDeleteSource,
                            Some("❌ Invalid number. Try again:".to_string()),
                        ));
                    }
                }
            } else {
                if validate_solana_address(text).is_err() {
                    return Ok((
                        Dialogue::AwaitDeleteSource,
                        Some("❌ Invalid address format. Try again:".to_string()),
                    ));
                }
                text.to_string()
            };

            let reply = if db::remove_source(db, &address).await? {
                format!("✅ Address removed:\n`{}`", address)
            } else {
                "❌ Address not found in the source list.".to_string()
            };
            Ok((Dialogue::Idle, Some(reply)))
        }

        Dialogue::AwaitRangeMin => match text.parse::<Decimal>() {
            Ok(min) if min >= Decimal::ZERO => Ok((
                Dialogue::AwaitRangeMax { min },
                Some("Enter the maximum amount in SOL (e.g. 10):".to_string()),
            )),
            _ => Ok((
                Dialogue::AwaitRangeMin,
                Some("❌ Invalid value. Enter a non-negative number:".to_string()),
            )),
        },

        Dialogue::AwaitRangeMax { min } => match text.parse::<Decimal>() {
            Ok(max) if max >= min => {
                db::update_setting(db, KEY_MIN_AMOUNT, &min.to_string()).await?;
                db::update_setting(db, KEY_MAX_AMOUNT, &max.to_string()).await?;

                Ok((
                    Dialogue::Idle,
                    Some(format!(
                        "✅ Range set:\nMinimum: {} SOL\nMaximum: {} SOL",
                        min, max
                    )),
                ))
            }
            Ok(_) => Ok((
                Dialogue::AwaitRangeMax { min },
                Some(format!(
                    "❌ Maximum must be at least the minimum ({}). Try again:",
                    min
                )),
            )),
            Err(_) => Ok((
                Dialogue::AwaitRangeMax { min },
                Some("❌ Invalid value. Enter a non-negative number:".to_string()),
            )),
        },

        Dialogue::AwaitTimezone => match text.parse::<i32>() {
            Ok(offset) if (-12..=14).contains(&offset) => {
                db::update_setting(db, KEY_TIMEZONE, &offset.to_string()).await?;
                Ok((
                    Dialogue::Idle,
                    Some(format!("✅ Timezone set: UTC{:+}", offset)),
                ))
            }
            _ => Ok((
                Dialogue::AwaitTimezone,
                Some("❌ Invalid value. Enter an integer between -12 and 14:".to_string()),
            )),
        },
    }
}

fn help_text() -> String {
    "👋 Welcome to Solana Wallet Tracker!\n\n\
     Available commands:\n\
     /addsource - Add a source address\n\
     /deletesource - Remove a source address\n\
     /listsources - Show watched addresses\n\
     /setrange - Set the amount range (SOL)\n\
     /settimezone - Set the timezone (UTC+offset)\n\
     /setnotifications - Toggle notification mode\n\
     /clearcache - Clear processed transaction cache\n\
     /settings - Show current settings"
        .to_string()
}

fn numbered_list(sources: &[String]) -> String {
    sources
        .iter()
        .enumerate()
        .map(|(i, addr)| format!("{}. `{}`\n", i + 1, addr))
        .collect()
}

async fn settings_summary(db: &DbPool) -> AppResult<String> {
    let settings = TrackerSettings::load(db).await?;
    let sources = db::list_sources(db).await?;

    let notify_mode = if settings.notify_all {
        "All transactions"
    } else {
        "First transactions only"
    };

    let mut message = format!(
        "⚙️ Current settings:\n\n\
         🕒 Timezone: UTC{:+}\n\
         💰 Amount range: {:.6} - {:.4} SOL\n\
         🔔 Notification mode: {}\n\
         📦 Watched sources: {}",
        settings.timezone_offset_hours,
        settings.min_amount,
        settings.max_amount,
        notify_mode,
        sources.len()
    );

    if !sources.is_empty() {
        message.push_str("\n\n📋 Source list:\n");
        message.push_str(&numbered_list(&sources));
    }

    Ok(message)
}
