//! Transfer analysis
//!
//! Pure decision logic: given one transaction record and a watched source,
//! decide whether it contains a qualifying outgoing transfer and who
//! received it. No I/O and no writes; the polling task owns all side
//! effects, so analysis of the same record is always deterministic.

use crate::constants::{programs, LAMPORTS_PER_SOL, RECIPIENT_MATCH_TOLERANCE_LAMPORTS};
use crate::rpc::{InstructionRecord, TransactionRecord};
use crate::settings::TrackerSettings;
use rust_decimal::Decimal;
use std::collections::HashSet;

/// Outcome of analyzing one transaction for one watched source
#[derive(Debug, Clone, PartialEq)]
pub enum TransferOutcome {
    /// No qualifying outgoing transfer was found
    NoTransfer { reason: &'static str },
    /// An outgoing transfer exists but its amount is outside the window
    OutOfRange { amount: Decimal },
    /// The recipient has already received its one alert
    AlreadyNotified { recipient: String },
    /// First-seen recipient of an in-range outgoing transfer
    Qualifies { recipient: String, amount: Decimal },
}

/// Analyze one transaction record for an outgoing transfer from `source_address`
///
/// `notified` is the cycle-start snapshot of already-alerted recipients;
/// the caller keeps it current within a cycle.
pub fn analyze(
    record: &TransactionRecord,
    source_address: &str,
    settings: &TrackerSettings,
    notified: &HashSet<String>,
) -> TransferOutcome {
    let Some(meta) = record.meta.as_ref() else {
        return TransferOutcome::NoTransfer {
            reason: "missing transaction meta",
        };
    };

    let message = &record.transaction.message;
    let account_keys = &message.account_keys;
    if account_keys.is_empty() {
        return TransferOutcome::NoTransfer {
            reason: "missing account keys",
        };
    }

    let Some(source_index) = account_keys.iter().position(|k| k == source_address) else {
        return TransferOutcome::NoTransfer {
            reason: "source not in transaction",
        };
    };

    let (Some(&pre), Some(&post)) = (
        meta.pre_balances.get(source_index),
        meta.post_balances.get(source_index),
    ) else {
        return TransferOutcome::NoTransfer {
            reason: "missing balance data",
        };
    };

    // Outgoing amount net of the fee the source paid
    let delta = pre as i128 - post as i128 - meta.fee as i128;
    if delta <= 0 {
        return TransferOutcome::NoTransfer {
            reason: "source balance did not decrease",
        };
    }

    let amount = Decimal::from(delta as u64) / Decimal::from(LAMPORTS_PER_SOL);
    if amount < settings.min_amount || amount > settings.max_amount {
        return TransferOutcome::OutOfRange { amount };
    }

    let recipient = resolve_recipient(record, source_address, source_index, delta);
    let Some(recipient) = recipient else {
        return TransferOutcome::NoTransfer {
            reason: "recipient not resolved",
        };
    };

    if notified.contains(&recipient) {
        return TransferOutcome::AlreadyNotified { recipient };
    }

    TransferOutcome::Qualifies { recipient, amount }
}

/// Resolve the transfer recipient, preferring explicit instructions over
/// the balance-diff heuristic
///
/// The heuristic is best effort: when several accounts gain a similar
/// amount in one transaction the first match wins, which can misattribute.
fn resolve_recipient(
    record: &TransactionRecord,
    source_address: &str,
    source_index: usize,
    delta: i128,
) -> Option<String> {
    let message = &record.transaction.message;
    let account_keys = &message.account_keys;

    for instruction in &message.instructions {
        match instruction {
            InstructionRecord::Parsed(parsed) => {
                if parsed.parsed.kind == "transfer"
                    && parsed.parsed.info.source.as_deref() == Some(source_address)
                {
                    if let Some(destination) = &parsed.parsed.info.destination {
                        return Some(destination.clone());
                    }
                }
            }
            InstructionRecord::Raw(raw) => {
                let is_system_transfer = account_keys
                    .get(raw.program_id_index)
                    .is_some_and(|program| program == programs::SYSTEM);
                if !is_system_transfer || raw.accounts.len() < 3 {
                    continue;
                }

                // Sender first, recipient second by system program convention
                let from = raw.accounts.first().and_then(|&i| account_keys.get(i));
                let to = raw.accounts.get(1).and_then(|&i| account_keys.get(i));
                if let (Some(from), Some(to)) = (from, to) {
                    if from == source_address {
                        return Some(to.clone());
                    }
                }
            }
            InstructionRecord::Opaque(_) => {}
        }
    }

    // Fallback: the account whose balance grew by roughly the outgoing delta
    let meta = record.meta.as_ref()?;
    for (i, (&pre, &post)) in meta
        .pre_balances
        .iter()
        .zip(meta.post_balances.iter())
        .enumerate()
    {
        if i == source_index {
            continue;
        }

        let gain = post as i128 - pre as i128;
        if (gain - delta).unsigned_abs() < RECIPIENT_MATCH_TOLERANCE_LAMPORTS as u128 {
            if let Some(key) = account_keys.get(i) {
                return Some(key.clone());
            }
        }
    }

    None
}
