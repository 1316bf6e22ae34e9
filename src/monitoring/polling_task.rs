//! Background polling task for watched sources
//!
//! Drives the whole pipeline on a fixed timer: list recent signatures per
//! source, analyze unseen ones, alert on first-seen recipients, and commit
//! dedup marks. One cycle is in flight at a time; a slow cycle makes the
//! timer skip ticks instead of stacking cycles.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::db::{self, DbPool};
use crate::error::AppResult;
use crate::monitoring::analyzer::{analyze, TransferOutcome};
use crate::notifications::{Notifier, TransferAlert};
use crate::rpc::{LedgerQuery, SignatureInfo};
use crate::settings::TrackerSettings;

/// Configuration for the polling task
#[derive(Debug, Clone)]
pub struct PollingConfig {
    /// Interval between polling cycles (seconds)
    pub interval_secs: u64,
    /// Delay before the first cycle after startup (seconds)
    pub startup_delay_secs: u64,
}

/// Counters for one completed polling cycle
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CycleStats {
    /// Watched sources visited
    pub sources: usize,
    /// Signatures returned by the ledger across all sources
    pub references_seen: usize,
    /// Signatures analyzed for the first time this cycle
    pub new_references: usize,
    /// Alerts delivered
    pub alerts_sent: usize,
}

/// Start the background polling task
///
/// Runs until the token is cancelled. All dedup state lives in the
/// database, so the task holds nothing across cycles and a restart resumes
/// exactly where the marks left off.
pub async fn start_polling_task(
    db: DbPool,
    ledger: Arc<dyn LedgerQuery>,
    notifier: Arc<dyn Notifier>,
    config: PollingConfig,
    cancel_token: CancellationToken,
) {
    tracing::info!(
        interval_secs = config.interval_secs,
        startup_delay_secs = config.startup_delay_secs,
        "Starting polling task"
    );

    // Let startup settle before the first cycle
    tokio::select! {
        _ = cancel_token.cancelled() => return,
        _ = tokio::time::sleep(Duration::from_secs(config.startup_delay_secs)) => {}
    }

    let mut interval = tokio::time::interval(Duration::from_secs(config.interval_secs));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut cycle_count = 0u64;

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => {
                tracing::info!("Polling task shutting down");
                break;
            }
            _ = interval.tick() => {
                cycle_count += 1;

                match run_cycle(&db, ledger.as_ref(), notifier.as_ref()).await {
                    Ok(stats) if stats.sources == 0 => {
                        if cycle_count % 10 == 0 { // Log every 10 cycles to avoid spam
                            tracing::debug!("No watched sources configured");
                        }
                    }
                    Ok(stats) => {
                        tracing::info!(
                            sources = stats.sources,
                            references_seen = stats.references_seen,
                            new_references = stats.new_references,
                            alerts_sent = stats.alerts_sent,
                            cycle = cycle_count,
                            "Polling cycle complete"
                        );
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Polling cycle failed, retrying next tick");
                    }
                }
            }
        }
    }
}

/// Run a single polling cycle
///
/// Settings and the notified-wallet set are snapshotted once; operator
/// edits apply from the next cycle. Ledger and delivery failures are
/// isolated per source and per signature, so one bad reference never
/// aborts the rest of the cycle.
pub async fn run_cycle(
    db: &DbPool,
    ledger: &dyn LedgerQuery,
    notifier: &dyn Notifier,
) -> AppResult<CycleStats> {
    let mut stats = CycleStats::default();

    let sources = db::list_sources(db).await?;
    if sources.is_empty() {
        return Ok(stats);
    }
    stats.sources = sources.len();

    let settings = TrackerSettings::load(db).await?;
    let mut notified = db::load_notified_wallets(db).await?;

    for source in &sources {
        let signatures = match ledger.recent_signatures(source).await {
            Ok(s) => s,
            Err(e) => {
                // Nothing marked; the same signatures come back next cycle
                tracing::warn!(
                    source = %source,
                    error = %e,
                    "Failed to list signatures, skipping source"
                );
                continue;
            }
        };

        if signatures.is_empty() {
            continue;
        }
        stats.references_seen += signatures.len();

        for sig in &signatures {
            match db::is_signature_processed(db, &sig.signature).await {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(
                        signature = %sig.signature,
                        error = %e,
                        "Dedup lookup failed, skipping signature"
                    );
                    continue;
                }
            }

            stats.new_references += 1;

            match process_reference(db, ledger, notifier, source, sig, &settings, &mut notified)
                .await
            {
                Ok(true) => stats.alerts_sent += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(
                        signature = %sig.signature,
                        error = %e,
                        "Failed to process signature"
                    );
                }
            }
        }
    }

    Ok(stats)
}

/// Analyze one signature and commit its dedup marks
///
/// Returns true when an alert was delivered. The signature is marked
/// processed unconditionally after one attempt: unfetchable records are
/// skipped permanently and a failed delivery is not retried for the same
/// signature. This bounds re-poll cost; a transient outage at the wrong
/// moment can cost an alert.
async fn process_reference(
    db: &DbPool,
    ledger: &dyn LedgerQuery,
    notifier: &dyn Notifier,
    source: &str,
    sig: &SignatureInfo,
    settings: &TrackerSettings,
    notified: &mut HashSet<String>,
) -> AppResult<bool> {
    let timestamp = sig.block_time.unwrap_or_else(|| Utc::now().timestamp());

    let record = match ledger.transaction_details(&sig.signature).await {
        Ok(Some(record)) => record,
        Ok(None) => {
            tracing::warn!(
                signature = %sig.signature,
                "Transaction not found, skipping permanently"
            );
            db::mark_signature_processed(db, &sig.signature, timestamp).await?;
            return Ok(false);
        }
        Err(e) => {
            tracing::warn!(
                signature = %sig.signature,
                error = %e,
                "Failed to fetch details, skipping permanently"
            );
            db::mark_signature_processed(db, &sig.signature, timestamp).await?;
            return Ok(false);
        }
    };

    let mut alerted = false;

    match analyze(&record, source, settings, notified) {
        TransferOutcome::Qualifies { recipient, amount } => {
            let alert = TransferAlert {
                recipient: recipient.clone(),
                amount_sol: amount,
                source: source.to_string(),
                timestamp,
                utc_offset_hours: settings.timezone_offset_hours,
            };

            match notifier.send_alert(&alert).await {
                Ok(()) => {
                    db::mark_wallet_notified(db, &recipient).await?;
                    notified.insert(recipient);
                    alerted = true;
                }
                Err(e) => {
                    // Not marked notified; the recipient stays eligible
                    tracing::error!(
                        recipient = %recipient,
                        error = %e,
                        "Alert delivery failed"
                    );
                }
            }
        }
        TransferOutcome::OutOfRange { amount } => {
            tracing::debug!(
                signature = %sig.signature,
                amount = %amount,
                "Transfer outside amount window"
            );
        }
        TransferOutcome::AlreadyNotified { recipient } => {
            tracing::debug!(recipient = %recipient, "Recipient already alerted");
        }
        TransferOutcome::NoTransfer { reason } => {
            tracing::debug!(signature = %sig.signature, reason, "No qualifying transfer");
        }
    }

    db::mark_signature_processed(db, &sig.signature, timestamp).await?;
    Ok(alerted)
}
