//! Transaction monitoring for Solwatch
//!
//! Periodic polling of watched sources, outgoing-transfer analysis, and
//! alert dispatch for first-seen recipient wallets.

pub mod analyzer;
pub mod polling_task;

pub use analyzer::{analyze, TransferOutcome};
pub use polling_task::{run_cycle, start_polling_task, CycleStats, PollingConfig};
