//! Solwatch Library
//!
//! Watches a set of Solana source wallets and alerts the operator once per
//! newly discovered recipient of a qualifying outgoing transfer.
//! This library exposes core modules for testing.

pub mod bot;
pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod monitoring;
pub mod notifications;
pub mod rpc;
pub mod settings;
pub mod validation;

// Re-export commonly used types for tests
pub use config::AppConfig;
pub use db::DbPool;
pub use error::{AppError, AppResult};
pub use monitoring::{analyze, run_cycle, CycleStats, PollingConfig, TransferOutcome};
pub use notifications::{Notifier, TelegramNotifier, TransferAlert};
pub use rpc::{LedgerQuery, RpcClient, RpcError, SignatureInfo, TransactionRecord};
pub use settings::TrackerSettings;
