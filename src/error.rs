//! Error types for Solwatch

use thiserror::Error;

/// Application-level errors
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Ledger RPC error
    #[error("RPC error: {0}")]
    Rpc(String),

    /// Telegram API error
    #[error("Telegram error: {0}")]
    Telegram(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
