//! Configuration management for Solwatch
//!
//! Loads configuration from config files and environment variables.
//! Environment variables override file values.

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Ledger RPC endpoint configuration
    pub rpc: RpcConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Telegram bot configuration
    pub telegram: TelegramConfig,
    /// Polling watcher configuration
    #[serde(default)]
    pub watcher: WatcherConfig,
}

/// Ledger RPC endpoint configuration
#[derive(Debug, Clone, Deserialize)]
pub struct RpcConfig {
    /// RPC endpoint URL
    #[serde(default = "default_rpc_url")]
    pub url: String,
    /// Request timeout in milliseconds
    #[serde(default = "default_rpc_timeout")]
    pub timeout_ms: u64,
    /// Signatures fetched per source per cycle
    #[serde(default = "default_signature_limit")]
    pub signature_limit: u32,
    /// Commitment level for detail fetches
    #[serde(default = "default_commitment")]
    pub commitment: String,
}

fn default_rpc_url() -> String {
    "https://api.mainnet-beta.solana.com".to_string()
}

fn default_rpc_timeout() -> u64 {
    10000
}

fn default_signature_limit() -> u32 {
    10
}

fn default_commitment() -> String {
    "confirmed".to_string()
}

/// Database configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
    /// Maximum connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("data/solwatch.db")
}

fn default_max_connections() -> u32 {
    5
}

/// Telegram bot configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelegramConfig {
    /// Bot API token (loaded from env)
    #[serde(default)]
    pub bot_token: String,
    /// Chat ID of the operator; alerts go here and only this chat may
    /// issue commands
    #[serde(default)]
    pub admin_chat_id: i64,
    /// Long-poll timeout for getUpdates in seconds
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,
}

fn default_poll_timeout() -> u64 {
    30
}

/// Polling watcher configuration
#[derive(Debug, Clone, Deserialize)]
pub struct WatcherConfig {
    /// Seconds between polling cycles
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,
    /// Delay before the first cycle after startup
    #[serde(default = "default_startup_delay")]
    pub startup_delay_secs: u64,
}

fn default_poll_interval() -> u64 {
    15
}

fn default_startup_delay() -> u64 {
    1
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: default_poll_interval(),
            startup_delay_secs: default_startup_delay(),
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables (SOLWATCH_*)
    /// 2. config/config.{toml,yaml} (if exists)
    /// 3. config.{toml,yaml} (if exists)
    /// 4. Default values
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            // Start with default values
            .set_default("rpc.url", "https://api.mainnet-beta.solana.com")?
            .set_default("rpc.timeout_ms", 10000)?
            .set_default("rpc.signature_limit", 10)?
            .set_default("rpc.commitment", "confirmed")?
            .set_default("database.path", "data/solwatch.db")?
            .set_default("database.max_connections", 5)?
            .set_default("telegram.poll_timeout_secs", 30)?
            .set_default("watcher.poll_interval_secs", 15)?
            .set_default("watcher.startup_delay_secs", 1)?
            // Load from config files (lower priority)
            .add_source(File::with_name("config").required(false))
            .add_source(File::with_name("config/config").required(false))
            // Override with environment variables (highest priority - loaded last)
            // SOLWATCH_TELEGRAM__BOT_TOKEN=123:abc -> telegram.bot_token
            // SOLWATCH_WATCHER__POLL_INTERVAL_SECS=30 -> watcher.poll_interval_secs
            .add_source(
                Environment::with_prefix("SOLWATCH")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Check bot token is set
        if self.telegram.bot_token.is_empty() {
            return Err(ConfigError::Message(
                "Telegram bot token must be set via SOLWATCH_TELEGRAM__BOT_TOKEN".to_string(),
            ));
        }

        // Check the operator chat is set
        if self.telegram.admin_chat_id == 0 {
            return Err(ConfigError::Message(
                "Admin chat ID must be set via SOLWATCH_TELEGRAM__ADMIN_CHAT_ID".to_string(),
            ));
        }

        // Check RPC URL is set
        if self.rpc.url.is_empty() {
            return Err(ConfigError::Message("RPC URL must be set".to_string()));
        }

        // Zero interval would spin the watcher
        if self.watcher.poll_interval_secs == 0 {
            return Err(ConfigError::Message(
                "Poll interval must be at least 1 second".to_string(),
            ));
        }

        Ok(())
    }
}
