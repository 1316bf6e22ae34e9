//! Solwatch - Solana source-wallet alert service
//!
//! Main entry point: wires the database, the ledger RPC client, the
//! polling watcher, and the Telegram command bot together.

mod bot;
mod config;
mod constants;
mod db;
mod error;
mod monitoring;
mod notifications;
mod rpc;
mod settings;
mod validation;

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;
use crate::monitoring::PollingConfig;
use crate::notifications::{Notifier, TelegramNotifier};
use crate::rpc::{LedgerQuery, RpcClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    init_tracing();

    tracing::info!("Starting Solwatch v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = load_config()?;
    tracing::info!(
        rpc_url = %config.rpc.url,
        poll_interval_secs = config.watcher.poll_interval_secs,
        "Configuration loaded"
    );

    // Initialize database
    let db_pool = db::init_pool(&config.database).await?;
    db::run_migrations(&db_pool).await?;
    tracing::info!("Database initialized");

    // Ledger client and alert channel
    let ledger: Arc<dyn LedgerQuery> = Arc::new(RpcClient::new(&config.rpc)?);
    let notifier: Arc<dyn Notifier> = Arc::new(TelegramNotifier::new(&config.telegram));
    if !notifier.is_enabled() {
        tracing::warn!("Telegram notifier not fully configured, alerts will fail");
    }

    let cancel_token = CancellationToken::new();

    // Spawn polling watcher
    let polling_config = PollingConfig {
        interval_secs: config.watcher.poll_interval_secs,
        startup_delay_secs: config.watcher.startup_delay_secs,
    };
    let watcher = tokio::spawn(monitoring::start_polling_task(
        db_pool.clone(),
        ledger,
        notifier,
        polling_config,
        cancel_token.clone(),
    ));
    tracing::info!("Polling watcher started");

    // Spawn command bot
    let bot_task = tokio::spawn(bot::run_bot(
        db_pool.clone(),
        config.telegram.clone(),
        cancel_token.clone(),
    ));
    tracing::info!("Command bot started");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received");

    cancel_token.cancel();
    let _ = watcher.await;
    let _ = bot_task.await;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Initialize tracing/logging
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "solwatch=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}

/// Load and validate configuration
fn load_config() -> anyhow::Result<AppConfig> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = AppConfig::load().map_err(|e| {
        tracing::error!(error = %e, "Failed to load configuration");
        anyhow::anyhow!("Configuration error: {}", e)
    })?;

    // Validate configuration
    if let Err(e) = config.validate() {
        // In development, allow running without Telegram credentials
        if std::env::var("SOLWATCH_DEV_MODE").is_ok() {
            tracing::warn!("Running in dev mode - skipping configuration validation");
        } else {
            return Err(anyhow::anyhow!("Configuration validation failed: {}", e));
        }
    }

    Ok(config)
}
