//! Database module for Solwatch
//!
//! Manages SQLite connection pool with WAL mode and provides
//! operations for watched sources, dedup bookkeeping, and settings.

use crate::config::DatabaseConfig;
use crate::error::{AppError, AppResult};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Row, Sqlite};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use tracing::info;

/// Type alias for the SQLite connection pool
pub type DbPool = Pool<Sqlite>;

/// Initialize the database connection pool
pub async fn init_pool(config: &DatabaseConfig) -> AppResult<DbPool> {
    // Ensure data directory exists
    if let Some(parent) = config.path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::Database(sqlx::Error::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Failed to create database directory: {}", e),
                )))
            })?;
            info!("Created database directory: {:?}", parent);
        }
    }

    let db_url = format!("sqlite:{}?mode=rwc", config.path.display());

    let connect_options = SqliteConnectOptions::from_str(&db_url)
        .map_err(AppError::Database)?
        // Enable WAL mode for concurrent reads
        .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
        // Set busy timeout to 5 seconds
        .busy_timeout(std::time::Duration::from_secs(5))
        // Create if not exists
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect_with(connect_options)
        .await?;

    info!(
        "Database pool initialized: {:?} (max {} connections)",
        config.path, config.max_connections
    );

    Ok(pool)
}

/// Run database migrations (apply schema)
///
/// Statements are idempotent, so re-running at every startup is safe.
pub async fn run_migrations(pool: &DbPool) -> AppResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sources (
            address TEXT PRIMARY KEY
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS processed_txs (
            signature TEXT PRIMARY KEY,
            timestamp INTEGER
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS notified_wallets (
            wallet_address TEXT PRIMARY KEY
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Seed default settings without clobbering operator changes
    for (key, value) in [
        ("min_amount", "0.001"),
        ("max_amount", "10"),
        ("timezone", "5"),
        ("notify_all_transactions", "true"),
    ] {
        sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(value)
            .execute(pool)
            .await?;
    }

    info!("Database schema applied successfully");
    Ok(())
}

// =============================================================================
// WATCHED SOURCES
// =============================================================================

/// Add a watched source address
///
/// Returns false if the address was already present.
pub async fn add_source(pool: &DbPool, address: &str) -> AppResult<bool> {
    let result = sqlx::query("INSERT OR IGNORE INTO sources (address) VALUES (?)")
        .bind(address)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Remove a watched source address
///
/// Returns false if the address was not present.
pub async fn remove_source(pool: &DbPool, address: &str) -> AppResult<bool> {
    let result = sqlx::query("DELETE FROM sources WHERE address = ?")
        .bind(address)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// List all watched source addresses
pub async fn list_sources(pool: &DbPool) -> AppResult<Vec<String>> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT address FROM sources ORDER BY address")
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|(a,)| a).collect())
}

// =============================================================================
// DEDUP LEDGER
// =============================================================================

/// Check whether a transaction signature has already been processed
pub async fn is_signature_processed(pool: &DbPool, signature: &str) -> AppResult<bool> {
    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM processed_txs WHERE signature = ?")
        .bind(signature)
        .fetch_one(pool)
        .await?;

    Ok(count.0 > 0)
}

/// Mark a transaction signature as processed (idempotent)
pub async fn mark_signature_processed(
    pool: &DbPool,
    signature: &str,
    timestamp: i64,
) -> AppResult<()> {
    sqlx::query("INSERT OR IGNORE INTO processed_txs (signature, timestamp) VALUES (?, ?)")
        .bind(signature)
        .bind(timestamp)
        .execute(pool)
        .await?;

    Ok(())
}

/// Check whether a recipient wallet has already been alerted
pub async fn is_wallet_notified(pool: &DbPool, address: &str) -> AppResult<bool> {
    let count: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM notified_wallets WHERE wallet_address = ?")
            .bind(address)
            .fetch_one(pool)
            .await?;

    Ok(count.0 > 0)
}

/// Mark a recipient wallet as alerted (idempotent)
pub async fn mark_wallet_notified(pool: &DbPool, address: &str) -> AppResult<()> {
    sqlx::query("INSERT OR IGNORE INTO notified_wallets (wallet_address) VALUES (?)")
        .bind(address)
        .execute(pool)
        .await?;

    Ok(())
}

/// Load the full notified-wallet set (snapshot taken once per polling cycle)
pub async fn load_notified_wallets(pool: &DbPool) -> AppResult<HashSet<String>> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT wallet_address FROM notified_wallets")
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(|(a,)| a).collect())
}

/// Delete all dedup bookkeeping
///
/// Explicit administrative reset; after this every signature is re-analyzed
/// and every recipient is eligible for one alert again. Returns the number
/// of deleted (signatures, wallets).
pub async fn clear_tracking_data(pool: &DbPool) -> AppResult<(u64, u64)> {
    let txs = sqlx::query("DELETE FROM processed_txs")
        .execute(pool)
        .await?
        .rows_affected();
    let wallets = sqlx::query("DELETE FROM notified_wallets")
        .execute(pool)
        .await?
        .rows_affected();

    info!(
        deleted_signatures = txs,
        deleted_wallets = wallets,
        "Tracking data cleared"
    );

    Ok((txs, wallets))
}

// =============================================================================
// SETTINGS
// =============================================================================

/// Fetch all settings rows as a key -> value map
pub async fn get_settings(pool: &DbPool) -> AppResult<HashMap<String, String>> {
    let rows = sqlx::query("SELECT key, value FROM settings")
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|row| (row.get::<String, _>("key"), row.get::<String, _>("value")))
        .collect())
}

/// Write a single setting (last writer wins)
pub async fn update_setting(pool: &DbPool, key: &str, value: &str) -> AppResult<()> {
    sqlx::query("INSERT OR REPLACE INTO settings (key, value) VALUES (?, ?)")
        .bind(key)
        .bind(value)
        .execute(pool)
        .await?;

    Ok(())
}
