//! Database Integration Tests
//!
//! Tests SQLite WAL behavior and the dedup ledger:
//! - WAL mode and busy timeout
//! - Migration idempotence and seeded defaults
//! - Watched-source CRUD
//! - Idempotent dedup marks
//! - Administrative reset

use solwatch::config::DatabaseConfig;
use solwatch::db::{
    self, add_source, clear_tracking_data, init_pool, is_signature_processed, is_wallet_notified,
    list_sources, load_notified_wallets, mark_signature_processed, mark_wallet_notified,
    remove_source, run_migrations, DbPool,
};
use tempfile::TempDir;

/// Create a temporary database for testing
async fn create_test_db() -> (DbPool, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("test.db");

    let config = DatabaseConfig {
        path: db_path,
        max_connections: 5,
    };

    let pool = init_pool(&config).await.unwrap();
    run_migrations(&pool).await.unwrap();

    (pool, temp_dir)
}

// =============================================================================
// POOL AND MIGRATIONS
// =============================================================================

#[tokio::test]
async fn test_wal_mode_enabled() {
    let (pool, _temp_dir) = create_test_db().await;

    let result: (String,) = sqlx::query_as("PRAGMA journal_mode")
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_eq!(result.0.to_uppercase(), "WAL", "Database should be in WAL mode");
}

#[tokio::test]
async fn test_busy_timeout_configured() {
    let (pool, _temp_dir) = create_test_db().await;

    let result: (i64,) = sqlx::query_as("PRAGMA busy_timeout")
        .fetch_one(&pool)
        .await
        .unwrap();

    assert!(
        result.0 >= 5000,
        "Busy timeout should be at least 5000ms, got {}ms",
        result.0
    );
}

#[tokio::test]
async fn test_migrations_are_idempotent() {
    let (pool, _temp_dir) = create_test_db().await;

    // Re-running the migrations must not error or duplicate seeds
    run_migrations(&pool).await.unwrap();
    run_migrations(&pool).await.unwrap();

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM settings")
        .fetch_one(&pool)
        .await
        .unwrap();

    assert_eq!(count.0, 4, "Should have exactly the four seeded settings rows");
}

#[tokio::test]
async fn test_seeded_defaults_present() {
    let (pool, _temp_dir) = create_test_db().await;

    let settings = db::get_settings(&pool).await.unwrap();

    assert_eq!(settings.get("min_amount").map(String::as_str), Some("0.001"));
    assert_eq!(settings.get("max_amount").map(String::as_str), Some("10"));
    assert_eq!(settings.get("timezone").map(String::as_str), Some("5"));
    assert_eq!(
        settings.get("notify_all_transactions").map(String::as_str),
        Some("true")
    );
}

#[tokio::test]
async fn test_reseeding_keeps_operator_values() {
    let (pool, _temp_dir) = create_test_db().await;

    db::update_setting(&pool, "min_amount", "0.5").await.unwrap();

    // A restart re-runs the migrations; the operator's value must survive
    run_migrations(&pool).await.unwrap();

    let settings = db::get_settings(&pool).await.unwrap();
    assert_eq!(
        settings.get("min_amount").map(String::as_str),
        Some("0.5"),
        "seeding must never clobber an operator-set value"
    );
}

#[tokio::test]
async fn test_settings_update_is_last_writer_wins() {
    let (pool, _temp_dir) = create_test_db().await;

    db::update_setting(&pool, "max_amount", "20").await.unwrap();
    db::update_setting(&pool, "max_amount", "30").await.unwrap();

    let settings = db::get_settings(&pool).await.unwrap();
    assert_eq!(settings.get("max_amount").map(String::as_str), Some("30"));
}

// =============================================================================
// WATCHED SOURCES
// =============================================================================

#[tokio::test]
async fn test_add_and_list_sources() {
    let (pool, _temp_dir) = create_test_db().await;

    assert!(add_source(&pool, "BsourceBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB").await.unwrap());
    assert!(add_source(&pool, "AsourceAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA").await.unwrap());

    // Duplicate insert reports false
    assert!(
        !add_source(&pool, "AsourceAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA").await.unwrap(),
        "inserting the same address twice should report false"
    );

    let sources = list_sources(&pool).await.unwrap();
    assert_eq!(
        sources,
        vec![
            "AsourceAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA".to_string(),
            "BsourceBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBBB".to_string(),
        ],
        "sources should come back sorted and deduplicated"
    );
}

#[tokio::test]
async fn test_remove_source() {
    let (pool, _temp_dir) = create_test_db().await;

    add_source(&pool, "GoneWa11etJJJJJJJJJJJJJJJJJJJJJJJJJJJJJJJJJJ").await.unwrap();

    assert!(remove_source(&pool, "GoneWa11etJJJJJJJJJJJJJJJJJJJJJJJJJJJJJJJJJJ").await.unwrap());
    assert!(
        !remove_source(&pool, "GoneWa11etJJJJJJJJJJJJJJJJJJJJJJJJJJJJJJJJJJ").await.unwrap(),
        "removing an absent address should report false"
    );

    assert!(list_sources(&pool).await.unwrap().is_empty());
}

// =============================================================================
// DEDUP LEDGER
// =============================================================================

#[tokio::test]
async fn test_signature_marks_are_idempotent() {
    let (pool, _temp_dir) = create_test_db().await;

    assert!(!is_signature_processed(&pool, "sig-1").await.unwrap());

    mark_signature_processed(&pool, "sig-1", 1_700_000_000).await.unwrap();
    mark_signature_processed(&pool, "sig-1", 1_700_000_999).await.unwrap();

    assert!(is_signature_processed(&pool, "sig-1").await.unwrap());

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM processed_txs")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count.0, 1, "re-marking must not create a second row");

    // The first mark's timestamp wins
    let ts: (i64,) = sqlx::query_as("SELECT timestamp FROM processed_txs WHERE signature = 'sig-1'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(ts.0, 1_700_000_000);
}

#[tokio::test]
async fn test_wallet_marks_are_idempotent() {
    let (pool, _temp_dir) = create_test_db().await;

    assert!(!is_wallet_notified(&pool, "wallet-1").await.unwrap());

    mark_wallet_notified(&pool, "wallet-1").await.unwrap();
    mark_wallet_notified(&pool, "wallet-1").await.unwrap();

    assert!(is_wallet_notified(&pool, "wallet-1").await.unwrap());

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM notified_wallets")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count.0, 1);
}

#[tokio::test]
async fn test_notified_snapshot_contains_marked_wallets() {
    let (pool, _temp_dir) = create_test_db().await;

    mark_wallet_notified(&pool, "wallet-a").await.unwrap();
    mark_wallet_notified(&pool, "wallet-b").await.unwrap();

    let snapshot = load_notified_wallets(&pool).await.unwrap();

    assert_eq!(snapshot.len(), 2);
    assert!(snapshot.contains("wallet-a"));
    assert!(snapshot.contains("wallet-b"));
    assert!(!snapshot.contains("wallet-c"));
}

#[tokio::test]
async fn test_concurrent_marks_produce_single_row() {
    let (pool, _temp_dir) = create_test_db().await;

    // Several tasks racing to mark the same signature must coalesce
    let mut handles = vec![];
    for _ in 0..5 {
        let pool_clone = pool.clone();
        handles.push(tokio::spawn(async move {
            mark_signature_processed(&pool_clone, "sig-race", 1_700_000_000)
                .await
                .unwrap();
        }));
    }

    for handle in handles {
        handle.await.unwrap();
    }

    let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM processed_txs WHERE signature = 'sig-race'")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count.0, 1, "concurrent idempotent marks should leave one row");
}

// =============================================================================
// ADMINISTRATIVE RESET
// =============================================================================

#[tokio::test]
async fn test_clear_tracking_data_reports_counts() {
    let (pool, _temp_dir) = create_test_db().await;

    mark_signature_processed(&pool, "sig-1", 1_700_000_000).await.unwrap();
    mark_signature_processed(&pool, "sig-2", 1_700_000_001).await.unwrap();
    mark_wallet_notified(&pool, "wallet-1").await.unwrap();

    let (signatures, wallets) = clear_tracking_data(&pool).await.unwrap();
    assert_eq!(signatures, 2);
    assert_eq!(wallets, 1);

    assert!(!is_signature_processed(&pool, "sig-1").await.unwrap());
    assert!(!is_wallet_notified(&pool, "wallet-1").await.unwrap());

    // Clearing an already-empty store reports zero, not an error
    let (signatures, wallets) = clear_tracking_data(&pool).await.unwrap();
    assert_eq!((signatures, wallets), (0, 0));
}

#[tokio::test]
async fn test_clear_does_not_touch_sources_or_settings() {
    let (pool, _temp_dir) = create_test_db().await;

    add_source(&pool, "KeptWa11etKKKKKKKKKKKKKKKKKKKKKKKKKKKKKKKKKK").await.unwrap();
    db::update_setting(&pool, "min_amount", "0.25").await.unwrap();
    mark_signature_processed(&pool, "sig-1", 1_700_000_000).await.unwrap();

    clear_tracking_data(&pool).await.unwrap();

    assert_eq!(list_sources(&pool).await.unwrap().len(), 1);
    let settings = db::get_settings(&pool).await.unwrap();
    assert_eq!(settings.get("min_amount").map(String::as_str), Some("0.25"));
}
