//! Integration tests for the schedule store against a GTFS file on disk

use std::{path::Path, str::FromStr};

use application::ports::ScheduleStorePort;
use infrastructure::{
    AppConfig, ScheduleDatabase, ScheduleStoreConfig, SqliteScheduleStore, TransitEngine,
};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tempfile::TempDir;

const FIXTURE: &str = include_str!("fixtures/santiago_gtfs.sql");

// ============================================================================
// Test Helpers
// ============================================================================

async fn write_fixture(path: &Path) {
    let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))
        .unwrap()
        .create_if_missing(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    sqlx::raw_sql(FIXTURE).execute(&pool).await.unwrap();
    pool.close().await;
}

async fn fixture_file() -> (TempDir, ScheduleStoreConfig) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("gtfs.db");
    write_fixture(&path).await;

    let config = ScheduleStoreConfig {
        path: path.display().to_string(),
        ..ScheduleStoreConfig::default()
    };
    (dir, config)
}

// ============================================================================
// Schedule Store Tests
// ============================================================================

#[tokio::test]
async fn test_file_store_answers_lookups() {
    let (_dir, config) = fixture_file().await;
    let store = SqliteScheduleStore::open(&config).await.unwrap();

    let route = store.route_by_name_or_id("506").await.unwrap().unwrap();
    let trip = store.representative_trip(&route.id).await.unwrap().unwrap();
    let stops = store.stops_for_trip(&trip).await.unwrap();

    assert_eq!(trip, "506-I-full");
    assert_eq!(stops.len(), 5);
    assert_eq!(stops.first().unwrap().name, "Parada 1 / Alameda - Amunategui");
}

#[tokio::test]
async fn test_file_store_is_read_only() {
    let (_dir, config) = fixture_file().await;
    let db = ScheduleDatabase::open(&config).await.unwrap();

    let result = sqlx::query("DELETE FROM stops").execute(db.pool()).await;
    assert!(result.is_err());

    let remaining: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stops")
        .fetch_one(db.pool())
        .await
        .unwrap();
    assert_eq!(remaining, 8);
}

#[tokio::test]
async fn test_concurrent_lookups_share_the_pool() {
    let (_dir, config) = fixture_file().await;
    let store = SqliteScheduleStore::open(&config).await.unwrap();

    let lookups = ["PA433", "pa434", "PA 435", "PA436", "PA437", "ML-UCH"].map(|code| {
        let store = store.clone();
        tokio::spawn(async move { store.stop_by_code(code).await })
    });

    for handle in lookups {
        assert!(handle.await.unwrap().unwrap().is_some());
    }
}

// ============================================================================
// Engine Wiring Tests
// ============================================================================

#[tokio::test]
async fn test_engine_from_config() {
    let (_dir, schedule) = fixture_file().await;
    let config = AppConfig {
        schedule,
        ..AppConfig::for_testing("http://127.0.0.1:9", "http://127.0.0.1:9")
    };

    let engine = TransitEngine::from_config(&config).await;
    assert!(engine.is_ok());
}

#[tokio::test]
async fn test_engine_rejects_missing_schedule() {
    let dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        schedule: ScheduleStoreConfig {
            path: dir.path().join("absent.db").display().to_string(),
            ..ScheduleStoreConfig::default()
        },
        ..AppConfig::for_testing("http://127.0.0.1:9", "http://127.0.0.1:9")
    };

    let err = TransitEngine::from_config(&config).await.unwrap_err();
    assert!(matches!(err, application::ApplicationError::ScheduleStore(_)));
}

#[tokio::test]
async fn test_engine_rejects_invalid_config() {
    let mut config = AppConfig::for_testing("http://127.0.0.1:9", "http://127.0.0.1:9");
    config.planner.html_cache_ttl_secs = 0;

    let err = TransitEngine::from_config(&config).await.unwrap_err();
    assert!(matches!(err, application::ApplicationError::Configuration(_)));
}
