//! Read-only connection pool over a GTFS SQLite file

use std::str::FromStr;

use sqlx::{
    SqlitePool,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
};
use tracing::{info, instrument};

use super::error::DatabaseError;
use crate::config::ScheduleStoreConfig;

/// Tables every schedule database must provide
pub const REQUIRED_TABLES: [&str; 4] = ["routes", "trips", "stop_times", "stops"];

/// Schedule database connection pool
#[derive(Debug, Clone)]
pub struct ScheduleDatabase {
    pool: SqlitePool,
}

impl ScheduleDatabase {
    /// Open the configured database
    ///
    /// Files are opened read-only and must already exist. An in-memory
    /// database stays writable so fixtures can be loaded into it.
    #[instrument(skip_all, fields(path = %config.path))]
    pub async fn open(config: &ScheduleStoreConfig) -> Result<Self, DatabaseError> {
        let in_memory = config.is_in_memory();
        let options = SqliteConnectOptions::from_str(&config.url())?
            .read_only(!in_memory)
            .create_if_missing(false);

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(1);
        if in_memory {
            // the data lives and dies with the single connection
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }
        let pool = pool_options.connect_with(options).await?;

        info!(
            max_connections = config.max_connections,
            read_only = !in_memory,
            "Schedule database opened"
        );
        Ok(Self { pool })
    }

    /// Open an empty in-memory database
    pub async fn in_memory() -> Result<Self, DatabaseError> {
        Self::open(&ScheduleStoreConfig::in_memory()).await
    }

    /// Get the underlying pool for raw queries
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Required tables absent from the database
    pub async fn missing_tables(&self) -> Result<Vec<&'static str>, DatabaseError> {
        let present: Vec<String> =
            sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table'")
                .fetch_all(&self.pool)
                .await?;

        Ok(REQUIRED_TABLES
            .into_iter()
            .filter(|table| !present.iter().any(|name| name == *table))
            .collect())
    }

    /// Whether the `stops` table carries the optional `stop_code` column
    pub async fn has_stop_code_column(&self) -> Result<bool, DatabaseError> {
        let columns: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_table_info('stops')")
            .fetch_all(&self.pool)
            .await?;
        Ok(columns.iter().any(|column| column == "stop_code"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_database_misses_every_table() {
        let db = ScheduleDatabase::in_memory().await.unwrap();
        assert_eq!(db.missing_tables().await.unwrap(), REQUIRED_TABLES.to_vec());
        assert!(!db.has_stop_code_column().await.unwrap());
    }

    #[tokio::test]
    async fn missing_file_is_not_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");
        let config = ScheduleStoreConfig {
            path: path.display().to_string(),
            ..ScheduleStoreConfig::default()
        };

        assert!(ScheduleDatabase::open(&config).await.is_err());
        assert!(!path.exists());
    }
}
