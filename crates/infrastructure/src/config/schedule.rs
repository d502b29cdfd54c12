//! Schedule store (GTFS SQLite) configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

const IN_MEMORY: &str = ":memory:";

/// Schedule database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleStoreConfig {
    /// Path to the GTFS SQLite file, or `:memory:`
    #[serde(default = "default_path")]
    pub path: String,

    /// Maximum number of pooled read connections
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Per-query deadline in seconds (default: 5)
    #[serde(default = "default_query_timeout")]
    pub query_timeout_secs: u64,
}

fn default_path() -> String {
    "gtfs.db".to_string()
}

const fn default_max_connections() -> u32 {
    4
}

const fn default_query_timeout() -> u64 {
    5
}

impl Default for ScheduleStoreConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            max_connections: default_max_connections(),
            query_timeout_secs: default_query_timeout(),
        }
    }
}

impl ScheduleStoreConfig {
    /// Private in-memory database, for tests and fixtures
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            path: IN_MEMORY.to_string(),
            max_connections: 1,
            query_timeout_secs: default_query_timeout(),
        }
    }

    /// Whether this points at a private in-memory database
    pub fn is_in_memory(&self) -> bool {
        self.path == IN_MEMORY
    }

    /// sqlx connection URL
    pub fn url(&self) -> String {
        if self.is_in_memory() {
            "sqlite::memory:".to_string()
        } else {
            format!("sqlite:{}", self.path)
        }
    }

    /// Per-query deadline
    pub const fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.path.trim().is_empty() {
            return Err("schedule.path cannot be empty".to_string());
        }
        if self.max_connections == 0 {
            return Err("schedule.max_connections must be greater than 0".to_string());
        }
        if self.is_in_memory() && self.max_connections != 1 {
            return Err("schedule.max_connections must be 1 for an in-memory database".to_string());
        }
        if self.query_timeout_secs == 0 {
            return Err("schedule.query_timeout_secs must be greater than 0".to_string());
        }
        Ok(())
    }
}
