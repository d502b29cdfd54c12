//! Infrastructure layer - Adapters for external systems
//!
//! Implements the application ports over the headless browser, the routing
//! engine and the GTFS SQLite schedule, and wires them into a
//! [`TransitEngine`] from layered configuration.

pub mod adapters;
pub mod config;
pub mod engine;
pub mod persistence;
pub mod telemetry;

pub use adapters::*;
pub use config::{AppConfig, ConfigError, LogFormat, LoggingConfig, ScheduleStoreConfig};
pub use engine::{EngineHealth, TransitEngine};
pub use persistence::{DatabaseError, ScheduleDatabase, SqliteScheduleStore};
pub use telemetry::{TelemetryError, init_logging};
