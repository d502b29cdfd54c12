//! Persistence layer
//!
//! Read-only access to the GTFS schedule database through sqlx.

mod error;
mod schedule_database;
mod schedule_store;

pub use error::{DatabaseError, map_sqlx_error};
pub use schedule_database::{REQUIRED_TABLES, ScheduleDatabase};
pub use schedule_store::SqliteScheduleStore;
