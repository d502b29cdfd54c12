//! Shared error mapping for the sqlx persistence layer

use application::error::ApplicationError;

/// Errors raised while opening or inspecting the schedule database
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Database error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Schema error: {0}")]
    Schema(String),
}

impl From<DatabaseError> for ApplicationError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Sqlx(e) => map_sqlx_error(e),
            DatabaseError::Schema(message) => Self::ScheduleStore(message),
        }
    }
}

/// Map a sqlx error to an application-layer error
pub fn map_sqlx_error(e: sqlx::Error) -> ApplicationError {
    match e {
        sqlx::Error::Database(db_err) => {
            ApplicationError::ScheduleStore(format!("Database error: {db_err}"))
        },
        sqlx::Error::PoolTimedOut => {
            ApplicationError::ScheduleStore("Timed out waiting for a connection".to_string())
        },
        other => ApplicationError::ScheduleStore(format!("Database error: {other}")),
    }
}
