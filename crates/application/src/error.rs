//! Application-level errors

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// No compatible browser runtime could be found or started
    #[error("Browser unavailable: {0}")]
    BrowserUnavailable(String),

    /// A scrape exceeded its deadline
    #[error("Scrape timed out after {timeout_secs} seconds")]
    ScrapeTimeout {
        /// The deadline in seconds
        timeout_secs: u64,
    },

    /// The scraped page did not yield enough facts
    #[error("Extraction incomplete: {0}")]
    ExtractionIncomplete(String),

    /// The routing engine could not produce geometry for a leg
    #[error("Geometry unavailable: {0}")]
    GeometryUnavailable(String),

    /// A stop code is unknown to the schedule store
    #[error("Stop not found: {0}")]
    StopNotFound(String),

    /// Schedule store query failed
    #[error("Schedule store error: {0}")]
    ScheduleStore(String),

    /// External service error
    #[error("External service error: {0}")]
    ExternalService(String),

    /// Caller supplied an unusable argument
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Check if this error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ScrapeTimeout { .. } | Self::ExternalService(_) | Self::ScheduleStore(_)
        )
    }
}
