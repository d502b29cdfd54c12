//! Routing error types

use thiserror::Error;

/// Errors that can occur during routing requests
#[derive(Debug, Error)]
pub enum RoutingError {
    /// Connection to the routing server failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// The routing server answered with an error status
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Failed to parse the routing response
    #[error("Parse error: {0}")]
    ParseError(String),

    /// The engine found no path between the endpoints
    #[error("No route found ({code}): {message}")]
    NoRoute {
        /// Engine status code, e.g. "NoRoute" or "NoSegment"
        code: String,
        /// Engine message, if any
        message: String,
    },

    /// The encoded geometry could not be decoded
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Request timeout
    #[error("Request timed out after {timeout_secs} seconds")]
    Timeout {
        /// The timeout duration in seconds
        timeout_secs: u64,
    },
}

impl RoutingError {
    /// Returns true if this error is retryable
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_) | Self::RequestFailed(_) | Self::Timeout { .. }
        )
    }
}
