//! Browser automation error types

use thiserror::Error;

/// Errors that can occur while driving the browser
#[derive(Debug, Error)]
pub enum BrowserError {
    /// No driver executable could be found
    #[error("WebDriver executable not found: {0}")]
    DriverNotFound(String),

    /// No browser executable could be found
    #[error("Browser executable not found: {0}")]
    BrowserNotFound(String),

    /// The driver process could not be started or never became ready
    #[error("Failed to launch driver: {0}")]
    LaunchFailed(String),

    /// The driver refused to create a browser session
    #[error("Session not created: {0}")]
    SessionNotCreated(String),

    /// Connection to the WebDriver endpoint failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A WebDriver command returned an error
    #[error("WebDriver error {error}: {message}")]
    Command {
        /// W3C error code, e.g. "javascript error"
        error: String,
        /// Driver-supplied message
        message: String,
    },

    /// A WebDriver response could not be parsed
    #[error("Parse error: {0}")]
    ParseError(String),

    /// A required element did not become visible in time
    #[error("Element '{selector}' not visible after {timeout_secs} seconds")]
    ElementTimeout {
        /// CSS selector that was waited for
        selector: String,
        /// The wait in seconds
        timeout_secs: u64,
    },

    /// The overall page deadline elapsed before any usable snapshot
    #[error("Page fetch timed out after {timeout_secs} seconds")]
    Timeout {
        /// The deadline in seconds
        timeout_secs: u64,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

impl BrowserError {
    /// Returns true if this error is retryable
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_)
                | Self::Command { .. }
                | Self::ElementTimeout { .. }
                | Self::Timeout { .. }
        )
    }

    /// Returns true if no browser runtime is available at all
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(
            self,
            Self::DriverNotFound(_)
                | Self::BrowserNotFound(_)
                | Self::LaunchFailed(_)
                | Self::SessionNotCreated(_)
        )
    }

    /// Deadline of a timeout error, if this is one
    #[must_use]
    pub const fn timeout_secs(&self) -> Option<u64> {
        match self {
            Self::ElementTimeout { timeout_secs, .. } | Self::Timeout { timeout_secs } => {
                Some(*timeout_secs)
            },
            _ => None,
        }
    }
}
