//! Logging configuration.

use serde::{Deserialize, Serialize};

/// Output format of the log subscriber
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// One JSON object per event
    Json,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directives, overridden by `RUST_LOG` when set
    #[serde(default = "default_filter")]
    pub filter: String,

    /// Output format (default: text)
    #[serde(default)]
    pub log_format: LogFormat,

    /// Include span events (new/close) in the output
    #[serde(default)]
    pub span_events: bool,
}

fn default_filter() -> String {
    "info,sqlx=warn".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_filter(),
            log_format: LogFormat::default(),
            span_events: false,
        }
    }
}

impl LoggingConfig {
    /// Replace the filter directives, keeping the format
    #[must_use]
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = filter.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.filter, "info,sqlx=warn");
        assert_eq!(config.log_format, LogFormat::Text);
        assert!(!config.span_events);
    }

    #[test]
    fn format_deserializes_lowercase() {
        let config: LoggingConfig = serde_json::from_str(r#"{"log_format":"json"}"#).unwrap();
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.filter, "info,sqlx=warn");
    }

    #[test]
    fn with_filter_keeps_format() {
        let config = LoggingConfig {
            log_format: LogFormat::Json,
            ..LoggingConfig::default()
        }
        .with_filter("debug");
        assert_eq!(config.filter, "debug");
        assert_eq!(config.log_format, LogFormat::Json);
    }
}
