//! Application configuration
//!
//! Split into focused sub-modules:
//! - `logging`: log filter and output format
//! - `schedule`: GTFS SQLite database settings
//!
//! Browser, routing, planner and arrivals sections reuse the config types of
//! the crates that own them.
//!
//! Sources, later ones winning: built-in defaults, an optional `trayecto.toml`
//! (or an explicit file), then `TRAYECTO_*` environment variables with `__`
//! between nested keys, e.g. `TRAYECTO_BROWSER__HEADLESS=false`.

mod logging;
mod schedule;

use std::path::Path;

use application::{ArrivalsConfig, PlannerConfig};
use integration_browser::BrowserConfig;
use integration_routing::RoutingConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub use logging::{LogFormat, LoggingConfig};
pub use schedule::ScheduleStoreConfig;

const ENV_PREFIX: &str = "TRAYECTO";
const DEFAULT_FILE: &str = "trayecto";

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or deserialized
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A section holds an unusable value
    #[error("Invalid {section} configuration: {message}")]
    Invalid {
        /// Section name
        section: &'static str,
        /// What is wrong
        message: String,
    },
}

/// Root configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Headless browser automation
    #[serde(default)]
    pub browser: BrowserConfig,

    /// Routing engine
    #[serde(default)]
    pub routing: RoutingConfig,

    /// GTFS schedule database
    #[serde(default)]
    pub schedule: ScheduleStoreConfig,

    /// Itinerary pipeline tuning
    #[serde(default)]
    pub planner: PlannerConfig,

    /// Arrivals tracker tuning
    #[serde(default)]
    pub arrivals: ArrivalsConfig,
}

impl AppConfig {
    /// Load from `trayecto.toml` (if present) and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load from an explicit file (required) or the default one (optional),
    /// then apply environment overrides and validate
    pub fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let builder = config::Config::builder();
        let builder = match path {
            Some(path) => builder.add_source(config::File::from(path).required(true)),
            None => builder.add_source(config::File::with_name(DEFAULT_FILE).required(false)),
        };

        let config: Self = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        debug!(
            schedule = %config.schedule.path,
            routing = %config.routing.base_url,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Configuration wired to local test doubles
    pub fn for_testing(webdriver_url: impl Into<String>, routing_url: impl Into<String>) -> Self {
        Self {
            logging: LoggingConfig::default(),
            browser: BrowserConfig::for_testing(webdriver_url),
            routing: RoutingConfig {
                base_url: routing_url.into(),
                ..RoutingConfig::for_testing()
            },
            schedule: ScheduleStoreConfig::in_memory(),
            planner: PlannerConfig::default(),
            arrivals: ArrivalsConfig::default(),
        }
    }

    /// Validate every section, reporting the first failure
    pub fn validate(&self) -> Result<(), ConfigError> {
        let checks: [(&'static str, Result<(), String>); 5] = [
            ("browser", self.browser.validate()),
            ("routing", self.routing.validate()),
            ("schedule", self.schedule.validate()),
            ("planner", self.planner.validate()),
            ("arrivals", self.arrivals.validate()),
        ];

        for (section, result) in checks {
            result.map_err(|message| ConfigError::Invalid { section, message })?;
        }
        Ok(())
    }
}
