//! Routing engine configuration

use serde::{Deserialize, Serialize};

/// Configuration for the OSRM-compatible routing engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingConfig {
    /// Base URL of the routing server
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Profile used for pedestrian legs
    #[serde(default = "default_walk_profile")]
    pub walk_profile: String,

    /// Profile used for bus legs
    #[serde(default = "default_vehicle_profile")]
    pub vehicle_profile: String,

    /// Profile used for metro legs
    #[serde(default = "default_transit_profile")]
    pub transit_profile: String,

    /// Cache TTL in seconds (0 to disable caching)
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// Maximum number of cached routes
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

fn default_walk_profile() -> String {
    "foot".to_string()
}

fn default_vehicle_profile() -> String {
    "driving".to_string()
}

fn default_transit_profile() -> String {
    "driving".to_string()
}

const fn default_cache_ttl_secs() -> u64 {
    3600
}

const fn default_cache_capacity() -> u64 {
    2000
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            walk_profile: default_walk_profile(),
            vehicle_profile: default_vehicle_profile(),
            transit_profile: default_transit_profile(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl RoutingConfig {
    /// Create a configuration suitable for testing
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            timeout_secs: 5,
            cache_ttl_secs: 0,
            ..Default::default()
        }
    }

    /// Check if caching is enabled
    #[must_use]
    pub const fn caching_enabled(&self) -> bool {
        self.cache_ttl_secs > 0 && self.cache_capacity > 0
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("base_url must not be empty".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }

        for (name, profile) in [
            ("walk_profile", &self.walk_profile),
            ("vehicle_profile", &self.vehicle_profile),
            ("transit_profile", &self.transit_profile),
        ] {
            if profile.is_empty() || profile.contains('/') {
                return Err(format!("{name} must be a single path segment"));
            }
        }

        Ok(())
    }
}
