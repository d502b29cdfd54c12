//! Tuning for the itinerary pipeline and the arrivals tracker

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::fallback_catalogue::CatalogueRoute;
use crate::retry::RetryConfig;

/// Settings shared by the planner, the assembler and the fallback engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// How long a phase-1 page stays reusable by phase 2 (default: 900)
    #[serde(default = "default_html_cache_ttl")]
    pub html_cache_ttl_secs: u64,

    /// Decimals kept when quantizing coordinates into cache keys (default: 4)
    #[serde(default = "default_coordinate_precision")]
    pub coordinate_precision: u8,

    /// Phase-2 fetch retries after the first attempt (default: 2)
    #[serde(default = "default_detail_retries")]
    pub detail_retries: u32,

    /// First phase-2 backoff delay in milliseconds (default: 1000)
    #[serde(default = "default_retry_initial_delay")]
    pub retry_initial_delay_ms: u64,

    /// Deadline for each routing-engine call in seconds (default: 10)
    #[serde(default = "default_routing_timeout")]
    pub routing_timeout_secs: u64,

    /// Used for straight-line walking estimates (default: 5.0)
    #[serde(default = "default_walking_speed")]
    pub walking_speed_kmh: f64,

    /// Used for straight-line bus estimates (default: 20.0)
    #[serde(default = "default_bus_speed")]
    pub bus_speed_kmh: f64,

    /// Used for straight-line metro estimates (default: 35.0)
    #[serde(default = "default_metro_speed")]
    pub metro_speed_kmh: f64,

    /// Below this distance the final walk is skipped (default: 0.05)
    #[serde(default = "default_arrival_threshold")]
    pub arrival_threshold_km: f64,

    /// Score added to fallback routes with a long walk at either end (default: 5.0)
    #[serde(default = "default_fallback_penalty")]
    pub fallback_penalty_km: f64,

    /// Walks longer than this make a fallback route penalized (default: 1.0)
    #[serde(default = "default_max_walk_to_stop")]
    pub max_walk_to_stop_km: f64,

    /// Replaces the built-in fallback routes when set
    #[serde(default)]
    pub fallback_catalogue: Option<Vec<CatalogueRoute>>,
}

const fn default_html_cache_ttl() -> u64 {
    900
}

const fn default_coordinate_precision() -> u8 {
    4
}

const fn default_detail_retries() -> u32 {
    2
}

const fn default_retry_initial_delay() -> u64 {
    1_000
}

const fn default_routing_timeout() -> u64 {
    10
}

const fn default_walking_speed() -> f64 {
    5.0
}

const fn default_bus_speed() -> f64 {
    20.0
}

const fn default_metro_speed() -> f64 {
    35.0
}

const fn default_arrival_threshold() -> f64 {
    0.05
}

const fn default_fallback_penalty() -> f64 {
    5.0
}

const fn default_max_walk_to_stop() -> f64 {
    1.0
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            html_cache_ttl_secs: default_html_cache_ttl(),
            coordinate_precision: default_coordinate_precision(),
            detail_retries: default_detail_retries(),
            retry_initial_delay_ms: default_retry_initial_delay(),
            routing_timeout_secs: default_routing_timeout(),
            walking_speed_kmh: default_walking_speed(),
            bus_speed_kmh: default_bus_speed(),
            metro_speed_kmh: default_metro_speed(),
            arrival_threshold_km: default_arrival_threshold(),
            fallback_penalty_km: default_fallback_penalty(),
            max_walk_to_stop_km: default_max_walk_to_stop(),
            fallback_catalogue: None,
        }
    }
}

impl PlannerConfig {
    /// Phase-1 page lifetime
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn html_cache_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.html_cache_ttl_secs as i64)
    }

    /// Per-call routing deadline
    #[must_use]
    pub const fn routing_timeout(&self) -> Duration {
        Duration::from_secs(self.routing_timeout_secs)
    }

    /// Backoff for phase-2 fetches
    #[must_use]
    pub fn detail_retry(&self) -> RetryConfig {
        RetryConfig {
            initial_delay_ms: self.retry_initial_delay_ms,
            max_delay_ms: self.retry_initial_delay_ms.saturating_mul(8),
            max_retries: self.detail_retries,
            ..RetryConfig::default()
        }
    }

    /// Check for values the pipeline cannot work with
    pub fn validate(&self) -> Result<(), String> {
        if self.html_cache_ttl_secs == 0 {
            return Err("planner.html_cache_ttl_secs must be greater than 0".to_string());
        }
        if self.coordinate_precision > 7 {
            return Err("planner.coordinate_precision must be at most 7".to_string());
        }
        if self.routing_timeout_secs == 0 {
            return Err("planner.routing_timeout_secs must be greater than 0".to_string());
        }
        for (name, speed) in [
            ("walking_speed_kmh", self.walking_speed_kmh),
            ("bus_speed_kmh", self.bus_speed_kmh),
            ("metro_speed_kmh", self.metro_speed_kmh),
        ] {
            if !speed.is_finite() || speed <= 0.0 {
                return Err(format!("planner.{name} must be a positive number"));
            }
        }
        if self.arrival_threshold_km < 0.0 || self.max_walk_to_stop_km <= 0.0 {
            return Err("planner distance thresholds must not be negative".to_string());
        }
        if self.fallback_penalty_km < 0.0 {
            return Err("planner.fallback_penalty_km must not be negative".to_string());
        }
        if let Some(routes) = &self.fallback_catalogue {
            if routes.iter().all(|r| r.stops.len() < 2) {
                return Err(
                    "planner.fallback_catalogue needs at least one route with two stops"
                        .to_string(),
                );
            }
        }
        Ok(())
    }
}

/// Thresholds for passed-bus inference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrivalsConfig {
    /// How long a stop's last reading is kept (default: 900)
    #[serde(default = "default_history_ttl")]
    pub history_ttl_secs: u64,

    /// A bus this close that vanishes has passed (default: 2.0)
    #[serde(default = "default_passed_within")]
    pub passed_within_km: f64,

    /// A bus previously this close... (default: 1.0)
    #[serde(default = "default_restart_near")]
    pub restart_near_km: f64,

    /// ...and now beyond this means a new run of the route (default: 5.0)
    #[serde(default = "default_restart_far")]
    pub restart_far_km: f64,
}

const fn default_history_ttl() -> u64 {
    900
}

const fn default_passed_within() -> f64 {
    2.0
}

const fn default_restart_near() -> f64 {
    1.0
}

const fn default_restart_far() -> f64 {
    5.0
}

impl Default for ArrivalsConfig {
    fn default() -> Self {
        Self {
            history_ttl_secs: default_history_ttl(),
            passed_within_km: default_passed_within(),
            restart_near_km: default_restart_near(),
            restart_far_km: default_restart_far(),
        }
    }
}

impl ArrivalsConfig {
    /// History lifetime
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn history_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.history_ttl_secs as i64)
    }

    /// Check threshold ordering
    pub fn validate(&self) -> Result<(), String> {
        if self.history_ttl_secs == 0 {
            return Err("arrivals.history_ttl_secs must be greater than 0".to_string());
        }
        if self.passed_within_km <= 0.0 {
            return Err("arrivals.passed_within_km must be positive".to_string());
        }
        if self.restart_near_km <= 0.0 || self.restart_far_km <= self.restart_near_km {
            return Err("arrivals.restart_far_km must exceed restart_near_km > 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(PlannerConfig::default().validate().is_ok());
        assert!(ArrivalsConfig::default().validate().is_ok());
    }

    #[test]
    fn detail_retry_follows_planner_settings() {
        let config = PlannerConfig {
            detail_retries: 4,
            retry_initial_delay_ms: 250,
            ..PlannerConfig::default()
        };
        let retry = config.detail_retry();
        assert_eq!(retry.max_retries, 4);
        assert_eq!(retry.initial_delay_ms, 250);
        assert_eq!(retry.max_delay_ms, 2_000);
    }

    #[test]
    fn rejects_zero_speed() {
        let config = PlannerConfig {
            bus_speed_kmh: 0.0,
            ..PlannerConfig::default()
        };
        assert!(config.validate().unwrap_err().contains("bus_speed_kmh"));
    }

    #[test]
    fn rejects_catalogue_without_usable_route() {
        let config = PlannerConfig {
            fallback_catalogue: Some(Vec::new()),
            ..PlannerConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_inverted_restart_thresholds() {
        let config = ArrivalsConfig {
            restart_near_km: 6.0,
            ..ArrivalsConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_config_uses_defaults() {
        let config: PlannerConfig = serde_json::from_str(r#"{"detail_retries":1}"#).unwrap();
        assert_eq!(config.detail_retries, 1);
        assert_eq!(config.html_cache_ttl_secs, 900);
    }
}
