//! Real-time bus arrivals at a stop

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::value_objects::StopCode;

/// A vehicle approaching (or having just left) a stop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BusArrival {
    /// Route number
    pub route_number: String,
    /// Distance to the stop in kilometers
    pub distance_km: f64,
    /// Inferred from comparison with the previous poll
    pub just_passed: bool,
}

impl BusArrival {
    /// A vehicle currently reported by the arrivals page
    #[must_use]
    pub fn approaching(route_number: impl Into<String>, distance_km: f64) -> Self {
        Self {
            route_number: route_number.into(),
            distance_km,
            just_passed: false,
        }
    }
}

/// Arrivals reported for one stop in one poll
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopArrivals {
    /// Normalized stop code
    pub stop_code: StopCode,
    /// Vehicles, approaching ones first in page order, then those that just passed
    pub arrivals: Vec<BusArrival>,
    /// When the page was read
    pub fetched_at: DateTime<Utc>,
}

impl StopArrivals {
    /// Vehicles flagged as having just passed
    pub fn passed(&self) -> impl Iterator<Item = &BusArrival> {
        self.arrivals.iter().filter(|a| a.just_passed)
    }
}

/// One vehicle reading kept between polls
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrivalObservation {
    /// Route number
    pub route_number: String,
    /// Distance to the stop in kilometers
    pub distance_km: f64,
    /// When the reading was taken
    pub seen_at: DateTime<Utc>,
}
