//! Itinerary entity

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::TripLeg;
use crate::errors::DomainError;
use crate::value_objects::GeoLocation;

/// How an itinerary was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItinerarySource {
    /// Stops and route came straight from the scraped page
    Scraped,
    /// Scraped route, stop list completed from the schedule store
    ScheduleAssisted,
    /// Distance-scored fallback over the built-in route catalogue
    Heuristic,
}

/// A complete multimodal journey from origin to destination
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Itinerary {
    /// Requested origin
    pub origin: GeoLocation,
    /// Requested destination
    pub destination: GeoLocation,
    /// Ordered legs
    pub legs: Vec<TripLeg>,
    /// Sum of leg durations in minutes
    pub total_duration_minutes: u32,
    /// Sum of leg distances in kilometers
    pub total_distance_km: f64,
    /// Route numbers and metro lines used, in riding order
    pub routes: Vec<String>,
    /// Departure time (synthesis wall-clock time)
    pub departure_time: DateTime<Utc>,
    /// Estimated arrival time
    pub arrival_time: DateTime<Utc>,
    /// Provenance
    pub source: ItinerarySource,
}

impl Itinerary {
    /// Assemble an itinerary from ordered legs, deriving aggregates and timestamps
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EmptyItinerary` without legs and
    /// `DomainError::BrokenContinuity` when a leg does not start at the coded
    /// stop where the previous leg ends.
    pub fn from_legs(
        origin: GeoLocation,
        destination: GeoLocation,
        legs: Vec<TripLeg>,
        departure_time: DateTime<Utc>,
        source: ItinerarySource,
    ) -> Result<Self, DomainError> {
        if legs.is_empty() {
            return Err(DomainError::EmptyItinerary);
        }
        if let Some(leg_index) = Self::continuity_violation(&legs) {
            return Err(DomainError::BrokenContinuity { leg_index });
        }

        let total_duration_minutes = legs.iter().map(|l| l.duration_minutes).sum();
        let total_distance_km = legs.iter().map(|l| l.distance_km).sum();

        let mut routes: Vec<String> = Vec::new();
        for route in legs.iter().filter_map(|l| l.route_number.as_ref()) {
            if !routes.contains(route) {
                routes.push(route.clone());
            }
        }

        let arrival_time = departure_time + Duration::minutes(i64::from(total_duration_minutes));

        Ok(Self {
            origin,
            destination,
            legs,
            total_duration_minutes,
            total_distance_km,
            routes,
            departure_time,
            arrival_time,
            source,
        })
    }

    /// Append routes the legs do not name, such as a metro line ridden after the bus
    #[must_use]
    pub fn with_routes<I, S>(mut self, routes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for route in routes {
            let route = route.as_ref().trim();
            if !route.is_empty() && !self.routes.iter().any(|r| r == route) {
                self.routes.push(route.to_string());
            }
        }
        self
    }

    /// Index of the first leg whose start does not match the previous leg's end
    ///
    /// Only pairs where both stops carry a code are compared.
    #[must_use]
    pub fn continuity_violation(legs: &[TripLeg]) -> Option<usize> {
        legs.windows(2).enumerate().find_map(|(i, pair)| {
            let (prev, next) = (&pair[0], &pair[1]);
            let comparable = !prev.to.is_synthetic() && !next.from.is_synthetic();
            (comparable && !prev.to.same_stop(&next.from)).then_some(i + 1)
        })
    }

    /// Number of vehicle changes
    #[must_use]
    pub fn transfers(&self) -> usize {
        self.legs
            .iter()
            .filter(|l| l.kind.is_ride())
            .count()
            .saturating_sub(1)
    }

    /// Whether any leg carries low-fidelity geometry
    #[must_use]
    pub fn has_degraded_legs(&self) -> bool {
        self.legs.iter().any(TripLeg::is_degraded)
    }

    /// Format as a compact one-line summary
    #[must_use]
    pub fn format_summary(&self) -> String {
        let dep = self.departure_time.format("%H:%M");
        let arr = self.arrival_time.format("%H:%M");
        let route = if self.routes.is_empty() {
            "walk".to_string()
        } else {
            self.routes.join(" → ")
        };
        format!(
            "{dep} → {arr} ({}min, {:.1}km) {route}",
            self.total_duration_minutes, self.total_distance_km
        )
    }
}

impl fmt::Display for Itinerary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_summary())
    }
}
