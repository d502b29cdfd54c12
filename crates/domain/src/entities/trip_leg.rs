//! Itinerary leg entity

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Stop;
use crate::value_objects::GeoLocation;

/// Kind of movement a leg represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegKind {
    /// On foot
    Walk,
    /// Riding a bus
    RideBus,
    /// Riding the metro
    RideMetro,
}

impl LegKind {
    /// Ride kind for a route identifier: metro lines ride the metro, everything else a bus
    #[must_use]
    pub fn ride_for_route(route: &str) -> Self {
        if normalize_metro_line(route).is_some() {
            Self::RideMetro
        } else {
            Self::RideBus
        }
    }

    /// Human-readable mode label
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Walk => "Walk",
            Self::RideBus => "Bus",
            Self::RideMetro => "Metro",
        }
    }

    /// Whether the leg is spent aboard a vehicle
    #[must_use]
    pub const fn is_ride(&self) -> bool {
        matches!(self, Self::RideBus | Self::RideMetro)
    }
}

impl fmt::Display for LegKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Where a leg's geometry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GeometrySource {
    /// Street-level geometry from the routing engine
    Routed,
    /// Straight line between the endpoints, routing engine unavailable
    StraightLine,
    /// No geometry at all
    Missing,
}

/// One contiguous segment of a journey sharing a single mode
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripLeg {
    /// Movement kind
    pub kind: LegKind,
    /// Mode label shown to the rider
    pub mode: String,
    /// Route number or metro line (ride legs only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_number: Option<String>,
    /// Where the leg starts
    pub from: Stop,
    /// Where the leg ends
    pub to: Stop,
    /// Duration in whole minutes, rounded up
    pub duration_minutes: u32,
    /// Distance in kilometers
    pub distance_km: f64,
    /// Human-readable instruction
    pub instruction: String,
    /// Ordered path geometry
    pub polyline: Vec<GeoLocation>,
    /// Provenance of `polyline`
    pub geometry: GeometrySource,
    /// Ordered stops served on a ride leg, endpoints included
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stops: Vec<Stop>,
    /// Number of stops travelled on a ride leg
    #[serde(default)]
    pub stop_count: u32,
}

impl TripLeg {
    /// Create a leg with empty geometry; callers fill in the measured fields
    #[must_use]
    pub fn new(kind: LegKind, from: Stop, to: Stop) -> Self {
        Self {
            kind,
            mode: kind.label().to_string(),
            route_number: None,
            from,
            to,
            duration_minutes: 0,
            distance_km: 0.0,
            instruction: String::new(),
            polyline: Vec::new(),
            geometry: GeometrySource::Missing,
            stops: Vec::new(),
            stop_count: 0,
        }
    }

    /// Whether downstream consumers should treat this leg as low fidelity
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.polyline.is_empty() || self.geometry != GeometrySource::Routed
    }
}

/// Canonicalize a metro line identifier ("Línea 4a", "l5", "L1") to "L4A", "L5", "L1"
///
/// Returns `None` when the input is not a metro line.
#[must_use]
pub fn normalize_metro_line(raw: &str) -> Option<String> {
    let upper = raw.trim().to_uppercase();
    let mut rest = upper.as_str();
    let mut prefixed = false;

    for prefix in ["LÍNEA", "LINEA", "LINE", "METRO"] {
        if let Some(stripped) = rest.strip_prefix(prefix) {
            rest = stripped.trim_start();
            prefixed = true;
            break;
        }
    }
    if let Some(stripped) = rest.strip_prefix('L') {
        rest = stripped;
        prefixed = true;
    }
    // a bare "12" is a bus service, not line 12
    if !prefixed {
        return None;
    }

    let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
    let suffix = &rest[digits.len()..];
    if digits.is_empty() || digits.len() > 2 || !(suffix.is_empty() || suffix == "A") {
        return None;
    }

    Some(format!("L{digits}{suffix}"))
}
