//! Routing data models
//!
//! Typed routes as returned to callers, plus the raw OSRM response shapes
//! they are decoded from.

use std::fmt;

use domain::GeoLocation;
use serde::{Deserialize, Serialize};

/// Which kind of traveller the route is computed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingProfile {
    /// Pedestrian
    Walk,
    /// Road vehicle (buses)
    Vehicle,
    /// Rail (metro)
    Transit,
}

impl fmt::Display for RoutingProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Walk => write!(f, "walk"),
            Self::Vehicle => write!(f, "vehicle"),
            Self::Transit => write!(f, "transit"),
        }
    }
}

/// A routed path between two points
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Distance in meters
    pub distance_m: f64,
    /// Duration in seconds
    pub duration_s: f64,
    /// Decoded path, origin first
    pub coordinates: Vec<GeoLocation>,
    /// Turn-by-turn instructions, empty unless steps were requested
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub instructions: Vec<String>,
}

// --- Raw API response types for deserialization ---

#[derive(Debug, Deserialize)]
pub(crate) struct RawRouteResponse {
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub routes: Vec<RawRoute>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawRoute {
    pub distance: f64,
    pub duration: f64,
    #[serde(default)]
    pub geometry: Option<String>,
    #[serde(default)]
    pub legs: Vec<RawLeg>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawLeg {
    #[serde(default)]
    pub steps: Vec<RawStep>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawStep {
    #[serde(default)]
    pub name: String,
    pub maneuver: RawManeuver,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RawManeuver {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub modifier: Option<String>,
}

impl RawStep {
    /// Render the step as a short spoken instruction
    ///
    /// Steps that neither turn nor name a street ("continue" on an unnamed
    /// path) produce nothing.
    pub(crate) fn instruction(&self) -> Option<String> {
        let street = self.name.trim();
        let modifier = self.maneuver.modifier.as_deref().unwrap_or("").trim();
        let onto = if street.is_empty() {
            String::new()
        } else {
            format!(" onto {street}")
        };

        let text = match self.maneuver.kind.as_str() {
            "depart" if street.is_empty() => "start walking".to_string(),
            "depart" => format!("head along {street}"),
            "arrive" => "arrive at your destination".to_string(),
            "turn" | "end of road" | "fork" if !modifier.is_empty() => {
                format!("turn {modifier}{onto}")
            },
            "roundabout" | "rotary" => format!("take the roundabout{onto}"),
            "continue" | "new name" if street.is_empty() => return None,
            "continue" | "new name" => format!("continue{onto}"),
            other if !modifier.is_empty() => format!("{other} {modifier}{onto}"),
            _ if street.is_empty() => return None,
            _ => format!("continue{onto}"),
        };
        Some(text)
    }
}
