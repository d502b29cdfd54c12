//! Transit stop entity

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value_objects::{GeoLocation, StopCode};

/// A transit stop, or a synthetic placeholder such as "your location"
///
/// Identity is the normalized stop code. A stop without a code is synthetic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    /// Signage code, `None` for synthetic placeholders
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<StopCode>,
    /// Internal schedule-store id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Human-readable name
    pub name: String,
    /// Stop position
    pub location: GeoLocation,
    /// Position within the trip it was read from
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sequence: Option<u32>,
}

impl Stop {
    /// Create a coded stop
    #[must_use]
    pub fn new(code: StopCode, name: impl Into<String>, location: GeoLocation) -> Self {
        Self {
            code: Some(code),
            id: None,
            name: name.into(),
            location,
            sequence: None,
        }
    }

    /// Create a synthetic placeholder stop (origin, destination, "your location")
    #[must_use]
    pub fn synthetic(name: impl Into<String>, location: GeoLocation) -> Self {
        Self {
            code: None,
            id: None,
            name: name.into(),
            location,
            sequence: None,
        }
    }

    /// Attach the schedule-store id
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Attach the sequence index within a trip
    #[must_use]
    pub const fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = Some(sequence);
        self
    }

    /// Whether this is a placeholder without a stop code
    #[must_use]
    pub const fn is_synthetic(&self) -> bool {
        self.code.is_none()
    }

    /// Identity comparison by stop code; synthetic stops never match
    #[must_use]
    pub fn same_stop(&self, other: &Self) -> bool {
        match (&self.code, &other.code) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Stop {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{} ({code})", self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn code(raw: &str) -> StopCode {
        StopCode::parse(raw).unwrap()
    }

    #[test]
    fn synthetic_stop_has_no_code() {
        let stop = Stop::synthetic("Your location", GeoLocation::santiago());
        assert!(stop.is_synthetic());
        assert_eq!(stop.to_string(), "Your location");
    }

    #[test]
    fn same_stop_compares_codes_only() {
        let a = Stop::new(code("PA433"), "Alameda / Cumming", GeoLocation::santiago());
        let b = Stop::new(code("pa433"), "Different name", GeoLocation::new_unchecked(0.0, 0.0));
        assert!(a.same_stop(&b));
    }

    #[test]
    fn synthetic_stops_never_match() {
        let a = Stop::synthetic("Origin", GeoLocation::santiago());
        let b = Stop::synthetic("Origin", GeoLocation::santiago());
        assert!(!a.same_stop(&b));
    }

    #[test]
    fn builder_sets_id_and_sequence() {
        let stop = Stop::new(code("PC12"), "Stop", GeoLocation::santiago())
            .with_id("stop-12")
            .with_sequence(4);
        assert_eq!(stop.id.as_deref(), Some("stop-12"));
        assert_eq!(stop.sequence, Some(4));
        assert_eq!(stop.to_string(), "Stop (PC12)");
    }
}
