//! Geographic location value object

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean Earth radius used for great-circle distances
const EARTH_RADIUS_KM: f64 = 6371.0;

/// A geographic location with latitude and longitude
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoLocation {
    /// Latitude in degrees (-90 to 90)
    latitude: f64,
    /// Longitude in degrees (-180 to 180)
    longitude: f64,
}

/// Error type for invalid coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidCoordinates;

impl fmt::Display for InvalidCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid coordinates: latitude must be -90 to 90, longitude must be -180 to 180"
        )
    }
}

impl std::error::Error for InvalidCoordinates {}

impl GeoLocation {
    /// Create a new location with validation
    ///
    /// # Errors
    ///
    /// Returns `InvalidCoordinates` if latitude is not in [-90, 90]
    /// or longitude is not in [-180, 180]
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, InvalidCoordinates> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(InvalidCoordinates);
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Create a location without validation (for trusted sources such as the schedule store)
    #[must_use]
    pub const fn new_unchecked(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Get the latitude
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Get the longitude
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }

    /// Calculate the great-circle distance to another location in kilometers
    ///
    /// Uses the Haversine formula
    #[must_use]
    pub fn distance_km(&self, other: &Self) -> f64 {
        let lat1_rad = self.latitude.to_radians();
        let lat2_rad = other.latitude.to_radians();
        let delta_lat = (other.latitude - self.latitude).to_radians();
        let delta_lon = (other.longitude - self.longitude).to_radians();

        let a = (lat1_rad.cos() * lat2_rad.cos()).mul_add(
            (delta_lon / 2.0).sin().powi(2),
            (delta_lat / 2.0).sin().powi(2),
        );
        let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

        EARTH_RADIUS_KM * c
    }

    /// Render the coordinates rounded to `decimals` places
    ///
    /// Two locations closer than the rounding step produce the same key,
    /// which is what the page cache relies on.
    #[must_use]
    pub fn quantized_key(&self, decimals: u8) -> String {
        let precision = usize::from(decimals);
        // `+ 0.0` folds negative zero so "-0.0000" never appears in a key
        let lat = round_to(self.latitude, decimals) + 0.0;
        let lon = round_to(self.longitude, decimals) + 0.0;
        format!("{lat:.precision$},{lon:.precision$}")
    }

    /// Index of the location in `candidates` closest to `self`, with its distance
    ///
    /// Ties resolve to the earliest candidate.
    #[must_use]
    pub fn nearest<'a, I>(&self, candidates: I) -> Option<(usize, f64)>
    where
        I: IntoIterator<Item = &'a Self>,
    {
        let mut best: Option<(usize, f64)> = None;
        for (index, candidate) in candidates.into_iter().enumerate() {
            let distance = self.distance_km(candidate);
            if best.is_none_or(|(_, d)| distance < d) {
                best = Some((index, distance));
            }
        }
        best
    }
}

fn round_to(value: f64, decimals: u8) -> f64 {
    let factor = 10f64.powi(i32::from(decimals));
    (value * factor).round() / factor
}

impl fmt::Display for GeoLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// Common locations for defaults
impl GeoLocation {
    /// Plaza de Armas, Santiago de Chile
    #[must_use]
    pub const fn santiago() -> Self {
        Self::new_unchecked(-33.4378, -70.6505)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_coordinates() {
        let loc = GeoLocation::new(-33.45, -70.65).expect("valid coordinates");
        assert!((loc.latitude() + 33.45).abs() < f64::EPSILON);
        assert!((loc.longitude() + 70.65).abs() < f64::EPSILON);
    }

    #[test]
    fn test_boundary_coordinates() {
        assert!(GeoLocation::new(90.0, 180.0).is_ok());
        assert!(GeoLocation::new(-90.0, -180.0).is_ok());
        assert!(GeoLocation::new(0.0, 0.0).is_ok());
    }

    #[test]
    fn test_invalid_latitude() {
        assert!(GeoLocation::new(91.0, 0.0).is_err());
        assert!(GeoLocation::new(-91.0, 0.0).is_err());
    }

    #[test]
    fn test_invalid_longitude() {
        assert!(GeoLocation::new(0.0, 181.0).is_err());
        assert!(GeoLocation::new(0.0, -181.0).is_err());
    }

    #[test]
    fn test_display() {
        let loc = GeoLocation::new(-33.45, -70.65).expect("valid");
        let display = format!("{loc}");
        assert!(display.contains("-33.45"));
        assert!(display.contains("-70.65"));
    }

    #[test]
    fn test_distance_same_location() {
        let loc = GeoLocation::santiago();
        assert!(loc.distance_km(&loc).abs() < 0.001);
    }

    #[test]
    fn test_distance_across_santiago() {
        // Roughly 1.45 km between these two points
        let a = GeoLocation::new_unchecked(-33.45, -70.65);
        let b = GeoLocation::new_unchecked(-33.46, -70.64);
        let distance = a.distance_km(&b);
        assert!((distance - 1.45).abs() < 0.05, "got {distance}");
    }

    #[test]
    fn test_quantized_key_groups_nearby_points() {
        let a = GeoLocation::new_unchecked(-33.450_01, -70.650_02);
        let b = GeoLocation::new_unchecked(-33.449_99, -70.649_98);
        assert_eq!(a.quantized_key(4), b.quantized_key(4));
        assert_eq!(a.quantized_key(4), "-33.4500,-70.6500");
    }

    #[test]
    fn test_quantized_key_separates_distant_points() {
        let a = GeoLocation::new_unchecked(-33.45, -70.65);
        let b = GeoLocation::new_unchecked(-33.46, -70.65);
        assert_ne!(a.quantized_key(4), b.quantized_key(4));
    }

    #[test]
    fn test_nearest_prefers_first_on_tie() {
        let origin = GeoLocation::new_unchecked(0.0, 0.0);
        let candidates = [
            GeoLocation::new_unchecked(0.0, 1.0),
            GeoLocation::new_unchecked(0.0, 0.1),
            GeoLocation::new_unchecked(0.0, -0.1),
        ];
        let (index, _) = origin.nearest(&candidates).expect("non-empty");
        assert_eq!(index, 1);
    }

    #[test]
    fn test_nearest_empty() {
        let origin = GeoLocation::santiago();
        let empty: [GeoLocation; 0] = [];
        assert!(origin.nearest(&empty).is_none());
    }

    #[test]
    fn test_serialization() {
        let loc = GeoLocation::new(-33.45, -70.65).expect("valid");
        let json = serde_json::to_string(&loc).expect("serialize");
        assert!(json.contains("latitude"));

        let deserialized: GeoLocation = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(loc, deserialized);
    }
}
