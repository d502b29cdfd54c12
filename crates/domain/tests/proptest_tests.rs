//! Property-based tests for domain value objects and entities
//!
//! These tests use proptest to verify invariants across many random inputs.

use chrono::{TimeZone, Utc};
use domain::{GeoLocation, Itinerary, ItinerarySource, LegKind, Stop, StopCode, TripLeg};
use proptest::prelude::*;

// ============================================================================
// GeoLocation Property Tests
// ============================================================================

mod geo_location_tests {
    use super::*;

    proptest! {
        #[test]
        fn valid_coordinates_create_location(
            lat in -90.0f64..=90.0f64,
            lon in -180.0f64..=180.0f64
        ) {
            let result = GeoLocation::new(lat, lon);
            prop_assert!(result.is_ok());
        }

        #[test]
        fn invalid_latitude_rejected(
            lat in prop_oneof![
                (-1000.0f64..-90.1f64),
                (90.1f64..1000.0f64)
            ],
            lon in -180.0f64..=180.0f64
        ) {
            prop_assert!(GeoLocation::new(lat, lon).is_err());
        }

        #[test]
        fn distance_is_symmetric(
            lat1 in -60.0f64..=60.0f64,
            lon1 in -170.0f64..=170.0f64,
            lat2 in -60.0f64..=60.0f64,
            lon2 in -170.0f64..=170.0f64
        ) {
            let a = GeoLocation::new_unchecked(lat1, lon1);
            let b = GeoLocation::new_unchecked(lat2, lon2);
            prop_assert!((a.distance_km(&b) - b.distance_km(&a)).abs() < 1e-6);
        }

        #[test]
        fn quantized_key_is_stable(
            lat in -90.0f64..=90.0f64,
            lon in -180.0f64..=180.0f64
        ) {
            let loc = GeoLocation::new_unchecked(lat, lon);
            prop_assert_eq!(loc.quantized_key(4), loc.quantized_key(4));
        }
    }
}

// ============================================================================
// StopCode Property Tests
// ============================================================================

mod stop_code_tests {
    use super::*;

    proptest! {
        #[test]
        fn normalization_is_idempotent(raw in "[a-zA-Z0-9 ]{1,10}") {
            if let Ok(code) = StopCode::parse(&raw) {
                let again = StopCode::parse(code.as_str()).unwrap();
                prop_assert_eq!(code, again);
            }
        }

        #[test]
        fn case_and_spacing_do_not_change_identity(raw in "[a-z]{1,2}[0-9]{1,4}") {
            let lower = StopCode::parse(&raw).unwrap();
            let spaced = StopCode::parse(&format!("  {}  ", raw.to_uppercase())).unwrap();
            prop_assert_eq!(lower, spaced);
        }
    }
}

// ============================================================================
// Itinerary continuity
// ============================================================================

mod itinerary_tests {
    use super::*;

    fn chain(codes: &[String]) -> Vec<TripLeg> {
        let stops: Vec<Stop> = codes
            .iter()
            .enumerate()
            .map(|(i, c)| {
                #[allow(clippy::cast_precision_loss)]
                let offset = i as f64 * 0.001;
                Stop::new(
                    StopCode::parse(c).unwrap(),
                    c.clone(),
                    GeoLocation::new_unchecked(-33.45 - offset, -70.65),
                )
            })
            .collect();

        stops
            .windows(2)
            .map(|pair| {
                let mut leg = TripLeg::new(LegKind::RideBus, pair[0].clone(), pair[1].clone());
                leg.duration_minutes = 2;
                leg.distance_km = 0.5;
                leg
            })
            .collect()
    }

    proptest! {
        #[test]
        fn chained_legs_are_continuous(codes in prop::collection::vec("P[A-Z][0-9]{1,3}", 2..8)) {
            let legs = chain(&codes);
            prop_assert_eq!(Itinerary::continuity_violation(&legs), None);

            let departure = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();
            let count = legs.len();
            let itinerary = Itinerary::from_legs(
                GeoLocation::santiago(),
                GeoLocation::santiago(),
                legs,
                departure,
                ItinerarySource::Scraped,
            ).unwrap();

            #[allow(clippy::cast_precision_loss)]
            let expected_km = count as f64 * 0.5;
            prop_assert!((itinerary.total_distance_km - expected_km).abs() < 1e-9);
            prop_assert_eq!(itinerary.total_duration_minutes as usize, count * 2);
        }
    }
}
