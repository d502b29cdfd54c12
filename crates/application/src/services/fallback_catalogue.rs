//! Built-in routes for the distance-scoring fallback
//!
//! When scraping yields nothing usable, the planner still owes the rider an
//! itinerary. This module picks the known route whose stops sit closest to
//! both ends of the trip.

use domain::{GeoLocation, Stop, StopCode};
use serde::{Deserialize, Serialize};

/// A stop of a catalogue route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogueStop {
    /// Signage code; metro stations have none
    #[serde(default)]
    pub code: Option<String>,
    /// Display name
    pub name: String,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}

impl CatalogueStop {
    fn coded(code: &str, name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            code: Some(code.to_string()),
            name: name.to_string(),
            latitude,
            longitude,
        }
    }

    fn station(name: &str, latitude: f64, longitude: f64) -> Self {
        Self {
            code: None,
            name: name.to_string(),
            latitude,
            longitude,
        }
    }

    /// Stop position
    pub const fn location(&self) -> GeoLocation {
        GeoLocation::new_unchecked(self.latitude, self.longitude)
    }

    /// Domain stop; an unparsable code leaves the stop synthetic
    pub fn to_stop(&self, sequence: u32) -> Stop {
        let code = self.code.as_deref().and_then(|c| StopCode::parse(c).ok());
        let stop = match code {
            Some(code) => Stop::new(code, &self.name, self.location()),
            None => Stop::synthetic(&self.name, self.location()),
        };
        stop.with_sequence(sequence)
    }
}

/// A known route and its stops in travel order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogueRoute {
    /// Bus route number or metro line
    pub route_number: String,
    /// Ordered stops
    pub stops: Vec<CatalogueStop>,
}

/// The route chosen by the fallback scorer
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackMatch {
    /// Chosen route
    pub route_number: String,
    /// Stops from boarding to alighting, in riding order
    pub stops: Vec<Stop>,
    /// Walk to the boarding stop plus walk from the alighting stop, plus any penalty
    pub score_km: f64,
}

/// Catalogue of routes the fallback engine may pick from
#[derive(Debug, Clone, PartialEq)]
pub struct FallbackCatalogue {
    routes: Vec<CatalogueRoute>,
}

impl Default for FallbackCatalogue {
    fn default() -> Self {
        Self::santiago()
    }
}

impl FallbackCatalogue {
    /// Catalogue over custom routes
    #[must_use]
    pub const fn new(routes: Vec<CatalogueRoute>) -> Self {
        Self { routes }
    }

    /// Routes in enumeration order
    pub fn routes(&self) -> &[CatalogueRoute] {
        &self.routes
    }

    /// Pick the route minimizing walk-to-boarding plus walk-from-alighting
    ///
    /// A route whose boarding or alighting walk exceeds `max_walk_km` has
    /// `penalty_km` added to its score. Ties keep the first route enumerated.
    /// Routes where both ends map to the same stop cannot carry the rider
    /// anywhere and are skipped.
    pub fn best_match(
        &self,
        origin: GeoLocation,
        destination: GeoLocation,
        max_walk_km: f64,
        penalty_km: f64,
    ) -> Option<FallbackMatch> {
        let mut best: Option<(usize, usize, usize, f64)> = None;

        for (route_index, route) in self.routes.iter().enumerate() {
            let locations: Vec<GeoLocation> =
                route.stops.iter().map(CatalogueStop::location).collect();
            let (Some((board, to_board)), Some((alight, from_alight))) =
                (origin.nearest(&locations), destination.nearest(&locations))
            else {
                continue;
            };
            if board == alight {
                continue;
            }

            let mut score = to_board + from_alight;
            if to_board > max_walk_km || from_alight > max_walk_km {
                score += penalty_km;
            }

            if best.is_none_or(|(_, _, _, s)| score < s) {
                best = Some((route_index, board, alight, score));
            }
        }

        let (route_index, board, alight, score_km) = best?;
        let route = &self.routes[route_index];

        let mut stops: Vec<Stop> = if board < alight {
            route.stops[board..=alight]
                .iter()
                .zip(board..)
                .map(|(s, i)| s.to_stop(sequence(i)))
                .collect()
        } else {
            route.stops[alight..=board]
                .iter()
                .zip(alight..)
                .map(|(s, i)| s.to_stop(sequence(i)))
                .collect()
        };
        if board > alight {
            stops.reverse();
        }

        Some(FallbackMatch {
            route_number: route.route_number.clone(),
            stops,
            score_km,
        })
    }

    /// A few well-covered Santiago corridors
    #[must_use]
    pub fn santiago() -> Self {
        let alameda_bus = |route: &str| CatalogueRoute {
            route_number: route.to_string(),
            stops: vec![
                CatalogueStop::coded("PJ394", "Estación Central", -33.4516, -70.6793),
                CatalogueStop::coded("PA420", "Alameda / Av. España", -33.4489, -70.6702),
                CatalogueStop::coded("PA433", "Alameda / Los Héroes", -33.4462, -70.6604),
                CatalogueStop::coded("PA434", "Alameda / Estado", -33.4443, -70.6515),
                CatalogueStop::coded("PA437", "Alameda / Santa Lucía", -33.4425, -70.6446),
                CatalogueStop::coded("PA442", "Alameda / Plaza Italia", -33.4372, -70.6343),
            ],
        };

        Self::new(vec![
            alameda_bus("506"),
            CatalogueRoute {
                route_number: "210".to_string(),
                stops: vec![
                    CatalogueStop::coded("PA433", "Alameda / Los Héroes", -33.4462, -70.6604),
                    CatalogueStop::coded("PD120", "Av. Matta / San Diego", -33.4563, -70.6505),
                    CatalogueStop::coded("PD128", "Av. Matta / Santa Rosa", -33.4578, -70.6447),
                    CatalogueStop::coded("PD135", "Av. Matta / Portugal", -33.4594, -70.6380),
                    CatalogueStop::coded("PD141", "Av. Matta / Vicuña Mackenna", -33.4610, -70.6316),
                ],
            },
            CatalogueRoute {
                route_number: "L1".to_string(),
                stops: vec![
                    CatalogueStop::station("Los Héroes", -33.4462, -70.6604),
                    CatalogueStop::station("La Moneda", -33.4451, -70.6544),
                    CatalogueStop::station("Universidad de Chile", -33.4443, -70.6515),
                    CatalogueStop::station("Santa Lucía", -33.4425, -70.6446),
                    CatalogueStop::station("Universidad Católica", -33.4403, -70.6405),
                    CatalogueStop::station("Baquedano", -33.4372, -70.6343),
                    CatalogueStop::station("Salvador", -33.4333, -70.6265),
                    CatalogueStop::station("Manuel Montt", -33.4300, -70.6156),
                    CatalogueStop::station("Tobalaba", -33.4182, -70.6018),
                ],
            },
            CatalogueRoute {
                route_number: "L2".to_string(),
                stops: vec![
                    CatalogueStop::station("Puente Cal y Canto", -33.4327, -70.6526),
                    CatalogueStop::station("Santa Ana", -33.4384, -70.6594),
                    CatalogueStop::station("Los Héroes", -33.4462, -70.6604),
                    CatalogueStop::station("Toesca", -33.4541, -70.6601),
                    CatalogueStop::station("Parque O'Higgins", -33.4620, -70.6610),
                    CatalogueStop::station("Rondizzoni", -33.4705, -70.6565),
                    CatalogueStop::station("Franklin", -33.4768, -70.6490),
                ],
            },
        ])
    }
}

fn sequence(index: usize) -> u32 {
    u32::try_from(index).unwrap_or(u32::MAX)
}
