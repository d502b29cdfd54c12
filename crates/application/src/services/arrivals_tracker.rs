//! Real-time arrivals with passed-bus inference
//!
//! The arrivals page only lists vehicles still approaching. Whether a bus
//! has just left is inferred by comparing each reading with the previous
//! one for the same stop. This is an approximation: a bus that vanishes may
//! also have gone out of service, and a distance jump may be a GPS glitch.

use std::sync::Arc;

use domain::{ArrivalObservation, BusArrival, StopArrivals, StopCode};
use tracing::{debug, info, instrument};

use super::planner_config::ArrivalsConfig;
use crate::error::ApplicationError;
use crate::extraction::{ArrivalRow, HtmlExtractor};
use crate::ports::{Clock, PageScraperPort};
use crate::ttl_cache::TtlCache;

/// Polls arrivals pages and remembers the last reading per stop
pub struct ArrivalsTracker {
    scraper: Arc<dyn PageScraperPort>,
    extractor: HtmlExtractor,
    history: TtlCache<StopCode, Vec<ArrivalObservation>>,
    clock: Arc<dyn Clock>,
    config: ArrivalsConfig,
}

impl std::fmt::Debug for ArrivalsTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArrivalsTracker")
            .field("history", &self.history)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ArrivalsTracker {
    /// Create a tracker with an empty history
    pub fn new(
        scraper: Arc<dyn PageScraperPort>,
        clock: Arc<dyn Clock>,
        config: ArrivalsConfig,
    ) -> Self {
        Self {
            scraper,
            extractor: HtmlExtractor::new(),
            history: TtlCache::new(config.history_ttl(), Arc::clone(&clock)),
            clock,
            config,
        }
    }

    /// Current arrivals at `stop_code`, with vehicles that just passed flagged
    #[instrument(skip(self))]
    pub async fn arrivals(&self, stop_code: &str) -> Result<StopArrivals, ApplicationError> {
        let code = StopCode::parse(stop_code)?;
        let html = self.scraper.fetch_arrivals_page(&code).await?;
        let rows = self.extractor.arrivals(&html);
        let fetched_at = self.clock.now();

        let current: Vec<ArrivalObservation> = rows
            .iter()
            .map(|row| ArrivalObservation {
                route_number: row.route_number.clone(),
                distance_km: row.distance_km,
                seen_at: fetched_at,
            })
            .collect();

        let arrivals = self.history.update(code.clone(), |previous| {
            let arrivals = infer_passed(previous.map_or(&[][..], Vec::as_slice), &rows, &self.config);
            (current, arrivals)
        });

        let passed = arrivals.iter().filter(|a| a.just_passed).count();
        if passed > 0 {
            info!(stop = %code, passed, "Buses inferred as just passed");
        }
        debug!(stop = %code, vehicles = arrivals.len(), "Arrivals read");

        Ok(StopArrivals {
            stop_code: code,
            arrivals,
            fetched_at,
        })
    }

    /// Stops with a live history, for diagnostics
    pub fn tracked_stops(&self) -> usize {
        self.history.prune_expired();
        self.history.len()
    }
}

/// Compare the previous reading with the current rows
///
/// A route seen within `passed_within_km` that is gone entirely now has
/// passed. A row beyond `restart_far_km` for a route previously seen within
/// `restart_near_km` is a new run of that route, so the old one passed.
fn infer_passed(
    previous: &[ArrivalObservation],
    rows: &[ArrivalRow],
    config: &ArrivalsConfig,
) -> Vec<BusArrival> {
    let was_near = |route: &str, limit: f64| {
        previous
            .iter()
            .any(|p| p.route_number == route && p.distance_km <= limit)
    };

    let mut arrivals: Vec<BusArrival> = rows
        .iter()
        .map(|row| {
            let restarted = row.distance_km > config.restart_far_km
                && was_near(&row.route_number, config.restart_near_km);
            BusArrival {
                route_number: row.route_number.clone(),
                distance_km: row.distance_km,
                just_passed: restarted,
            }
        })
        .collect();

    let mut vanished: Vec<&ArrivalObservation> = Vec::new();
    for observation in previous {
        if observation.distance_km > config.passed_within_km
            || rows.iter().any(|r| r.route_number == observation.route_number)
        {
            continue;
        }
        match vanished
            .iter_mut()
            .find(|v| v.route_number == observation.route_number)
        {
            Some(existing) if observation.distance_km < existing.distance_km => {
                *existing = observation;
            },
            Some(_) => {},
            None => vanished.push(observation),
        }
    }

    arrivals.extend(vanished.into_iter().map(|v| BusArrival {
        route_number: v.route_number.clone(),
        distance_km: v.distance_km,
        just_passed: true,
    }));
    arrivals
}
