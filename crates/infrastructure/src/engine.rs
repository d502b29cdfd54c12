//! Engine wiring
//!
//! Builds the adapters from [`AppConfig`] and exposes the four public
//! operations: lightweight options, detailed itinerary, heuristic itinerary
//! and real-time arrivals.

use std::sync::Arc;

use application::{
    ArrivalsTracker, TripPlannerService, TripQuery,
    error::ApplicationError,
    ports::{Clock, PageScraperPort, RoutingEnginePort, ScheduleStorePort, SystemClock},
};
use domain::{Itinerary, LightweightOption, StopArrivals};
use serde::Serialize;
use tracing::{info, instrument};

use crate::{
    adapters::{BrowserPageScraper, RoutingEngineAdapter},
    config::AppConfig,
    persistence::SqliteScheduleStore,
};

/// Reachability of the external collaborators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct EngineHealth {
    /// A WebDriver endpoint answered or a local driver started;
    /// `None` when the scraper is not browser-backed
    pub browser: Option<bool>,
    /// The routing engine answered its health probe
    pub routing_engine: bool,
}

/// Fully wired itinerary and arrivals engine
pub struct TransitEngine {
    planner: TripPlannerService,
    arrivals: ArrivalsTracker,
    routing: Arc<dyn RoutingEnginePort>,
    browser: Option<Arc<BrowserPageScraper>>,
}

impl std::fmt::Debug for TransitEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitEngine")
            .field("planner", &self.planner)
            .field("arrivals", &self.arrivals)
            .field("browser", &self.browser)
            .finish_non_exhaustive()
    }
}

impl TransitEngine {
    /// Open the schedule database and build every adapter
    ///
    /// Neither the browser nor the routing engine is contacted here.
    #[instrument(skip_all, fields(schedule = %config.schedule.path))]
    pub async fn from_config(config: &AppConfig) -> Result<Self, ApplicationError> {
        config
            .validate()
            .map_err(|e| ApplicationError::Configuration(e.to_string()))?;

        let schedule = SqliteScheduleStore::open(&config.schedule).await?;
        let browser = Arc::new(BrowserPageScraper::with_config(config.browser.clone())?);
        let routing = RoutingEngineAdapter::with_config(&config.routing)?;

        let mut engine = Self::from_parts(
            config,
            Arc::clone(&browser) as Arc<dyn PageScraperPort>,
            Arc::new(schedule),
            Arc::new(routing),
        );
        engine.browser = Some(browser);

        info!("Transit engine ready");
        Ok(engine)
    }

    /// Wire the services to caller-supplied ports
    pub fn from_parts(
        config: &AppConfig,
        scraper: Arc<dyn PageScraperPort>,
        schedule: Arc<dyn ScheduleStorePort>,
        routing: Arc<dyn RoutingEnginePort>,
    ) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let planner = TripPlannerService::new(
            Arc::clone(&scraper),
            schedule,
            Arc::clone(&routing),
            Arc::clone(&clock),
            config.planner.clone(),
        );
        let arrivals = ArrivalsTracker::new(scraper, clock, config.arrivals.clone());

        Self {
            planner,
            arrivals,
            routing,
            browser: None,
        }
    }

    /// Phase 1: every option on the results page, summarized
    pub async fn lightweight_options(
        &self,
        query: &TripQuery,
    ) -> Result<Vec<LightweightOption>, ApplicationError> {
        self.planner.lightweight_options(query).await
    }

    /// Phase 2: full itinerary for one option (0-based)
    pub async fn detailed_itinerary(
        &self,
        query: &TripQuery,
        option_index: usize,
    ) -> Result<Itinerary, ApplicationError> {
        self.planner.detailed_itinerary(query, option_index).await
    }

    /// Itinerary from the built-in catalogue, no scraping
    pub async fn heuristic_itinerary(&self, query: &TripQuery) -> Result<Itinerary, ApplicationError> {
        self.planner.heuristic_itinerary(query).await
    }

    /// Real-time arrivals with passed buses inferred
    pub async fn arrivals(&self, stop_code: &str) -> Result<StopArrivals, ApplicationError> {
        self.arrivals.arrivals(stop_code).await
    }

    /// Probe the browser and the routing engine
    pub async fn health(&self) -> EngineHealth {
        let browser = match &self.browser {
            Some(browser) => Some(browser.is_available().await),
            None => None,
        };

        EngineHealth {
            browser,
            routing_engine: self.routing.is_available().await,
        }
    }
}
