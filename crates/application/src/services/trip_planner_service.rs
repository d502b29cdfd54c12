//! Two-phase itinerary planning
//!
//! Phase 1 renders the results page, caches it and lists every option as a
//! cheap spoken summary. Phase 2 takes the option the rider picked, reuses
//! the cached page when it is still fresh and actually holds that option, and
//! assembles the full itinerary.

use std::fmt;
use std::sync::Arc;

use domain::{GeoLocation, Itinerary, LightweightOption, Stop, StopCode};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::itinerary_assembler::{ItineraryAssembler, PageHints};
use super::planner_config::PlannerConfig;
use crate::error::ApplicationError;
use crate::extraction::HtmlExtractor;
use crate::ports::{
    Clock, PageRequest, PageScraperPort, RoutingEnginePort, ScheduleStorePort,
};
use crate::retry::retry;
use crate::ttl_cache::TtlCache;

/// Origin and destination of a trip request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripQuery {
    /// Origin name as the itinerary site should show it
    pub origin_name: String,
    /// Destination name as the itinerary site should show it
    pub destination_name: String,
    /// Origin coordinates
    pub origin: GeoLocation,
    /// Destination coordinates
    pub destination: GeoLocation,
}

impl TripQuery {
    /// Query named after its coordinates
    pub fn new(origin: GeoLocation, destination: GeoLocation) -> Self {
        Self {
            origin_name: origin.to_string(),
            destination_name: destination.to_string(),
            origin,
            destination,
        }
    }

    /// Replace the place names
    #[must_use]
    pub fn with_names(
        mut self,
        origin_name: impl Into<String>,
        destination_name: impl Into<String>,
    ) -> Self {
        self.origin_name = origin_name.into();
        self.destination_name = destination_name.into();
        self
    }

    /// Page cache key: both endpoints quantized to `decimals`
    pub fn cache_key(&self, decimals: u8) -> String {
        format!(
            "{}|{}",
            self.origin.quantized_key(decimals),
            self.destination.quantized_key(decimals)
        )
    }

    fn page_request(&self, option_index: usize) -> PageRequest {
        PageRequest {
            origin_name: self.origin_name.clone(),
            destination_name: self.destination_name.clone(),
            origin: self.origin,
            destination: self.destination,
            option_index,
        }
    }
}

/// A rendered results page and the option indices phase 1 offered from it
#[derive(Debug, Clone)]
struct CachedPage {
    html: Arc<str>,
    offered: Arc<[usize]>,
}

/// Orchestrates scraping, extraction and assembly across both phases
pub struct TripPlannerService {
    scraper: Arc<dyn PageScraperPort>,
    schedule: Arc<dyn ScheduleStorePort>,
    assembler: ItineraryAssembler,
    extractor: HtmlExtractor,
    pages: TtlCache<String, CachedPage>,
    config: PlannerConfig,
}

impl fmt::Debug for TripPlannerService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TripPlannerService")
            .field("assembler", &self.assembler)
            .field("pages", &self.pages)
            .finish_non_exhaustive()
    }
}

impl TripPlannerService {
    /// Wire the planner to its ports
    pub fn new(
        scraper: Arc<dyn PageScraperPort>,
        schedule: Arc<dyn ScheduleStorePort>,
        routing: Arc<dyn RoutingEnginePort>,
        clock: Arc<dyn Clock>,
        config: PlannerConfig,
    ) -> Self {
        let pages = TtlCache::new(config.html_cache_ttl(), Arc::clone(&clock));
        let assembler =
            ItineraryAssembler::new(routing, Arc::clone(&schedule), clock, config.clone());

        Self {
            scraper,
            schedule,
            assembler,
            extractor: HtmlExtractor::new(),
            pages,
            config,
        }
    }

    /// Phase 1: fresh scrape, cached for phase 2, summarized per option
    #[instrument(skip(self, query), fields(origin = %query.origin, destination = %query.destination))]
    pub async fn lightweight_options(
        &self,
        query: &TripQuery,
    ) -> Result<Vec<LightweightOption>, ApplicationError> {
        let html = self
            .scraper
            .fetch_itinerary_page(&query.page_request(0))
            .await?;
        let options: Vec<LightweightOption> = self
            .extractor
            .lightweight_options(&html)
            .into_iter()
            .map(LightweightOption::from)
            .collect();

        if options.is_empty() {
            return Err(ApplicationError::ExtractionIncomplete(
                "results page lists no itinerary options".to_string(),
            ));
        }

        self.pages.insert(
            query.cache_key(self.config.coordinate_precision),
            CachedPage {
                html: Arc::from(html),
                offered: options.iter().map(|o| o.index).collect(),
            },
        );

        info!(count = options.len(), "Lightweight options extracted");
        Ok(options)
    }

    /// Phase 2: full itinerary for the option at `option_index`
    #[instrument(skip(self, query), fields(origin = %query.origin, destination = %query.destination))]
    pub async fn detailed_itinerary(
        &self,
        query: &TripQuery,
        option_index: usize,
    ) -> Result<Itinerary, ApplicationError> {
        let html = self.page_for_option(query, option_index).await?;

        let facts = self.extractor.extract_option(&html, option_index);
        if facts.coverage.is_absent() {
            return Err(ApplicationError::InvalidInput(format!(
                "the itinerary page has no option {}",
                option_index + 1
            )));
        }
        if facts.is_empty() {
            return Err(ApplicationError::ExtractionIncomplete(format!(
                "no transit facts found for option {}",
                option_index + 1
            )));
        }

        let stops = self.resolve_stops(&facts.stop_codes).await;
        self.assembler
            .assemble(&PageHints::from(&facts), &stops, query.origin, query.destination)
            .await
    }

    /// Itinerary from the fallback catalogue, without scraping
    #[instrument(skip(self, query), fields(origin = %query.origin, destination = %query.destination))]
    pub async fn heuristic_itinerary(
        &self,
        query: &TripQuery,
    ) -> Result<Itinerary, ApplicationError> {
        self.assembler.heuristic(query.origin, query.destination).await
    }

    async fn page_for_option(
        &self,
        query: &TripQuery,
        option_index: usize,
    ) -> Result<Arc<str>, ApplicationError> {
        let key = query.cache_key(self.config.coordinate_precision);
        match self.pages.get(&key) {
            Some(page) if !page.offered.contains(&option_index) => {
                return Err(ApplicationError::InvalidInput(format!(
                    "option {} was not offered; choose one of {}",
                    option_index + 1,
                    page.offered
                        .iter()
                        .map(|i| (i + 1).to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )));
            },
            Some(page) if !self.extractor.coverage(&page.html, option_index).is_absent() => {
                debug!(key, option_index, "HTML cache hit");
                return Ok(page.html);
            },
            Some(_) => {
                debug!(key, option_index, "Cached page does not hold this option, scraping it");
            },
            None => debug!(key, option_index, "HTML cache miss, scraping option"),
        }

        let request = query.page_request(option_index);
        let html = retry(&self.config.detail_retry(), || {
            self.scraper.fetch_itinerary_page(&request)
        })
        .await?;
        Ok(Arc::from(html))
    }

    /// Look every code up; unknown codes are skipped
    async fn resolve_stops(&self, codes: &[StopCode]) -> Vec<Stop> {
        let lookups = join_all(codes.iter().map(|code| self.schedule.stop_by_code(code.as_str()))).await;

        codes
            .iter()
            .zip(lookups)
            .filter_map(|(code, lookup)| match lookup {
                Ok(Some(stop)) => Some(stop),
                Ok(None) => {
                    let err = ApplicationError::StopNotFound(code.to_string());
                    warn!(error = %err, "Skipping stop");
                    None
                },
                Err(e) => {
                    warn!(code = %code, error = %e, "Stop lookup failed, skipping");
                    None
                },
            })
            .collect()
    }
}
