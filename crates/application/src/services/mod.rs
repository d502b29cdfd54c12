//! Application services - Use case implementations

mod arrivals_tracker;
mod fallback_catalogue;
mod itinerary_assembler;
mod planner_config;
mod trip_planner_service;

pub use arrivals_tracker::ArrivalsTracker;
pub use fallback_catalogue::{CatalogueRoute, CatalogueStop, FallbackCatalogue, FallbackMatch};
pub use itinerary_assembler::{ItineraryAssembler, PageHints};
pub use planner_config::{ArrivalsConfig, PlannerConfig};
pub use trip_planner_service::{TripPlannerService, TripQuery};
