//! Application layer - Use cases and orchestration
//!
//! Contains the itinerary pipeline: port definitions for the schedule store,
//! routing engine and page scraper, the heuristic HTML extractor, and the
//! services that fuse their output into itineraries and arrival reports.

pub mod error;
pub mod extraction;
pub mod ports;
pub mod retry;
pub mod services;
pub mod ttl_cache;

pub use error::ApplicationError;
pub use extraction::{Coverage, ExtractedFacts, HtmlExtractor, OptionFacts};
pub use ports::*;
pub use retry::{RetryConfig, Retryable, retry, with_retry};
pub use services::*;
pub use ttl_cache::TtlCache;
