//! Page scraper port
//!
//! The two third-party websites expose no API; the only contract is rendered
//! HTML obtained through a headless browser.

use async_trait::async_trait;
use domain::{GeoLocation, StopCode};
#[cfg(test)]
use mockall::automock;

use crate::error::ApplicationError;

/// What to render on the itinerary site
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    /// Origin place name shown on the page
    pub origin_name: String,
    /// Destination place name shown on the page
    pub destination_name: String,
    /// Origin coordinates
    pub origin: GeoLocation,
    /// Destination coordinates
    pub destination: GeoLocation,
    /// Which suggested itinerary to open (0 = first)
    pub option_index: usize,
}

/// Port for headless-browser page acquisition
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PageScraperPort: Send + Sync {
    /// Render the itinerary page and return the most complete HTML snapshot
    async fn fetch_itinerary_page(
        &self,
        request: &PageRequest,
    ) -> Result<String, ApplicationError>;

    /// Render the real-time arrivals page for one stop
    async fn fetch_arrivals_page(&self, stop_code: &StopCode) -> Result<String, ApplicationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn PageScraperPort>();
    }
}
