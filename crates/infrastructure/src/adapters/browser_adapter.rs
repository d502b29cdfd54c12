//! Browser adapter - Implements PageScraperPort using integration_browser

use application::{
    error::ApplicationError,
    ports::{PageRequest, PageScraperPort},
};
use async_trait::async_trait;
use domain::StopCode;
use integration_browser::{BrowserConfig, BrowserController, BrowserError, ItineraryTarget};
use tracing::{debug, instrument};

/// Page scraper backed by a headless browser
pub struct BrowserPageScraper {
    controller: BrowserController,
}

impl std::fmt::Debug for BrowserPageScraper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserPageScraper")
            .field("controller", &"BrowserController")
            .field("remote", &self.controller.config().webdriver_url)
            .finish()
    }
}

impl BrowserPageScraper {
    /// Create with custom configuration
    ///
    /// No browser is started until the first fetch.
    pub fn with_config(config: BrowserConfig) -> Result<Self, ApplicationError> {
        let controller = BrowserController::new(config).map_err(Self::map_error)?;
        Ok(Self { controller })
    }

    /// Whether a driver can be reached or started
    pub async fn is_available(&self) -> bool {
        self.controller.is_available().await
    }

    /// Map integration browser error to application error
    fn map_error(err: BrowserError) -> ApplicationError {
        if err.is_unavailable() {
            return ApplicationError::BrowserUnavailable(err.to_string());
        }
        match err {
            BrowserError::Timeout { timeout_secs }
            | BrowserError::ElementTimeout { timeout_secs, .. } => {
                ApplicationError::ScrapeTimeout { timeout_secs }
            },
            BrowserError::ConfigurationError(e) => ApplicationError::Configuration(e),
            other => ApplicationError::ExternalService(other.to_string()),
        }
    }

    fn target(request: &PageRequest) -> ItineraryTarget {
        ItineraryTarget {
            origin_name: request.origin_name.clone(),
            destination_name: request.destination_name.clone(),
            origin: request.origin,
            destination: request.destination,
            option_index: request.option_index,
        }
    }
}

#[async_trait]
impl PageScraperPort for BrowserPageScraper {
    #[instrument(skip(self, request), fields(option = request.option_index))]
    async fn fetch_itinerary_page(
        &self,
        request: &PageRequest,
    ) -> Result<String, ApplicationError> {
        let html = self
            .controller
            .fetch_itinerary(&Self::target(request))
            .await
            .map_err(Self::map_error)?;
        debug!(bytes = html.len(), "Itinerary page fetched");
        Ok(html)
    }

    #[instrument(skip(self), fields(stop = %stop_code))]
    async fn fetch_arrivals_page(&self, stop_code: &StopCode) -> Result<String, ApplicationError> {
        let html = self
            .controller
            .fetch_arrivals(stop_code.as_str())
            .await
            .map_err(Self::map_error)?;
        debug!(bytes = html.len(), "Arrivals page fetched");
        Ok(html)
    }
}
