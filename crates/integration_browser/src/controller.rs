//! Staged page acquisition
//!
//! An itinerary fetch runs five stages against one fresh session:
//! wait for the option list, open the selected option, expand stop lists,
//! scroll to the bottom, and record in-page findings on a marker element.
//! The page source is captured after every stage and the longest capture is
//! returned, so a stage that breaks the page does not lose earlier content.

use std::time::Duration;

use domain::GeoLocation;
use domain::markers::{
    EXTRACTION_MARKER_ID, MARKER_METRO_ATTR, MARKER_OPTION_ATTR, MARKER_ROUTES_ATTR,
    MARKER_STOPS_ATTR,
};
use serde_json::{Value, json};
use tokio::sync::OnceCell;
use tokio::time::{Instant, timeout_at};
use tracing::{debug, info, instrument, warn};

use crate::config::BrowserConfig;
use crate::driver::{self, DriverEndpoint};
use crate::error::BrowserError;
use crate::page_url::{arrivals_url, itinerary_url};
use crate::scripts;
use crate::webdriver::{Session, WebDriverClient, capabilities};

/// What to render on the itinerary site
#[derive(Debug, Clone, PartialEq)]
pub struct ItineraryTarget {
    /// Origin place name
    pub origin_name: String,
    /// Destination place name
    pub destination_name: String,
    /// Origin coordinates
    pub origin: GeoLocation,
    /// Destination coordinates
    pub destination: GeoLocation,
    /// Suggested option to open (0 = first)
    pub option_index: usize,
}

#[derive(Debug)]
struct Snapshot {
    stage: &'static str,
    html: String,
}

/// Renders pages through WebDriver, one isolated session per fetch
#[derive(Debug)]
pub struct BrowserController {
    config: BrowserConfig,
    endpoint: OnceCell<DriverEndpoint>,
}

impl BrowserController {
    /// Create a controller; the driver is located and launched on first use
    ///
    /// # Errors
    ///
    /// Returns `BrowserError::ConfigurationError` if the configuration is invalid.
    pub fn new(config: BrowserConfig) -> Result<Self, BrowserError> {
        config.validate().map_err(BrowserError::ConfigurationError)?;
        Ok(Self {
            config,
            endpoint: OnceCell::new(),
        })
    }

    /// The active configuration
    pub const fn config(&self) -> &BrowserConfig {
        &self.config
    }

    /// Render the itinerary page and return the most complete snapshot
    ///
    /// # Errors
    ///
    /// Fails if no browser runtime is available, if the option list never
    /// becomes visible, or if the deadline passes before the first snapshot.
    #[instrument(skip(self, target), fields(option = target.option_index))]
    pub async fn fetch_itinerary(&self, target: &ItineraryTarget) -> Result<String, BrowserError> {
        let url = itinerary_url(
            &self.config.itinerary_url_template,
            &target.origin_name,
            &target.destination_name,
            target.origin,
            target.destination,
        )?;
        let deadline = Instant::now() + self.page_timeout();

        let session = self.open_session(deadline).await?;
        let mut snapshots = Vec::new();
        let outcome = timeout_at(
            deadline,
            self.run_stages(&session, &url, target.option_index, &mut snapshots),
        )
        .await;
        Self::release(session).await;

        match outcome {
            Ok(Ok(())) => {},
            Ok(Err(e)) => return Err(e),
            Err(_) if snapshots.is_empty() => {
                return Err(BrowserError::Timeout {
                    timeout_secs: self.config.page_timeout_secs,
                });
            },
            Err(_) => warn!(
                captured = snapshots.len(),
                "Deadline reached mid-script, using snapshots so far"
            ),
        }

        let best = snapshots
            .into_iter()
            .max_by_key(|s| s.html.len())
            .ok_or(BrowserError::Timeout {
                timeout_secs: self.config.page_timeout_secs,
            })?;
        info!(stage = best.stage, bytes = best.html.len(), "Itinerary page rendered");
        Ok(best.html)
    }

    /// Render the arrivals page for one stop
    ///
    /// # Errors
    ///
    /// Fails if no browser runtime is available or the table never appears.
    #[instrument(skip(self))]
    pub async fn fetch_arrivals(&self, stop_code: &str) -> Result<String, BrowserError> {
        let url = arrivals_url(&self.config.arrivals_url_template, stop_code)?;
        let deadline = Instant::now() + self.page_timeout();

        let session = self.open_session(deadline).await?;
        let outcome = timeout_at(deadline, async {
            session.navigate(&url).await?;
            self.wait_visible(&session, &self.config.arrivals_table_selector)
                .await?;
            session.source().await
        })
        .await;
        Self::release(session).await;

        let html = outcome.map_err(|_| BrowserError::Timeout {
            timeout_secs: self.config.page_timeout_secs,
        })??;
        debug!(bytes = html.len(), "Arrivals page rendered");
        Ok(html)
    }

    /// Whether a browser runtime can be reached or launched
    pub async fn is_available(&self) -> bool {
        if let Some(endpoint) = self.endpoint.get() {
            return Self::endpoint_ready(&endpoint.url).await;
        }
        match &self.config.webdriver_url {
            Some(url) => Self::endpoint_ready(url).await,
            None => {
                let search_path = std::env::var_os("PATH");
                driver::locate(&self.config, search_path.as_deref()).is_ok()
            },
        }
    }

    async fn endpoint_ready(url: &str) -> bool {
        match WebDriverClient::new(url, Duration::from_secs(5)) {
            Ok(client) => client.is_ready().await,
            Err(_) => false,
        }
    }

    fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.config.page_timeout_secs)
    }

    async fn endpoint(&self) -> Result<&DriverEndpoint, BrowserError> {
        self.endpoint
            .get_or_try_init(|| async {
                match &self.config.webdriver_url {
                    Some(url) => Ok(DriverEndpoint::remote(
                        url,
                        self.config.browser_binary.clone(),
                    )),
                    None => DriverEndpoint::launch(&self.config).await,
                }
            })
            .await
    }

    async fn open_session(&self, deadline: Instant) -> Result<Session, BrowserError> {
        let opened = timeout_at(deadline, async {
            let endpoint = self.endpoint().await?;
            let client = WebDriverClient::new(&endpoint.url, self.page_timeout())?;
            client
                .new_session(capabilities(
                    &self.config,
                    endpoint.browser_binary.as_deref(),
                ))
                .await
        })
        .await;

        opened.map_err(|_| BrowserError::Timeout {
            timeout_secs: self.config.page_timeout_secs,
        })?
    }

    async fn release(session: Session) {
        let id = session.id().to_string();
        if let Err(e) = session.close().await {
            warn!(session = %id, error = %e, "Failed to close session");
        }
    }

    async fn run_stages(
        &self,
        session: &Session,
        url: &str,
        option_index: usize,
        snapshots: &mut Vec<Snapshot>,
    ) -> Result<(), BrowserError> {
        session.navigate(url).await?;
        self.wait_visible(session, &self.config.itinerary_list_selector)
            .await?;
        Self::snapshot(session, "option_list", snapshots).await;

        let selected = self
            .script_stage(
                session,
                "select_option",
                scripts::CLICK_OPTION,
                vec![json!(option_index), json!(self.config.option_selector)],
                snapshots,
            )
            .await;
        let clicked = selected.as_ref().and_then(Value::as_bool) == Some(true);
        if !clicked {
            warn!(option_index, "Option not selected, staying on the list");
        }

        self.script_stage(session, "expand_stops", scripts::EXPAND_STOPS, vec![], snapshots)
            .await;
        self.script_stage(session, "scroll", scripts::SCROLL_TO_BOTTOM, vec![], snapshots)
            .await;

        // marker only for an option that was actually opened
        if clicked {
            self.script_stage(
                session,
                "marker",
                scripts::INJECT_MARKER,
                vec![json!(option_index), marker_names()],
                snapshots,
            )
            .await;
        }

        Ok(())
    }

    /// Run one script, let the page settle, and capture the source
    ///
    /// Failures are logged and the stage is skipped.
    async fn script_stage(
        &self,
        session: &Session,
        stage: &'static str,
        script: &str,
        args: Vec<Value>,
        snapshots: &mut Vec<Snapshot>,
    ) -> Option<Value> {
        let result = match session.execute(script, args).await {
            Ok(value) => {
                debug!(stage, result = %value, "Stage script ran");
                Some(value)
            },
            Err(e) => {
                warn!(stage, error = %e, "Stage script failed");
                None
            },
        };

        if self.config.settle_delay_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.settle_delay_ms)).await;
        }
        Self::snapshot(session, stage, snapshots).await;
        result
    }

    async fn snapshot(session: &Session, stage: &'static str, snapshots: &mut Vec<Snapshot>) {
        match session.source().await {
            Ok(html) => {
                debug!(stage, bytes = html.len(), "Snapshot taken");
                snapshots.push(Snapshot { stage, html });
            },
            Err(e) => warn!(stage, error = %e, "Snapshot failed"),
        }
    }

    /// Poll until `selector` matches a displayed element
    async fn wait_visible(&self, session: &Session, selector: &str) -> Result<(), BrowserError> {
        let deadline = Instant::now() + Duration::from_secs(self.config.element_timeout_secs);
        let poll = Duration::from_millis(self.config.poll_interval_ms);

        loop {
            let visible = match session.find(selector).await? {
                Some(element) => matches!(session.is_displayed(&element).await, Ok(true)),
                None => false,
            };
            if visible {
                return Ok(());
            }
            if Instant::now() >= deadline {
                return Err(BrowserError::ElementTimeout {
                    selector: selector.to_string(),
                    timeout_secs: self.config.element_timeout_secs,
                });
            }
            tokio::time::sleep(poll).await;
        }
    }
}

fn marker_names() -> Value {
    json!({
        "id": EXTRACTION_MARKER_ID,
        "option": MARKER_OPTION_ATTR,
        "stops": MARKER_STOPS_ATTR,
        "metro": MARKER_METRO_ATTR,
        "routes": MARKER_ROUTES_ATTR,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_config_is_rejected() {
        let config = BrowserConfig {
            page_timeout_secs: 0,
            ..BrowserConfig::default()
        };
        assert!(matches!(
            BrowserController::new(config),
            Err(BrowserError::ConfigurationError(_))
        ));
    }

    #[test]
    fn marker_names_match_extractor_constants() {
        let names = marker_names();
        assert_eq!(names["id"], EXTRACTION_MARKER_ID);
        assert_eq!(names["stops"], MARKER_STOPS_ATTR);
    }

    #[tokio::test]
    async fn missing_local_driver_is_unavailable() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = BrowserConfig {
            driver_binary: Some(dir.path().join("chromedriver")),
            ..BrowserConfig::default()
        };
        let controller = BrowserController::new(config).unwrap();
        assert!(!controller.is_available().await);

        let err = controller.fetch_arrivals("PA433").await.unwrap_err();
        assert!(err.is_unavailable());
    }
}
