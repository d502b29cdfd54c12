//! Browser automation configuration

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Configuration for the headless browser controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserConfig {
    /// Remote WebDriver endpoint; when set, no local driver is launched
    #[serde(default)]
    pub webdriver_url: Option<String>,

    /// Path to the driver executable (searched on `PATH` when unset)
    #[serde(default)]
    pub driver_binary: Option<PathBuf>,

    /// Path to the browser executable (searched on `PATH` when unset)
    #[serde(default)]
    pub browser_binary: Option<PathBuf>,

    /// Port for a locally launched driver
    #[serde(default = "default_driver_port")]
    pub driver_port: u16,

    /// Run the browser without a window
    #[serde(default = "default_headless")]
    pub headless: bool,

    /// Overall deadline for one page fetch in seconds
    #[serde(default = "default_page_timeout_secs")]
    pub page_timeout_secs: u64,

    /// How long to wait for a required element in seconds
    #[serde(default = "default_element_timeout_secs")]
    pub element_timeout_secs: u64,

    /// Element polling interval in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Pause after each interactive stage in milliseconds
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Itinerary page URL with `{origin_name}`, `{destination_name}`,
    /// `{origin_lat}`, `{origin_lon}`, `{destination_lat}`, `{destination_lon}`
    #[serde(default = "default_itinerary_url_template")]
    pub itinerary_url_template: String,

    /// Arrivals page URL with `{stop_code}`
    #[serde(default = "default_arrivals_url_template")]
    pub arrivals_url_template: String,

    /// CSS selector of the itinerary list that must appear before anything else
    #[serde(default = "default_itinerary_list_selector")]
    pub itinerary_list_selector: String,

    /// CSS selector matching each suggested itinerary
    #[serde(default = "default_option_selector")]
    pub option_selector: String,

    /// CSS selector of the arrivals table
    #[serde(default = "default_arrivals_table_selector")]
    pub arrivals_table_selector: String,

    /// User agent presented by the browser
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

const fn default_driver_port() -> u16 {
    9515
}

const fn default_headless() -> bool {
    true
}

const fn default_page_timeout_secs() -> u64 {
    90
}

const fn default_element_timeout_secs() -> u64 {
    30
}

const fn default_poll_interval_ms() -> u64 {
    250
}

const fn default_settle_delay_ms() -> u64 {
    1500
}

fn default_itinerary_url_template() -> String {
    "https://moovitapp.com/tripplan/santiago-642/poi/{destination_name}/{origin_name}/es-419?fll={origin_lat}_{origin_lon}&tll={destination_lat}_{destination_lon}".to_string()
}

fn default_arrivals_url_template() -> String {
    "https://www.red.cl/planifica-tu-viaje/cuando-llega/?codsimt={stop_code}".to_string()
}

fn default_itinerary_list_selector() -> String {
    ".suggested-routes, [data-option-index]".to_string()
}

fn default_option_selector() -> String {
    ".suggested-route, [data-option-index]".to_string()
}

fn default_arrivals_table_selector() -> String {
    "table, .arrivals, #prediccion".to_string()
}

fn default_user_agent() -> String {
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36".to_string()
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            webdriver_url: None,
            driver_binary: None,
            browser_binary: None,
            driver_port: default_driver_port(),
            headless: default_headless(),
            page_timeout_secs: default_page_timeout_secs(),
            element_timeout_secs: default_element_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            itinerary_url_template: default_itinerary_url_template(),
            arrivals_url_template: default_arrivals_url_template(),
            itinerary_list_selector: default_itinerary_list_selector(),
            option_selector: default_option_selector(),
            arrivals_table_selector: default_arrivals_table_selector(),
            user_agent: default_user_agent(),
        }
    }
}

impl BrowserConfig {
    /// Create a configuration suitable for testing against a mock endpoint
    #[must_use]
    pub fn for_testing(webdriver_url: impl Into<String>) -> Self {
        Self {
            webdriver_url: Some(webdriver_url.into()),
            page_timeout_secs: 10,
            element_timeout_secs: 1,
            poll_interval_ms: 20,
            settle_delay_ms: 0,
            itinerary_url_template: "http://pages.test/plan?from={origin_name}&to={destination_name}&o={origin_lat},{origin_lon}&d={destination_lat},{destination_lon}".to_string(),
            arrivals_url_template: "http://pages.test/arrivals/{stop_code}".to_string(),
            ..Default::default()
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.page_timeout_secs == 0 {
            return Err("page_timeout_secs must be greater than 0".to_string());
        }

        if self.element_timeout_secs == 0 || self.element_timeout_secs > self.page_timeout_secs {
            return Err("element_timeout_secs must be between 1 and page_timeout_secs".to_string());
        }

        if self.poll_interval_ms == 0 {
            return Err("poll_interval_ms must be greater than 0".to_string());
        }

        if let Some(endpoint) = &self.webdriver_url {
            url::Url::parse(endpoint).map_err(|e| format!("webdriver_url is invalid: {e}"))?;
        }

        if !self.arrivals_url_template.contains("{stop_code}") {
            return Err("arrivals_url_template must contain {stop_code}".to_string());
        }

        for (name, selector) in [
            ("itinerary_list_selector", &self.itinerary_list_selector),
            ("option_selector", &self.option_selector),
            ("arrivals_table_selector", &self.arrivals_table_selector),
        ] {
            if selector.trim().is_empty() {
                return Err(format!("{name} must not be empty"));
            }
        }

        crate::page_url::check_templates(self)
    }
}
