//! Headless browser automation for trayecto
//!
//! Renders the itinerary and real-time arrivals pages through a
//! [W3C WebDriver](https://www.w3.org/TR/webdriver2/) endpoint and returns
//! their HTML. Either a remote endpoint is configured, or a local
//! `chromedriver` is discovered on `PATH` and launched once.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain::GeoLocation;
//! use integration_browser::{BrowserConfig, BrowserController, ItineraryTarget};
//!
//! let controller = BrowserController::new(BrowserConfig::default())?;
//! let html = controller
//!     .fetch_itinerary(&ItineraryTarget {
//!         origin_name: "Plaza de Armas".into(),
//!         destination_name: "Estación Central".into(),
//!         origin: GeoLocation::new(-33.4378, -70.6505)?,
//!         destination: GeoLocation::new(-33.4516, -70.6795)?,
//!         option_index: 0,
//!     })
//!     .await?;
//! ```

mod config;
mod controller;
mod driver;
mod error;
mod page_url;
mod scripts;
mod webdriver;

pub use config::BrowserConfig;
pub use controller::{BrowserController, ItineraryTarget};
pub use error::BrowserError;
pub use page_url::{arrivals_url, itinerary_url};
