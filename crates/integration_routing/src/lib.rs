//! Routing-engine integration for trayecto
//!
//! Talks to an [OSRM](https://project-osrm.org)-compatible HTTP server and
//! returns decoded path geometry, distance, duration and (for walking)
//! turn instructions. The pipeline never computes paths itself.
//!
//! # Architecture
//!
//! [`RoutingClient`] defines the interface, implemented by
//! [`OsrmRoutingClient`]. Responses are cached per profile and rounded
//! endpoints, since the same stop-to-stop segments recur across itineraries.
//!
//! # Example
//!
//! ```rust,ignore
//! use domain::GeoLocation;
//! use integration_routing::{OsrmRoutingClient, RoutingClient, RoutingConfig, RoutingProfile};
//!
//! let client = OsrmRoutingClient::new(&RoutingConfig::default())?;
//! let route = client
//!     .route(
//!         RoutingProfile::Walk,
//!         GeoLocation::new(-33.4372, -70.6506)?,
//!         GeoLocation::new(-33.4420, -70.6540)?,
//!         true,
//!     )
//!     .await?;
//! ```

mod client;
mod config;
mod error;
mod models;

pub use client::{OsrmRoutingClient, RoutingClient};
pub use config::RoutingConfig;
pub use error::RoutingError;
pub use models::{Route, RoutingProfile};
