//! Routing engine port
//!
//! Narrow interface to an external path-finding engine. The pipeline never
//! computes paths itself; it asks this port for street-level geometry between
//! points it already knows.

use async_trait::async_trait;
use domain::GeoLocation;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::ApplicationError;

/// Geometry and timing for one routed segment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteGeometry {
    /// Distance in meters
    pub distance_m: f64,
    /// Duration in seconds
    pub duration_s: f64,
    /// Ordered path coordinates
    pub polyline: Vec<GeoLocation>,
    /// Turn-by-turn instructions (walking only)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub instructions: Vec<String>,
}

impl RouteGeometry {
    /// Distance in kilometers
    #[must_use]
    pub fn distance_km(&self) -> f64 {
        self.distance_m / 1000.0
    }

    /// Duration in whole minutes, rounded up
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn duration_minutes(&self) -> u32 {
        (self.duration_s.max(0.0) / 60.0).ceil() as u32
    }
}

/// Port for routing engine queries
#[cfg_attr(test, automock)]
#[async_trait]
pub trait RoutingEnginePort: Send + Sync {
    /// Pedestrian route; `detailed` requests full geometry and turn instructions
    async fn walk_route(
        &self,
        from: GeoLocation,
        to: GeoLocation,
        detailed: bool,
    ) -> Result<RouteGeometry, ApplicationError>;

    /// Road vehicle route (buses)
    async fn vehicle_route(
        &self,
        from: GeoLocation,
        to: GeoLocation,
    ) -> Result<RouteGeometry, ApplicationError>;

    /// Rail/transit route (metro)
    async fn transit_route(
        &self,
        from: GeoLocation,
        to: GeoLocation,
    ) -> Result<RouteGeometry, ApplicationError>;

    /// Check if the routing engine is reachable
    async fn is_available(&self) -> bool;
}
