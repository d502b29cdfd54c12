//! Routing adapter - Implements RoutingEnginePort using integration_routing

use std::sync::Arc;

use application::{
    error::ApplicationError,
    ports::{RouteGeometry, RoutingEnginePort},
};
use async_trait::async_trait;
use domain::GeoLocation;
use integration_routing::{
    OsrmRoutingClient, Route, RoutingClient, RoutingConfig, RoutingError, RoutingProfile,
};
use tracing::instrument;

/// Adapter for an OSRM-compatible routing engine
pub struct RoutingEngineAdapter {
    client: Arc<dyn RoutingClient>,
}

impl std::fmt::Debug for RoutingEngineAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingEngineAdapter")
            .field("client", &"RoutingClient")
            .finish()
    }
}

impl RoutingEngineAdapter {
    /// Create with custom configuration
    pub fn with_config(config: &RoutingConfig) -> Result<Self, ApplicationError> {
        let client = OsrmRoutingClient::new(config).map_err(Self::map_error)?;
        Ok(Self::with_client(Arc::new(client)))
    }

    /// Wrap an existing client
    pub fn with_client(client: Arc<dyn RoutingClient>) -> Self {
        Self { client }
    }

    /// Map integration routing error to application error
    fn map_error(err: RoutingError) -> ApplicationError {
        match err {
            RoutingError::ConnectionFailed(e) | RoutingError::RequestFailed(e) => {
                ApplicationError::ExternalService(e)
            },
            RoutingError::Timeout { timeout_secs } => ApplicationError::ExternalService(format!(
                "routing engine timed out after {timeout_secs}s"
            )),
            err @ (RoutingError::NoRoute { .. }
            | RoutingError::InvalidGeometry(_)
            | RoutingError::ParseError(_)) => ApplicationError::GeometryUnavailable(err.to_string()),
            RoutingError::ConfigurationError(e) => ApplicationError::Configuration(e),
        }
    }

    fn into_geometry(route: Route) -> RouteGeometry {
        RouteGeometry {
            distance_m: route.distance_m,
            duration_s: route.duration_s,
            polyline: route.coordinates,
            instructions: route.instructions,
        }
    }

    async fn route(
        &self,
        profile: RoutingProfile,
        from: GeoLocation,
        to: GeoLocation,
        detailed: bool,
    ) -> Result<RouteGeometry, ApplicationError> {
        self.client
            .route(profile, from, to, detailed)
            .await
            .map(Self::into_geometry)
            .map_err(Self::map_error)
    }
}

#[async_trait]
impl RoutingEnginePort for RoutingEngineAdapter {
    #[instrument(skip(self, from, to), fields(from = %from, to = %to))]
    async fn walk_route(
        &self,
        from: GeoLocation,
        to: GeoLocation,
        detailed: bool,
    ) -> Result<RouteGeometry, ApplicationError> {
        self.route(RoutingProfile::Walk, from, to, detailed).await
    }

    #[instrument(skip(self, from, to), fields(from = %from, to = %to))]
    async fn vehicle_route(
        &self,
        from: GeoLocation,
        to: GeoLocation,
    ) -> Result<RouteGeometry, ApplicationError> {
        self.route(RoutingProfile::Vehicle, from, to, true).await
    }

    #[instrument(skip(self, from, to), fields(from = %from, to = %to))]
    async fn transit_route(
        &self,
        from: GeoLocation,
        to: GeoLocation,
    ) -> Result<RouteGeometry, ApplicationError> {
        self.route(RoutingProfile::Transit, from, to, true).await
    }

    async fn is_available(&self) -> bool {
        self.client.is_healthy().await
    }
}
