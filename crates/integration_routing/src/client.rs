//! OSRM routing client
//!
//! Requests `GET /route/v1/{profile}/{lon},{lat};{lon},{lat}` and decodes the
//! precision-5 polyline geometry into coordinates.

use std::time::Duration;

use async_trait::async_trait;
use domain::GeoLocation;
use moka::future::Cache;
use reqwest::Client;
use tracing::{debug, instrument, warn};

use crate::config::RoutingConfig;
use crate::error::RoutingError;
use crate::models::{RawRoute, RawRouteResponse, Route, RoutingProfile};

/// Decimal places of the endpoints in the cache key (about 1 m)
const CACHE_KEY_DECIMALS: u8 = 5;

/// Polyline precision used by OSRM's `geometries=polyline`
const POLYLINE_PRECISION: u32 = 5;

/// Trait for routing engine clients
#[async_trait]
pub trait RoutingClient: Send + Sync {
    /// Route between two points for the given profile
    ///
    /// `detailed` requests full-resolution geometry and turn instructions.
    async fn route(
        &self,
        profile: RoutingProfile,
        from: GeoLocation,
        to: GeoLocation,
        detailed: bool,
    ) -> Result<Route, RoutingError>;

    /// Check if the routing engine is reachable
    async fn is_healthy(&self) -> bool;
}

/// Client for an OSRM-compatible routing server
#[derive(Debug)]
pub struct OsrmRoutingClient {
    client: Client,
    config: RoutingConfig,
    cache: Option<Cache<String, Route>>,
}

impl OsrmRoutingClient {
    /// Create a new routing client
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be initialized.
    pub fn new(config: &RoutingConfig) -> Result<Self, RoutingError> {
        config.validate().map_err(RoutingError::ConfigurationError)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("trayecto/0.3")
            .build()
            .map_err(|e| RoutingError::ConnectionFailed(e.to_string()))?;

        let cache = config.caching_enabled().then(|| {
            Cache::builder()
                .max_capacity(config.cache_capacity)
                .time_to_live(Duration::from_secs(config.cache_ttl_secs))
                .build()
        });

        Ok(Self {
            client,
            config: config.clone(),
            cache,
        })
    }

    fn profile_name(&self, profile: RoutingProfile) -> &str {
        match profile {
            RoutingProfile::Walk => &self.config.walk_profile,
            RoutingProfile::Vehicle => &self.config.vehicle_profile,
            RoutingProfile::Transit => &self.config.transit_profile,
        }
    }

    fn route_url(&self, profile: RoutingProfile, from: GeoLocation, to: GeoLocation) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}",
            self.config.base_url.trim_end_matches('/'),
            self.profile_name(profile),
            from.longitude(),
            from.latitude(),
            to.longitude(),
            to.latitude(),
        )
    }

    fn cache_key(
        profile: RoutingProfile,
        from: GeoLocation,
        to: GeoLocation,
        detailed: bool,
    ) -> String {
        format!(
            "{profile}|{}|{}|{detailed}",
            from.quantized_key(CACHE_KEY_DECIMALS),
            to.quantized_key(CACHE_KEY_DECIMALS)
        )
    }

    /// Parse the raw OSRM response into the first route
    fn parse_route_response(body: &str) -> Result<Route, RoutingError> {
        let raw: RawRouteResponse =
            serde_json::from_str(body).map_err(|e| RoutingError::ParseError(e.to_string()))?;

        if raw.code != "Ok" {
            return Err(RoutingError::NoRoute {
                code: raw.code,
                message: raw.message.unwrap_or_default(),
            });
        }

        let route = raw
            .routes
            .into_iter()
            .next()
            .ok_or_else(|| RoutingError::NoRoute {
                code: "NoRoute".to_string(),
                message: "response contained no routes".to_string(),
            })?;

        Self::convert_route(route)
    }

    fn convert_route(raw: RawRoute) -> Result<Route, RoutingError> {
        let coordinates = match raw.geometry.as_deref() {
            Some(encoded) => decode_geometry(encoded)?,
            None => Vec::new(),
        };

        let instructions = raw
            .legs
            .iter()
            .flat_map(|leg| leg.steps.iter())
            .filter_map(crate::models::RawStep::instruction)
            .collect();

        Ok(Route {
            distance_m: raw.distance,
            duration_s: raw.duration,
            coordinates,
            instructions,
        })
    }

    fn map_send_error(&self, e: &reqwest::Error) -> RoutingError {
        if e.is_timeout() {
            RoutingError::Timeout {
                timeout_secs: self.config.timeout_secs,
            }
        } else {
            RoutingError::ConnectionFailed(e.to_string())
        }
    }
}

/// Decode an encoded polyline into coordinates, origin first
fn decode_geometry(encoded: &str) -> Result<Vec<GeoLocation>, RoutingError> {
    let line = polyline::decode_polyline(encoded, POLYLINE_PRECISION)
        .map_err(|e| RoutingError::InvalidGeometry(e.to_string()))?;

    line.0
        .into_iter()
        .map(|coord| {
            GeoLocation::new(coord.y, coord.x)
                .map_err(|e| RoutingError::InvalidGeometry(e.to_string()))
        })
        .collect()
}

#[async_trait]
impl RoutingClient for OsrmRoutingClient {
    #[instrument(skip(self, from, to), fields(from = %from, to = %to))]
    async fn route(
        &self,
        profile: RoutingProfile,
        from: GeoLocation,
        to: GeoLocation,
        detailed: bool,
    ) -> Result<Route, RoutingError> {
        let key = Self::cache_key(profile, from, to, detailed);
        let cached = match &self.cache {
            Some(cache) => cache.get(&key).await,
            None => None,
        };
        if let Some(route) = cached {
            debug!("Routing cache hit");
            return Ok(route);
        }

        let url = self.route_url(profile, from, to);
        let params = [
            ("overview", if detailed { "full" } else { "simplified" }),
            ("geometries", "polyline"),
            ("steps", if detailed { "true" } else { "false" }),
        ];

        debug!(?url, "Requesting route");

        let response = self
            .client
            .get(&url)
            .query(&params)
            .send()
            .await
            .map_err(|e| self.map_send_error(&e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| RoutingError::ParseError(e.to_string()))?;

        // OSRM answers 400 with a JSON body for NoRoute/NoSegment
        if status == reqwest::StatusCode::BAD_REQUEST {
            return Self::parse_route_response(&body);
        }
        if !status.is_success() {
            warn!(%status, "Routing engine returned an error status");
            return Err(RoutingError::RequestFailed(format!("HTTP {status}")));
        }

        let route = Self::parse_route_response(&body)?;
        debug!(
            distance_m = route.distance_m,
            points = route.coordinates.len(),
            "Route found"
        );

        if let Some(cache) = &self.cache {
            cache.insert(key, route.clone()).await;
        }
        Ok(route)
    }

    async fn is_healthy(&self) -> bool {
        let santiago = GeoLocation::santiago();
        let url = format!(
            "{}/nearest/v1/{}/{},{}",
            self.config.base_url.trim_end_matches('/'),
            self.config.walk_profile,
            santiago.longitude(),
            santiago.latitude(),
        );
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!(error = %e, "Routing engine health check failed");
                false
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_POLYLINE: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

    #[test]
    fn decodes_reference_polyline_as_lat_lon() {
        let coords = decode_geometry(SAMPLE_POLYLINE).unwrap();
        assert_eq!(coords.len(), 3);
        assert!((coords[0].latitude() - 38.5).abs() < 1e-6);
        assert!((coords[0].longitude() - -120.2).abs() < 1e-6);
        assert!((coords[2].latitude() - 43.252).abs() < 1e-6);
    }

    #[test]
    fn non_ok_code_is_no_route() {
        let err = OsrmRoutingClient::parse_route_response(
            r#"{"code":"NoSegment","message":"Could not find a matching segment"}"#,
        )
        .unwrap_err();
        assert!(matches!(err, RoutingError::NoRoute { ref code, .. } if code == "NoSegment"));
    }

    #[test]
    fn empty_routes_is_no_route() {
        let err = OsrmRoutingClient::parse_route_response(r#"{"code":"Ok","routes":[]}"#)
            .unwrap_err();
        assert!(matches!(err, RoutingError::NoRoute { .. }));
    }

    #[test]
    fn garbage_is_parse_error() {
        let err = OsrmRoutingClient::parse_route_response("<html>").unwrap_err();
        assert!(matches!(err, RoutingError::ParseError(_)));
    }

    #[test]
    fn url_puts_longitude_first() {
        let client = OsrmRoutingClient::new(&RoutingConfig {
            base_url: "http://osrm:5000/".to_string(),
            ..RoutingConfig::for_testing()
        })
        .unwrap();
        let url = client.route_url(
            RoutingProfile::Walk,
            GeoLocation::new(-33.45, -70.65).unwrap(),
            GeoLocation::new(-33.46, -70.64).unwrap(),
        );
        assert_eq!(url, "http://osrm:5000/route/v1/foot/-70.65,-33.45;-70.64,-33.46");
    }

    #[test]
    fn cache_key_separates_profiles_and_detail() {
        let a = GeoLocation::new(-33.45, -70.65).unwrap();
        let b = GeoLocation::new(-33.46, -70.64).unwrap();
        let walk = OsrmRoutingClient::cache_key(RoutingProfile::Walk, a, b, true);
        assert_ne!(walk, OsrmRoutingClient::cache_key(RoutingProfile::Vehicle, a, b, true));
        assert_ne!(walk, OsrmRoutingClient::cache_key(RoutingProfile::Walk, a, b, false));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let config = RoutingConfig {
            timeout_secs: 0,
            ..RoutingConfig::default()
        };
        assert!(matches!(
            OsrmRoutingClient::new(&config),
            Err(RoutingError::ConfigurationError(_))
        ));
    }
}
