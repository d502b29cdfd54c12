//! Integration tests for the routing client (wiremock-based)

use domain::GeoLocation;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use integration_routing::{
    OsrmRoutingClient, RoutingClient, RoutingConfig, RoutingError, RoutingProfile,
};

fn config_for_mock(base_url: &str) -> RoutingConfig {
    RoutingConfig {
        base_url: base_url.to_string(),
        timeout_secs: 5,
        cache_ttl_secs: 0,
        ..RoutingConfig::default()
    }
}

fn origin() -> GeoLocation {
    GeoLocation::new(-33.45, -70.65).unwrap()
}

fn destination() -> GeoLocation {
    GeoLocation::new(-33.46, -70.64).unwrap()
}

const fn sample_route_json() -> &'static str {
    r#"{
        "code": "Ok",
        "routes": [{
            "distance": 1432.7,
            "duration": 1031.4,
            "geometry": "_p~iF~ps|U_ulLnnqC_mqNvxq`@",
            "legs": [{
                "steps": [
                    { "name": "Alameda", "maneuver": { "type": "depart" } },
                    { "name": "Avenida Matta", "maneuver": { "type": "turn", "modifier": "left" } },
                    { "name": "", "maneuver": { "type": "continue" } },
                    { "name": "", "maneuver": { "type": "arrive" } }
                ]
            }]
        }],
        "waypoints": []
    }"#
}

#[tokio::test]
async fn test_walk_route_success() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/route/v1/foot/-70.65,-33.45;-70.64,-33.46"))
        .and(query_param("geometries", "polyline"))
        .and(query_param("overview", "full"))
        .and(query_param("steps", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sample_route_json()))
        .mount(&server)
        .await;

    let client = OsrmRoutingClient::new(&config_for_mock(&server.uri())).unwrap();
    let route = client
        .route(RoutingProfile::Walk, origin(), destination(), true)
        .await
        .unwrap();

    assert!((route.distance_m - 1432.7).abs() < 1e-9);
    assert_eq!(route.coordinates.len(), 3);
    assert_eq!(
        route.instructions,
        vec![
            "head along Alameda",
            "turn left onto Avenida Matta",
            "arrive at your destination"
        ]
    );
}

#[tokio::test]
async fn test_vehicle_route_uses_vehicle_profile_without_steps() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/route/v1/driving/.+$"))
        .and(query_param("overview", "simplified"))
        .and(query_param("steps", "false"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"code":"Ok","routes":[{"distance":900.0,"duration":180.0,"geometry":"_p~iF~ps|U_ulLnnqC","legs":[{"steps":[]}]}]}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let client = OsrmRoutingClient::new(&config_for_mock(&server.uri())).unwrap();
    let route = client
        .route(RoutingProfile::Vehicle, origin(), destination(), false)
        .await
        .unwrap();

    assert_eq!(route.coordinates.len(), 2);
    assert!(route.instructions.is_empty());
}

#[tokio::test]
async fn test_no_route_on_bad_request_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/route/v1/.+$"))
        .respond_with(ResponseTemplate::new(400).set_body_string(
            r#"{"code":"NoSegment","message":"Could not find a matching segment for coordinate 0"}"#,
        ))
        .mount(&server)
        .await;

    let client = OsrmRoutingClient::new(&config_for_mock(&server.uri())).unwrap();
    let err = client
        .route(RoutingProfile::Walk, origin(), destination(), true)
        .await
        .unwrap_err();

    assert!(matches!(err, RoutingError::NoRoute { ref code, .. } if code == "NoSegment"));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_empty_routes_is_no_route() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"code":"Ok","routes":[]}"#))
        .mount(&server)
        .await;

    let client = OsrmRoutingClient::new(&config_for_mock(&server.uri())).unwrap();
    let err = client
        .route(RoutingProfile::Transit, origin(), destination(), false)
        .await
        .unwrap_err();

    assert!(matches!(err, RoutingError::NoRoute { .. }));
}

#[tokio::test]
async fn test_server_error_is_retryable() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = OsrmRoutingClient::new(&config_for_mock(&server.uri())).unwrap();
    let err = client
        .route(RoutingProfile::Walk, origin(), destination(), true)
        .await
        .unwrap_err();

    assert!(matches!(err, RoutingError::RequestFailed(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_timeout() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(sample_route_json())
                .set_delay(std::time::Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = RoutingConfig {
        timeout_secs: 1,
        ..config_for_mock(&server.uri())
    };
    let client = OsrmRoutingClient::new(&config).unwrap();
    let err = client
        .route(RoutingProfile::Walk, origin(), destination(), true)
        .await
        .unwrap_err();

    assert!(matches!(err, RoutingError::Timeout { timeout_secs: 1 }));
}

#[tokio::test]
async fn test_cached_route_skips_second_request() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/route/v1/foot/.+$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(sample_route_json()))
        .expect(1)
        .mount(&server)
        .await;

    let config = RoutingConfig {
        cache_ttl_secs: 60,
        ..config_for_mock(&server.uri())
    };
    let client = OsrmRoutingClient::new(&config).unwrap();

    let first = client
        .route(RoutingProfile::Walk, origin(), destination(), true)
        .await
        .unwrap();
    let second = client
        .route(RoutingProfile::Walk, origin(), destination(), true)
        .await
        .unwrap();

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_health_check() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/nearest/v1/foot/.+$"))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"code":"Ok"}"#))
        .mount(&server)
        .await;

    let client = OsrmRoutingClient::new(&config_for_mock(&server.uri())).unwrap();
    assert!(client.is_healthy().await);
}

#[tokio::test]
async fn test_health_check_unreachable() {
    let client = OsrmRoutingClient::new(&config_for_mock("http://127.0.0.1:1")).unwrap();
    assert!(!client.is_healthy().await);
}
