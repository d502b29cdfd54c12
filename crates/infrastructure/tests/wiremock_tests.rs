//! End-to-end tests for the wired engine
//!
//! The browser talks to a mock WebDriver endpoint, the routing adapter to a
//! mock OSRM server, and the schedule store reads the GTFS fixture.

use std::sync::Arc;

use application::TripQuery;
use application::error::ApplicationError;
use domain::{GeoLocation, GeometrySource, ItinerarySource, LegKind};
use infrastructure::{
    AppConfig, BrowserPageScraper, RoutingEngineAdapter, ScheduleDatabase, SqliteScheduleStore,
    TransitEngine,
};
use serde_json::json;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const FIXTURE: &str = include_str!("fixtures/santiago_gtfs.sql");
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

const RESULTS_PAGE: &str = r#"
    <html><body>
    <ul class="results">
      <li class="itinerary-option">
        <div class="service-name"><b>506</b></div>
        <span>Caminar 4 min</span><span>Caminar 3 min</span>
        <span class="duration">25 min</span>
        <p>Paradero PA433 - Alameda / Amunategui</p>
      </li>
      <li class="itinerary-option">
        <span class="route-label">210v</span>
        <span>Caminar 9 min</span>
        <span class="duration">41 min</span>
      </li>
    </ul>
    </body></html>"#;

const ROUTE_JSON: &str = r#"{
    "code": "Ok",
    "routes": [{
        "distance": 650.0,
        "duration": 470.0,
        "geometry": "fyakEr|enLvLjHvQnK",
        "legs": [{
            "steps": [
                { "name": "Bandera", "maneuver": { "type": "depart" } },
                { "name": "", "maneuver": { "type": "arrive" } }
            ]
        }]
    }]
}"#;

fn ok(value: serde_json::Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({ "value": value }))
}

fn query() -> TripQuery {
    TripQuery::new(
        GeoLocation::new(-33.4426, -70.6548).unwrap(),
        GeoLocation::new(-33.4460, -70.6378).unwrap(),
    )
    .with_names("Amunategui", "Santa Lucia")
}

/// A WebDriver endpoint that opens `sessions` sessions and renders `source`
async fn mount_driver(server: &MockServer, sessions: u64) {
    Mock::given(method("POST"))
        .and(path("/session"))
        .respond_with(ok(json!({ "sessionId": "s1", "capabilities": {} })))
        .expect(sessions)
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/s1/url"))
        .respond_with(ok(json!(null)))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/s1/element"))
        .respond_with(ok(json!({ ELEMENT_KEY: "e1" })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/session/s1/element/e1/displayed"))
        .respond_with(ok(json!(true)))
        .mount(server)
        .await;
    Mock::given(method("POST"))
        .and(path("/session/s1/execute/sync"))
        .respond_with(ok(json!(true)))
        .mount(server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/session/s1"))
        .respond_with(ok(json!(null)))
        .expect(sessions)
        .mount(server)
        .await;
}

async fn mount_source(server: &MockServer, html: &str, times: Option<u64>) {
    let mock = Mock::given(method("GET"))
        .and(path("/session/s1/source"))
        .respond_with(ok(json!(html)));
    match times {
        Some(n) => mock.up_to_n_times(n).mount(server).await,
        None => mock.mount(server).await,
    }
}

async fn mount_routing(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/route/v1/[a-z]+/"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ROUTE_JSON))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/nearest/v1/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "code": "Ok" })))
        .mount(server)
        .await;
}

async fn engine(driver: &MockServer, routing: &MockServer) -> TransitEngine {
    let config = AppConfig::for_testing(driver.uri(), routing.uri());

    let db = ScheduleDatabase::in_memory().await.unwrap();
    sqlx::raw_sql(FIXTURE).execute(db.pool()).await.unwrap();
    let schedule = SqliteScheduleStore::new(&db, config.schedule.query_timeout())
        .await
        .unwrap();

    TransitEngine::from_parts(
        &config,
        Arc::new(BrowserPageScraper::with_config(config.browser.clone()).unwrap()),
        Arc::new(schedule),
        Arc::new(RoutingEngineAdapter::with_config(&config.routing).unwrap()),
    )
}

#[tokio::test]
async fn two_phase_query_reuses_the_rendered_page() {
    let driver = MockServer::start().await;
    let routing = MockServer::start().await;
    mount_driver(&driver, 1).await;
    mount_source(&driver, RESULTS_PAGE, None).await;
    mount_routing(&routing).await;

    let engine = engine(&driver, &routing).await;
    let query = query();

    let options = engine.lightweight_options(&query).await.unwrap();
    assert_eq!(options.len(), 2);
    assert_eq!(options[0].route_numbers, vec!["506"]);
    assert_eq!(options[0].total_duration_minutes, Some(25));
    assert_eq!(options[0].walking_minutes, 7);
    assert_eq!(options[1].route_numbers, vec!["210V"]);

    // a single scraped stop: the stop list comes from the schedule
    let itinerary = engine.detailed_itinerary(&query, 0).await.unwrap();
    assert_eq!(itinerary.source, ItinerarySource::ScheduleAssisted);
    assert_eq!(itinerary.legs[0].kind, LegKind::Walk);
    assert_eq!(itinerary.legs[0].geometry, GeometrySource::Routed);

    let ride = &itinerary.legs[1];
    assert_eq!(ride.kind, LegKind::RideBus);
    assert_eq!(ride.route_number.as_deref(), Some("506"));
    let codes: Vec<_> = ride
        .stops
        .iter()
        .filter_map(|stop| stop.code.as_ref().map(|c| c.as_str().to_string()))
        .collect();
    assert_eq!(codes, vec!["PA433", "PA434", "PA435", "PA436", "PA437"]);
    assert_eq!(ride.stop_count, 4);
    assert_eq!(itinerary.routes, vec!["506"]);
}

#[tokio::test]
async fn routing_outage_degrades_geometry_only() {
    let driver = MockServer::start().await;
    let routing = MockServer::start().await;
    mount_driver(&driver, 1).await;
    mount_source(&driver, RESULTS_PAGE, None).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&routing)
        .await;

    let engine = engine(&driver, &routing).await;
    let itinerary = engine.detailed_itinerary(&query(), 0).await.unwrap();

    assert!(itinerary.legs.len() >= 2);
    assert!(itinerary.has_degraded_legs());
    assert!(
        itinerary
            .legs
            .iter()
            .all(|leg| leg.geometry == GeometrySource::StraightLine)
    );
}

#[tokio::test]
async fn heuristic_itinerary_needs_no_browser() {
    let driver = MockServer::start().await;
    let routing = MockServer::start().await;
    mount_driver(&driver, 0).await;
    mount_routing(&routing).await;

    let engine = engine(&driver, &routing).await;
    let itinerary = engine.heuristic_itinerary(&query()).await.unwrap();

    assert_eq!(itinerary.source, ItinerarySource::Heuristic);
    assert!(!itinerary.legs.is_empty());
}

#[tokio::test]
async fn arrivals_flag_a_bus_that_left_the_table() {
    let driver = MockServer::start().await;
    let routing = MockServer::start().await;
    mount_driver(&driver, 2).await;
    mount_source(
        &driver,
        "<table><tr><td>506</td><td>Menos de 2 min</td><td>900 mts</td></tr>\
         <tr><td>210v</td><td>Entre 11 y 15 min</td><td>4,1 km</td></tr></table>",
        Some(1),
    )
    .await;
    mount_source(
        &driver,
        "<table><tr><td>210v</td><td>Entre 7 y 9 min</td><td>2,6 km</td></tr></table>",
        None,
    )
    .await;

    let engine = engine(&driver, &routing).await;

    let first = engine.arrivals("pa433").await.unwrap();
    assert_eq!(first.stop_code.as_str(), "PA433");
    assert_eq!(first.arrivals.len(), 2);
    assert_eq!(first.passed().count(), 0);

    let second = engine.arrivals("PA433").await.unwrap();
    let passed: Vec<_> = second.passed().collect();
    assert_eq!(passed.len(), 1);
    assert_eq!(passed[0].route_number, "506");
    assert_eq!(second.arrivals[0].route_number, "210V");
    assert!(!second.arrivals[0].just_passed);
}

#[tokio::test]
async fn malformed_stop_code_never_reaches_the_browser() {
    let driver = MockServer::start().await;
    let routing = MockServer::start().await;
    mount_driver(&driver, 0).await;

    let engine = engine(&driver, &routing).await;
    let err = engine.arrivals("PA-433").await.unwrap_err();
    assert!(matches!(err, ApplicationError::Domain(_)));
}

#[tokio::test]
async fn health_reports_routing_engine() {
    let driver = MockServer::start().await;
    let routing = MockServer::start().await;
    mount_routing(&routing).await;

    let engine = engine(&driver, &routing).await;
    let health = engine.health().await;
    assert!(health.routing_engine);
    assert_eq!(health.browser, None);
}
