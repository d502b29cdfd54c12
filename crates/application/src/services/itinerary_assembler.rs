//! Itinerary assembly
//!
//! Turns a route and the stops it serves into a walk / ride / walk
//! itinerary with street-level geometry. Missing pieces degrade instead of
//! failing: a leg the routing engine cannot draw becomes a straight line, a
//! stop list too short to ride is completed from the schedule store, and
//! when nothing usable remains the fallback catalogue supplies a route.

use std::future::Future;
use std::sync::Arc;

use domain::{
    GeoLocation, GeometrySource, Itinerary, ItinerarySource, LegKind, Stop, TripLeg,
};
use futures::future::join_all;
use tracing::{debug, info, instrument, warn};

use super::fallback_catalogue::FallbackCatalogue;
use super::planner_config::PlannerConfig;
use crate::error::ApplicationError;
use crate::extraction::ExtractedFacts;
use crate::ports::{Clock, RouteGeometry, RoutingEnginePort, ScheduleStorePort};

/// Two consecutive polyline points closer than this are the same joint
const JOINT_TOLERANCE_KM: f64 = 0.001;

/// What the itinerary page printed about the chosen option
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageHints {
    /// Routes in riding order; the first one is ridden between the stops
    pub routes: Vec<String>,
    /// Scheduled total including waiting
    pub duration_minutes: Option<u32>,
    /// Stops travelled on the ride
    pub stop_count: Option<u32>,
}

impl PageHints {
    /// Hints naming a single route and nothing else
    pub fn route(route: impl Into<String>) -> Self {
        Self {
            routes: vec![route.into()],
            ..Self::default()
        }
    }

    fn ridden(&self) -> Option<&str> {
        self.routes.first().map(String::as_str)
    }
}

impl From<&ExtractedFacts> for PageHints {
    fn from(facts: &ExtractedFacts) -> Self {
        Self {
            routes: facts.route_numbers(),
            duration_minutes: facts.duration_minutes,
            stop_count: facts.stop_count,
        }
    }
}

/// Builds itineraries from resolved stops, degrading gracefully
pub struct ItineraryAssembler {
    routing: Arc<dyn RoutingEnginePort>,
    schedule: Arc<dyn ScheduleStorePort>,
    clock: Arc<dyn Clock>,
    catalogue: FallbackCatalogue,
    config: PlannerConfig,
}

impl std::fmt::Debug for ItineraryAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItineraryAssembler")
            .field("routing", &"<RoutingEnginePort>")
            .field("schedule", &"<ScheduleStorePort>")
            .field("catalogue_routes", &self.catalogue.routes().len())
            .finish_non_exhaustive()
    }
}

impl ItineraryAssembler {
    /// Create an assembler; the configured catalogue replaces the built-in one
    pub fn new(
        routing: Arc<dyn RoutingEnginePort>,
        schedule: Arc<dyn ScheduleStorePort>,
        clock: Arc<dyn Clock>,
        config: PlannerConfig,
    ) -> Self {
        let catalogue = config
            .fallback_catalogue
            .clone()
            .map_or_else(FallbackCatalogue::santiago, FallbackCatalogue::new);

        Self {
            routing,
            schedule,
            clock,
            catalogue,
            config,
        }
    }

    /// Build an itinerary for riding the first hinted route through `stops`
    ///
    /// The stop nearest the origin is the boarding stop and the one nearest the
    /// destination the alighting stop. With fewer than two usable stops the
    /// route's stop list is read from the schedule store instead, and without
    /// a route or schedule data the fallback catalogue decides.
    #[instrument(skip(self, hints, stops), fields(routes = ?hints.routes, stops = stops.len()))]
    pub async fn assemble(
        &self,
        hints: &PageHints,
        stops: &[Stop],
        origin: GeoLocation,
        destination: GeoLocation,
    ) -> Result<Itinerary, ApplicationError> {
        if let Some(route) = hints.ridden() {
            if let Some(ride) = ride_between(stops, origin, destination) {
                return self
                    .build(route, ride, Some(hints), origin, destination, ItinerarySource::Scraped)
                    .await;
            }

            debug!(route, "Too few scraped stops, consulting schedule store");
            if let Some(ride) = self.stops_from_schedule(route, origin, destination).await {
                return self
                    .build(
                        route,
                        ride,
                        Some(hints),
                        origin,
                        destination,
                        ItinerarySource::ScheduleAssisted,
                    )
                    .await;
            }
        }

        warn!(route = ?hints.ridden(), "No usable stop sequence, using fallback routes");
        self.heuristic(origin, destination).await
    }

    /// Best-effort itinerary from the fallback catalogue alone
    ///
    /// Never empty: without any matching route the rider walks.
    #[instrument(skip(self))]
    pub async fn heuristic(
        &self,
        origin: GeoLocation,
        destination: GeoLocation,
    ) -> Result<Itinerary, ApplicationError> {
        match self.catalogue.best_match(
            origin,
            destination,
            self.config.max_walk_to_stop_km,
            self.config.fallback_penalty_km,
        ) {
            Some(found) => {
                info!(route = %found.route_number, score_km = found.score_km, "Fallback route selected");
                self.build(
                    &found.route_number,
                    found.stops,
                    None,
                    origin,
                    destination,
                    ItinerarySource::Heuristic,
                )
                .await
            },
            None => {
                warn!("No fallback route fits, walking the whole way");
                let leg = self
                    .walk_leg(
                        Stop::synthetic("Origin", origin),
                        Stop::synthetic("Destination", destination),
                    )
                    .await;
                Ok(Itinerary::from_legs(
                    origin,
                    destination,
                    vec![leg],
                    self.clock.now(),
                    ItinerarySource::Heuristic,
                )?)
            },
        }
    }

    async fn stops_from_schedule(
        &self,
        route: &str,
        origin: GeoLocation,
        destination: GeoLocation,
    ) -> Option<Vec<Stop>> {
        let lookup = async {
            let Some(found) = self.schedule.route_by_name_or_id(route).await? else {
                return Ok(None);
            };
            let Some(trip) = self.schedule.representative_trip(&found.id).await? else {
                return Ok(None);
            };
            let stops = self.schedule.stops_for_trip(&trip).await?;
            Ok::<_, ApplicationError>(ride_between(&stops, origin, destination))
        };

        match lookup.await {
            Ok(Some(ride)) => Some(ride),
            Ok(None) => {
                warn!(route, "Schedule store has no usable trip for route");
                None
            },
            Err(e) => {
                warn!(route, error = %e, "Schedule store lookup failed");
                None
            },
        }
    }

    async fn build(
        &self,
        route: &str,
        ride: Vec<Stop>,
        hints: Option<&PageHints>,
        origin: GeoLocation,
        destination: GeoLocation,
        source: ItinerarySource,
    ) -> Result<Itinerary, ApplicationError> {
        let (Some(boarding), Some(alighting)) = (ride.first().cloned(), ride.last().cloned())
        else {
            return Err(ApplicationError::Internal(
                "ride requires a boarding and an alighting stop".to_string(),
            ));
        };

        let alighting_stop = alighting.clone();
        let start = Stop::synthetic("Origin", origin);
        let end = Stop::synthetic("Destination", destination);
        let needs_final_walk =
            alighting.location.distance_km(&destination) >= self.config.arrival_threshold_km;
        let printed_stops = hints.and_then(|h| h.stop_count);

        let final_walk = async {
            if needs_final_walk {
                Some(self.walk_leg(alighting, end).await)
            } else {
                debug!("Alighting stop is at the destination, no final walk");
                None
            }
        };
        let (walk_in, ride_leg, walk_out) = tokio::join!(
            self.walk_leg(start, boarding.clone()),
            self.ride_leg(route, boarding, alighting_stop, ride, printed_stops),
            final_walk
        );

        let mut legs = vec![walk_in, ride_leg];
        legs.extend(walk_out);

        if let Some(total) = hints.and_then(|h| h.duration_minutes) {
            absorb_waiting_time(&mut legs, total);
        }

        let itinerary =
            Itinerary::from_legs(origin, destination, legs, self.clock.now(), source)?;
        Ok(match hints {
            Some(hints) => itinerary.with_routes(&hints.routes),
            None => itinerary,
        })
    }

    async fn walk_leg(&self, from: Stop, to: Stop) -> TripLeg {
        let (a, b) = (from.location, to.location);
        let mut leg = TripLeg::new(LegKind::Walk, from, to);
        leg.instruction = format!("Walk to {}", leg.to);

        match self.bounded(self.routing.walk_route(a, b, true)).await {
            Ok(geometry) => {
                if !geometry.instructions.is_empty() {
                    leg.instruction = format!("{}: {}", leg.instruction, geometry.instructions.join(", "));
                }
                leg.distance_km = geometry.distance_km();
                leg.duration_minutes = geometry.duration_minutes();
                leg.polyline = geometry.polyline;
                leg.geometry = GeometrySource::Routed;
            },
            Err(e) => {
                warn!(to = %leg.to, error = %e, "Walking geometry unavailable, using straight line");
                self.straight_line(&mut leg, self.config.walking_speed_kmh);
            },
        }

        leg
    }

    /// Ride `stops`; a printed stop count wins when it is the larger one
    async fn ride_leg(
        &self,
        route: &str,
        from: Stop,
        to: Stop,
        stops: Vec<Stop>,
        printed_stops: Option<u32>,
    ) -> TripLeg {
        let kind = LegKind::ride_for_route(route);
        let speed = match kind {
            LegKind::RideMetro => self.config.metro_speed_kmh,
            _ => self.config.bus_speed_kmh,
        };

        let pairs: Vec<(GeoLocation, GeoLocation)> = stops
            .windows(2)
            .map(|pair| (pair[0].location, pair[1].location))
            .collect();
        let segments = join_all(pairs.iter().map(|&(a, b)| {
            let request = if kind == LegKind::RideMetro {
                self.routing.transit_route(a, b)
            } else {
                self.routing.vehicle_route(a, b)
            };
            self.bounded(request)
        }))
        .await;

        let mut polyline: Vec<GeoLocation> = Vec::new();
        let mut distance_km = 0.0;
        let mut duration_hours = 0.0;
        let mut straight_segments = 0usize;

        for (&(a, b), segment) in pairs.iter().zip(segments) {
            match segment {
                Ok(geometry) => {
                    distance_km += geometry.distance_km();
                    duration_hours += geometry.duration_s / 3600.0;
                    append_segment(&mut polyline, geometry.polyline);
                },
                Err(e) => {
                    debug!(error = %e, "Ride segment degraded to straight line");
                    let km = a.distance_km(&b);
                    distance_km += km;
                    duration_hours += km / speed;
                    straight_segments += 1;
                    append_segment(&mut polyline, vec![a, b]);
                },
            }
        }
        if straight_segments > 0 {
            warn!(route, straight_segments, total = pairs.len(), "Ride geometry partially unavailable");
        }

        let resolved = u32::try_from(stops.len().saturating_sub(1)).unwrap_or(u32::MAX);
        let stop_count = printed_stops.map_or(resolved, |printed| printed.max(resolved));

        let mut leg = TripLeg::new(kind, from, to);
        leg.route_number = Some(route.to_string());
        leg.instruction = format!(
            "Take {} {route} from {} to {} ({stop_count} {})",
            kind.label().to_lowercase(),
            leg.from,
            leg.to,
            if stop_count == 1 { "stop" } else { "stops" },
        );
        leg.distance_km = distance_km;
        leg.duration_minutes = hours_to_minutes(duration_hours);
        leg.polyline = polyline;
        leg.geometry = if straight_segments == 0 {
            GeometrySource::Routed
        } else {
            GeometrySource::StraightLine
        };
        leg.stops = stops;
        leg.stop_count = stop_count;
        leg
    }

    /// Degrade `leg` to a two-point line timed at `speed_kmh`
    fn straight_line(&self, leg: &mut TripLeg, speed_kmh: f64) {
        let (a, b) = (leg.from.location, leg.to.location);
        leg.distance_km = a.distance_km(&b);
        leg.duration_minutes = hours_to_minutes(leg.distance_km / speed_kmh);
        leg.polyline = vec![a, b];
        leg.geometry = GeometrySource::StraightLine;
    }

    /// Apply the per-call routing deadline and reject empty geometry
    async fn bounded<F>(&self, request: F) -> Result<RouteGeometry, ApplicationError>
    where
        F: Future<Output = Result<RouteGeometry, ApplicationError>>,
    {
        let deadline = self.config.routing_timeout();
        let geometry = tokio::time::timeout(deadline, request)
            .await
            .map_err(|_| {
                ApplicationError::GeometryUnavailable(format!(
                    "routing engine did not answer within {}s",
                    deadline.as_secs()
                ))
            })??;

        if geometry.polyline.is_empty() {
            return Err(ApplicationError::GeometryUnavailable(
                "routing engine returned an empty polyline".to_string(),
            ));
        }
        Ok(geometry)
    }
}

/// Stops to ride between the one nearest `origin` and the one nearest `destination`
///
/// `None` when fewer than two stops are known or both ends map to the same
/// stop. A list given in the opposite direction is ridden backwards.
fn ride_between(stops: &[Stop], origin: GeoLocation, destination: GeoLocation) -> Option<Vec<Stop>> {
    if stops.len() < 2 {
        return None;
    }
    let locations: Vec<GeoLocation> = stops.iter().map(|s| s.location).collect();
    let (board, _) = origin.nearest(&locations)?;
    let (alight, _) = destination.nearest(&locations)?;

    match board.cmp(&alight) {
        std::cmp::Ordering::Less => Some(stops[board..=alight].to_vec()),
        std::cmp::Ordering::Greater => Some(stops[alight..=board].iter().rev().cloned().collect()),
        std::cmp::Ordering::Equal => None,
    }
}

/// Concatenate a segment, dropping its first point when it repeats the joint
fn append_segment(polyline: &mut Vec<GeoLocation>, segment: Vec<GeoLocation>) {
    let mut points = segment.into_iter().peekable();
    if let (Some(last), Some(first)) = (polyline.last(), points.peek()) {
        if last.distance_km(first) < JOINT_TOLERANCE_KM {
            points.next();
        }
    }
    polyline.extend(points);
}

/// The page's scheduled total includes waiting; the ride leg absorbs any surplus
fn absorb_waiting_time(legs: &mut [TripLeg], total_minutes: u32) {
    let computed: u32 = legs.iter().map(|l| l.duration_minutes).sum();
    if total_minutes > computed {
        if let Some(ride) = legs.iter_mut().find(|l| l.kind.is_ride()) {
            ride.duration_minutes += total_minutes - computed;
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn hours_to_minutes(hours: f64) -> u32 {
    (hours.max(0.0) * 60.0).ceil() as u32
}
