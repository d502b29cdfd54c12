//! Domain entities

mod arrival;
mod itinerary;
mod lightweight_option;
mod stop;
mod trip_leg;

pub use arrival::{ArrivalObservation, BusArrival, StopArrivals};
pub use itinerary::{Itinerary, ItinerarySource};
pub use lightweight_option::LightweightOption;
pub use stop::Stop;
pub use trip_leg::{GeometrySource, LegKind, TripLeg, normalize_metro_line};
