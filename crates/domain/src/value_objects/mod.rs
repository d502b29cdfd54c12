//! Value Objects - Immutable, identity-less domain primitives

mod geo_location;
mod stop_code;

pub use geo_location::{GeoLocation, InvalidCoordinates};
pub use stop_code::StopCode;
