//! Domain layer for trayecto
//!
//! Contains the transit vocabulary shared by every other crate: stops, legs,
//! itineraries, lightweight options and real-time arrivals.
//! This layer has no I/O and defines the ubiquitous language.

pub mod entities;
pub mod errors;
pub mod markers;
pub mod value_objects;

pub use entities::*;
pub use errors::DomainError;
pub use value_objects::*;
