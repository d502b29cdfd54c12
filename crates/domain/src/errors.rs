//! Domain-level errors

use thiserror::Error;

/// Errors that can occur in the domain layer
#[derive(Debug, Error)]
pub enum DomainError {
    /// Stop code is empty or contains characters that never appear on signage
    #[error("Invalid stop code: {0}")]
    InvalidStopCode(String),

    /// Coordinates outside the valid latitude/longitude range
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    /// Entity not found
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    /// Validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),

    /// Consecutive legs do not share their joint stop
    #[error("Leg {leg_index} does not start where the previous leg ends")]
    BrokenContinuity { leg_index: usize },

    /// An itinerary must contain at least one leg
    #[error("Itinerary has no legs")]
    EmptyItinerary,
}

impl DomainError {
    /// Create a not found error
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }
}
