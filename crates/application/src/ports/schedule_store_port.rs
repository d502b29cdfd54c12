//! Schedule store port
//!
//! Read-only queries against a GTFS-shaped schedule database. No writes
//! originate from the itinerary pipeline.

use async_trait::async_trait;
use domain::Stop;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::ApplicationError;

/// A route as stored in the schedule database
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleRoute {
    /// Internal route id
    pub id: String,
    /// Public short name ("506", "L1")
    pub short_name: String,
    /// Descriptive long name
    pub long_name: Option<String>,
}

/// Port for schedule lookups
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ScheduleStorePort: Send + Sync {
    /// Find a route by its short name or internal id
    async fn route_by_name_or_id(
        &self,
        key: &str,
    ) -> Result<Option<ScheduleRoute>, ApplicationError>;

    /// Pick one trip that represents the route's full stop pattern
    async fn representative_trip(
        &self,
        route_id: &str,
    ) -> Result<Option<String>, ApplicationError>;

    /// Ordered stops served by a trip, each carrying its sequence index
    async fn stops_for_trip(&self, trip_id: &str) -> Result<Vec<Stop>, ApplicationError>;

    /// Find a stop by signage code or internal id, case-insensitively
    async fn stop_by_code(&self, code: &str) -> Result<Option<Stop>, ApplicationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn _assert_object_safe(_: &dyn ScheduleStorePort) {}

    #[test]
    fn trait_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn ScheduleStorePort>();
    }
}
