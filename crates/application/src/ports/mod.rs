//! Port definitions for application layer
//!
//! Ports are interfaces that define how the application interacts with
//! external systems. Adapters in the infrastructure layer implement these ports.

mod clock_port;
mod page_scraper_port;
mod routing_engine_port;
mod schedule_store_port;

#[cfg(test)]
pub use clock_port::ManualClock;
pub use clock_port::{Clock, SystemClock};
#[cfg(test)]
pub use page_scraper_port::MockPageScraperPort;
pub use page_scraper_port::{PageRequest, PageScraperPort};
#[cfg(test)]
pub use routing_engine_port::MockRoutingEnginePort;
pub use routing_engine_port::{RouteGeometry, RoutingEnginePort};
#[cfg(test)]
pub use schedule_store_port::MockScheduleStorePort;
pub use schedule_store_port::{ScheduleRoute, ScheduleStorePort};
