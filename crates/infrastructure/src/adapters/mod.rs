//! Adapters implementing application ports

mod browser_adapter;
mod routing_adapter;

pub use browser_adapter::BrowserPageScraper;
pub use routing_adapter::RoutingEngineAdapter;
