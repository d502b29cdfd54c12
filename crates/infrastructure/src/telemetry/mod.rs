//! Structured logging
//!
//! Installs the global `tracing` subscriber. Events go to stderr so command
//! output on stdout stays machine-readable.

mod logging;

pub use logging::{TelemetryError, init_logging};
