//! Observability bootstrap
//!
//! The gateway logs through `tracing` everywhere; this module installs the
//! process-wide subscriber.

pub mod logging;

pub use logging::{init_logging, DEFAULT_FILTER};
