//! # graphgate Domain
//!
//! Business domain types for the graphgate access layer.
//!
//! This crate contains:
//! - The error taxonomy and the structured failure payload
//! - Credential kinds, cached credential records, and inspection results
//! - Gateway configuration and its validation rules
//! - Response envelopes and shared constants
//!
//! ## Architecture
//! - No dependencies on other graphgate crates
//! - No I/O; pure data and rules

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::GatewayConfig;
pub use errors::*;
pub use types::*;
