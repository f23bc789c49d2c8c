//! # graphgate Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The Graph API executor (rate limiting, retries, caching, batch,
//!   pagination, credential inspection)
//! - The SQLite credential store
//! - Configuration loading and logging bootstrap
//! - The [`Gateway`] composition root
//!
//! ## Architecture
//! - Implements traits defined in `graphgate-core`
//! - Contains all "impure" code (HTTP, SQLite, environment)

pub mod config;
pub mod database;
pub mod errors;
pub mod gateway;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use database::{DbManager, SqliteCredentialStore};
pub use errors::InfraError;
pub use gateway::{CallOutcome, Gateway, GuardedCall, PermissionsReport};
pub use http::*;
pub use observability::init_logging;
