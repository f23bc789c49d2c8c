//! # graphgate Core
//!
//! Authorization logic layered over upstream credential inspection.
//!
//! This crate contains:
//! - The authorization service (credential cache, scope checks, publish cap)
//! - Port interfaces for credential storage and upstream inspection
//! - An in-memory credential store
//!
//! ## Architecture Principles
//! - Depends only on `graphgate-common` and `graphgate-domain`
//! - No database or HTTP code; both arrive through the ports

pub mod auth;

// Re-export specific items to avoid ambiguity
pub use auth::ports::{CredentialInspector, CredentialStore};
pub use auth::{AuthorizationService, InMemoryCredentialStore, PublishRateGuard};
