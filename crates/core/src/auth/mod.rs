//! Credential authorization
//!
//! Callers validate a credential and its scopes through
//! [`AuthorizationService`] before asking the executor to perform the call.

pub mod memory;
pub mod ports;
pub mod publish_guard;
pub mod service;

pub use memory::InMemoryCredentialStore;
pub use publish_guard::PublishRateGuard;
pub use service::AuthorizationService;
