//! Modular common utilities shared across graphgate crates.
//!
//! # Feature Tiers
//!
//! Enable cargo features to opt into the tiers you need:
//! - `foundation`: request fingerprints, credential digests, redaction
//! - `runtime`: async infrastructure (clock, rate limiting, backoff, response
//!   cache)
//! - `observability`: tracing (pulled in by `runtime`)

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::complexity, clippy::suspicious)]

// Foundation tier
// -----------------------------------------------------------------
#[cfg(feature = "foundation")]
pub mod cache;
#[cfg(feature = "foundation")]
pub mod privacy;

// Runtime tier
// --------------------------------------------------------------------
#[cfg(feature = "runtime")]
pub mod resilience;

// Re-export commonly used types and traits for convenience
// ------------------------
#[cfg(feature = "foundation")]
pub use cache::fingerprint;
#[cfg(feature = "runtime")]
pub use cache::ResponseCache;
#[cfg(feature = "foundation")]
pub use privacy::{credential_digest, idempotency_key, redact_query, sha256_hex};
#[cfg(feature = "runtime")]
pub use resilience::{Backoff, Clock, MockClock, SlidingWindowRateLimiter, SystemClock};
