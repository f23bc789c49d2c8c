//! Privacy Module
//!
//! One-way digests for credentials and request payloads, plus redaction of
//! sensitive query parameters before they reach logs.

pub mod digest;
pub mod redact;

// Re-export commonly used items
pub use digest::{credential_digest, idempotency_key, sha256_hex};
pub use redact::{redact_query, redact_value};
