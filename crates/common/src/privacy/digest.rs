//! SHA-256 digests for credentials and idempotency keys

use std::collections::BTreeMap;

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `input`.
pub fn sha256_hex(input: impl AsRef<[u8]>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_ref());
    hex::encode(hasher.finalize())
}

/// Stable digest used as the credential cache key and per-credential limiter
/// key. The raw credential never leaves this function.
pub fn credential_digest(credential: &str) -> String {
    sha256_hex(credential.as_bytes())
}

/// Idempotency key over `{method, path, payload}`.
///
/// `serde_json` maps are ordered by key, so nested objects hash the same
/// regardless of insertion order.
pub fn idempotency_key(method: &str, path: &str, payload: &Value) -> String {
    let mut canonical = BTreeMap::new();
    canonical.insert("method", Value::String(method.to_string()));
    canonical.insert("path", Value::String(path.to_string()));
    canonical.insert("payload", payload.clone());
    // BTreeMap<&str, Value> always serializes
    let encoded = serde_json::to_string(&canonical).unwrap_or_default();
    sha256_hex(encoded)
}
