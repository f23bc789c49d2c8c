//! Request fingerprints used as response-cache keys

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::privacy::sha256_hex;

/// Stable hash over `{method, path, query, json}`.
///
/// Null query values are dropped first and a missing body hashes like an
/// empty object. Headers never participate, so requests that differ only in
/// credentials or idempotency keys share a fingerprint.
pub fn fingerprint(
    method: &str,
    path: &str,
    query: &BTreeMap<String, Value>,
    json: Option<&Value>,
) -> String {
    let query: Map<String, Value> =
        query.iter().filter(|(_, v)| !v.is_null()).map(|(k, v)| (k.clone(), v.clone())).collect();

    let mut canonical = BTreeMap::new();
    canonical.insert("json", json.cloned().unwrap_or_else(|| Value::Object(Map::new())));
    canonical.insert("method", Value::String(method.to_ascii_uppercase()));
    canonical.insert("path", Value::String(path.to_string()));
    canonical.insert("query", Value::Object(query));

    sha256_hex(serde_json::to_string(&canonical).unwrap_or_default())
}
