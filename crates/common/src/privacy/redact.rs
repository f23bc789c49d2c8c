//! Redaction of sensitive request fields before logging

use std::collections::BTreeMap;

use serde_json::Value;

pub use graphgate_domain::constants::REDACTED;

fn is_sensitive<S: AsRef<str>>(key: &str, keys: &[S]) -> bool {
    keys.iter().any(|k| k.as_ref().eq_ignore_ascii_case(key))
}

/// Copy of `query` with every sensitive key replaced by [`REDACTED`].
pub fn redact_query<S: AsRef<str>>(
    query: &BTreeMap<String, Value>,
    keys: &[S],
) -> BTreeMap<String, Value> {
    query
        .iter()
        .map(|(key, value)| {
            let value = if is_sensitive(key, keys) {
                Value::String(REDACTED.to_string())
            } else {
                redact_value(value, keys)
            };
            (key.clone(), value)
        })
        .collect()
}

/// Recursively redacts sensitive keys inside JSON objects and arrays.
pub fn redact_value<S: AsRef<str>>(value: &Value, keys: &[S]) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, inner)| {
                    let inner = if is_sensitive(key, keys) {
                        Value::String(REDACTED.to_string())
                    } else {
                        redact_value(inner, keys)
                    };
                    (key.clone(), inner)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(|v| redact_value(v, keys)).collect()),
        other => other.clone(),
    }
}
