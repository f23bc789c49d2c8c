//! Upstream error classification
//!
//! Maps a failed response onto the gateway taxonomy. Only the HTTP status
//! and the upstream numeric `code` decide the kind; everything else read
//! from the body or headers lands in `details` for observability.

use std::collections::BTreeMap;

use graphgate_domain::constants::RETRY_AFTER_HEADER;
use graphgate_domain::{ErrorKind, GatewayError};
use serde_json::{json, Map, Value};

use super::response::{usage_meta, GraphResponse};

/// Upstream code for an expired or invalidated access token.
pub const INVALID_TOKEN_CODE: i64 = 190;

/// Taxonomy kind for a failed response, rules in priority order.
pub fn classify(status: u16, upstream_code: Option<i64>) -> ErrorKind {
    if status == 401 || upstream_code == Some(INVALID_TOKEN_CODE) {
        return ErrorKind::Auth;
    }
    match status {
        403 => ErrorKind::Permission,
        404 => ErrorKind::NotFound,
        409 => ErrorKind::Conflict,
        429 => ErrorKind::RateLimit,
        500..=599 => ErrorKind::RemoteFailure,
        _ => ErrorKind::Validation,
    }
}

/// `Retry-After` in seconds; unparsable or negative values give `None`.
pub fn parse_retry_after(headers: &BTreeMap<String, String>) -> Option<f64> {
    headers
        .get(RETRY_AFTER_HEADER)
        .and_then(|value| value.trim().parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
}

/// Upstream codes arrive as numbers or numeric strings.
fn as_code(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Builds the classified error for a non-success response.
pub fn error_from_response(response: &GraphResponse) -> GatewayError {
    let payload = response
        .json()
        .ok()
        .filter(Value::is_object)
        .unwrap_or_else(|| json!({ "error": { "message": response.text() } }));
    let empty = Map::new();
    let err = payload.get("error").and_then(Value::as_object).unwrap_or(&empty);

    let message = err
        .get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.is_empty())
        .unwrap_or("Unknown error");
    let code = as_code(err.get("code"));
    let kind = classify(response.status, code);

    let mut details = Map::new();
    details.insert("status".into(), json!(response.status));
    for field in ["type", "code", "error_subcode"] {
        if let Some(value) = err.get(field).filter(|v| !v.is_null()) {
            details.insert(field.into(), value.clone());
        }
    }
    if let Some(trace) = err.get("fbtrace_id").filter(|v| !v.is_null()) {
        details.insert("fbtrace_id".into(), trace.clone());
    }
    if let Some(messages) = payload.pointer("/__debug__/messages") {
        details.insert("debug_messages".into(), messages.clone());
    }
    if let Some(title) = err.get("error_user_title") {
        details.insert("user_title".into(), title.clone());
    }
    if let Some(user_message) = err.get("error_user_msg") {
        details.insert("user_message".into(), user_message.clone());
    }
    details.insert("meta".into(), Value::Object(usage_meta(&response.headers)));

    let error = GatewayError::new(kind, message).with_details(details);
    match parse_retry_after(&response.headers) {
        Some(secs) => error.with_retry_after(secs),
        None => error,
    }
}
