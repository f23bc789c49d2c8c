//! Error types used throughout the gateway

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Closed taxonomy of failure kinds surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Auth,
    Permission,
    RateLimit,
    Validation,
    NotFound,
    Conflict,
    RemoteFailure,
    /// Reserved for operations the gateway deliberately does not implement.
    Unsupported,
}

impl ErrorKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auth => "AUTH",
            Self::Permission => "PERMISSION",
            Self::RateLimit => "RATE_LIMIT",
            Self::Validation => "VALIDATION",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::RemoteFailure => "REMOTE_FAILURE",
            Self::Unsupported => "UNSUPPORTED",
        }
    }

    /// Whether the executor may retry a response of this kind.
    pub const fn is_transient(self) -> bool {
        matches!(self, Self::RateLimit | Self::RemoteFailure)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for graphgate.
///
/// Every failure carries its kind plus structured details; callers surface it
/// verbatim through [`GatewayError::to_payload`].
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}: {message}")]
pub struct GatewayError {
    pub kind: ErrorKind,
    pub message: String,
    pub details: Map<String, Value>,
    /// Retry hint in seconds.
    pub retry_after: Option<f64>,
}

impl GatewayError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into(), details: Map::new(), retry_after: None }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Auth, message)
    }

    pub fn permission(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Permission, message)
    }

    pub fn rate_limit(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RateLimit, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, message)
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::RemoteFailure, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unsupported, message)
    }

    #[must_use]
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_details(mut self, details: Map<String, Value>) -> Self {
        self.details.extend(details);
        self
    }

    #[must_use]
    pub const fn with_retry_after(mut self, seconds: f64) -> Self {
        self.retry_after = Some(seconds);
        self
    }

    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.get(key)
    }

    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload {
            code: self.kind,
            message: self.message.clone(),
            details: (!self.details.is_empty()).then(|| self.details.clone()),
            retry_after: self.retry_after,
        }
    }
}

/// Structured failure payload `{code, message, details?, retry_after?}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<f64>,
}

impl From<ErrorPayload> for GatewayError {
    fn from(payload: ErrorPayload) -> Self {
        Self {
            kind: payload.code,
            message: payload.message,
            details: payload.details.unwrap_or_default(),
            retry_after: payload.retry_after,
        }
    }
}

/// Result type alias for graphgate operations
pub type Result<T> = std::result::Result<T, GatewayError>;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn kind_serializes_screaming_snake_case() {
        let encoded = serde_json::to_string(&ErrorKind::RemoteFailure).unwrap();
        assert_eq!(encoded, "\"REMOTE_FAILURE\"");
        assert_eq!(ErrorKind::RateLimit.to_string(), "RATE_LIMIT");
    }

    #[test]
    fn payload_omits_empty_details_and_missing_hint() {
        let payload = GatewayError::validation("bad input").to_payload();
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value, json!({"code": "VALIDATION", "message": "bad input"}));
    }

    #[test]
    fn payload_carries_details_and_retry_hint() {
        let err = GatewayError::rate_limit("slow down")
            .with_detail("limit", 25)
            .with_retry_after(86_400.0);
        let value = serde_json::to_value(err.to_payload()).unwrap();
        assert_eq!(value["details"]["limit"], json!(25));
        assert_eq!(value["retry_after"], json!(86_400.0));
    }

    #[test]
    fn payload_converts_back_into_error() {
        let original = GatewayError::permission("missing").with_detail("required_scope", "x");
        let restored = GatewayError::from(original.to_payload());
        assert_eq!(restored, original);
    }

    #[test]
    fn display_includes_kind_and_message() {
        let err = GatewayError::auth("Invalid access token");
        assert_eq!(err.to_string(), "AUTH: Invalid access token");
    }

    #[test]
    fn only_rate_limit_and_remote_failures_are_transient() {
        assert!(ErrorKind::RateLimit.is_transient());
        assert!(ErrorKind::RemoteFailure.is_transient());
        assert!(!ErrorKind::Validation.is_transient());
        assert!(!ErrorKind::Auth.is_transient());
    }
}
