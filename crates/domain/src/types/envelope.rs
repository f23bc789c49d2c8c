//! Response envelopes returned to gateway callers

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::errors::{ErrorPayload, GatewayError};

/// `{ok, data, meta}` on success, `{ok, error, meta}` on failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
    #[serde(default)]
    pub meta: Map<String, Value>,
}

impl Envelope {
    pub fn success(data: Value, meta: Map<String, Value>) -> Self {
        Self { ok: true, data: Some(data), error: None, meta }
    }

    pub fn failure(error: &GatewayError) -> Self {
        Self { ok: false, data: None, error: Some(error.to_payload()), meta: Map::new() }
    }

    #[must_use]
    pub fn with_meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.meta.insert(key.into(), value.into());
        self
    }
}

impl<T: Serialize> From<crate::Result<T>> for Envelope {
    fn from(result: crate::Result<T>) -> Self {
        match result.and_then(|value| {
            serde_json::to_value(value).map_err(|e| GatewayError::validation(e.to_string()))
        }) {
            Ok(data) => Self::success(data, Map::new()),
            Err(err) => Self::failure(&err),
        }
    }
}
