//! Buffered upstream response

use std::collections::BTreeMap;

use graphgate_domain::constants::USAGE_HEADERS;
use graphgate_domain::{GatewayError, Result};
use serde_json::{Map, Value};

/// A fully read upstream response.
///
/// Header names are lowercase. `from_cache` is set on responses synthesized
/// from the response cache.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
    pub from_cache: bool,
}

impl GraphResponse {
    pub(crate) async fn read(response: reqwest::Response) -> reqwest::Result<Self> {
        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (name.as_str().to_ascii_lowercase(), String::from_utf8_lossy(value.as_bytes()).into_owned())
            })
            .collect();
        let body = response.bytes().await?.to_vec();
        Ok(Self { status, headers, body, from_cache: false })
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 429 and 5xx, the statuses the executor retries.
    pub fn is_retryable(&self) -> bool {
        self.status == 429 || self.status >= 500
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decoded JSON body; a non-JSON body is a `REMOTE_FAILURE`.
    pub fn json(&self) -> Result<Value> {
        serde_json::from_slice(&self.body).map_err(|err| {
            GatewayError::remote("Upstream returned a non-JSON body")
                .with_detail("status", self.status)
                .with_detail("error", err.to_string())
        })
    }

    /// Decoded JSON body, or the lossy text when the body is not JSON.
    pub fn json_or_text(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or_else(|_| Value::String(self.text()))
    }

    pub fn is_json(&self) -> bool {
        serde_json::from_slice::<serde::de::IgnoredAny>(&self.body).is_ok()
    }

    /// Opaque usage headers, passed through to callers.
    pub fn usage_meta(&self) -> Map<String, Value> {
        usage_meta(&self.headers)
    }
}

pub(crate) fn usage_meta(headers: &BTreeMap<String, String>) -> Map<String, Value> {
    USAGE_HEADERS
        .iter()
        .filter_map(|name| headers.get(*name).map(|value| ((*name).to_string(), Value::String(value.clone()))))
        .collect()
}
