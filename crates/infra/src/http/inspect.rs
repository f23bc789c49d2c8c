//! Credential inspection through `debug_token`

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use graphgate_core::CredentialInspector;
use graphgate_domain::{InspectionResult, Result};
use serde_json::{Map, Value};
use tracing::debug;

use super::client::GraphApiClient;
use super::request::GraphRequest;

/// Ids arrive as strings or bare numbers.
fn id_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Maps the `data` object of a `debug_token` payload.
///
/// An `expires_at` of zero means the credential never expires.
pub fn parse_inspection(data: &Map<String, Value>) -> InspectionResult {
    let expires_at = data
        .get("expires_at")
        .and_then(Value::as_i64)
        .filter(|secs| *secs > 0)
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0));

    InspectionResult {
        app_id: id_string(data.get("app_id")),
        kind: data.get("type").and_then(Value::as_str).map(str::to_string),
        scopes: data
            .get("scopes")
            .and_then(Value::as_array)
            .map(|scopes| scopes.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default(),
        expires_at,
        is_valid: data.get("is_valid").and_then(Value::as_bool).unwrap_or(false),
        user_id: id_string(data.get("user_id")),
        profile_id: id_string(data.get("profile_id")),
        raw: data.clone(),
    }
}

impl GraphApiClient {
    /// Look up `credential` metadata upstream.
    ///
    /// Authenticates with the system user token when configured, else with
    /// the inspected credential. The app access token is sent as
    /// `access_token` when an app secret is configured.
    pub async fn debug_token(&self, credential: &str) -> Result<InspectionResult> {
        let config = self.config();
        let mut request =
            GraphRequest::get(config.versioned_path("debug_token")).query("input_token", credential);
        if let Some(app_token) = config.app_access_token() {
            request = request.query("access_token", app_token);
        }
        let bearer = config.system_user_access_token.as_deref().unwrap_or(credential);

        let response = self.execute(bearer, request).await?;
        let payload = response.json()?;
        let mut data = payload.get("data").and_then(Value::as_object).cloned().unwrap_or_default();
        if let Some(trace) = response.header("fbtrace_id") {
            data.entry("fbtrace_id").or_insert_with(|| Value::String(trace.to_string()));
        }

        let result = parse_inspection(&data);
        debug!(is_valid = result.is_valid, kind = ?result.kind, scopes = result.scopes.len(), "debug_token answered");
        Ok(result)
    }
}

#[async_trait]
impl CredentialInspector for GraphApiClient {
    async fn inspect(&self, credential: &str) -> Result<InspectionResult> {
        self.debug_token(credential).await
    }
}
