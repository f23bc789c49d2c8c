//! Composition root
//!
//! One [`Gateway`] per process owns the executor and the authorization
//! service and hands both to every caller.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use graphgate_common::privacy::idempotency_key;
use graphgate_common::resilience::{Clock, SystemClock};
use graphgate_core::{AuthorizationService, CredentialInspector, CredentialStore};
use graphgate_domain::{CredentialKind, Envelope, GatewayConfig, Result};
use reqwest::Method;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::database::{DbManager, SqliteCredentialStore};
use crate::http::{GraphApiClient, GraphRequest};

const DEFAULT_POOL_SIZE: u32 = 4;

/// An upstream call guarded by a permission check.
#[derive(Debug, Clone)]
pub struct GuardedCall {
    pub request: GraphRequest,
    pub required_scopes: Vec<String>,
    pub require_special_access: bool,
    pub kind_hint: Option<CredentialKind>,
    /// Derive an idempotency key from method, path and payload when the
    /// request does not carry one.
    pub derive_idempotency_key: bool,
    /// Account whose publish cap the call counts against.
    pub publish_target: Option<String>,
}

impl GuardedCall {
    pub fn new(request: GraphRequest) -> Self {
        Self {
            request,
            required_scopes: Vec::new(),
            require_special_access: false,
            kind_hint: None,
            derive_idempotency_key: false,
            publish_target: None,
        }
    }

    #[must_use]
    pub fn scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_scopes.extend(scopes.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub fn special_access(mut self) -> Self {
        self.require_special_access = true;
        self
    }

    #[must_use]
    pub fn kind_hint(mut self, kind: CredentialKind) -> Self {
        self.kind_hint = Some(kind);
        self
    }

    #[must_use]
    pub fn idempotent(mut self) -> Self {
        self.derive_idempotency_key = true;
        self
    }

    /// Count the call against the publish cap of `target_id`, the account
    /// being published to.
    #[must_use]
    pub fn publish(mut self, target_id: impl Into<String>) -> Self {
        self.publish_target = Some(target_id.into());
        self
    }
}

/// Result of a successful guarded call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CallOutcome {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    /// Decoded JSON body, or the body text when it is not JSON.
    pub data: Value,
    /// Usage headers plus `token_subject_id` and `token_type`.
    pub meta: Map<String, Value>,
    pub from_cache: bool,
}

impl CallOutcome {
    pub fn into_envelope(self) -> Envelope {
        Envelope::success(self.data, self.meta)
    }
}

/// What the gateway knows about a credential.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PermissionsReport {
    pub credential_hash: String,
    pub subject_id: String,
    pub app_id: String,
    pub kind: CredentialKind,
    pub scopes: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub valid: bool,
}

pub struct Gateway {
    client: Arc<GraphApiClient>,
    auth: AuthorizationService,
}

impl Gateway {
    /// Wire a gateway whose credential inspection goes through `client`.
    pub fn new(client: Arc<GraphApiClient>, store: Arc<dyn CredentialStore>) -> Self {
        Self::with_clock(client, store, Arc::new(SystemClock))
    }

    pub fn with_clock(
        client: Arc<GraphApiClient>,
        store: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let inspector: Arc<dyn CredentialInspector> = client.clone();
        Self { auth: AuthorizationService::with_clock(inspector, store, clock), client }
    }

    /// Build the production wiring: reqwest executor plus the SQLite
    /// credential store at `database_path`.
    pub fn from_config(config: GatewayConfig) -> Result<Self> {
        let db = Arc::new(DbManager::new(&config.database_path, DEFAULT_POOL_SIZE)?);
        db.run_migrations()?;
        let store: Arc<dyn CredentialStore> = Arc::new(SqliteCredentialStore::new(db));
        let client = Arc::new(GraphApiClient::new(config)?);
        info!(
            api_version = %client.config().graph_api_version,
            database = %client.config().database_path,
            "gateway initialised"
        );
        Ok(Self::new(client, store))
    }

    pub fn client(&self) -> &GraphApiClient {
        &self.client
    }

    pub fn auth(&self) -> &AuthorizationService {
        &self.auth
    }

    /// Check permissions, then execute the call on behalf of `credential`.
    pub async fn perform_call(&self, credential: &str, call: GuardedCall) -> Result<CallOutcome> {
        let record = self
            .auth
            .ensure_permissions(
                credential,
                &call.required_scopes,
                call.require_special_access,
                call.kind_hint,
            )
            .await?;

        if let Some(target) = call.publish_target.as_deref() {
            self.auth.assert_publish_allowed(target)?;
        }

        let mut request = call.request;
        if let Some(Value::Object(body)) = request.json.as_mut() {
            body.retain(|_, value| !value.is_null());
        }
        request.form.retain(|_, value| !value.is_null());

        if call.derive_idempotency_key && request.idempotency_key.is_none() {
            let payload = request_payload(&request);
            let key = idempotency_key(request.method.as_str(), &request.normalized_path(), &payload);
            debug!(idempotency_key = %key, "derived idempotency key");
            request.idempotency_key = Some(key);
        }

        let response = self.client.execute(credential, request).await?;

        let mut meta = response.usage_meta();
        meta.insert("token_subject_id".into(), Value::String(record.subject_id.clone()));
        meta.insert("token_type".into(), Value::String(record.kind.to_string()));

        Ok(CallOutcome {
            status: response.status,
            data: response.json_or_text(),
            headers: response.headers,
            meta,
            from_cache: response.from_cache,
        })
    }

    /// Pass-through call requiring no scopes. GET requests use the response
    /// cache.
    pub async fn graph_request(
        &self,
        credential: &str,
        method: Method,
        path: &str,
        query: BTreeMap<String, Value>,
        json: Option<Value>,
    ) -> Result<CallOutcome> {
        let use_cache = method == Method::GET;
        let mut request = GraphRequest::new(method, path).with_query(query).use_cache(use_cache);
        request.json = json;
        self.perform_call(credential, GuardedCall::new(request)).await
    }

    /// Inspect `credential` and report what it grants.
    pub async fn permissions_check(&self, credential: &str) -> Result<PermissionsReport> {
        let record = self.auth.inspect(credential, None).await?;
        Ok(PermissionsReport {
            valid: !record.is_expired(Utc::now()),
            credential_hash: record.hash,
            subject_id: record.subject_id,
            app_id: record.app_id,
            kind: record.kind,
            scopes: record.scopes.into_iter().collect(),
            expires_at: record.expires_at,
        })
    }
}

/// Body used for idempotency derivation: the JSON body, else `{}`.
fn request_payload(request: &GraphRequest) -> Value {
    request.json.clone().unwrap_or_else(|| Value::Object(Map::new()))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn payload_is_json_body_or_empty_object() {
        let json_req = GraphRequest::post("me/feed").json(json!({"message": "hi"}));
        assert_eq!(request_payload(&json_req), json!({"message": "hi"}));

        let form_req = GraphRequest::post("me/feed").form_field("message", "hi");
        assert_eq!(request_payload(&form_req), json!({}));

        assert_eq!(request_payload(&GraphRequest::get("me")), json!({}));
    }

    #[test]
    fn guarded_call_builder_collects_requirements() {
        let call = GuardedCall::new(GraphRequest::post("1/media_publish"))
            .scopes(["instagram_basic", "instagram_content_publish"])
            .kind_hint(CredentialKind::BusinessAccount)
            .idempotent()
            .publish("1");

        assert_eq!(call.required_scopes, vec!["instagram_basic", "instagram_content_publish"]);
        assert_eq!(call.kind_hint, Some(CredentialKind::BusinessAccount));
        assert!(call.derive_idempotency_key);
        assert_eq!(call.publish_target.as_deref(), Some("1"));
        assert!(!call.require_special_access);
    }

    #[test]
    fn outcome_becomes_success_envelope() {
        let mut meta = Map::new();
        meta.insert("token_type".into(), json!("page"));
        let outcome = CallOutcome {
            status: 200,
            headers: BTreeMap::new(),
            data: json!({"id": "1"}),
            meta,
            from_cache: false,
        };
        let envelope = outcome.into_envelope();
        assert!(envelope.ok);
        assert_eq!(envelope.data, Some(json!({"id": "1"})));
        assert_eq!(envelope.meta["token_type"], json!("page"));
    }
}
