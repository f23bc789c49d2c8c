//! Authorization service - credential cache and permission checks

use std::sync::Arc;

use chrono::{DateTime, Utc};
use graphgate_common::privacy::credential_digest;
use graphgate_common::resilience::{Clock, SystemClock};
use graphgate_domain::constants::{BUSINESS_ACCOUNT_SCOPE, SPECIAL_ACCESS_SCOPE};
use graphgate_domain::{CredentialKind, CredentialRecord, GatewayError, Result};
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::ports::{CredentialInspector, CredentialStore};
use super::publish_guard::PublishRateGuard;

/// Validates credentials against cached upstream metadata.
///
/// Records are served from the store until they enter the freshness margin.
/// Upstream inspection runs under one process-wide lock with a re-check
/// inside it, so concurrent first lookups of the same credential produce a
/// single upstream call.
pub struct AuthorizationService {
    inspector: Arc<dyn CredentialInspector>,
    store: Arc<dyn CredentialStore>,
    clock: Arc<dyn Clock>,
    inspect_lock: Mutex<()>,
    publish_guard: PublishRateGuard,
}

impl AuthorizationService {
    /// Create a new authorization service on the system clock
    pub fn new(inspector: Arc<dyn CredentialInspector>, store: Arc<dyn CredentialStore>) -> Self {
        Self::with_clock(inspector, store, Arc::new(SystemClock))
    }

    pub fn with_clock(
        inspector: Arc<dyn CredentialInspector>,
        store: Arc<dyn CredentialStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inspector,
            store,
            clock,
            inspect_lock: Mutex::new(()),
            publish_guard: PublishRateGuard::default(),
        }
    }

    /// Replace the publish guard (custom caps in tests or deployments)
    #[must_use]
    pub fn with_publish_guard(mut self, guard: PublishRateGuard) -> Self {
        self.publish_guard = guard;
        self
    }

    fn now(&self) -> DateTime<Utc> {
        DateTime::<Utc>::from(self.clock.system_time())
    }

    async fn fresh_record(&self, hash: &str) -> Result<Option<CredentialRecord>> {
        let now = self.now();
        Ok(self.store.get(hash).await?.filter(|record| !record.needs_refresh(now)))
    }

    /// Metadata for `credential`, from cache when fresh, else from upstream.
    ///
    /// `hint` overrides the upstream-reported kind for newly inspected
    /// credentials.
    pub async fn inspect(
        &self,
        credential: &str,
        hint: Option<CredentialKind>,
    ) -> Result<CredentialRecord> {
        let hash = credential_digest(credential);

        if let Some(record) = self.fresh_record(&hash).await? {
            debug!(credential_hash = %hash, kind = %record.kind, "credential cache hit");
            return Ok(record);
        }

        let _guard = self.inspect_lock.lock().await;

        // Another task may have refreshed the record while we queued.
        if let Some(record) = self.fresh_record(&hash).await? {
            debug!(credential_hash = %hash, "credential refreshed by concurrent lookup");
            return Ok(record);
        }

        info!(credential_hash = %hash, "inspecting credential upstream");
        let result = self.inspector.inspect(credential).await?;
        if !result.is_valid {
            warn!(credential_hash = %hash, "upstream reports credential invalid");
            let trace = result.raw.get("fbtrace_id").cloned().unwrap_or(Value::Null);
            return Err(GatewayError::auth("Invalid access token").with_detail("fbtrace_id", trace));
        }

        let record = result.into_record(hash, hint, self.now());
        self.store.upsert(&record).await?;
        debug!(
            credential_hash = %record.hash,
            kind = %record.kind,
            scopes = record.scopes.len(),
            "credential cached"
        );
        Ok(record)
    }

    /// Inspects `credential` and checks it carries every required scope,
    /// the special-access scope when asked for, and has not expired.
    pub async fn ensure_permissions<S: AsRef<str> + Sync>(
        &self,
        credential: &str,
        required_scopes: &[S],
        require_special_access: bool,
        hint: Option<CredentialKind>,
    ) -> Result<CredentialRecord> {
        let record = self.inspect(credential, hint).await?;

        let missing = record.missing_scopes(required_scopes);
        if !missing.is_empty() {
            debug!(credential_hash = %record.hash, ?missing, "credential missing scopes");
            return Err(GatewayError::permission("Access token missing required scopes")
                .with_detail("missing_scopes", missing));
        }

        if require_special_access && !record.has_scope(SPECIAL_ACCESS_SCOPE) {
            return Err(GatewayError::permission("Special access scope required for this operation")
                .with_detail("required_scope", SPECIAL_ACCESS_SCOPE));
        }

        if record.is_expired(self.now()) {
            let expires_at = record.expires_at.map(|at| at.to_rfc3339());
            return Err(GatewayError::auth("Access token expired").with_detail("expires_at", expires_at));
        }

        Ok(record)
    }

    /// Fails with `PERMISSION` unless the record is business-account capable.
    pub fn ensure_business_account(&self, record: &CredentialRecord) -> Result<()> {
        if record.has_scope(BUSINESS_ACCOUNT_SCOPE) {
            Ok(())
        } else {
            Err(GatewayError::permission("Business account scope required")
                .with_detail("required_scope", BUSINESS_ACCOUNT_SCOPE))
        }
    }

    /// Records a publish for `subject_id` or fails with `RATE_LIMIT`.
    pub fn assert_publish_allowed(&self, subject_id: &str) -> Result<()> {
        self.publish_guard.check_and_record(subject_id, self.now())
    }

    /// Publishes recorded for `subject_id` in the current window.
    pub fn publish_count(&self, subject_id: &str) -> usize {
        self.publish_guard.recorded(subject_id, self.now())
    }
}

impl std::fmt::Debug for AuthorizationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthorizationService")
            .field("publish_guard", &self.publish_guard)
            .finish_non_exhaustive()
    }
}
