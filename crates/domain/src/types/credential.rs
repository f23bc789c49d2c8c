//! Cached credential metadata

use std::collections::BTreeSet;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::FRESHNESS_MARGIN_SECS;
use crate::impl_domain_tag_conversions;

/// Category of subject a credential authenticates as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
    Page,
    BusinessAccount,
    AdAccount,
    SystemLevel,
}

impl_domain_tag_conversions!(CredentialKind {
    Page => "page",
    BusinessAccount => "business_account",
    AdAccount => "ad_account",
    SystemLevel => "system_level",
});

impl CredentialKind {
    /// Maps the upstream `type` string onto a kind.
    ///
    /// An explicit hint always wins. A missing upstream type is read as
    /// `USER`; anything unrecognized falls back to [`CredentialKind::SystemLevel`].
    pub fn from_upstream(raw: Option<&str>, hint: Option<Self>) -> Self {
        if let Some(kind) = hint {
            return kind;
        }
        match raw.unwrap_or("user").to_uppercase().as_str() {
            "PAGE" => Self::Page,
            "IG_USER" | "INSTAGRAM" => Self::BusinessAccount,
            "ADACCOUNT" | "AD_ACCOUNT" => Self::AdAccount,
            _ => Self::SystemLevel,
        }
    }
}

/// Validated credential metadata keyed by the credential digest.
///
/// The raw credential is never part of this record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub hash: String,
    pub kind: CredentialKind,
    pub subject_id: String,
    pub scopes: BTreeSet<String>,
    pub app_id: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub raw_metadata: Map<String, Value>,
}

impl CredentialRecord {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| now >= expires_at)
    }

    /// True once the record is inside the freshness margin before expiry.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expires_at
            .is_some_and(|expires_at| expires_at <= now + Duration::seconds(FRESHNESS_MARGIN_SECS))
    }

    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.contains(scope)
    }

    /// Required scopes this record lacks, in request order without repeats.
    pub fn missing_scopes<S: AsRef<str>>(&self, required: &[S]) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for scope in required.iter().map(AsRef::as_ref) {
            if !self.has_scope(scope) && !missing.iter().any(|m| m == scope) {
                missing.push(scope.to_string());
            }
        }
        missing
    }
}
