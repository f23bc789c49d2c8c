//! Upstream credential inspection results

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::credential::{CredentialKind, CredentialRecord};

/// Metadata the upstream platform reports for an inspected credential.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InspectionResult {
    pub app_id: Option<String>,
    /// Upstream `type` string, uninterpreted.
    pub kind: Option<String>,
    pub scopes: Vec<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub is_valid: bool,
    pub user_id: Option<String>,
    pub profile_id: Option<String>,
    /// The inspection payload as received, kept for audit.
    #[serde(default)]
    pub raw: Map<String, Value>,
}

impl InspectionResult {
    pub fn subject_id(&self) -> String {
        self.user_id
            .as_deref()
            .or(self.profile_id.as_deref())
            .filter(|id| !id.is_empty())
            .unwrap_or("unknown")
            .to_string()
    }

    /// Builds the cache record for a valid inspection.
    pub fn into_record(
        self,
        hash: String,
        hint: Option<CredentialKind>,
        issued_at: DateTime<Utc>,
    ) -> CredentialRecord {
        let kind = CredentialKind::from_upstream(self.kind.as_deref(), hint);
        let subject_id = self.subject_id();
        CredentialRecord {
            hash,
            kind,
            subject_id,
            scopes: self.scopes.into_iter().collect(),
            app_id: self.app_id.unwrap_or_default(),
            issued_at,
            expires_at: self.expires_at,
            raw_metadata: self.raw,
        }
    }
}
