//! Port interfaces for credential authorization
//!
//! These traits define the boundaries between the authorization service and
//! the infrastructure that persists records and talks to the upstream API.

use async_trait::async_trait;
use graphgate_domain::{CredentialRecord, InspectionResult, Result};

/// Persistence for inspected credential metadata, keyed by digest.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Get the record for a credential digest
    async fn get(&self, hash: &str) -> Result<Option<CredentialRecord>>;

    /// Insert the record, or replace every field of an existing one
    async fn upsert(&self, record: &CredentialRecord) -> Result<()>;
}

/// Upstream lookup of a raw credential's metadata.
#[async_trait]
pub trait CredentialInspector: Send + Sync {
    async fn inspect(&self, credential: &str) -> Result<InspectionResult>;
}
