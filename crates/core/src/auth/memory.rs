//! In-memory credential store

use std::collections::HashMap;

use async_trait::async_trait;
use graphgate_domain::{CredentialRecord, Result};
use parking_lot::RwLock;

use super::ports::CredentialStore;

/// Process-local [`CredentialStore`] for tests and embedded deployments.
#[derive(Debug, Default)]
pub struct InMemoryCredentialStore {
    records: RwLock<HashMap<String, CredentialRecord>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn get(&self, hash: &str) -> Result<Option<CredentialRecord>> {
        Ok(self.records.read().get(hash).cloned())
    }

    async fn upsert(&self, record: &CredentialRecord) -> Result<()> {
        self.records.write().insert(record.hash.clone(), record.clone());
        Ok(())
    }
}
