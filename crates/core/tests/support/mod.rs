//! Shared test helpers for `graphgate-core` integration tests.
//!
//! Provides a scripted upstream inspector so tests can focus on caching and
//! locking behaviour instead of HTTP plumbing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use graphgate_core::CredentialInspector;
use graphgate_domain::{InspectionResult, Result};
use parking_lot::Mutex;

/// Inspector answering from a fixed table, with an optional delay that lets
/// concurrent callers pile up on the inspection lock.
#[derive(Default)]
pub struct ScriptedInspector {
    responses: Mutex<HashMap<String, InspectionResult>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl ScriptedInspector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_credential(self, credential: &str, subject: &str, scopes: &[&str]) -> Self {
        self.responses.lock().insert(
            credential.to_string(),
            InspectionResult {
                app_id: Some("1234".into()),
                kind: Some("USER".into()),
                scopes: scopes.iter().map(|s| (*s).to_string()).collect(),
                is_valid: true,
                user_id: Some(subject.to_string()),
                ..InspectionResult::default()
            },
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CredentialInspector for ScriptedInspector {
    async fn inspect(&self, credential: &str) -> Result<InspectionResult> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self.responses.lock().get(credential).cloned().unwrap_or_default())
    }
}
