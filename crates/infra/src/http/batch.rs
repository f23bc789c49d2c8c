//! Batched Graph API calls

use graphgate_domain::constants::MAX_BATCH_OPERATIONS;
use graphgate_domain::{GatewayError, Result};
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::client::GraphApiClient;
use super::request::GraphRequest;
use super::response::GraphResponse;

/// One sub-request of a batch call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOperation {
    pub method: String,
    pub relative_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl BatchOperation {
    pub fn new(method: impl Into<String>, relative_url: impl Into<String>) -> Self {
        Self { method: method.into(), relative_url: relative_url.into(), body: None, name: None }
    }

    pub fn get(relative_url: impl Into<String>) -> Self {
        Self::new("GET", relative_url)
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl GraphApiClient {
    /// POST `operations` to the versioned batch endpoint.
    ///
    /// More than 50 operations is rejected with `VALIDATION` before any
    /// network call.
    pub async fn batch(
        &self,
        credential: &str,
        operations: &[BatchOperation],
    ) -> Result<GraphResponse> {
        if operations.len() > MAX_BATCH_OPERATIONS {
            return Err(GatewayError::validation("Batch operations cannot exceed 50")
                .with_detail("operations", operations.len())
                .with_detail("limit", MAX_BATCH_OPERATIONS));
        }

        let request = GraphRequest::post(self.config().versioned_path("batch"))
            .json(json!({ "batch": operations }));
        self.execute(credential, request).await
    }
}
