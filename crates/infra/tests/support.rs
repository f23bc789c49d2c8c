//! Shared helpers for `graphgate-infra` integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use graphgate_common::resilience::MockClock;
use graphgate_domain::GatewayConfig;
use graphgate_infra::database::DbManager;
use graphgate_infra::GraphApiClient;
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const APP_ID: &str = "1234";

/// Temporary database wrapper that keeps the underlying file alive for the
/// duration of a test run.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    _temp_dir: TempDir,
}

impl TestDatabase {
    /// Create a new temporary database with the schema applied.
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let db_path = temp_dir.path().join("graphgate-test.db");

        let manager = DbManager::new(&db_path, 4).expect("db manager should be created");
        manager.run_migrations().expect("schema migrations should apply");

        Self { manager: Arc::new(manager), _temp_dir: temp_dir }
    }
}

impl Default for TestDatabase {
    fn default() -> Self {
        Self::new()
    }
}

/// Config pointed at `server` with a small retry ceiling.
pub fn test_config(server: &MockServer) -> GatewayConfig {
    GatewayConfig {
        graph_api_base_url: server.uri(),
        max_retries: 2,
        ..GatewayConfig::for_app(APP_ID)
    }
}

/// Client whose sleeps complete instantly on `clock`.
pub fn client_with(config: GatewayConfig, clock: Arc<MockClock>) -> GraphApiClient {
    GraphApiClient::builder(config).clock(clock).build().expect("client should build")
}

/// `debug_token` payload for a valid credential.
pub fn token_data(kind: &str, subject: &str, scopes: &[&str]) -> Value {
    json!({
        "data": {
            "app_id": APP_ID,
            "type": kind,
            "scopes": scopes,
            "expires_at": 0,
            "is_valid": true,
            "user_id": subject
        }
    })
}

/// Mount a `debug_token` answer for `credential`, expected `calls` times.
pub async fn mount_debug_token(server: &MockServer, credential: &str, body: Value, calls: u64) {
    Mock::given(method("GET"))
        .and(path("/v18.0/debug_token"))
        .and(query_param("input_token", credential))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(calls)
        .mount(server)
        .await;
}
