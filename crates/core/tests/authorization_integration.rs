//! Integration tests for the authorization service
//!
//! Covers the inspection lock, the double-checked cache read, and the
//! scope checks callers rely on before executing upstream calls.

mod support;

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use graphgate_core::{AuthorizationService, CredentialStore, InMemoryCredentialStore};
use graphgate_domain::{CredentialKind, ErrorKind};
use serde_json::json;
use support::ScriptedInspector;

/// Validates concurrent first lookups of one credential share one upstream
/// call.
///
/// # Test Steps
/// 1. Inspector sleeps so that every caller queues on the lock
/// 2. Eight tasks inspect the same credential at once
/// 3. Verify exactly one upstream inspection and identical records
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_first_lookups_share_one_inspection() {
    let inspector = Arc::new(
        ScriptedInspector::new()
            .with_delay(Duration::from_millis(50))
            .with_credential("EAAB-shared", "subject-1", &["pages_show_list"]),
    );
    let store = Arc::new(InMemoryCredentialStore::new());
    let service = Arc::new(AuthorizationService::new(inspector.clone(), store.clone()));

    let records = join_all((0..8).map(|_| {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.inspect("EAAB-shared", None).await })
    }))
    .await;

    assert_eq!(inspector.calls(), 1, "only the first caller should reach upstream");
    let records: Vec<_> = records.into_iter().map(|r| r.unwrap().unwrap()).collect();
    assert!(records.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(store.len(), 1);
}

/// Validates different credentials are inspected one at a time but each once.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_distinct_credentials_each_inspected_once() {
    let inspector = Arc::new(
        ScriptedInspector::new()
            .with_delay(Duration::from_millis(10))
            .with_credential("a", "sa", &[])
            .with_credential("b", "sb", &[])
            .with_credential("c", "sc", &[]),
    );
    let store = Arc::new(InMemoryCredentialStore::new());
    let service = Arc::new(AuthorizationService::new(inspector.clone(), store.clone()));

    let lookups = ["a", "b", "c", "a", "b", "c"].map(|credential| {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.inspect(credential, None).await })
    });
    for handle in join_all(lookups).await {
        handle.unwrap().unwrap();
    }

    assert_eq!(inspector.calls(), 3);
    assert_eq!(store.len(), 3);
}

/// Validates the permission failure payload callers surface verbatim.
#[tokio::test]
async fn test_missing_scope_payload() {
    let inspector = Arc::new(
        ScriptedInspector::new().with_credential("tok", "page-1", &["pages_read_engagement"]),
    );
    let service =
        AuthorizationService::new(inspector, Arc::new(InMemoryCredentialStore::new()));

    let err = service
        .ensure_permissions("tok", &["pages_manage_posts"], false, Some(CredentialKind::Page))
        .await
        .unwrap_err();

    let payload = serde_json::to_value(err.to_payload()).unwrap();
    assert_eq!(payload["code"], json!("PERMISSION"));
    assert_eq!(payload["details"]["missing_scopes"], json!(["pages_manage_posts"]));
}

/// Validates the stored row never contains the raw credential.
#[tokio::test]
async fn test_store_is_keyed_by_digest_only() {
    let inspector = Arc::new(ScriptedInspector::new().with_credential("EAAB-raw", "u", &["x"]));
    let store = Arc::new(InMemoryCredentialStore::new());
    let service = AuthorizationService::new(inspector, store.clone());

    let record = service.inspect("EAAB-raw", None).await.unwrap();

    assert!(store.get("EAAB-raw").await.unwrap().is_none());
    let stored = store.get(&record.hash).await.unwrap().unwrap();
    assert!(!serde_json::to_string(&stored).unwrap().contains("EAAB-raw"));
    assert_eq!(stored.kind, CredentialKind::SystemLevel);
}

/// Validates an unknown credential (upstream says invalid) is rejected.
#[tokio::test]
async fn test_unknown_credential_is_auth_error() {
    let service = AuthorizationService::new(
        Arc::new(ScriptedInspector::new()),
        Arc::new(InMemoryCredentialStore::new()),
    );
    let err = service.inspect("nope", None).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Auth);
}
