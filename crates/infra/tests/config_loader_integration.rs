//! Integration tests for configuration loader
//!
//! Tests the end-to-end behavior of loading configuration from files and
//! wiring a gateway from it.

use std::io::Write;

use graphgate_domain::ErrorKind;
use graphgate_infra::{config, Gateway};
use tempfile::{NamedTempFile, TempDir};

#[test]
fn test_load_config_from_json_file() {
    let json_content = r#"{
        "graph_api_base_url": "https://graph.example.test",
        "graph_api_version": "v19.0",
        "app_id": "4321",
        "app_secret": "secret-json",
        "request_timeout_secs": 10,
        "max_retries": 3,
        "cache_max_size": 64,
        "rate_limit_per_app": 200,
        "rate_limit_per_credential": 50,
        "pii_redaction_keys": ["access_token", "client_secret"]
    }"#;

    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(json_content.as_bytes()).expect("Failed to write to temp file");

    let path = temp_file.path().with_extension("json");
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");

    let config = config::load_from_file(Some(path.clone())).expect("JSON config should load");

    assert_eq!(config.graph_api_base_url, "https://graph.example.test");
    assert_eq!(config.graph_api_version, "v19.0");
    assert_eq!(config.app_access_token().as_deref(), Some("4321|secret-json"));
    assert_eq!(config.max_retries, 3);
    assert_eq!(config.cache_max_size, 64);
    assert_eq!(config.rate_limit_per_credential, 50);
    assert_eq!(config.pii_redaction_keys, vec!["access_token", "client_secret"]);
    // Unset fields keep their defaults.
    assert!((config.rate_limit_window_secs - 60.0).abs() < f64::EPSILON);

    std::fs::remove_file(path).ok();
}

#[test]
fn test_load_config_from_toml_file() {
    let toml_content = r#"
app_id = "8765"
system_user_access_token = "sys-token"
retry_backoff_factor_secs = 0.25
retry_backoff_max_secs = 5.0
enable_request_logging = true
"#;

    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(toml_content.as_bytes()).expect("Failed to write to temp file");

    let path = temp_file.path().with_extension("toml");
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");

    let config = config::load_from_file(Some(path.clone())).expect("TOML config should load");

    assert_eq!(config.app_id, "8765");
    assert_eq!(config.system_user_access_token.as_deref(), Some("sys-token"));
    assert!((config.retry_backoff_factor_secs - 0.25).abs() < f64::EPSILON);
    assert!(config.enable_request_logging);
    assert!(!format!("{config:?}").contains("sys-token"));

    std::fs::remove_file(path).ok();
}

#[test]
fn test_invalid_json_is_validation_error() {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(b"{ not json").expect("Failed to write to temp file");

    let path = temp_file.path().with_extension("json");
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");

    let err = config::load_from_file(Some(path.clone())).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(err.message.contains("Invalid JSON format"));

    std::fs::remove_file(path).ok();
}

#[tokio::test]
async fn test_gateway_from_loaded_config_creates_database() {
    let dir = TempDir::new().expect("temp dir");
    let db_path = dir.path().join("gateway.db");
    let config_path = dir.path().join("graphgate.toml");
    std::fs::write(
        &config_path,
        format!("app_id = \"1\"\ndatabase_path = \"{}\"\n", db_path.display()),
    )
    .expect("write config");

    let config = config::load_from_file(Some(config_path)).expect("config should load");
    let gateway = Gateway::from_config(config).expect("gateway should build");

    assert!(db_path.exists());
    assert_eq!(gateway.client().config().app_id, "1");
}
