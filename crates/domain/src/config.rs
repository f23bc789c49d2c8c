//! Gateway configuration

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::REDACTED;
use crate::errors::{GatewayError, Result};

pub const DEFAULT_GRAPH_API_BASE_URL: &str = "https://graph.facebook.com";
pub const DEFAULT_GRAPH_API_VERSION: &str = "v18.0";
pub const MAX_RETRIES_CEILING: u32 = 10;
/// Upper bound for every duration-valued setting (one day).
pub const MAX_DURATION_SECS: f64 = 86_400.0;

/// Settings consumed by the executor and the authorization service.
///
/// Unknown fields in config files are ignored; missing ones take the
/// defaults below.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub graph_api_base_url: String,
    pub graph_api_version: String,
    pub app_id: String,
    pub app_secret: Option<String>,
    pub system_user_access_token: Option<String>,
    pub request_timeout_secs: f64,
    pub max_retries: u32,
    pub retry_backoff_factor_secs: f64,
    pub retry_backoff_max_secs: f64,
    /// Zero disables the response cache.
    pub cache_max_size: usize,
    pub rate_limit_per_app: usize,
    pub rate_limit_per_credential: usize,
    pub rate_limit_window_secs: f64,
    pub database_path: String,
    pub enable_request_logging: bool,
    pub pii_redaction_keys: Vec<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            graph_api_base_url: DEFAULT_GRAPH_API_BASE_URL.to_string(),
            graph_api_version: DEFAULT_GRAPH_API_VERSION.to_string(),
            app_id: String::new(),
            app_secret: None,
            system_user_access_token: None,
            request_timeout_secs: 30.0,
            max_retries: 5,
            retry_backoff_factor_secs: 0.5,
            retry_backoff_max_secs: 30.0,
            cache_max_size: 256,
            rate_limit_per_app: 90,
            rate_limit_per_credential: 30,
            rate_limit_window_secs: 60.0,
            database_path: "graphgate.db".to_string(),
            enable_request_logging: false,
            pii_redaction_keys: ["access_token", "authorization", "password", "input_token"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl GatewayConfig {
    /// Default settings for the given application.
    pub fn for_app(app_id: impl Into<String>) -> Self {
        Self { app_id: app_id.into(), ..Self::default() }
    }

    /// Checks every bound, returning the first violation as `VALIDATION`.
    pub fn validate(&self) -> Result<()> {
        if self.app_id.trim().is_empty() {
            return Err(invalid("app_id", "must not be empty"));
        }
        if self.graph_api_base_url.trim().is_empty() {
            return Err(invalid("graph_api_base_url", "must not be empty"));
        }
        if !self.graph_api_version.starts_with('v') {
            return Err(invalid("graph_api_version", "must start with 'v'"));
        }
        if !(1.0..=MAX_DURATION_SECS).contains(&self.request_timeout_secs) {
            return Err(invalid("request_timeout_secs", "must be between 1 second and one day"));
        }
        if self.max_retries > MAX_RETRIES_CEILING {
            return Err(invalid("max_retries", "must be between 0 and 10"));
        }
        for (field, value) in [
            ("retry_backoff_factor_secs", self.retry_backoff_factor_secs),
            ("retry_backoff_max_secs", self.retry_backoff_max_secs),
        ] {
            if !(0.0..=MAX_DURATION_SECS).contains(&value) {
                return Err(invalid(field, "must be between 0 seconds and one day"));
            }
        }
        if self.rate_limit_per_app == 0 {
            return Err(invalid("rate_limit_per_app", "must be at least 1"));
        }
        if self.rate_limit_per_credential == 0 {
            return Err(invalid("rate_limit_per_credential", "must be at least 1"));
        }
        if !(self.rate_limit_window_secs > 0.0 && self.rate_limit_window_secs <= MAX_DURATION_SECS) {
            return Err(invalid("rate_limit_window_secs", "must be positive and at most one day"));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        bounded_duration(self.request_timeout_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        bounded_duration(self.rate_limit_window_secs)
    }

    /// `/{version}/{suffix}` for version-scoped endpoints.
    pub fn versioned_path(&self, suffix: &str) -> String {
        format!("/{}/{}", self.graph_api_version, suffix.trim_start_matches('/'))
    }

    /// `app_id|app_secret`, when a secret is configured.
    pub fn app_access_token(&self) -> Option<String> {
        self.app_secret.as_ref().map(|secret| format!("{}|{}", self.app_id, secret))
    }
}

/// Seconds clamped to `[0, MAX_DURATION_SECS]`; NaN reads as the upper bound.
fn bounded_duration(secs: f64) -> Duration {
    Duration::try_from_secs_f64(secs.min(MAX_DURATION_SECS)).unwrap_or(Duration::ZERO)
}

fn invalid(field: &str, reason: &str) -> GatewayError {
    GatewayError::validation(format!("Invalid configuration: {field} {reason}"))
        .with_detail("field", field)
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| REDACTED);
        f.debug_struct("GatewayConfig")
            .field("graph_api_base_url", &self.graph_api_base_url)
            .field("graph_api_version", &self.graph_api_version)
            .field("app_id", &self.app_id)
            .field("app_secret", &redact(&self.app_secret))
            .field("system_user_access_token", &redact(&self.system_user_access_token))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_factor_secs", &self.retry_backoff_factor_secs)
            .field("retry_backoff_max_secs", &self.retry_backoff_max_secs)
            .field("cache_max_size", &self.cache_max_size)
            .field("rate_limit_per_app", &self.rate_limit_per_app)
            .field("rate_limit_per_credential", &self.rate_limit_per_credential)
            .field("rate_limit_window_secs", &self.rate_limit_window_secs)
            .field("database_path", &self.database_path)
            .field("enable_request_logging", &self.enable_request_logging)
            .field("pii_redaction_keys", &self.pii_redaction_keys)
            .finish()
    }
}
