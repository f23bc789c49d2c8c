//! Configuration loader
//!
//! Loads gateway configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Reads a `.env` file into the environment when one exists
//! 2. Attempts to load from environment variables (`GRAPHGATE_APP_ID` is
//!    required, everything else falls back to defaults)
//! 3. If that fails, falls back to loading from file
//! 4. Supports JSON and TOML formats
//!
//! Every loaded configuration is validated before it is returned.
//!
//! ## Environment Variables
//! - `GRAPHGATE_GRAPH_API_BASE_URL`, `GRAPHGATE_GRAPH_API_VERSION`
//! - `GRAPHGATE_APP_ID`, `GRAPHGATE_APP_SECRET`,
//!   `GRAPHGATE_SYSTEM_USER_ACCESS_TOKEN`
//! - `GRAPHGATE_REQUEST_TIMEOUT_SECS`, `GRAPHGATE_MAX_RETRIES`
//! - `GRAPHGATE_RETRY_BACKOFF_FACTOR_SECS`, `GRAPHGATE_RETRY_BACKOFF_MAX_SECS`
//! - `GRAPHGATE_CACHE_MAX_SIZE`
//! - `GRAPHGATE_RATE_LIMIT_PER_APP`, `GRAPHGATE_RATE_LIMIT_PER_CREDENTIAL`,
//!   `GRAPHGATE_RATE_LIMIT_WINDOW_SECS`
//! - `GRAPHGATE_DATABASE_PATH`
//! - `GRAPHGATE_ENABLE_REQUEST_LOGGING` (true/false)
//! - `GRAPHGATE_PII_REDACTION_KEYS` (comma separated)
//!
//! ## File Locations
//! The loader probes `graphgate.{json,toml}` then `config.{json,toml}` in the
//! current working directory, then the same names beside the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use graphgate_domain::{GatewayConfig, GatewayError, Result};

const FILE_NAMES: [&str; 4] = ["graphgate.json", "graphgate.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `VALIDATION` if neither source yields a valid configuration.
pub fn load() -> Result<GatewayConfig> {
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!(path = %path.display(), "Loaded .env file");
    }

    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from `GRAPHGATE_*` environment variables
///
/// # Errors
/// Returns `VALIDATION` if `GRAPHGATE_APP_ID` is missing, a value does not
/// parse, or the result fails validation.
pub fn load_from_env() -> Result<GatewayConfig> {
    let mut config = GatewayConfig::for_app(env_var("GRAPHGATE_APP_ID")?);

    if let Some(url) = env_opt("GRAPHGATE_GRAPH_API_BASE_URL") {
        config.graph_api_base_url = url;
    }
    if let Some(version) = env_opt("GRAPHGATE_GRAPH_API_VERSION") {
        config.graph_api_version = version;
    }
    config.app_secret = env_opt("GRAPHGATE_APP_SECRET");
    config.system_user_access_token = env_opt("GRAPHGATE_SYSTEM_USER_ACCESS_TOKEN");

    env_parse("GRAPHGATE_REQUEST_TIMEOUT_SECS", &mut config.request_timeout_secs)?;
    env_parse("GRAPHGATE_MAX_RETRIES", &mut config.max_retries)?;
    env_parse("GRAPHGATE_RETRY_BACKOFF_FACTOR_SECS", &mut config.retry_backoff_factor_secs)?;
    env_parse("GRAPHGATE_RETRY_BACKOFF_MAX_SECS", &mut config.retry_backoff_max_secs)?;
    env_parse("GRAPHGATE_CACHE_MAX_SIZE", &mut config.cache_max_size)?;
    env_parse("GRAPHGATE_RATE_LIMIT_PER_APP", &mut config.rate_limit_per_app)?;
    env_parse("GRAPHGATE_RATE_LIMIT_PER_CREDENTIAL", &mut config.rate_limit_per_credential)?;
    env_parse("GRAPHGATE_RATE_LIMIT_WINDOW_SECS", &mut config.rate_limit_window_secs)?;

    if let Some(path) = env_opt("GRAPHGATE_DATABASE_PATH") {
        config.database_path = path;
    }
    config.enable_request_logging =
        env_bool("GRAPHGATE_ENABLE_REQUEST_LOGGING", config.enable_request_logging);
    if let Some(keys) = env_opt("GRAPHGATE_PII_REDACTION_KEYS") {
        config.pii_redaction_keys = keys
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .collect();
    }

    config.validate()?;
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations (see
/// [`probe_config_paths`]). Format is chosen by extension.
///
/// # Errors
/// Returns `VALIDATION` if the file is missing, malformed, or the result
/// fails validation.
pub fn load_from_file(path: Option<PathBuf>) -> Result<GatewayConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(config_error(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            config_error("No config file found in any of the standard locations")
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| config_error(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

fn parse_config(contents: &str, path: &Path) -> Result<GatewayConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => {
            toml::from_str(contents).map_err(|e| config_error(format!("Invalid TOML format: {e}")))
        }
        "json" => serde_json::from_str(contents)
            .map_err(|e| config_error(format!("Invalid JSON format: {e}"))),
        _ => Err(config_error(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file among the standard locations, if any.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        candidates.extend(FILE_NAMES.iter().map(|name| cwd.join(name)));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            candidates.extend(FILE_NAMES.iter().map(|name| exe_dir.join(name)));
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn config_error(message: impl Into<String>) -> GatewayError {
    GatewayError::validation(message).with_detail("source", "config")
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| config_error(format!("Missing required environment variable: {key}")))
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Overwrites `slot` when `key` is set; an unparsable value is an error.
fn env_parse<T>(key: &str, slot: &mut T) -> Result<()>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    if let Some(raw) = env_opt(key) {
        *slot = raw
            .trim()
            .parse()
            .map_err(|e| config_error(format!("Invalid value for {key}: {e}")))?;
    }
    Ok(())
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
