//! Structured logging setup

use graphgate_domain::GatewayConfig;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info";

/// Installs a JSON `tracing` subscriber filtered by `RUST_LOG`.
///
/// With `enable_request_logging` the executor's per-attempt events are
/// `debug`, so the default filter is widened for the graphgate crates.
/// Returns `false` when a global subscriber was already installed.
pub fn init_logging(config: &GatewayConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(config)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().json().with_target(true))
        .try_init()
        .is_ok()
}

fn default_directives(config: &GatewayConfig) -> String {
    if config.enable_request_logging {
        format!("{DEFAULT_FILTER},graphgate_infra=debug")
    } else {
        DEFAULT_FILTER.to_string()
    }
}
