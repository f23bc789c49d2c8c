//! Domain constants
//!
//! Centralized location for the fixed limits and well-known names the gateway
//! enforces regardless of configuration.

// Credential freshness
/// Cached credentials this close to expiry are re-inspected.
pub const FRESHNESS_MARGIN_SECS: i64 = 300;

// Scopes
pub const SPECIAL_ACCESS_SCOPE: &str = "page_public_content_access";
pub const BUSINESS_ACCOUNT_SCOPE: &str = "instagram_basic";

// Publish guard
pub const PUBLISH_CAP: usize = 25;
pub const PUBLISH_WINDOW_SECS: i64 = 24 * 3600;

// Upstream request shaping
pub const MAX_BATCH_OPERATIONS: usize = 50;
pub const GLOBAL_RATE_LIMIT_KEY: &str = "global";
pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";
pub const RETRY_AFTER_HEADER: &str = "retry-after";

/// Opaque usage headers passed through to callers in `meta`.
pub const USAGE_HEADERS: [&str; 4] =
    ["x-app-usage", "x-business-use-case-usage", "x-ad-account-usage", "fbtrace_id"];

pub const REDACTED: &str = "[REDACTED]";
