//! Response caching for idempotent upstream calls
//!
//! - [`fingerprint`]: stable request key over method, path, query and body
//! - [`ResponseCache`]: bounded LRU store behind a single mutex; a capacity of
//!   zero turns every operation into a no-op
//!
//! # Example
//! ```
//! use std::collections::BTreeMap;
//!
//! use graphgate_common::cache::fingerprint;
//! use serde_json::json;
//!
//! let mut query = BTreeMap::new();
//! query.insert("fields".to_string(), json!("id,name"));
//! let key = fingerprint("GET", "/v18.0/me", &query, None);
//! assert_eq!(key.len(), 64);
//! ```

pub mod fingerprint;
#[cfg(feature = "runtime")]
pub mod response;

pub use fingerprint::fingerprint;
#[cfg(feature = "runtime")]
pub use response::{CacheStats, ResponseCache};
