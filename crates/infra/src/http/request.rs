//! Upstream request description

use std::collections::BTreeMap;

use graphgate_domain::{GatewayError, Result};
use reqwest::Method;
use serde_json::Value;

/// One file attached to a multipart upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl FilePart {
    pub fn new(field: impl Into<String>, file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self { field: field.into(), file_name: file_name.into(), content_type: None, bytes }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// A call the executor sends to the Graph API.
///
/// A JSON body and a form body (or files) are mutually exclusive; the
/// executor rejects requests carrying both before any network call.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphRequest {
    pub method: Method,
    pub path: String,
    pub query: BTreeMap<String, Value>,
    pub json: Option<Value>,
    pub form: BTreeMap<String, Value>,
    pub files: Vec<FilePart>,
    pub idempotency_key: Option<String>,
    pub use_cache: bool,
}

impl GraphRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: BTreeMap::new(),
            json: None,
            form: BTreeMap::new(),
            files: Vec::new(),
            idempotency_key: None,
            use_cache: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_query(mut self, query: BTreeMap<String, Value>) -> Self {
        self.query.extend(query);
        self
    }

    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.json = Some(body);
        self
    }

    #[must_use]
    pub fn form_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.form.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn file(mut self, part: FilePart) -> Self {
        self.files.push(part);
        self
    }

    #[must_use]
    pub fn idempotency_key(mut self, key: impl Into<String>) -> Self {
        self.idempotency_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn use_cache(mut self, enabled: bool) -> Self {
        self.use_cache = enabled;
        self
    }

    /// Path with exactly one leading `/`.
    pub fn normalized_path(&self) -> String {
        format!("/{}", self.path.trim_start_matches('/'))
    }

    /// Query entries with null values dropped.
    pub fn effective_query(&self) -> BTreeMap<String, Value> {
        self.query.iter().filter(|(_, v)| !v.is_null()).map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    pub fn has_form_body(&self) -> bool {
        !self.form.is_empty() || !self.files.is_empty()
    }

    /// Fails with `VALIDATION` when both a JSON and a form body are set.
    pub fn validate(&self) -> Result<()> {
        if self.json.is_some() && self.has_form_body() {
            return Err(GatewayError::validation(
                "JSON body cannot be combined with form data or files",
            )
            .with_detail("path", self.normalized_path()));
        }
        Ok(())
    }
}

/// Wire rendering of a query or form value.
///
/// Strings go out verbatim; everything else as its JSON text, which is how
/// the Graph API expects booleans, numbers and nested `fields` specs.
pub(crate) fn wire_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub(crate) fn wire_pairs(values: &BTreeMap<String, Value>) -> Vec<(String, String)> {
    values
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.clone(), wire_value(v)))
        .collect()
}
