use std::sync::Arc;

use graphgate_common::cache::{fingerprint, CacheStats, ResponseCache};
use graphgate_common::privacy::{credential_digest, redact_query};
use graphgate_common::resilience::{Backoff, Clock, SlidingWindowRateLimiter, SystemClock};
use graphgate_domain::constants::{GLOBAL_RATE_LIMIT_KEY, IDEMPOTENCY_HEADER};
use graphgate_domain::{GatewayConfig, GatewayError, Result};
use reqwest::header::ACCEPT;
use reqwest::multipart::{Form, Part};
use reqwest::{Client as ReqwestClient, RequestBuilder};
use tracing::{debug, warn};

use super::classify::{error_from_response, parse_retry_after};
use super::request::{wire_pairs, wire_value, GraphRequest};
use super::response::GraphResponse;
use crate::errors::InfraError;

/// Graph API executor with rate limiting, retries and response caching.
///
/// Every attempt acquires the global limiter and the per-credential limiter
/// (keyed by the credential digest). Transport failures, 429 and 5xx are
/// retried up to `max_retries` times; other failures surface immediately.
pub struct GraphApiClient {
    http: ReqwestClient,
    config: Arc<GatewayConfig>,
    base_url: String,
    clock: Arc<dyn Clock>,
    global_limiter: SlidingWindowRateLimiter<dyn Clock>,
    credential_limiter: SlidingWindowRateLimiter<dyn Clock>,
    backoff: Backoff,
    cache: ResponseCache<GraphResponse>,
}

impl GraphApiClient {
    /// Start building a client for `config`.
    pub fn builder(config: GatewayConfig) -> GraphApiClientBuilder {
        GraphApiClientBuilder::new(config)
    }

    /// Convenience constructor on the system clock.
    pub fn new(config: GatewayConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Execute `request` on behalf of `credential`.
    pub async fn execute(&self, credential: &str, request: GraphRequest) -> Result<GraphResponse> {
        request.validate()?;

        let path = request.normalized_path();
        let query = request.effective_query();
        let method = request.method.clone();
        let cache_key = fingerprint(method.as_str(), &path, &query, request.json.as_ref());

        if request.use_cache {
            if let Some(mut cached) = self.cache.get(&cache_key) {
                debug!(%method, %path, "response cache hit");
                cached.from_cache = true;
                return Ok(cached);
            }
            debug!(%method, %path, "response cache miss");
        }

        let credential_hash = credential_digest(credential);
        let url = format!("{}{}", self.base_url, path);
        let max_retries = self.config.max_retries;

        for attempt in 0..=max_retries {
            self.global_limiter.acquire(GLOBAL_RATE_LIMIT_KEY).await;
            self.credential_limiter.acquire(&credential_hash).await;
            let is_last = attempt == max_retries;

            if self.config.enable_request_logging {
                let redacted = redact_query(&query, &self.config.pii_redaction_keys);
                debug!(attempt = attempt + 1, %method, %path, query = ?redacted, credential_hash = %credential_hash, "sending Graph API request");
            } else {
                debug!(attempt = attempt + 1, %method, %path, "sending Graph API request");
            }

            let builder = self.build_request(credential, &request, &url)?;
            let response = match send_once(builder).await {
                Ok(response) => response,
                Err(err) => {
                    if is_last || !should_retry_error(&err) {
                        warn!(attempt = attempt + 1, %method, %path, error = %err, "Graph API request failed");
                        return Err(InfraError::from(err).into());
                    }
                    debug!(attempt = attempt + 1, %method, %path, error = %err, "transport failure, retrying");
                    self.backoff.sleep(attempt, self.clock.as_ref()).await;
                    continue;
                }
            };

            let status = response.status;
            debug!(attempt = attempt + 1, %method, %path, status, "received Graph API response");

            if response.is_retryable() {
                if is_last {
                    let error = error_from_response(&response);
                    warn!(%method, %path, status, kind = %error.kind, "retries exhausted");
                    return Err(error);
                }
                let retry_after = parse_retry_after(&response.headers).unwrap_or(0.0);
                debug!(attempt = attempt + 1, status, retry_after, "retryable status, backing off");
                // Values too large for a Duration count as unparsable.
                match std::time::Duration::try_from_secs_f64(retry_after) {
                    Ok(wait) if !wait.is_zero() => self.clock.sleep(wait).await,
                    Ok(_) => {}
                    Err(_) => debug!(retry_after, "ignoring out-of-range Retry-After"),
                }
                self.backoff.sleep(attempt, self.clock.as_ref()).await;
                continue;
            }

            if response.is_success() {
                if request.use_cache && response.is_json() {
                    self.cache.put(cache_key, response.clone());
                }
                return Ok(response);
            }

            let error = error_from_response(&response);
            debug!(%method, %path, status, kind = %error.kind, "Graph API request rejected");
            return Err(error);
        }

        Err(GatewayError::remote("Max retries exceeded").with_detail("path", path))
    }

    fn build_request(
        &self,
        credential: &str,
        request: &GraphRequest,
        url: &str,
    ) -> Result<RequestBuilder> {
        let mut builder = self
            .http
            .request(request.method.clone(), url)
            .bearer_auth(credential)
            .header(ACCEPT, "application/json");

        let query = wire_pairs(&request.query);
        if !query.is_empty() {
            builder = builder.query(&query);
        }
        if let Some(key) = &request.idempotency_key {
            builder = builder.header(IDEMPOTENCY_HEADER, key);
        }

        if let Some(body) = &request.json {
            builder = builder.json(body);
        } else if !request.files.is_empty() {
            builder = builder.multipart(multipart_form(request)?);
        } else if !request.form.is_empty() {
            builder = builder.form(&wire_pairs(&request.form));
        }

        Ok(builder)
    }
}

/// Multipart bodies are rebuilt for every attempt; `Form` cannot be cloned.
fn multipart_form(request: &GraphRequest) -> Result<Form> {
    let mut form = Form::new();
    for (key, value) in request.form.iter().filter(|(_, v)| !v.is_null()) {
        form = form.text(key.clone(), wire_value(value));
    }
    for file in &request.files {
        let mut part = Part::bytes(file.bytes.clone()).file_name(file.file_name.clone());
        if let Some(content_type) = &file.content_type {
            part = part.mime_str(content_type).map_err(|err| {
                GatewayError::validation("Invalid file content type")
                    .with_detail("field", file.field.clone())
                    .with_detail("error", err.to_string())
            })?;
        }
        form = form.part(file.field.clone(), part);
    }
    Ok(form)
}

async fn send_once(builder: RequestBuilder) -> reqwest::Result<GraphResponse> {
    let response = builder.send().await?;
    GraphResponse::read(response).await
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    if err.is_timeout() || err.is_request() || err.is_body() {
        return true;
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        if err.is_connect() {
            return true;
        }
    }
    false
}

/// Builder for [`GraphApiClient`].
pub struct GraphApiClientBuilder {
    config: GatewayConfig,
    clock: Option<Arc<dyn Clock>>,
    user_agent: Option<String>,
}

impl GraphApiClientBuilder {
    pub fn new(config: GatewayConfig) -> Self {
        Self { config, clock: None, user_agent: None }
    }

    /// Clock used for limiter waits, `Retry-After` and backoff sleeps.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<GraphApiClient> {
        self.config.validate()?;
        let config = self.config;

        let mut builder = ReqwestClient::builder().timeout(config.request_timeout()).no_proxy();
        if let Some(agent) = self.user_agent {
            builder = builder.user_agent(agent);
        }
        let http = builder.build().map_err(|err| GatewayError::from(InfraError::from(err)))?;

        let clock: Arc<dyn Clock> = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let window = config.rate_limit_window();
        let cache = ResponseCache::new(config.cache_max_size);

        Ok(GraphApiClient {
            http,
            base_url: config.graph_api_base_url.trim_end_matches('/').to_string(),
            global_limiter: SlidingWindowRateLimiter::with_clock(
                config.rate_limit_per_app,
                window,
                Arc::clone(&clock),
            ),
            credential_limiter: SlidingWindowRateLimiter::with_clock(
                config.rate_limit_per_credential,
                window,
                Arc::clone(&clock),
            ),
            backoff: Backoff::new(config.retry_backoff_factor_secs, config.retry_backoff_max_secs),
            cache,
            clock,
            config: Arc::new(config),
        })
    }
}
