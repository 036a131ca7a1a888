//! Core HTTP transport: one attempt per call, typed network failures.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{is_retryable_status, Error, ErrorKind, FailureCause, Result};
use crate::request::{RequestBody, RequestBuilder, RequestMethod};
use crate::response::Response;
use crate::retry::{RetryConfig, RetryPolicy};

/// HTTP client for Salesforce APIs.
///
/// `execute` issues exactly one request. A failure to get any response at all
/// becomes [`ErrorKind::HttpGet`] or [`ErrorKind::HttpPost`]; a response with
/// a non-2xx status is returned as-is for the caller to interpret.
#[derive(Debug, Clone)]
pub struct SfHttpClient {
    inner: reqwest::Client,
    config: ClientConfig,
}

impl SfHttpClient {
    /// Create a new HTTP client.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .user_agent(&config.user_agent)
            .gzip(config.accept_compressed)
            .deflate(config.accept_compressed)
            .build()
            .map_err(|e| Error::with_source(ErrorKind::Config(e.to_string()), e))?;

        Ok(Self { inner, config })
    }

    /// Create a new HTTP client with default configuration.
    pub fn default_client() -> Result<Self> {
        Self::new(ClientConfig::default())
    }

    /// Get the client configuration.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Create a GET request builder.
    pub fn get(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Get, url)
    }

    /// Create a POST request builder.
    pub fn post(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Post, url)
    }

    /// Create a PATCH request builder.
    pub fn patch(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Patch, url)
    }

    /// Create a DELETE request builder.
    pub fn delete(&self, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(RequestMethod::Delete, url)
    }

    /// Execute a request once.
    pub async fn execute(&self, request: &RequestBuilder) -> Result<Response> {
        self.execute_cancellable(request, &CancellationToken::new())
            .await
    }

    /// Execute a request once, abandoning it if `cancel` fires first.
    #[instrument(skip(self, request, cancel), fields(method = ?request.method, url = %request.url))]
    pub async fn execute_cancellable(
        &self,
        request: &RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<Response> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(failure(request, FailureCause::Cancelled, None)),
            result = self.execute_once(request) => result,
        }
    }

    /// Execute a request, retrying network failures and 429/5xx responses
    /// according to `retry`.
    ///
    /// When the budget runs out the last outcome is returned unchanged: the
    /// final error, or the final retryable response.
    #[instrument(skip(self, request, retry, cancel), fields(method = ?request.method, url = %request.url))]
    pub async fn execute_with_retry(
        &self,
        request: &RequestBuilder,
        retry: &RetryConfig,
        cancel: &CancellationToken,
    ) -> Result<Response> {
        let mut policy = RetryPolicy::new(retry.clone());

        loop {
            let delay = match self.execute_cancellable(request, cancel).await {
                Ok(response) if is_retryable_status(response.status()) => {
                    match policy.next_delay(response.retry_after()) {
                        Some(delay) => {
                            warn!(
                                attempt = policy.attempt(),
                                delay_ms = delay.as_millis(),
                                status = response.status(),
                                "Retryable status, retrying"
                            );
                            delay
                        }
                        None => return Ok(response),
                    }
                }
                Err(err) if err.is_retryable() => match policy.next_delay(err.retry_after()) {
                    Some(delay) => {
                        warn!(
                            attempt = policy.attempt(),
                            delay_ms = delay.as_millis(),
                            error = %err,
                            "Request failed, retrying"
                        );
                        delay
                    }
                    None => return Err(err),
                },
                outcome => return outcome,
            };

            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    return Err(failure(request, FailureCause::Cancelled, None));
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Send one request and read the whole body.
    async fn execute_once(&self, request: &RequestBuilder) -> Result<Response> {
        let mut req = self
            .inner
            .request(request.method.to_reqwest(), &request.url);

        if request.header_value("Accept").is_none() {
            req = req.header("Accept", "application/json");
        }

        if let Some(ref token) = request.bearer_token {
            req = req.bearer_auth(token);
        }

        for (name, value) in &request.headers {
            req = req.header(name.as_str(), value.as_str());
        }

        if let Some(ref body) = request.body {
            req = match body {
                RequestBody::Json(value) => req.body(value.to_string()),
                RequestBody::Text(content) => req.body(content.clone()),
                RequestBody::Form(encoded) => req.body(encoded.clone()),
            };
        }

        if self.config.enable_tracing {
            debug!(method = ?request.method, url = %request.url, "Sending request");
        }

        let response = req
            .send()
            .await
            .map_err(|e| failure(request, FailureCause::from(&e), Some(e)))?;

        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs);

        let body = response.text().await.map_err(|e| {
            failure(request, FailureCause::Body(e.to_string()), Some(e))
        })?;

        if self.config.enable_tracing {
            if (200..300).contains(&status) {
                debug!(status, bytes = body.len(), "Response received");
            } else {
                info!(status, bytes = body.len(), "Non-success response");
            }
        }

        Ok(Response::new(status, body).with_headers(content_type, retry_after))
    }
}

/// Build the typed failure for a request that produced no response. Writes
/// carry the object type and the pretty-printed payload.
fn failure(
    request: &RequestBuilder,
    cause: FailureCause,
    source: Option<reqwest::Error>,
) -> Error {
    let kind = if request.method.is_write() {
        ErrorKind::HttpPost {
            url: request.url.clone(),
            object_type: request.object_type.clone(),
            payload: request.payload_for_report(),
            cause,
        }
    } else {
        ErrorKind::HttpGet {
            url: request.url.clone(),
            cause,
        }
    };

    match source {
        Some(err) => Error::with_source(kind, err),
        None => Error::new(kind),
    }
}
