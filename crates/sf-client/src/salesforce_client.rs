//! Session-bound Salesforce client.
//!
//! `SalesforceClient` pairs the HTTP transport with a [`Session`] and knows
//! how each API family authenticates: every call sends `Authorization: Bearer`
//! and bulk job calls also send the token as `X-SFDC-Session`. Responses to requests
//! tagged with [`RequestBuilder::log_as`] are appended to the session's
//! diagnostic log.
//!
//! ## Security
//!
//! - Access tokens are redacted in Debug output
//! - Sensitive parameters are skipped in tracing spans

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{instrument, warn};

use crate::client::SfHttpClient;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::request::{RequestBuilder, RequestMethod};
use crate::response::Response;
use crate::retry::RetryConfig;
use crate::session::Session;

/// Header the bulk job endpoints read the session id from.
pub const BULK_SESSION_HEADER: &str = "X-SFDC-Session";

/// High-level Salesforce API client.
///
/// Cheap to clone; clones share the connection pool and the session.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use sfbatch_client::{SalesforceClient, Session};
///
/// let session = Arc::new(Session::builder(token, instance_url).build()?);
/// let client = SalesforceClient::new(session)?;
///
/// let limits: serde_json::Value = client.get_json("limits").await?;
/// ```
#[derive(Clone)]
pub struct SalesforceClient {
    http: SfHttpClient,
    session: Arc<Session>,
}

impl std::fmt::Debug for SalesforceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceClient")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl SalesforceClient {
    /// Create a client whose request timeout follows the session policy.
    pub fn new(session: Arc<Session>) -> Result<Self> {
        let config = ClientConfig::builder()
            .with_timeout(session.request_timeout())
            .build();
        Self::with_config(session, config)
    }

    /// Create a client with custom HTTP configuration.
    pub fn with_config(session: Arc<Session>, config: ClientConfig) -> Result<Self> {
        let http = SfHttpClient::new(config)?;
        Ok(Self { http, session })
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn http(&self) -> &SfHttpClient {
        &self.http
    }

    /// Absolute REST URL for `path` (e.g. `sobjects/Account`).
    pub fn rest_url(&self, path: &str) -> String {
        join(self.session.rest_endpoint(), path)
    }

    /// Absolute bulk URL for `path` (e.g. `750xx/batch`). An empty path is
    /// the job collection itself.
    pub fn bulk_url(&self, path: &str) -> String {
        join(self.session.bulk_endpoint(), path)
    }

    /// GET with bearer authentication.
    pub fn get(&self, url: impl Into<String>) -> RequestBuilder {
        self.rest_request(RequestMethod::Get, url)
    }

    /// POST with bearer authentication.
    pub fn post(&self, url: impl Into<String>) -> RequestBuilder {
        self.rest_request(RequestMethod::Post, url)
    }

    /// PATCH with bearer authentication.
    pub fn patch(&self, url: impl Into<String>) -> RequestBuilder {
        self.rest_request(RequestMethod::Patch, url)
    }

    /// DELETE with bearer authentication.
    pub fn delete(&self, url: impl Into<String>) -> RequestBuilder {
        self.rest_request(RequestMethod::Delete, url)
    }

    /// GET against the bulk job API.
    pub fn bulk_get(&self, url: impl Into<String>) -> RequestBuilder {
        self.bulk_request(RequestMethod::Get, url)
    }

    /// POST against the bulk job API.
    pub fn bulk_post(&self, url: impl Into<String>) -> RequestBuilder {
        self.bulk_request(RequestMethod::Post, url)
    }

    fn rest_request(&self, method: RequestMethod, url: impl Into<String>) -> RequestBuilder {
        RequestBuilder::new(method, url)
            .bearer_auth(self.session.access_token())
            .header("Accept", "application/json")
    }

    fn bulk_request(&self, method: RequestMethod, url: impl Into<String>) -> RequestBuilder {
        self.rest_request(method, url)
            .header(BULK_SESSION_HEADER, self.session.access_token())
    }

    /// Retry settings derived from the session's transport retry budget.
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::default().with_max_attempts(self.session.max_transport_retries())
    }

    /// Send once.
    pub async fn send(&self, request: &RequestBuilder) -> Result<Response> {
        self.send_cancellable(request, &CancellationToken::new())
            .await
    }

    /// Send once, abandoning the request if `cancel` fires.
    #[instrument(skip(self, request, cancel), fields(url = %request.url()))]
    pub async fn send_cancellable(
        &self,
        request: &RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<Response> {
        let response = self.http.execute_cancellable(request, cancel).await?;
        self.record(request, &response).await;
        Ok(response)
    }

    /// Send with the session's retry budget.
    #[instrument(skip(self, request, cancel), fields(url = %request.url()))]
    pub async fn send_with_retry(
        &self,
        request: &RequestBuilder,
        cancel: &CancellationToken,
    ) -> Result<Response> {
        let response = self
            .http
            .execute_with_retry(request, &self.retry_config(), cancel)
            .await?;
        self.record(request, &response).await;
        Ok(response)
    }

    /// Append a tagged response to the diagnostic log. A failed write is
    /// reported and otherwise ignored.
    async fn record(&self, request: &RequestBuilder, response: &Response) {
        let (Some(log), Some(tag)) = (self.session.diagnostics(), request.diagnostic) else {
            return;
        };

        if let Err(e) = log.append(tag.operation, response.text(), tag.format).await {
            warn!(
                operation = tag.operation,
                path = %log.path().display(),
                error = %e,
                "Failed to write diagnostic log"
            );
        }
    }

    /// GET a REST path and deserialize a 2xx JSON body.
    #[instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.get(self.rest_url(path));
        self.send(&request).await?.error_for_status()?.json()
    }

    /// POST a JSON body to a REST path and deserialize a 2xx JSON body.
    #[instrument(skip(self, body))]
    pub async fn post_json<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let request = self.post(self.rest_url(path)).json(body)?;
        self.send(&request).await?.error_for_status()?.json()
    }
}

fn join(base: &str, path: &str) -> String {
    let path = path.trim_start_matches('/');
    if path.is_empty() {
        base.to_string()
    } else {
        format!("{base}/{path}")
    }
}
