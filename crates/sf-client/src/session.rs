//! Immutable per-login session: credentials, endpoints and polling policy.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::config::DEFAULT_REQUEST_TIMEOUT;
use crate::diagnostic::DiagnosticLog;
use crate::error::{Error, ErrorKind, Result};
use crate::retry::DEFAULT_MAX_RETRIES;
use crate::DEFAULT_API_VERSION;

/// Default delay between bulk status checks.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(7000);

/// Default number of status checks before giving up on a batch.
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 1000;

/// Tunables shared by everything that runs under one session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
    pub max_transport_retries: u32,
    pub request_timeout: Duration,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_poll_attempts: DEFAULT_MAX_POLL_ATTEMPTS,
            max_transport_retries: DEFAULT_MAX_RETRIES,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// An authenticated Salesforce session.
///
/// Built once after login and shared read-only (usually behind an `Arc`)
/// by every client that talks to the org.
#[derive(Clone)]
pub struct Session {
    access_token: String,
    instance_url: String,
    api_version: String,
    rest_base: String,
    bulk_base: String,
    policy: SessionPolicy,
    diagnostics: Option<Arc<DiagnosticLog>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .field("instance_url", &self.instance_url)
            .field("api_version", &self.api_version)
            .field("rest_base", &self.rest_base)
            .field("bulk_base", &self.bulk_base)
            .field("policy", &self.policy)
            .field(
                "diagnostics",
                &self.diagnostics.as_ref().map(|log| log.path().to_path_buf()),
            )
            .finish()
    }
}

impl Session {
    /// Start building a session from a token and instance URL.
    pub fn builder(
        access_token: impl Into<String>,
        instance_url: impl Into<String>,
    ) -> SessionBuilder {
        SessionBuilder {
            access_token: access_token.into(),
            instance_url: instance_url.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            rest_endpoint: None,
            bulk_endpoint: None,
            policy: SessionPolicy::default(),
            diagnostic_dir: None,
        }
    }

    /// The OAuth access token, also used as the bulk session id.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// The instance URL, without a trailing slash.
    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    /// The API version (e.g. "62.0").
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Base for REST calls, e.g. `https://na1.salesforce.com/services/data/v62.0`.
    pub fn rest_endpoint(&self) -> &str {
        &self.rest_base
    }

    /// Base for bulk job calls, e.g. `https://na1.salesforce.com/services/async/62.0/job`.
    pub fn bulk_endpoint(&self) -> &str {
        &self.bulk_base
    }

    pub fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    pub fn poll_interval(&self) -> Duration {
        self.policy.poll_interval
    }

    pub fn max_poll_attempts(&self) -> u32 {
        self.policy.max_poll_attempts
    }

    pub fn max_transport_retries(&self) -> u32 {
        self.policy.max_transport_retries
    }

    pub fn request_timeout(&self) -> Duration {
        self.policy.request_timeout
    }

    /// The diagnostic response log, when enabled.
    pub fn diagnostics(&self) -> Option<&Arc<DiagnosticLog>> {
        self.diagnostics.as_ref()
    }
}

/// Builder for [`Session`].
#[derive(Debug)]
pub struct SessionBuilder {
    access_token: String,
    instance_url: String,
    api_version: String,
    rest_endpoint: Option<String>,
    bulk_endpoint: Option<String>,
    policy: SessionPolicy,
    diagnostic_dir: Option<PathBuf>,
}

impl SessionBuilder {
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Override the REST base URL instead of deriving it from the instance.
    pub fn with_rest_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.rest_endpoint = Some(endpoint.into());
        self
    }

    /// Override the bulk job base URL instead of deriving it from the instance.
    pub fn with_bulk_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.bulk_endpoint = Some(endpoint.into());
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.policy.poll_interval = interval;
        self
    }

    pub fn with_max_poll_attempts(mut self, attempts: u32) -> Self {
        self.policy.max_poll_attempts = attempts;
        self
    }

    pub fn with_max_transport_retries(mut self, retries: u32) -> Self {
        self.policy.max_transport_retries = retries;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.policy.request_timeout = timeout;
        self
    }

    /// Write every tagged response to a timestamped file under `dir`.
    pub fn with_diagnostic_log(mut self, dir: impl Into<PathBuf>) -> Self {
        self.diagnostic_dir = Some(dir.into());
        self
    }

    /// Validate and build the session.
    pub fn build(self) -> Result<Session> {
        if self.access_token.trim().is_empty() {
            return Err(config_error("access token must not be empty"));
        }
        if self.api_version.trim().is_empty() {
            return Err(config_error("API version must not be empty"));
        }
        if self.policy.max_poll_attempts == 0 {
            return Err(config_error("max poll attempts must be greater than 0"));
        }

        let instance_url = self.instance_url.trim_end_matches('/').to_string();
        url::Url::parse(&instance_url)?;

        let rest_base = match self.rest_endpoint {
            Some(endpoint) => normalize_endpoint(endpoint)?,
            None => format!("{}/services/data/v{}", instance_url, self.api_version),
        };
        let bulk_base = match self.bulk_endpoint {
            Some(endpoint) => normalize_endpoint(endpoint)?,
            None => format!("{}/services/async/{}/job", instance_url, self.api_version),
        };

        let diagnostics = match self.diagnostic_dir {
            Some(dir) if dir.as_os_str().is_empty() => {
                return Err(config_error("diagnostic log directory must not be empty"));
            }
            Some(dir) => {
                let log = DiagnosticLog::create(&dir).map_err(|e| {
                    Error::with_source(
                        ErrorKind::Config(format!(
                            "cannot open diagnostic log in {}",
                            dir.display()
                        )),
                        e,
                    )
                })?;
                Some(Arc::new(log))
            }
            None => None,
        };

        Ok(Session {
            access_token: self.access_token,
            instance_url,
            api_version: self.api_version,
            rest_base,
            bulk_base,
            policy: self.policy,
            diagnostics,
        })
    }
}

fn normalize_endpoint(endpoint: String) -> Result<String> {
    let endpoint = endpoint.trim_end_matches('/').to_string();
    url::Url::parse(&endpoint)?;
    Ok(endpoint)
}

fn config_error(message: &str) -> Error {
    Error::new(ErrorKind::Config(message.to_string()))
}
