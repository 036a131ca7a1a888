//! Error types for sfbatch-client.

use std::time::Duration;

/// Result type alias for sfbatch-client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for sfbatch-client operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// Shorthand for an `InvalidArgument` error.
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument(message.into()))
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }

    /// Returns true if this is a network-level failure of a GET or POST.
    pub fn is_transport(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::HttpGet { .. } | ErrorKind::HttpPost { .. }
        )
    }

    /// Returns true if the request was abandoned because the caller cancelled it.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::HttpGet { cause: FailureCause::Cancelled, .. }
                | ErrorKind::HttpPost { cause: FailureCause::Cancelled, .. }
        )
    }

    /// Returns the retry-after duration if the server asked us to back off.
    pub fn retry_after(&self) -> Option<Duration> {
        match &self.kind {
            ErrorKind::RateLimited { retry_after } => *retry_after,
            _ => None,
        }
    }

    /// The URL of the failing request, when one is known.
    pub fn url(&self) -> Option<&str> {
        match &self.kind {
            ErrorKind::HttpGet { url, .. } | ErrorKind::HttpPost { url, .. } => Some(url),
            _ => None,
        }
    }
}

/// Why a request never produced a response.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FailureCause {
    /// The request timeout elapsed.
    #[error("request timed out")]
    Timeout,
    /// The connection could not be established.
    #[error("connection failed: {0}")]
    Connection(String),
    /// The request was cancelled before completing.
    #[error("request cancelled")]
    Cancelled,
    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),
    /// Any other network-level failure.
    #[error("{0}")]
    Other(String),
}

impl FailureCause {
    fn is_retryable(&self) -> bool {
        matches!(
            self,
            FailureCause::Timeout | FailureCause::Connection(_) | FailureCause::Body(_)
        )
    }
}

impl From<&reqwest::Error> for FailureCause {
    fn from(err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            FailureCause::Timeout
        } else if err.is_connect() {
            FailureCause::Connection(err.to_string())
        } else if err.is_body() || err.is_decode() {
            FailureCause::Body(err.to_string())
        } else {
            FailureCause::Other(err.to_string())
        }
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Bad caller input; no request was issued.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A GET never produced a response.
    #[error("An error occurred for an http get request. Url: {url}. Cause: {cause}")]
    HttpGet { url: String, cause: FailureCause },

    /// A POST never produced a response. Carries the payload so the call can be
    /// diagnosed without replaying it.
    #[error(
        "An error occurred for an http post request. Url: {url}. Cause: {cause}. Object: {}\n{payload}",
        object_type.as_deref().unwrap_or("<none>")
    )]
    HttpPost {
        url: String,
        object_type: Option<String>,
        payload: String,
        cause: FailureCause,
    },

    /// Non-success HTTP status, surfaced by callers that require 2xx.
    #[error("HTTP error: {status} {message}")]
    Http { status: u16, message: String },

    /// Rate limit exceeded (HTTP 429).
    #[error("Rate limited{}", retry_after.map(|d| format!(", retry after {:?}", d)).unwrap_or_default())]
    RateLimited { retry_after: Option<Duration> },

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Other error.
    #[error("{0}")]
    Other(String),
}

impl ErrorKind {
    /// Returns true if this error kind is retryable.
    pub fn is_retryable(&self) -> bool {
        match self {
            ErrorKind::HttpGet { cause, .. } | ErrorKind::HttpPost { cause, .. } => {
                cause.is_retryable()
            }
            ErrorKind::RateLimited { .. } => true,
            ErrorKind::Http { status, .. } => is_retryable_status(*status),
            _ => false,
        }
    }
}

/// Check if an HTTP status code is typically retryable.
pub(crate) fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::Config(format!("Invalid URL: {}", err)), err)
    }
}
