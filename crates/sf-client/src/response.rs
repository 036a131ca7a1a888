//! Fully-read HTTP responses.
//!
//! Bulk job responses are small and several of them are not JSON, so the
//! transport reads every body to text before handing it back.

use serde::de::DeserializeOwned;
use std::sync::OnceLock;
use std::time::Duration;

use crate::error::{Error, ErrorKind, Result};

/// Status and body of a completed request.
#[derive(Debug, Clone)]
pub struct Response {
    status: u16,
    content_type: Option<String>,
    retry_after: Option<Duration>,
    body: String,
}

impl Response {
    /// Build a response from its parts.
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            content_type: None,
            retry_after: None,
            body: body.into(),
        }
    }

    pub(crate) fn with_headers(
        mut self,
        content_type: Option<String>,
        retry_after: Option<Duration>,
    ) -> Self {
        self.content_type = content_type;
        self.retry_after = retry_after;
        self
    }

    /// Get the HTTP status code.
    pub fn status(&self) -> u16 {
        self.status
    }

    /// Returns true if the response status is successful (2xx).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get the Content-Type header.
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Get the Retry-After header, when given in seconds.
    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }

    /// The response body.
    pub fn text(&self) -> &str {
        &self.body
    }

    /// Consume the response, returning its body.
    pub fn into_text(self) -> String {
        self.body
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.body).map_err(Into::into)
    }

    /// A short, credential-free rendering of the body for error messages.
    pub fn summary(&self) -> String {
        sanitize_error_message(&self.body)
    }

    /// Turn a non-2xx response into an error.
    pub fn error_for_status(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }

        let kind = if self.status == 429 {
            ErrorKind::RateLimited {
                retry_after: self.retry_after,
            }
        } else {
            ErrorKind::Http {
                status: self.status,
                message: self.summary(),
            }
        };
        Err(Error::new(kind))
    }
}

fn token_pattern() -> &'static regex_lite::Regex {
    static PATTERN: OnceLock<regex_lite::Regex> = OnceLock::new();
    // Session ids look like `00D<org id>!<secret>`.
    PATTERN.get_or_init(|| {
        regex_lite::Regex::new(r"00[A-Za-z0-9]{13,}![A-Za-z0-9_.]+").expect("static regex")
    })
}

/// Redact anything that looks like a session id and cap the length.
pub(crate) fn sanitize_error_message(message: &str) -> String {
    const MAX_CHARS: usize = 500;

    let sanitized = token_pattern().replace_all(message, "[REDACTED_TOKEN]");

    if sanitized.chars().count() > MAX_CHARS {
        let mut truncated: String = sanitized.chars().take(MAX_CHARS).collect();
        truncated.push_str("...[truncated]");
        truncated
    } else {
        sanitized.into_owned()
    }
}
