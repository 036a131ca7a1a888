//! HTTP request building with Salesforce-specific headers.

use serde::Serialize;

use crate::diagnostic::LogFormat;
use crate::error::Result;
use crate::pretty::prettify_json;

/// HTTP request method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestMethod {
    Get,
    Post,
    Patch,
    Delete,
}

impl RequestMethod {
    /// Convert to reqwest::Method.
    pub fn to_reqwest(&self) -> reqwest::Method {
        match self {
            RequestMethod::Get => reqwest::Method::GET,
            RequestMethod::Post => reqwest::Method::POST,
            RequestMethod::Patch => reqwest::Method::PATCH,
            RequestMethod::Delete => reqwest::Method::DELETE,
        }
    }

    /// True for methods that carry a payload worth reporting on failure.
    pub(crate) fn is_write(&self) -> bool {
        matches!(self, RequestMethod::Post | RequestMethod::Patch)
    }
}

/// Request body content.
#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(serde_json::Value),
    /// Raw text; the `Content-Type` header says what it is.
    Text(String),
    /// Pre-encoded `application/x-www-form-urlencoded` body.
    Form(String),
}

impl RequestBody {
    /// The body as it should appear in an error report. Form bodies carry
    /// credentials and are never reproduced.
    pub(crate) fn describe(&self) -> String {
        match self {
            RequestBody::Json(value) => prettify_json(&value.to_string()),
            RequestBody::Text(content) => content.clone(),
            RequestBody::Form(_) => "[form body redacted]".to_string(),
        }
    }
}

/// Names a request in the diagnostic log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnosticTag {
    pub operation: &'static str,
    pub format: LogFormat,
}

/// Builder for HTTP requests with Salesforce-specific options.
#[derive(Clone)]
pub struct RequestBuilder {
    pub(crate) method: RequestMethod,
    pub(crate) url: String,
    pub(crate) headers: Vec<(String, String)>,
    pub(crate) body: Option<RequestBody>,
    pub(crate) bearer_token: Option<String>,
    /// Object type the request acts on; reported on POST failures.
    pub(crate) object_type: Option<String>,
    pub(crate) diagnostic: Option<DiagnosticTag>,
}

impl std::fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBuilder")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("bearer_token", &self.bearer_token.as_ref().map(|_| "[REDACTED]"))
            .field("object_type", &self.object_type)
            .field("diagnostic", &self.diagnostic)
            .finish_non_exhaustive()
    }
}

impl RequestBuilder {
    /// Create a new request builder.
    pub fn new(method: RequestMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            body: None,
            bearer_token: None,
            object_type: None,
            diagnostic: None,
        }
    }

    /// The request method.
    pub fn method(&self) -> RequestMethod {
        self.method
    }

    /// The target URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Set the bearer token for authentication.
    pub fn bearer_auth(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    /// Set a header, replacing any previous value with the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        self.headers.retain(|(n, _)| !n.eq_ignore_ascii_case(&name));
        self.headers.push((name, value.into()));
        self
    }

    /// Look up a header value (case-insensitive).
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Record the object type this request acts on.
    pub fn object_type(mut self, object_type: impl Into<String>) -> Self {
        self.object_type = Some(object_type.into());
        self
    }

    /// Log the response under `operation`, prettified as JSON.
    pub fn log_as(mut self, operation: &'static str) -> Self {
        self.diagnostic = Some(DiagnosticTag {
            operation,
            format: LogFormat::PrettyJson,
        });
        self
    }

    /// Log the response under `operation` exactly as received.
    pub fn log_raw_as(mut self, operation: &'static str) -> Self {
        self.diagnostic = Some(DiagnosticTag {
            operation,
            format: LogFormat::Raw,
        });
        self
    }

    /// Set JSON body.
    pub fn json<T: Serialize>(mut self, body: &T) -> Result<Self> {
        let value = serde_json::to_value(body)?;
        self.body = Some(RequestBody::Json(value));
        Ok(self.header("Content-Type", "application/json"))
    }

    /// Send raw text with a JSON content type; the bulk batch endpoint takes
    /// the query itself as the body.
    pub fn json_text(mut self, body: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text(body.into()));
        self.header("Content-Type", "application/json; charset=UTF-8")
    }

    /// Set text body.
    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = Some(RequestBody::Text(body.into()));
        self.header("Content-Type", "text/plain")
    }

    /// Set a form body from key/value pairs.
    pub fn form<K, V>(mut self, pairs: &[(K, V)]) -> Result<Self>
    where
        K: Serialize,
        V: Serialize,
    {
        let encoded = serde_urlencoded::to_string(pairs).map_err(|e| {
            crate::Error::with_source(crate::ErrorKind::Other(e.to_string()), e)
        })?;
        self.body = Some(RequestBody::Form(encoded));
        Ok(self.header("Content-Type", "application/x-www-form-urlencoded"))
    }

    /// The body as it should appear in an error report.
    pub(crate) fn payload_for_report(&self) -> String {
        self.body
            .as_ref()
            .map(RequestBody::describe)
            .unwrap_or_default()
    }
}
