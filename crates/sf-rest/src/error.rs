//! Error types for sfbatch-rest.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    pub kind: ErrorKind,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument(message.into()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A request never produced a response.
    #[error("{0}")]
    Transport(String),

    /// The server did not return an id for a new record.
    #[error("Insert of {object} failed.\nPayload:\n{payload}\nResponse:\n{response}")]
    Insert {
        object: String,
        payload: String,
        response: String,
    },

    /// Non-success status from the REST API.
    #[error("API error: {status} {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(String),

    #[error("{0}")]
    Other(String),
}

impl From<sfbatch_client::Error> for Error {
    fn from(err: sfbatch_client::Error) -> Self {
        use sfbatch_client::ErrorKind as ClientKind;

        let kind = if err.is_transport() {
            ErrorKind::Transport(err.to_string())
        } else {
            match &err.kind {
                ClientKind::InvalidArgument(message) => ErrorKind::InvalidArgument(message.clone()),
                ClientKind::Http { status, message } => ErrorKind::Api {
                    status: *status,
                    message: message.clone(),
                },
                ClientKind::RateLimited { .. } => ErrorKind::Api {
                    status: 429,
                    message: err.to_string(),
                },
                ClientKind::Json(message) => ErrorKind::Json(message.clone()),
                _ => ErrorKind::Other(err.to_string()),
            }
        };
        Error {
            kind,
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error {
            kind: ErrorKind::Json(err.to_string()),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_error_display() {
        let err = Error::new(ErrorKind::Insert {
            object: "Account".into(),
            payload: "{\n    \"Name\": \"Acme\"\n}".into(),
            response: r#"[{"errorCode":"REQUIRED_FIELD_MISSING"}]"#.into(),
        });
        let msg = err.to_string();
        assert!(msg.starts_with("Insert of Account failed."));
        assert!(msg.contains("\"Name\": \"Acme\""));
        assert!(msg.contains("REQUIRED_FIELD_MISSING"));
    }

    #[test]
    fn test_client_http_error_becomes_api_error() {
        let client_err = sfbatch_client::Error::new(sfbatch_client::ErrorKind::Http {
            status: 404,
            message: "NOT_FOUND".into(),
        });
        let err: Error = client_err.into();
        assert!(matches!(err.kind, ErrorKind::Api { status: 404, .. }));
    }
}
