//! Error types for sfbatch-bulk.

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

    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidArgument(message.into()))
    }

    pub(crate) fn cancelled() -> Self {
        Self::new(ErrorKind::Cancelled)
    }

    /// The transport failure underneath a [`ErrorKind::Transport`] error.
    pub fn transport_error(&self) -> Option<&sfbatch_client::Error> {
        match self.kind {
            ErrorKind::Transport(_) => self
                .source
                .as_deref()
                .and_then(|s| s.downcast_ref::<sfbatch_client::Error>()),
            _ => None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Bad caller input; nothing was sent.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A request never produced a response.
    #[error("{0}")]
    Transport(String),

    #[error("Failed to create bulk job for {object}: {message}")]
    JobCreate { object: String, message: String },

    #[error("Failed to create batch for job {job_id}: {message}")]
    BatchCreate { job_id: String, message: String },

    /// The status response was unusable.
    #[error("Failed to read status of batch {batch_id}: {message}")]
    StatusCheck { batch_id: String, message: String },

    #[error("Failed to close job {job_id}: {message}")]
    JobClose { job_id: String, message: String },

    #[error("Failed to fetch results of batch {batch_id}: {message}")]
    ResultFetch { batch_id: String, message: String },

    /// The batch reached `Failed` or `Not Processed`.
    #[error("Batch {state}: {message}")]
    BatchFailed { state: String, message: String },

    #[error("Batch did not finish after {max_attempts} status checks")]
    PollTimeout { max_attempts: u32 },

    #[error("Bulk query cancelled")]
    Cancelled,

    #[error("{0}")]
    Other(String),
}

impl From<sfbatch_client::Error> for Error {
    fn from(err: sfbatch_client::Error) -> Self {
        let kind = if err.is_cancelled() {
            ErrorKind::Cancelled
        } else if err.is_transport() {
            ErrorKind::Transport(err.to_string())
        } else {
            match &err.kind {
                sfbatch_client::ErrorKind::InvalidArgument(message) => {
                    ErrorKind::InvalidArgument(message.clone())
                }
                _ => ErrorKind::Other(err.to_string()),
            }
        };
        Error::with_source(kind, err)
    }
}
