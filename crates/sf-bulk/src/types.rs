//! Types for the bulk job/batch API.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use sfbatch_client::Session;

use crate::error::{Error, ErrorKind, Result};

/// Longest query text the bulk API accepts.
pub const MAX_QUERY_LENGTH: usize = 20_000;

/// How the server schedules a job's batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ConcurrencyMode {
    #[default]
    Parallel,
    Serial,
}

/// Format of batch results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ContentType {
    #[default]
    #[serde(rename = "JSON")]
    Json,
    #[serde(rename = "CSV")]
    Csv,
}

/// Request to open a query job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateJobRequest {
    pub operation: String,
    pub object: String,
    pub concurrency_mode: ConcurrencyMode,
    pub content_type: ContentType,
}

impl CreateJobRequest {
    /// A parallel query job returning JSON.
    pub fn query(object: impl Into<String>) -> Self {
        Self {
            operation: "query".to_string(),
            object: object.into(),
            concurrency_mode: ConcurrencyMode::default(),
            content_type: ContentType::default(),
        }
    }

    pub fn with_concurrency_mode(mut self, mode: ConcurrencyMode) -> Self {
        self.concurrency_mode = mode;
        self
    }
}

/// Request to close a job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CloseJobRequest {
    pub state: &'static str,
}

impl CloseJobRequest {
    pub fn closed() -> Self {
        Self { state: "Closed" }
    }
}

/// Job as reported by the server. Every field is optional because error
/// payloads share the same endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JobInfo {
    pub id: Option<String>,
    pub object: Option<String>,
    pub operation: Option<String>,
    pub state: Option<String>,
    pub concurrency_mode: Option<String>,
    pub content_type: Option<String>,
}

/// Processing state of a batch.
///
/// Unrecognised states are kept as [`BatchStatus::Unknown`] and treated as
/// still running.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum BatchStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
    NotProcessed,
    Unknown(String),
}

impl BatchStatus {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "Queued" => BatchStatus::Queued,
            "InProgress" => BatchStatus::InProgress,
            "Completed" => BatchStatus::Completed,
            "Failed" => BatchStatus::Failed,
            // The server spells it with a space.
            "Not Processed" | "NotProcessed" => BatchStatus::NotProcessed,
            other => BatchStatus::Unknown(other.to_string()),
        }
    }

    /// The server's spelling of this state.
    pub fn as_str(&self) -> &str {
        match self {
            BatchStatus::Queued => "Queued",
            BatchStatus::InProgress => "InProgress",
            BatchStatus::Completed => "Completed",
            BatchStatus::Failed => "Failed",
            BatchStatus::NotProcessed => "Not Processed",
            BatchStatus::Unknown(raw) => raw,
        }
    }

    /// No further status change will happen.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            BatchStatus::Completed | BatchStatus::Failed | BatchStatus::NotProcessed
        )
    }

    /// Terminal without results.
    pub fn is_failure(&self) -> bool {
        matches!(self, BatchStatus::Failed | BatchStatus::NotProcessed)
    }
}

impl From<String> for BatchStatus {
    fn from(raw: String) -> Self {
        BatchStatus::parse(&raw)
    }
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct BatchInfoWire {
    id: Option<String>,
    job_id: Option<String>,
    state: Option<BatchStatus>,
    state_message: Option<String>,
    number_records_processed: Option<u64>,
}

/// A batch and its last observed state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchInfo {
    pub id: String,
    pub job_id: String,
    pub state: BatchStatus,
    pub state_message: Option<String>,
    pub number_records_processed: Option<u64>,
}

impl BatchInfo {
    /// Parse a batch-creation response. Only the id is required.
    pub(crate) fn from_create_response(job_id: &str, body: &str) -> Result<Self> {
        let failure = |message: String| {
            Error::new(ErrorKind::BatchCreate {
                job_id: job_id.to_string(),
                message,
            })
        };

        let wire: BatchInfoWire = serde_json::from_str(body)
            .map_err(|e| failure(format!("unreadable response: {e}")))?;
        let id = wire
            .id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| failure("response has no batch id".to_string()))?;

        Ok(Self {
            id,
            job_id: wire.job_id.unwrap_or_else(|| job_id.to_string()),
            state: wire.state.unwrap_or(BatchStatus::Queued),
            state_message: wire.state_message,
            number_records_processed: wire.number_records_processed,
        })
    }

    /// Parse a status response. The state is required.
    pub(crate) fn from_status_response(job_id: &str, batch_id: &str, body: &str) -> Result<Self> {
        let failure = |message: String| {
            Error::new(ErrorKind::StatusCheck {
                batch_id: batch_id.to_string(),
                message,
            })
        };

        let wire: BatchInfoWire = serde_json::from_str(body)
            .map_err(|e| failure(format!("unreadable response: {e}")))?;
        let state = wire
            .state
            .ok_or_else(|| failure("response has no state".to_string()))?;

        Ok(Self {
            id: wire.id.unwrap_or_else(|| batch_id.to_string()),
            job_id: wire.job_id.unwrap_or_else(|| job_id.to_string()),
            state,
            state_message: wire.state_message,
            number_records_processed: wire.number_records_processed,
        })
    }
}

/// Interval and attempt budget for one polling run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollingPolicy {
    interval: Duration,
    max_attempts: u32,
}

impl PollingPolicy {
    pub fn new(interval: Duration, max_attempts: u32) -> Result<Self> {
        if max_attempts == 0 {
            return Err(Error::invalid_argument(
                "max poll attempts must be greater than 0",
            ));
        }
        Ok(Self {
            interval,
            max_attempts,
        })
    }

    /// Snapshot of the session's polling settings.
    pub fn from_session(session: &Session) -> Self {
        Self {
            interval: session.poll_interval(),
            max_attempts: session.max_poll_attempts().max(1),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

/// Result ids of a completed batch, in server order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultHandle {
    ids: Vec<String>,
}

impl ResultHandle {
    /// Parse a result-list response such as `["752xx0000004CHE"]`.
    ///
    /// A JSON string array yields every id it holds and must contain no empty
    /// ids. Anything that is not a JSON string array falls back to the text
    /// between the first and last double quote.
    pub fn parse(batch_id: &str, body: &str) -> Result<Self> {
        let failure = |message: String| {
            Error::new(ErrorKind::ResultFetch {
                batch_id: batch_id.to_string(),
                message,
            })
        };

        if let Ok(ids) = serde_json::from_str::<Vec<String>>(body) {
            return if !ids.is_empty() && ids.iter().all(|id| !id.is_empty()) {
                Ok(Self { ids })
            } else {
                Err(failure(format!("empty result id in response: {}", body.trim())))
            };
        }

        match extract_result_id(body) {
            Some(id) => Ok(Self {
                ids: vec![id.to_string()],
            }),
            None => Err(failure(format!(
                "no result id in response: {}",
                body.trim()
            ))),
        }
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn first(&self) -> &str {
        &self.ids[0]
    }
}

/// The text between the first and last `"` of `body`, if non-empty.
pub fn extract_result_id(body: &str) -> Option<&str> {
    let start = body.find('"')? + 1;
    let end = body.rfind('"')?;
    if end > start {
        Some(&body[start..end])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_job_request_serialization() {
        let json = serde_json::to_value(CreateJobRequest::query("Account")).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "operation": "query",
                "object": "Account",
                "concurrencyMode": "Parallel",
                "contentType": "JSON"
            })
        );

        let serial =
            CreateJobRequest::query("Contact").with_concurrency_mode(ConcurrencyMode::Serial);
        let json = serde_json::to_value(serial).unwrap();
        assert_eq!(json["concurrencyMode"], "Serial");
    }

    #[test]
    fn test_close_job_request_serialization() {
        let json = serde_json::to_string(&CloseJobRequest::closed()).unwrap();
        assert_eq!(json, r#"{"state":"Closed"}"#);
    }

    #[test]
    fn test_batch_status_parsing() {
        assert_eq!(BatchStatus::parse("Queued"), BatchStatus::Queued);
        assert_eq!(BatchStatus::parse("InProgress"), BatchStatus::InProgress);
        assert_eq!(BatchStatus::parse("Completed"), BatchStatus::Completed);
        assert_eq!(BatchStatus::parse("Failed"), BatchStatus::Failed);
        assert_eq!(BatchStatus::parse("Not Processed"), BatchStatus::NotProcessed);
        assert_eq!(BatchStatus::parse("NotProcessed"), BatchStatus::NotProcessed);
        assert_eq!(
            BatchStatus::parse("Paused"),
            BatchStatus::Unknown("Paused".to_string())
        );
    }

    #[test]
    fn test_batch_status_terminal() {
        assert!(BatchStatus::Completed.is_terminal());
        assert!(BatchStatus::Failed.is_terminal());
        assert!(BatchStatus::NotProcessed.is_terminal());
        assert!(!BatchStatus::Queued.is_terminal());
        assert!(!BatchStatus::InProgress.is_terminal());
        assert!(!BatchStatus::Unknown("Paused".into()).is_terminal());

        assert!(BatchStatus::NotProcessed.is_failure());
        assert!(!BatchStatus::Completed.is_failure());
    }

    #[test]
    fn test_status_response() {
        let body = r#"{"id":"751xx","jobId":"750xx","state":"Failed","stateMessage":"bad query"}"#;
        let info = BatchInfo::from_status_response("750xx", "751xx", body).unwrap();
        assert_eq!(info.state, BatchStatus::Failed);
        assert_eq!(info.state_message.as_deref(), Some("bad query"));

        let err = BatchInfo::from_status_response("750xx", "751xx", r#"{"id":"751xx"}"#)
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::StatusCheck { .. }));

        let err = BatchInfo::from_status_response("750xx", "751xx", "<html>").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::StatusCheck { .. }));
    }

    #[test]
    fn test_create_response_requires_id() {
        let info = BatchInfo::from_create_response("750xx", r#"{"id":"751xx","state":"Queued"}"#)
            .unwrap();
        assert_eq!(info.id, "751xx");
        assert_eq!(info.job_id, "750xx");

        let err = BatchInfo::from_create_response("750xx", r#"{"id":""}"#).unwrap_err();
        assert!(matches!(err.kind, ErrorKind::BatchCreate { .. }));
    }

    #[test]
    fn test_polling_policy() {
        assert!(PollingPolicy::new(Duration::from_millis(10), 0).is_err());

        let policy = PollingPolicy::new(Duration::from_millis(10), 3).unwrap();
        assert_eq!(policy.max_attempts(), 3);
        assert_eq!(policy.interval(), Duration::from_millis(10));

        let session = Session::builder("token", "https://na1.salesforce.com")
            .build()
            .unwrap();
        let policy = PollingPolicy::from_session(&session);
        assert_eq!(policy.interval(), Duration::from_millis(7000));
        assert_eq!(policy.max_attempts(), 1000);
    }

    #[test]
    fn test_extract_result_id() {
        assert_eq!(extract_result_id(r#"["abc123"]"#), Some("abc123"));
        assert_eq!(extract_result_id(r#"[ "abc123" ]\n"#), Some("abc123"));
        assert_eq!(extract_result_id("[]"), None);
        assert_eq!(extract_result_id(r#"[""]"#), None);
        assert_eq!(extract_result_id(r#"["abc"#), None);
    }

    #[test]
    fn test_result_handle() {
        let handle = ResultHandle::parse("751xx", r#"["abc123"]"#).unwrap();
        assert_eq!(handle.ids(), ["abc123"]);
        assert_eq!(handle.first(), "abc123");

        let handle = ResultHandle::parse("751xx", r#"["r1","r2"]"#).unwrap();
        assert_eq!(handle.ids(), ["r1", "r2"]);

        // Not JSON, still bracket-quoted.
        let handle = ResultHandle::parse("751xx", r#"["abc123"]x"#).unwrap();
        assert_eq!(handle.first(), "abc123");

        let err = ResultHandle::parse("751xx", "[]").unwrap_err();
        assert!(matches!(err.kind, ErrorKind::ResultFetch { .. }));

        for body in [r#"["R1",""]"#, r#"[""]"#, r#"["","R2"]"#] {
            let err = ResultHandle::parse("751xx", body).unwrap_err();
            assert!(
                matches!(
                    err.kind,
                    ErrorKind::ResultFetch { ref batch_id, .. } if batch_id == "751xx"
                ),
                "{body} should be rejected"
            );
        }
    }
}
