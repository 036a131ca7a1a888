//! Bounded-attempt batch status polling.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::client::BulkJobClient;
use crate::error::{Error, ErrorKind, Result};
use crate::types::{BatchInfo, BatchStatus, PollingPolicy};

/// Polls one batch until it reaches a terminal state.
///
/// Makes at most `policy.max_attempts()` status checks, sleeping
/// `policy.interval()` between them. A terminal state observed on the last
/// allowed check wins over the timeout.
#[derive(Debug)]
pub struct StatusPoller<'a> {
    client: &'a BulkJobClient,
}

impl<'a> StatusPoller<'a> {
    pub fn new(client: &'a BulkJobClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self, policy, cancel), fields(max_attempts = policy.max_attempts()))]
    pub async fn poll_until_terminal(
        &self,
        job_id: &str,
        batch_id: &str,
        policy: PollingPolicy,
        cancel: &CancellationToken,
    ) -> Result<BatchInfo> {
        let max_attempts = policy.max_attempts();

        for attempt in 1..=max_attempts {
            if cancel.is_cancelled() {
                return Err(Error::cancelled());
            }

            let info = self.client.batch_status(job_id, batch_id, cancel).await?;

            match info.state {
                BatchStatus::Completed => {
                    info!(attempt, "Batch completed");
                    return Ok(info);
                }
                BatchStatus::Failed | BatchStatus::NotProcessed => {
                    return Err(Error::new(ErrorKind::BatchFailed {
                        state: info.state.to_string(),
                        message: info.state_message.unwrap_or_default(),
                    }));
                }
                _ => debug!(attempt, state = %info.state, "Batch not finished"),
            }

            if attempt == max_attempts {
                break;
            }

            if cancel.is_cancelled() {
                return Err(Error::cancelled());
            }
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::cancelled()),
                _ = tokio::time::sleep(policy.interval()) => {}
            }
        }

        Err(Error::new(ErrorKind::PollTimeout { max_attempts }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use sfbatch_client::Session;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const STATUS_PATH: &str = "/services/async/62.0/job/750xx/batch/751xx";

    fn bulk_client(server: &MockServer) -> BulkJobClient {
        let session = Session::builder("test-token", server.uri())
            .with_api_version("62.0")
            .build()
            .unwrap();
        BulkJobClient::new(Arc::new(session)).unwrap()
    }

    fn policy(max_attempts: u32) -> PollingPolicy {
        PollingPolicy::new(Duration::from_millis(10), max_attempts).unwrap()
    }

    fn status_body(state: &str) -> String {
        serde_json::json!({"id": "751xx", "jobId": "750xx", "state": state}).to_string()
    }

    /// Serve `states` in order, repeating the last one.
    async fn mount_status_sequence(
        server: &MockServer,
        states: &'static [&'static str],
    ) -> Arc<AtomicUsize> {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .respond_with(move |_: &wiremock::Request| {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                let state = states[n.min(states.len() - 1)];
                ResponseTemplate::new(200).set_body_string(status_body(state))
            })
            .mount(server)
            .await;

        calls
    }

    #[tokio::test]
    async fn test_completes_after_exactly_four_checks() {
        let mock_server = MockServer::start().await;
        let calls = mount_status_sequence(
            &mock_server,
            &["Queued", "Queued", "InProgress", "Completed"],
        )
        .await;

        let client = bulk_client(&mock_server);
        let info = StatusPoller::new(&client)
            .poll_until_terminal("750xx", "751xx", policy(10), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(info.state, BatchStatus::Completed);
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_times_out_after_max_attempts() {
        let mock_server = MockServer::start().await;
        let calls = mount_status_sequence(&mock_server, &["InProgress"]).await;

        let client = bulk_client(&mock_server);
        let err = StatusPoller::new(&client)
            .poll_until_terminal("750xx", "751xx", policy(3), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err.kind, ErrorKind::PollTimeout { max_attempts: 3 }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_terminal_on_last_attempt_is_not_a_timeout() {
        let mock_server = MockServer::start().await;
        let calls = mount_status_sequence(&mock_server, &["Queued", "Queued", "Completed"]).await;

        let client = bulk_client(&mock_server);
        let info = StatusPoller::new(&client)
            .poll_until_terminal("750xx", "751xx", policy(3), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(info.state, BatchStatus::Completed);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_unknown_state_keeps_polling() {
        let mock_server = MockServer::start().await;
        let calls = mount_status_sequence(&mock_server, &["Paused", "Completed"]).await;

        let client = bulk_client(&mock_server);
        StatusPoller::new(&client)
            .poll_until_terminal("750xx", "751xx", policy(5), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failed_batch_stops_immediately() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"id":"751xx","state":"Failed","stateMessage":"bad query"}"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;

        let client = bulk_client(&mock_server);
        let err = StatusPoller::new(&client)
            .poll_until_terminal("750xx", "751xx", policy(10), &CancellationToken::new())
            .await
            .unwrap_err();

        match err.kind {
            ErrorKind::BatchFailed { state, message } => {
                assert_eq!(state, "Failed");
                assert_eq!(message, "bad query");
            }
            other => panic!("expected BatchFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_not_processed_is_a_failure() {
        let mock_server = MockServer::start().await;
        mount_status_sequence(&mock_server, &["Not Processed"]).await;

        let client = bulk_client(&mock_server);
        let err = StatusPoller::new(&client)
            .poll_until_terminal("750xx", "751xx", policy(10), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err.kind,
            ErrorKind::BatchFailed { ref state, .. } if state == "Not Processed"
        ));
    }

    #[tokio::test]
    async fn test_missing_state_is_a_status_check_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"id":"751xx"}"#))
            .mount(&mock_server)
            .await;

        let client = bulk_client(&mock_server);
        let err = StatusPoller::new(&client)
            .poll_until_terminal("750xx", "751xx", policy(10), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(matches!(err.kind, ErrorKind::StatusCheck { .. }));
    }

    #[tokio::test]
    async fn test_cancel_during_sleep() {
        let mock_server = MockServer::start().await;
        let calls = mount_status_sequence(&mock_server, &["InProgress"]).await;

        let client = bulk_client(&mock_server);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let slow = PollingPolicy::new(Duration::from_secs(30), 10).unwrap();
        let started = std::time::Instant::now();
        let err = StatusPoller::new(&client)
            .poll_until_terminal("750xx", "751xx", slow, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err.kind, ErrorKind::Cancelled));
        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_check() {
        let mock_server = MockServer::start().await;
        let calls = mount_status_sequence(&mock_server, &["Completed"]).await;

        let client = bulk_client(&mock_server);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = StatusPoller::new(&client)
            .poll_until_terminal("750xx", "751xx", policy(3), &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err.kind, ErrorKind::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }
}
