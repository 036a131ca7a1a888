use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use sfbatch::auth::PasswordLogin;
use sfbatch::bulk::{BulkJobClient, ErrorKind};
use sfbatch::CancellationToken;
use wiremock::matchers::{body_json, body_string, header, method, path};
use wiremock::{Mock, MockServer, Request, ResponseTemplate};

use super::common::{credentials_for, login, mount_login, ACCESS_TOKEN, JOB_PATH};

async fn mount_job(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(JOB_PATH))
        .and(header("X-SFDC-Session", ACCESS_TOKEN))
        .respond_with(
            ResponseTemplate::new(201).set_body_string(r#"{"id":"750J1","state":"Open"}"#),
        )
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("{JOB_PATH}/750J1/batch")))
        .and(body_string("SELECT Id, Name FROM Account"))
        .respond_with(
            ResponseTemplate::new(201)
                .set_body_string(r#"{"id":"751B1","jobId":"750J1","state":"Queued"}"#),
        )
        .expect(1)
        .mount(server)
        .await;
}

/// Batch status answers Queued, InProgress, then Completed.
async fn mount_status_progression(server: &MockServer) -> Arc<AtomicUsize> {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = calls.clone();
    Mock::given(method("GET"))
        .and(path(format!("{JOB_PATH}/750J1/batch/751B1")))
        .respond_with(move |_: &Request| {
            let state = match counter.fetch_add(1, Ordering::SeqCst) {
                0 => "Queued",
                1 => "InProgress",
                _ => "Completed",
            };
            ResponseTemplate::new(200).set_body_string(format!(
                r#"{{"id":"751B1","jobId":"750J1","state":"{state}"}}"#
            ))
        })
        .mount(server)
        .await;
    calls
}

async fn mount_results(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path(format!("{JOB_PATH}/750J1/batch/751B1/result")))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"["752R1"]"#))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("{JOB_PATH}/750J1/batch/751B1/result/752R1")))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"[{"Id":"001A","Name":"Acme"},{"Id":"001B","Name":"Globex"}]"#,
        ))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_then_bulk_query_end_to_end() {
    let server = MockServer::start().await;
    let log_dir = tempfile::tempdir().unwrap();

    mount_login(&server).await;
    mount_job(&server).await;
    let status_calls = mount_status_progression(&server).await;
    mount_results(&server).await;

    Mock::given(method("POST"))
        .and(path(format!("{JOB_PATH}/750J1")))
        .and(body_json(serde_json::json!({"state": "Closed"})))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(r#"{"id":"750J1","state":"Closed"}"#),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session = PasswordLogin::new(credentials_for(&server))
        .unwrap()
        .login_with(|b| {
            b.with_poll_interval(Duration::from_millis(10))
                .with_diagnostic_log(log_dir.path())
        })
        .await
        .unwrap();
    let log_path = session.diagnostics().unwrap().path().to_path_buf();

    let bulk = BulkJobClient::new(Arc::new(session)).unwrap();
    let result = bulk
        .execute_bulk_query("Account", "SELECT Id, Name FROM Account")
        .await
        .unwrap();

    assert_eq!(
        result,
        r#"[{"Id":"001A","Name":"Acme"},{"Id":"001B","Name":"Globex"}]"#
    );
    assert_eq!(status_calls.load(Ordering::SeqCst), 3);

    let log = std::fs::read_to_string(log_path).unwrap();
    let headers: Vec<&str> = log
        .lines()
        .filter(|l| l.starts_with("##########"))
        .collect();
    assert_eq!(
        headers,
        [
            "########## CreateJob ##########",
            "########## CreateBatch ##########",
            "########## GetBatchStatus ##########",
            "########## GetBatchStatus ##########",
            "########## GetBatchStatus ##########",
            "########## GetResultsIds ##########",
            "########## GetResults ##########",
            "########## CloseJob ##########",
        ]
    );
    assert!(!log.contains(ACCESS_TOKEN));
}

#[tokio::test]
async fn test_failed_batch_surfaces_state_message() {
    let server = MockServer::start().await;
    let session = login(&server).await;
    mount_job(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("{JOB_PATH}/750J1/batch/751B1")))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"id":"751B1","jobId":"750J1","state":"Failed","stateMessage":"InvalidBatch : unexpected token"}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let bulk = BulkJobClient::new(session).unwrap();
    let err = bulk
        .execute_bulk_query("Account", "SELECT Id, Name FROM Account")
        .await
        .unwrap_err();

    match err.kind {
        ErrorKind::BatchFailed { state, message } => {
            assert_eq!(state.as_str(), "Failed");
            assert!(message.contains("unexpected token"));
        }
        other => panic!("expected BatchFailed, got {other:?}"),
    }
}

#[tokio::test]
async fn test_cancel_while_polling_stops_the_query() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    mount_job(&server).await;

    Mock::given(method("GET"))
        .and(path(format!("{JOB_PATH}/750J1/batch/751B1")))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"id":"751B1","jobId":"750J1","state":"InProgress"}"#,
        ))
        .mount(&server)
        .await;

    let session = PasswordLogin::new(credentials_for(&server))
        .unwrap()
        .login_with(|b| b.with_poll_interval(Duration::from_secs(30)))
        .await
        .unwrap();
    let bulk = BulkJobClient::new(Arc::new(session)).unwrap();

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let err = tokio::time::timeout(
        Duration::from_secs(10),
        bulk.execute_bulk_query_cancellable("Account", "SELECT Id, Name FROM Account", &cancel),
    )
    .await
    .expect("cancellation should end the poll promptly")
    .unwrap_err();

    assert!(matches!(err.kind, ErrorKind::Cancelled));
}
