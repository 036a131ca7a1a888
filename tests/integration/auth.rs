use sfbatch::auth::{ErrorKind, PasswordLogin};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::common::{credentials_for, login, ACCESS_TOKEN};

#[tokio::test]
async fn test_login_builds_session_for_instance() {
    let server = MockServer::start().await;
    let session = login(&server).await;

    assert_eq!(session.access_token(), ACCESS_TOKEN);
    assert_eq!(session.instance_url(), server.uri());
    assert_eq!(
        session.bulk_endpoint(),
        format!("{}/services/async/62.0/job", server.uri())
    );

    // The token never reaches Debug output.
    assert!(!format!("{session:?}").contains(ACCESS_TOKEN));
}

#[tokio::test]
async fn test_login_sends_password_with_security_token() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/services/oauth2/token"))
        .and(body_string_contains("password=hunter2tok"))
        .and(body_string_contains("username=user%40example.com"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "token",
            "instance_url": server.uri()
        })))
        .expect(1)
        .mount(&server)
        .await;

    PasswordLogin::new(credentials_for(&server))
        .unwrap()
        .login()
        .await
        .unwrap();
}

#[tokio::test]
async fn test_rejected_login_is_oauth_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/services/oauth2/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": "invalid_grant",
            "error_description": "authentication failure"
        })))
        .mount(&server)
        .await;

    let err = PasswordLogin::new(credentials_for(&server))
        .unwrap()
        .login()
        .await
        .unwrap_err();

    match err.kind {
        ErrorKind::OAuth { error, description } => {
            assert_eq!(error, "invalid_grant");
            assert_eq!(description, "authentication failure");
        }
        other => panic!("expected OAuth error, got {other:?}"),
    }
}
