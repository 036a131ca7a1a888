use std::sync::Arc;
use std::time::Duration;

use sfbatch::auth::{PasswordCredentials, PasswordLogin};
use sfbatch::client::Session;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const ACCESS_TOKEN: &str = "00Dxx0000001gPL!AQ4AQFakeAccessToken";
pub const JOB_PATH: &str = "/services/async/62.0/job";
pub const DATA_PATH: &str = "/services/data/v62.0";

/// Mount a token endpoint that hands out a session for `server` itself.
pub async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/services/oauth2/token"))
        .and(body_string_contains("grant_type=password"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": ACCESS_TOKEN,
            "instance_url": server.uri(),
            "id": format!("{}/id/00Dxx0000001gPLEAY/005xx000001SwiUAAS", server.uri()),
            "token_type": "Bearer",
            "issued_at": "1700000000000"
        })))
        .expect(1)
        .mount(server)
        .await;
}

pub fn credentials_for(server: &MockServer) -> PasswordCredentials {
    PasswordCredentials::new("client-id", "client-secret", "user@example.com", "hunter2")
        .with_security_token("tok")
        .with_login_url(server.uri())
}

/// Log in against the mock server with a short poll interval.
pub async fn login(server: &MockServer) -> Arc<Session> {
    mount_login(server).await;
    let session = PasswordLogin::new(credentials_for(server))
        .unwrap()
        .login_with(|b| {
            b.with_api_version("62.0")
                .with_poll_interval(Duration::from_millis(10))
                .with_max_poll_attempts(20)
        })
        .await
        .unwrap();
    Arc::new(session)
}
