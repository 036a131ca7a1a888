//! OAuth 2.0 username/password flow.

use serde::Deserialize;
use sfbatch_client::{Session, SessionBuilder, DEFAULT_REQUEST_TIMEOUT, USER_AGENT};
use tracing::{info, instrument};

use crate::credentials::PasswordCredentials;
use crate::error::{Error, ErrorKind, Result};

/// Token response from the password grant.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub instance_url: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub issued_at: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("instance_url", &self.instance_url)
            .field("id", &self.id)
            .field("token_type", &self.token_type)
            .field("issued_at", &self.issued_at)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    error: String,
    #[serde(default)]
    error_description: String,
}

/// One-shot password-grant login.
///
/// Every call to [`login`](Self::login) performs a fresh token request and
/// yields a new [`Session`]; nothing is cached.
#[derive(Clone)]
pub struct PasswordLogin {
    credentials: PasswordCredentials,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for PasswordLogin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordLogin")
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}

impl PasswordLogin {
    /// Validate the credentials and prepare an HTTP client.
    pub fn new(credentials: PasswordCredentials) -> Result<Self> {
        credentials.validate()?;
        let http_client = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            credentials,
            http_client,
        })
    }

    pub fn credentials(&self) -> &PasswordCredentials {
        &self.credentials
    }

    /// Exchange the credentials for an access token.
    #[instrument(skip(self), fields(username = %self.credentials.username()))]
    pub async fn request_token(&self) -> Result<TokenResponse> {
        let body = serde_urlencoded::to_string(self.credentials.token_form())?;

        let response = self
            .http_client
            .post(format!(
                "{}/services/oauth2/token",
                self.credentials.login_url()
            ))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .header("Accept", "application/json")
            .body(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(match serde_json::from_str::<OAuthErrorResponse>(&text) {
                Ok(error) => Error::new(ErrorKind::OAuth {
                    error: error.error,
                    description: error.error_description,
                }),
                Err(_) => Error::new(ErrorKind::Http(format!(
                    "token request failed with status {}",
                    status.as_u16()
                ))),
            });
        }

        let token: TokenResponse = serde_json::from_str(&text)?;
        info!(instance_url = %token.instance_url, "Logged in");
        Ok(token)
    }

    /// Log in and build a session with default settings.
    pub async fn login(&self) -> Result<Session> {
        self.login_with(|builder| builder).await
    }

    /// Log in and build a session, letting `configure` adjust the builder
    /// (API version, polling policy, diagnostic log).
    pub async fn login_with<F>(&self, configure: F) -> Result<Session>
    where
        F: FnOnce(SessionBuilder) -> SessionBuilder,
    {
        let token = self.request_token().await?;
        let builder = Session::builder(token.access_token, token.instance_url);
        Ok(configure(builder).build()?)
    }
}
