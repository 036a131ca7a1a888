//! Connected-app and user credentials for the password grant.

use crate::error::{Error, ErrorKind, Result};
use crate::PRODUCTION_LOGIN_URL;

/// Credentials for the OAuth username/password flow.
///
/// The client secret, password and security token are redacted in Debug output.
#[derive(Clone)]
pub struct PasswordCredentials {
    client_id: String,
    client_secret: String,
    username: String,
    password: String,
    security_token: String,
    login_url: String,
}

impl std::fmt::Debug for PasswordCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("security_token", &"[REDACTED]")
            .field("login_url", &self.login_url)
            .finish()
    }
}

impl PasswordCredentials {
    /// Create credentials against the production login host.
    pub fn new(
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            username: username.into(),
            password: password.into(),
            security_token: String::new(),
            login_url: PRODUCTION_LOGIN_URL.to_string(),
        }
    }

    /// Security token appended to the password.
    pub fn with_security_token(mut self, token: impl Into<String>) -> Self {
        self.security_token = token.into();
        self
    }

    /// Login host, e.g. `https://test.salesforce.com` for sandboxes.
    pub fn with_login_url(mut self, url: impl Into<String>) -> Self {
        self.login_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Load credentials from environment variables.
    ///
    /// Requires `SF_CLIENT_ID`, `SF_CLIENT_SECRET`, `SF_USERNAME` and
    /// `SF_PASSWORD`; `SF_SECURITY_TOKEN` and `SF_LOGIN_URL` are optional.
    pub fn from_env() -> Result<Self> {
        let required = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.is_empty())
                .ok_or_else(|| Error::new(ErrorKind::EnvVar(name.to_string())))
        };

        let mut creds = Self::new(
            required("SF_CLIENT_ID")?,
            required("SF_CLIENT_SECRET")?,
            required("SF_USERNAME")?,
            required("SF_PASSWORD")?,
        );

        if let Ok(token) = std::env::var("SF_SECURITY_TOKEN") {
            creds = creds.with_security_token(token);
        }
        if let Ok(url) = std::env::var("SF_LOGIN_URL") {
            creds = creds.with_login_url(url);
        }

        Ok(creds)
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    /// Check that every required field is present and the login URL parses.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("username", &self.username),
            ("password", &self.password),
            ("login_url", &self.login_url),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(Error::new(ErrorKind::InvalidCredentials(format!(
                    "{name} must not be empty"
                ))));
            }
        }

        url::Url::parse(&self.login_url).map_err(|e| {
            Error::with_source(
                ErrorKind::InvalidCredentials(format!("invalid login URL: {e}")),
                e,
            )
        })?;
        Ok(())
    }

    /// Form fields of the token request.
    pub(crate) fn token_form(&self) -> [(&'static str, String); 5] {
        [
            ("grant_type", "password".to_string()),
            ("client_id", self.client_id.clone()),
            ("client_secret", self.client_secret.clone()),
            ("username", self.username.clone()),
            ("password", format!("{}{}", self.password, self.security_token)),
        ]
    }
}
