//! # sfbatch-auth
//!
//! Password-grant login for Salesforce, producing an immutable
//! [`Session`](sfbatch_client::Session).
//!
//! ## Security
//!
//! - Secrets and tokens are redacted in Debug output
//! - Tracing skips credential parameters
//!
//! ## Example
//!
//! ```rust,ignore
//! use sfbatch_auth::{PasswordCredentials, PasswordLogin};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sfbatch_auth::Error> {
//!     let creds = PasswordCredentials::from_env()?;
//!     let session = PasswordLogin::new(creds)?
//!         .login_with(|b| b.with_diagnostic_log("logs"))
//!         .await?;
//!
//!     println!("Logged in to {}", session.instance_url());
//!     Ok(())
//! }
//! ```

mod credentials;
mod error;
mod password;

pub use credentials::PasswordCredentials;
pub use error::{Error, ErrorKind, Result};
pub use password::{PasswordLogin, TokenResponse};

/// Default Salesforce login URL for production.
pub const PRODUCTION_LOGIN_URL: &str = "https://login.salesforce.com";

/// Default Salesforce login URL for sandbox.
pub const SANDBOX_LOGIN_URL: &str = "https://test.salesforce.com";
