//! # sfbatch
//!
//! Salesforce Bulk API (v1) query orchestration for Rust.
//!
//! A bulk query is a fixed sequence of requests: create a job, submit the
//! query as a batch, poll the batch until it settles, fetch the result ids,
//! download each result, close the job. [`bulk::BulkJobClient`] runs that
//! sequence against an authenticated [`client::Session`].
//!
//! ## Security
//!
//! - Access tokens and secrets are redacted in Debug output
//! - Tracing skips credential parameters
//! - Error messages sanitize anything that looks like a session id
//!
//! ## Crates
//!
//! - **sfbatch-client** - HTTP transport, session, retry, diagnostic log
//! - **sfbatch-auth** - OAuth 2.0 password-grant login
//! - **sfbatch-rest** - SObject insert/update/delete and SOQL queries
//! - **sfbatch-bulk** - Bulk query job lifecycle and status polling
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sfbatch::auth::{PasswordCredentials, PasswordLogin};
//! use sfbatch::bulk::BulkJobClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = PasswordLogin::new(PasswordCredentials::from_env()?)?
//!         .login()
//!         .await?;
//!
//!     let bulk = BulkJobClient::new(Arc::new(session))?;
//!     let csv = bulk
//!         .execute_bulk_query("Account", "SELECT Id, Name FROM Account")
//!         .await?;
//!
//!     println!("{csv}");
//!     Ok(())
//! }
//! ```

#[cfg(feature = "auth")]
pub use sfbatch_auth as auth;
#[cfg(feature = "bulk")]
pub use sfbatch_bulk as bulk;
#[cfg(feature = "client")]
pub use sfbatch_client as client;
#[cfg(feature = "rest")]
pub use sfbatch_rest as rest;

#[cfg(feature = "auth")]
pub use sfbatch_auth::{PasswordCredentials, PasswordLogin};
#[cfg(feature = "bulk")]
pub use sfbatch_bulk::BulkJobClient;
#[cfg(feature = "client")]
pub use sfbatch_client::{CancellationToken, ClientConfig, SalesforceClient, Session};
#[cfg(feature = "rest")]
pub use sfbatch_rest::SObjectClient;
