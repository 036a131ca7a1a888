//! # sfbatch-client
//!
//! Session-scoped HTTP infrastructure shared by the sfbatch crates.
//!
//! - One-shot requests with typed network failures
//! - Opt-in retry with exponential backoff and jitter
//! - Cooperative cancellation
//! - An append-only diagnostic log of raw responses
//! - Small helpers used by the API crates (JSON pretty-printing, chunking)
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    Application Layer                        │
//! │  (sfbatch-rest, sfbatch-bulk)                               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   SalesforceClient                          │
//! │  - Holds the Session + HTTP client                          │
//! │  - Bearer auth, plus X-SFDC-Session for bulk calls          │
//! │  - Appends tagged responses to the diagnostic log           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    SfHttpClient                             │
//! │  - One attempt per call, reads the full body                │
//! │  - Retry and cancellation layered on request                │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sfbatch_client::{SalesforceClient, Session};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sfbatch_client::Error> {
//!     let session = Session::builder(access_token, instance_url)
//!         .with_diagnostic_log("logs")
//!         .build()?;
//!     let client = SalesforceClient::new(Arc::new(session))?;
//!
//!     let limits: serde_json::Value = client.get_json("limits").await?;
//!     Ok(())
//! }
//! ```

mod chunk;
mod client;
mod config;
mod diagnostic;
mod error;
mod pretty;
mod request;
mod response;
mod retry;
mod salesforce_client;
mod session;

pub use chunk::chunk;
pub use client::SfHttpClient;
pub use config::{ClientConfig, ClientConfigBuilder, DEFAULT_REQUEST_TIMEOUT};
pub use diagnostic::{DiagnosticLog, LogFormat};
pub use error::{Error, ErrorKind, FailureCause, Result};
pub use pretty::prettify_json;
pub use request::{DiagnosticTag, RequestBody, RequestBuilder, RequestMethod};
pub use response::Response;
pub use retry::{BackoffStrategy, RetryConfig, RetryPolicy, DEFAULT_MAX_RETRIES};
pub use salesforce_client::{SalesforceClient, BULK_SESSION_HEADER};
pub use session::{
    Session, SessionBuilder, SessionPolicy, DEFAULT_MAX_POLL_ATTEMPTS, DEFAULT_POLL_INTERVAL,
};

// Re-exported so callers can build cancellation tokens without a direct dependency.
pub use tokio_util::sync::CancellationToken;

/// Default Salesforce API version
pub const DEFAULT_API_VERSION: &str = "62.0";

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("sfbatch/", env!("CARGO_PKG_VERSION"));
