//! # sfbatch-bulk
//!
//! Salesforce bulk query jobs (job/batch API).
//!
//! ## Features
//!
//! - **Query Jobs** - job, batch, status polling, result retrieval and close in one call
//! - **Bounded Polling** - interval and attempt budget come from the session
//! - **Cancellation** - every step and every poll sleep honour a `CancellationToken`
//! - **Typed Failures** - each step fails with its own [`ErrorKind`]
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sfbatch_bulk::BulkJobClient;
//! use sfbatch_client::Session;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sfbatch_bulk::Error> {
//!     let session = Session::builder("access_token", "https://myorg.my.salesforce.com")
//!         .build()?;
//!     let client = BulkJobClient::new(Arc::new(session))?.with_transport_retries();
//!
//!     let rows = client
//!         .execute_bulk_query("Account", "SELECT Id, Name FROM Account")
//!         .await?;
//!     println!("{rows}");
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod poller;
mod types;

pub use client::BulkJobClient;
pub use error::{Error, ErrorKind, Result};
pub use poller::StatusPoller;
pub use types::*;
