//! # sfbatch-rest
//!
//! Salesforce REST glue around the bulk workflow: single-record writes,
//! composite deletes and SOQL queries over a shared [`Session`](sfbatch_client::Session).
//!
//! ## Example
//!
//! ```rust,ignore
//! use sfbatch_rest::SObjectClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sfbatch_rest::Error> {
//!     let client = SObjectClient::new(session)?;
//!
//!     let id = client
//!         .insert("Account", &serde_json::json!({"Name": "New Account"}))
//!         .await?;
//!
//!     let accounts: Vec<serde_json::Value> = client
//!         .query_all("SELECT Id, Name FROM Account LIMIT 10")
//!         .await?;
//!
//!     client.delete_many(&[id]).await?;
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod query;
mod sobject;

pub use client::{SObjectClient, MAX_COMPOSITE_IDS};
pub use error::{Error, ErrorKind, Result};
pub use query::QueryResponse;
pub use sobject::{DeleteResult, InsertResponse, SalesforceError};
