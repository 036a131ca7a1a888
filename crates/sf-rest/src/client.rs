//! SObject REST client.
//!
//! Thin request/response glue over `SalesforceClient`: single-record writes,
//! chunked composite deletes and SOQL queries.

use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, instrument};

use sfbatch_client::{chunk, prettify_json, ClientConfig, Response, SalesforceClient, Session};

use crate::error::{Error, ErrorKind, Result};
use crate::query::QueryResponse;
use crate::sobject::{DeleteResult, InsertResponse};

/// Most ids a composite delete accepts in one request.
pub const MAX_COMPOSITE_IDS: usize = 200;

/// Salesforce SObject REST client.
///
/// # Example
///
/// ```rust,ignore
/// use sfbatch_rest::SObjectClient;
///
/// let client = SObjectClient::new(session)?;
///
/// let id = client.insert("Account", &json!({"Name": "New Account"})).await?;
/// client.update("Account", &id, &json!({"Name": "Updated"})).await?;
/// client.delete("Account", &id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct SObjectClient {
    client: SalesforceClient,
}

impl SObjectClient {
    pub fn new(session: Arc<Session>) -> Result<Self> {
        Ok(Self::from_client(SalesforceClient::new(session)?))
    }

    /// Create a client with custom HTTP configuration.
    pub fn with_config(session: Arc<Session>, config: ClientConfig) -> Result<Self> {
        Ok(Self::from_client(SalesforceClient::with_config(
            session, config,
        )?))
    }

    /// Create a client from an existing SalesforceClient.
    pub fn from_client(client: SalesforceClient) -> Self {
        Self { client }
    }

    /// Get the underlying SalesforceClient.
    pub fn inner(&self) -> &SalesforceClient {
        &self.client
    }

    /// Insert a record and return its id.
    ///
    /// Any response without an id fails with [`ErrorKind::Insert`], carrying
    /// the pretty-printed payload and the server's answer.
    #[instrument(skip(self, record))]
    pub async fn insert<T: Serialize>(&self, object: &str, record: &T) -> Result<String> {
        ensure_sobject_name(object)?;

        let request = self
            .client
            .post(self.client.rest_url(&format!("sobjects/{object}")))
            .object_type(object)
            .json(record)?;
        let response = self.client.send(&request).await?;

        let inserted = serde_json::from_str::<InsertResponse>(response.text())
            .ok()
            .filter(|r| response.is_success() && !r.id.is_empty());

        match inserted {
            Some(r) => Ok(r.id),
            None => Err(Error::new(ErrorKind::Insert {
                object: object.to_string(),
                payload: prettify_json(&serde_json::to_string(record)?),
                response: response.into_text(),
            })),
        }
    }

    /// Update fields of an existing record.
    #[instrument(skip(self, record))]
    pub async fn update<T: Serialize>(&self, object: &str, id: &str, record: &T) -> Result<()> {
        ensure_sobject_name(object)?;
        ensure_id(id)?;

        let request = self
            .client
            .post(
                self.client
                    .rest_url(&format!("sobjects/{object}/{id}?_HttpMethod=PATCH")),
            )
            .object_type(object)
            .json(record)?;
        let response = self.client.send(&request).await?;
        response.error_for_status()?;
        Ok(())
    }

    /// Delete one record.
    #[instrument(skip(self))]
    pub async fn delete(&self, object: &str, id: &str) -> Result<()> {
        ensure_sobject_name(object)?;
        ensure_id(id)?;

        let request = self
            .client
            .post(
                self.client
                    .rest_url(&format!("sobjects/{object}/{id}?_HttpMethod=DELETE")),
            )
            .object_type(object);
        let response = self.client.send(&request).await?;
        response.error_for_status()?;
        Ok(())
    }

    /// Delete many records, at most [`MAX_COMPOSITE_IDS`] per request.
    ///
    /// Per-record outcomes are returned in input order; a record that could
    /// not be deleted shows up with `success == false` rather than an error.
    #[instrument(skip(self, ids), fields(count = ids.len()))]
    pub async fn delete_many<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<DeleteResult>> {
        for id in ids {
            ensure_id(id.as_ref())?;
        }

        let mut results = Vec::with_capacity(ids.len());
        let groups: Vec<Vec<&str>> = chunk(ids.iter().map(|id| id.as_ref()), MAX_COMPOSITE_IDS)?;
        for group in groups {
            let url = self
                .client
                .rest_url(&format!("composite/sobjects?ids={}", group.join(",")));
            let response = self.client.send(&self.client.delete(url)).await?;
            let page: Vec<DeleteResult> = response.error_for_status()?.json()?;
            debug!(requested = group.len(), returned = page.len(), "Composite delete");
            results.extend(page);
        }
        Ok(results)
    }

    /// Run a SOQL query and return the first page as raw JSON text.
    #[instrument(skip(self, soql))]
    pub async fn query(&self, soql: &str) -> Result<String> {
        Ok(self.send_query(soql).await?.into_text())
    }

    /// Run a SOQL query and deserialize the first page.
    #[instrument(skip(self, soql))]
    pub async fn query_page<T: DeserializeOwned>(&self, soql: &str) -> Result<QueryResponse<T>> {
        Ok(self.send_query(soql).await?.json()?)
    }

    /// Fetch a follow-up page given its `nextRecordsUrl`, as raw JSON text.
    #[instrument(skip(self))]
    pub async fn next_records(&self, next_records_url: &str) -> Result<String> {
        Ok(self.send_next(next_records_url).await?.into_text())
    }

    /// Fetch and deserialize a follow-up page.
    #[instrument(skip(self))]
    pub async fn next_page<T: DeserializeOwned>(
        &self,
        next_records_url: &str,
    ) -> Result<QueryResponse<T>> {
        Ok(self.send_next(next_records_url).await?.json()?)
    }

    /// Run a SOQL query and follow every page.
    #[instrument(skip(self, soql))]
    pub async fn query_all<T: DeserializeOwned>(&self, soql: &str) -> Result<Vec<T>> {
        let mut page: QueryResponse<T> = self.query_page(soql).await?;
        let mut records = std::mem::take(&mut page.records);

        while let Some(next) = page.next_page().map(str::to_string) {
            page = self.next_page(&next).await?;
            records.append(&mut page.records);
        }
        Ok(records)
    }

    async fn send_query(&self, soql: &str) -> Result<Response> {
        if soql.trim().is_empty() {
            return Err(Error::invalid_argument("query must not be empty"));
        }
        let url = self
            .client
            .rest_url(&format!("query?q={}", urlencoding::encode(soql)));
        let response = self.client.send(&self.client.get(url)).await?;
        Ok(response.error_for_status()?)
    }

    async fn send_next(&self, next_records_url: &str) -> Result<Response> {
        // Only follow paths on the session's own instance.
        if !next_records_url.starts_with("/services/data/") {
            return Err(Error::invalid_argument(format!(
                "not a query continuation path: {next_records_url}"
            )));
        }
        let url = format!(
            "{}{}",
            self.client.session().instance_url(),
            next_records_url
        );
        let response = self.client.send(&self.client.get(url)).await?;
        Ok(response.error_for_status()?)
    }
}

/// SObject API names are letters, digits and underscores, starting with a letter.
fn ensure_sobject_name(name: &str) -> Result<()> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!(
            "invalid SObject name: {name:?}"
        )))
    }
}

/// Record ids are 15 or 18 alphanumeric characters.
fn ensure_id(id: &str) -> Result<()> {
    let valid = matches!(id.len(), 15 | 18) && id.chars().all(|c| c.is_ascii_alphanumeric());
    if valid {
        Ok(())
    } else {
        Err(Error::invalid_argument(format!("invalid record id: {id:?}")))
    }
}
