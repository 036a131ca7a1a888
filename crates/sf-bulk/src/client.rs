//! Bulk query job client.
//!
//! Drives the job/batch flavour of the bulk API: open a query job, submit
//! the query as a batch, poll the batch, fetch its results and close the job.

use std::sync::Arc;

use sfbatch_client::{
    CancellationToken, ClientConfig, RequestBuilder, Response, SalesforceClient, Session,
};
use tracing::{info, instrument, warn};

use crate::error::{Error, ErrorKind, Result};
use crate::poller::StatusPoller;
use crate::types::*;

/// Salesforce bulk query client.
///
/// Each step of the workflow is exposed on its own; [`execute_bulk_query`]
/// runs them in order.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use sfbatch_bulk::BulkJobClient;
///
/// let client = BulkJobClient::new(Arc::new(session))?;
/// let rows = client
///     .execute_bulk_query("Account", "SELECT Id, Name FROM Account")
///     .await?;
/// ```
///
/// [`execute_bulk_query`]: BulkJobClient::execute_bulk_query
#[derive(Debug, Clone)]
pub struct BulkJobClient {
    client: SalesforceClient,
    transport_retries: bool,
}

impl BulkJobClient {
    /// Create a bulk client for `session`.
    pub fn new(session: Arc<Session>) -> Result<Self> {
        Ok(Self::from_client(SalesforceClient::new(session)?))
    }

    /// Create a bulk client with custom HTTP configuration.
    pub fn with_config(session: Arc<Session>, config: ClientConfig) -> Result<Self> {
        Ok(Self::from_client(SalesforceClient::with_config(
            session, config,
        )?))
    }

    /// Create a bulk client from an existing SalesforceClient.
    pub fn from_client(client: SalesforceClient) -> Self {
        Self {
            client,
            transport_retries: false,
        }
    }

    /// Retry network failures and 429/5xx responses up to the session's
    /// `max_transport_retries`. Off by default.
    pub fn with_transport_retries(mut self) -> Self {
        self.transport_retries = true;
        self
    }

    /// Get the underlying SalesforceClient.
    pub fn inner(&self) -> &SalesforceClient {
        &self.client
    }

    pub fn session(&self) -> &Arc<Session> {
        self.client.session()
    }

    async fn send(&self, request: &RequestBuilder, cancel: &CancellationToken) -> Result<Response> {
        let response = if self.transport_retries {
            self.client.send_with_retry(request, cancel).await?
        } else {
            self.client.send_cancellable(request, cancel).await?
        };
        Ok(response)
    }

    /// Open a query job on `object_type`.
    #[instrument(skip(self, cancel))]
    pub async fn create_job(
        &self,
        object_type: &str,
        cancel: &CancellationToken,
    ) -> Result<JobInfo> {
        let failure = |message: String| {
            Error::new(ErrorKind::JobCreate {
                object: object_type.to_string(),
                message,
            })
        };

        let request = self
            .client
            .bulk_post(self.client.bulk_url(""))
            .object_type(object_type)
            .json(&CreateJobRequest::query(object_type))?
            .log_as("CreateJob");
        let response = self.send(&request, cancel).await?;

        if !response.is_success() {
            return Err(failure(status_message(&response)));
        }

        let job: JobInfo = serde_json::from_str(response.text())
            .map_err(|e| failure(format!("unreadable response: {e}")))?;
        if job.id.as_deref().is_some_and(|id| !id.is_empty()) {
            Ok(job)
        } else {
            Err(failure("response has no job id".to_string()))
        }
    }

    /// Submit `query` as a batch of `job_id`.
    #[instrument(skip(self, query, cancel))]
    pub async fn create_batch(
        &self,
        job_id: &str,
        object_type: &str,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<BatchInfo> {
        let request = self
            .client
            .bulk_post(self.client.bulk_url(&format!("{job_id}/batch")))
            .object_type(object_type)
            .json_text(query)
            .log_as("CreateBatch");
        let response = self.send(&request, cancel).await?;

        if !response.is_success() {
            return Err(Error::new(ErrorKind::BatchCreate {
                job_id: job_id.to_string(),
                message: status_message(&response),
            }));
        }

        BatchInfo::from_create_response(job_id, response.text())
    }

    /// One status check of a batch.
    #[instrument(skip(self, cancel))]
    pub async fn batch_status(
        &self,
        job_id: &str,
        batch_id: &str,
        cancel: &CancellationToken,
    ) -> Result<BatchInfo> {
        let request = self
            .client
            .bulk_get(self.client.bulk_url(&format!("{job_id}/batch/{batch_id}")))
            .log_as("GetBatchStatus");
        let response = self.send(&request, cancel).await?;

        if !response.is_success() {
            return Err(Error::new(ErrorKind::StatusCheck {
                batch_id: batch_id.to_string(),
                message: status_message(&response),
            }));
        }

        BatchInfo::from_status_response(job_id, batch_id, response.text())
    }

    /// Result ids of a completed batch.
    #[instrument(skip(self, cancel))]
    pub async fn result_ids(
        &self,
        job_id: &str,
        batch_id: &str,
        cancel: &CancellationToken,
    ) -> Result<ResultHandle> {
        let request = self
            .client
            .bulk_get(
                self.client
                    .bulk_url(&format!("{job_id}/batch/{batch_id}/result")),
            )
            .log_raw_as("GetResultsIds");
        let response = self.send(&request, cancel).await?;

        if !response.is_success() {
            return Err(Error::new(ErrorKind::ResultFetch {
                batch_id: batch_id.to_string(),
                message: status_message(&response),
            }));
        }

        ResultHandle::parse(batch_id, response.text())
    }

    /// Content of one result, exactly as the server sent it.
    #[instrument(skip(self, cancel))]
    pub async fn result(
        &self,
        job_id: &str,
        batch_id: &str,
        result_id: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let request = self
            .client
            .bulk_get(
                self.client
                    .bulk_url(&format!("{job_id}/batch/{batch_id}/result/{result_id}")),
            )
            .log_as("GetResults");
        let response = self.send(&request, cancel).await?;

        if !response.is_success() {
            return Err(Error::new(ErrorKind::ResultFetch {
                batch_id: batch_id.to_string(),
                message: status_message(&response),
            }));
        }

        Ok(response.into_text())
    }

    /// Close `job_id`.
    #[instrument(skip(self, cancel))]
    pub async fn close_job(&self, job_id: &str, cancel: &CancellationToken) -> Result<()> {
        let request = self
            .client
            .bulk_post(self.client.bulk_url(job_id))
            .json(&CloseJobRequest::closed())?
            .log_as("CloseJob");
        let response = self.send(&request, cancel).await?;

        if !response.is_success() {
            return Err(Error::new(ErrorKind::JobClose {
                job_id: job_id.to_string(),
                message: status_message(&response),
            }));
        }

        Ok(())
    }

    /// Run `query` against `object_type` and return the raw result content.
    pub async fn execute_bulk_query(&self, object_type: &str, query: &str) -> Result<String> {
        self.execute_bulk_query_cancellable(object_type, query, &CancellationToken::new())
            .await
    }

    /// Like [`execute_bulk_query`](Self::execute_bulk_query), stopping with
    /// [`ErrorKind::Cancelled`] once `cancel` fires.
    ///
    /// When a batch has several results their contents are joined with a
    /// newline, in server order. The job is closed only after the results are
    /// in hand; a failed close is logged and does not affect the outcome.
    #[instrument(skip(self, query, cancel))]
    pub async fn execute_bulk_query_cancellable(
        &self,
        object_type: &str,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        validate_query(object_type, query)?;

        let policy = PollingPolicy::from_session(self.session());

        ensure_active(cancel)?;
        let job = self.create_job(object_type, cancel).await?;
        let job_id = job.id.unwrap_or_default();
        info!(job_id = %job_id, "Bulk job created");

        ensure_active(cancel)?;
        let batch = self
            .create_batch(&job_id, object_type, query, cancel)
            .await?;
        info!(job_id = %job_id, batch_id = %batch.id, "Batch submitted");

        StatusPoller::new(self)
            .poll_until_terminal(&job_id, &batch.id, policy, cancel)
            .await?;

        ensure_active(cancel)?;
        let handle = self.result_ids(&job_id, &batch.id, cancel).await?;

        let mut contents = Vec::with_capacity(handle.ids().len());
        for result_id in handle.ids() {
            ensure_active(cancel)?;
            contents.push(self.result(&job_id, &batch.id, result_id, cancel).await?);
        }
        let content = contents.join("\n");
        info!(
            job_id = %job_id,
            results = handle.ids().len(),
            bytes = content.len(),
            "Bulk query results retrieved"
        );

        if let Err(e) = self.close_job(&job_id, cancel).await {
            warn!(job_id = %job_id, error = %e, "Failed to close bulk job");
        }

        Ok(content)
    }
}

fn validate_query(object_type: &str, query: &str) -> Result<()> {
    if object_type.trim().is_empty() {
        return Err(Error::invalid_argument("object type must not be empty"));
    }
    if query.trim().is_empty() {
        return Err(Error::invalid_argument("query must not be empty"));
    }
    let length = query.chars().count();
    if length > MAX_QUERY_LENGTH {
        return Err(Error::invalid_argument(format!(
            "query is {length} characters, the limit is {MAX_QUERY_LENGTH}"
        )));
    }
    Ok(())
}

fn ensure_active(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        Err(Error::cancelled())
    } else {
        Ok(())
    }
}

fn status_message(response: &Response) -> String {
    format!("status {}: {}", response.status(), response.summary())
}
