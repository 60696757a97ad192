//! Log Analytics query client.

use std::sync::Arc;
use stratus_http_client::{Method, Request, Response, Transport, Url};
use tracing::{debug, info, warn};

use super::batch::{CLIENT_TIMEOUT_BUFFER, LogsBatch, LogsBatchQuery, LogsBatchQueryResultCollection};
use super::error::{LogsQueryError, collapse};
use super::models::{BatchRequest, BatchResponse, ErrorResponse, QueryBody, QueryResults};
use super::options::{LogsQueryOptions, QueryTimeSpan};
use super::table::LogsQueryResult;
use crate::{AzureError, Result};

/// Runs Kusto queries against Log Analytics workspaces.
#[derive(Clone)]
pub struct LogsQueryClient {
    transport: Arc<dyn Transport>,
    endpoint: Url,
}

impl LogsQueryClient {
    /// Create a client for the given API endpoint, e.g.
    /// `https://api.loganalytics.io/v1`.
    pub fn new(transport: Arc<dyn Transport>, endpoint: Url) -> Self {
        Self { transport, endpoint }
    }

    /// The API endpoint.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Run one query with default options.
    pub async fn query_workspace(
        &self,
        workspace_id: &str,
        query: &str,
        time_span: Option<QueryTimeSpan>,
    ) -> Result<LogsQueryResult> {
        self.query_workspace_with_options(workspace_id, query, time_span, &LogsQueryOptions::default())
            .await
    }

    /// Run one query.
    ///
    /// A service-side rejection of the whole call is an
    /// [`AzureError::LogsQuery`]; an error that comes back alongside results
    /// is left on [`LogsQueryResult::error`].
    pub async fn query_workspace_with_options(
        &self,
        workspace_id: &str,
        query: &str,
        time_span: Option<QueryTimeSpan>,
        options: &LogsQueryOptions,
    ) -> Result<LogsQueryResult> {
        let url = self.url(&["workspaces", workspace_id, "query"])?;
        let body = QueryBody {
            query: query.to_string(),
            timespan: time_span.map(|span| span.to_string()),
            workspaces: options.additional_workspaces.clone(),
        };

        let mut request = Request::new(Method::POST, url).json(&body)?;
        if let Some(prefer) = options.prefer_header() {
            request = request.header("Prefer", prefer);
        }
        if let Some(timeout) = options.server_timeout {
            request = request.timeout(timeout + CLIENT_TIMEOUT_BUFFER);
        }

        debug!(workspace_id = %workspace_id, "Executing logs query");
        let response = self.send(request).await?;
        let results: QueryResults = serde_json::from_slice(response.bytes())?;
        LogsQueryResult::from_wire(results)
    }

    /// Run a batch of queries in one round trip.
    ///
    /// Results come back sorted by query id. Errors of individual queries are
    /// left on their results; only a rejection of the whole batch fails the
    /// call.
    pub async fn query_batch(&self, batch: LogsBatch) -> Result<LogsBatchQueryResultCollection> {
        let url = self.url(&["$batch"])?;
        let mut request = Request::new(Method::POST, url).json(&BatchRequest {
            requests: batch.requests(),
        })?;
        if let Some(timeout) = batch.transport_timeout() {
            request = request.timeout(timeout);
        }

        info!(queries = batch.len(), "Executing logs query batch");
        let response = self.send(request).await?;
        let wire: BatchResponse = serde_json::from_slice(response.bytes())?;
        if wire.responses.len() != batch.len() {
            warn!(
                sent = batch.len(),
                received = wire.responses.len(),
                "Batch response count differs from request count"
            );
        }
        LogsBatchQueryResultCollection::from_wire(wire)
    }

    /// Run several queries against one workspace as a batch.
    pub async fn query_workspace_batch<I, Q>(
        &self,
        workspace_id: &str,
        queries: I,
        time_span: Option<QueryTimeSpan>,
    ) -> Result<LogsBatchQueryResultCollection>
    where
        I: IntoIterator<Item = Q>,
        Q: Into<String>,
    {
        let batch = queries
            .into_iter()
            .fold(LogsBatchQuery::new(), |batch, query| {
                batch.add_query(workspace_id, query, time_span)
            })
            .into_batch();
        self.query_batch(batch).await
    }

    /// Endpoint URL with `segments` appended, each percent-encoded on its own.
    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|()| {
                AzureError::Config(format!("logs endpoint '{}' cannot hold a path", self.endpoint))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send(&self, request: Request) -> Result<Response> {
        let response = self.transport.send(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(rejection(response))
        }
    }
}

impl std::fmt::Debug for LogsQueryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogsQueryClient")
            .field("endpoint", &self.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

fn rejection(response: Response) -> AzureError {
    let error = match serde_json::from_slice::<ErrorResponse>(response.bytes()) {
        Ok(body) => collapse(&body.error),
        Err(_) => LogsQueryError::new(
            response
                .status()
                .canonical_reason()
                .unwrap_or("UnknownError")
                .replace(' ', ""),
            response.text().unwrap_or_default(),
        ),
    };
    warn!(status = %response.status(), code = %error.code, "Logs query rejected");

    AzureError::LogsQuery {
        status: response.status(),
        headers: response.headers().clone(),
        error,
    }
}
