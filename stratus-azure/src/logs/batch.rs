//! Batching several logs queries into one request.

use std::collections::BTreeMap;
use std::time::Duration;
use tracing::error;

use super::models::{BatchQueryRequest, BatchResponse, QueryBody};
use super::options::{LogsQueryOptions, QueryTimeSpan};
use super::table::LogsQueryResult;
use crate::{AzureError, Result};

/// Slack added to the longest server timeout to get the transport timeout.
pub const CLIENT_TIMEOUT_BUFFER: Duration = Duration::from_secs(5);

/// Accumulates queries for one batch request.
///
/// Each query gets the next id, starting at `"1"`. Ids are never reused by a
/// builder, not even after [`LogsBatchQuery::drain`]. The builder is owned by
/// one caller; [`LogsBatchQuery::into_batch`] or [`LogsBatchQuery::drain`]
/// freeze the queries into an immutable [`LogsBatch`].
///
/// ```rust,ignore
/// let batch = LogsBatchQuery::new()
///     .add_query("workspace", "AppRequests | count", Some(QueryTimeSpan::LAST_DAY))
///     .add_query_with_options(
///         "workspace",
///         "AppTraces | take 10",
///         None,
///         &LogsQueryOptions::new().server_timeout(Duration::from_secs(30)),
///     )
///     .into_batch();
/// let results = client.query_batch(batch).await?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct LogsBatchQuery {
    requests: Vec<BatchQueryRequest>,
    last_id: u32,
    max_server_timeout: Option<Duration>,
}

impl LogsBatchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a query with default options.
    pub fn add_query(
        self,
        workspace_id: impl Into<String>,
        query: impl Into<String>,
        time_span: Option<QueryTimeSpan>,
    ) -> Self {
        self.add_query_with_options(workspace_id, query, time_span, &LogsQueryOptions::default())
    }

    /// Add a query.
    pub fn add_query_with_options(
        mut self,
        workspace_id: impl Into<String>,
        query: impl Into<String>,
        time_span: Option<QueryTimeSpan>,
        options: &LogsQueryOptions,
    ) -> Self {
        self.push(workspace_id.into(), query.into(), time_span, options);
        self
    }

    /// Add a query to a builder held by reference, returning the id it got.
    pub fn push(
        &mut self,
        workspace_id: String,
        query: String,
        time_span: Option<QueryTimeSpan>,
        options: &LogsQueryOptions,
    ) -> String {
        self.last_id += 1;
        let id = self.last_id.to_string();

        let mut headers = BTreeMap::new();
        if let Some(prefer) = options.prefer_header() {
            headers.insert("Prefer".to_string(), prefer);
        }
        if let Some(timeout) = options.server_timeout {
            self.max_server_timeout = Some(self.max_server_timeout.map_or(timeout, |max| max.max(timeout)));
        }

        self.requests.push(BatchQueryRequest {
            id: id.clone(),
            headers,
            body: QueryBody {
                query,
                timespan: time_span.map(|span| span.to_string()),
                workspaces: options.additional_workspaces.clone(),
            },
            path: "/query",
            method: "POST",
            workspace: workspace_id,
        });
        id
    }

    /// Number of queries waiting.
    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Longest server timeout among the waiting queries.
    pub fn max_server_timeout(&self) -> Option<Duration> {
        self.max_server_timeout
    }

    /// Take the waiting queries as a batch, leaving the builder empty. The id
    /// counter carries on.
    pub fn drain(&mut self) -> LogsBatch {
        LogsBatch {
            requests: std::mem::take(&mut self.requests),
            max_server_timeout: self.max_server_timeout.take(),
        }
    }

    /// Finish the builder.
    pub fn into_batch(mut self) -> LogsBatch {
        self.drain()
    }
}

/// An immutable set of queries ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct LogsBatch {
    requests: Vec<BatchQueryRequest>,
    max_server_timeout: Option<Duration>,
}

impl LogsBatch {
    /// The wire requests, in id order.
    pub fn requests(&self) -> &[BatchQueryRequest] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn max_server_timeout(&self) -> Option<Duration> {
        self.max_server_timeout
    }

    /// Transport timeout for the batch: the longest server timeout plus
    /// [`CLIENT_TIMEOUT_BUFFER`]. `None` leaves the transport default.
    pub fn transport_timeout(&self) -> Option<Duration> {
        self.max_server_timeout.map(|t| t + CLIENT_TIMEOUT_BUFFER)
    }
}

/// Result of one query of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct LogsBatchQueryResult {
    id: String,
    status: u16,
    result: LogsQueryResult,
}

impl LogsBatchQueryResult {
    /// The id the query was given when added.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// HTTP-like status of this query.
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn result(&self) -> &LogsQueryResult {
        &self.result
    }

    pub fn into_result(self) -> LogsQueryResult {
        self.result
    }
}

/// All results of a batch, sorted by id.
#[derive(Debug, Clone, PartialEq)]
pub struct LogsBatchQueryResultCollection {
    results: Vec<LogsBatchQueryResult>,
}

impl LogsBatchQueryResultCollection {
    pub(crate) fn from_wire(response: BatchResponse) -> Result<Self> {
        let mut keyed = response
            .responses
            .into_iter()
            .map(|item| -> Result<(u32, LogsBatchQueryResult)> {
                let key: u32 = item.id.parse().map_err(|_| {
                    error!(id = %item.id, "Batch response id is not an integer");
                    AzureError::Internal(format!("batch response id '{}' is not an integer", item.id))
                })?;
                let result = LogsQueryResult::from_wire(item.body)?;
                Ok((
                    key,
                    LogsBatchQueryResult {
                        id: item.id,
                        status: item.status,
                        result,
                    },
                ))
            })
            .collect::<Result<Vec<_>>>()?;

        keyed.sort_by_key(|(key, _)| *key);
        Ok(Self {
            results: keyed.into_iter().map(|(_, result)| result).collect(),
        })
    }

    pub fn results(&self) -> &[LogsBatchQueryResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Result for a query id.
    pub fn get(&self, id: &str) -> Option<&LogsBatchQueryResult> {
        self.results.iter().find(|r| r.id == id)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LogsBatchQueryResult> {
        self.results.iter()
    }
}

impl IntoIterator for LogsBatchQueryResultCollection {
    type Item = LogsBatchQueryResult;
    type IntoIter = std::vec::IntoIter<LogsBatchQueryResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.into_iter()
    }
}

impl<'a> IntoIterator for &'a LogsBatchQueryResultCollection {
    type Item = &'a LogsBatchQueryResult;
    type IntoIter = std::slice::Iter<'a, LogsBatchQueryResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
