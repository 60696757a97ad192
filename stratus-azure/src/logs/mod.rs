//! Log Analytics queries.
//!
//! [`LogsQueryClient`] runs single queries and batches. A batch is built with
//! [`LogsBatchQuery`], which numbers queries from `"1"` and tracks the longest
//! server timeout; results come back as a [`LogsBatchQueryResultCollection`]
//! sorted by that number. Service error envelopes are collapsed into a
//! [`LogsQueryError`] by [`collapse`].

mod batch;
mod client;
mod error;
mod models;
mod options;
mod table;

pub use batch::{
    CLIENT_TIMEOUT_BUFFER, LogsBatch, LogsBatchQuery, LogsBatchQueryResult,
    LogsBatchQueryResultCollection,
};
pub use client::LogsQueryClient;
pub use error::{LogsQueryError, LogsQueryErrorDetail, collapse};
pub use models::{BatchQueryRequest, ErrorDetail, ErrorInfo};
pub use options::{LogsQueryOptions, QueryTimeSpan};
pub use table::{
    LogsQueryResult, LogsQueryResultStatus, LogsTable, LogsTableCell, LogsTableColumn,
    LogsTableRow,
};
