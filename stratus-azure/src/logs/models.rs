//! Log Analytics wire types.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Body of a single query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryBody {
    pub(crate) query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) timespan: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub(crate) workspaces: Vec<String>,
}

/// One sub-request of a batch envelope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchQueryRequest {
    pub(crate) id: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub(crate) headers: BTreeMap<String, String>,
    pub(crate) body: QueryBody,
    pub(crate) path: &'static str,
    pub(crate) method: &'static str,
    pub(crate) workspace: String,
}

impl BatchQueryRequest {
    /// Correlation id, the 1-based position the query was added at.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Target workspace.
    pub fn workspace(&self) -> &str {
        &self.workspace
    }

    /// Query text.
    pub fn query(&self) -> &str {
        &self.body.query
    }

    /// ISO-8601 time span, if any.
    pub fn timespan(&self) -> Option<&str> {
        self.body.timespan.as_deref()
    }

    /// Additional workspaces the query spans.
    pub fn additional_workspaces(&self) -> &[String] {
        &self.body.workspaces
    }

    /// The `Prefer` header sent with this query.
    pub fn prefer(&self) -> Option<&str> {
        self.headers.get("Prefer").map(String::as_str)
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct BatchRequest<'a> {
    pub(crate) requests: &'a [BatchQueryRequest],
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct BatchResponse {
    #[serde(default, deserialize_with = "crate::management::null_as_default")]
    pub(crate) responses: Vec<BatchQueryResponse>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BatchQueryResponse {
    pub(crate) id: String,
    #[serde(default, deserialize_with = "crate::management::null_as_default")]
    pub(crate) status: u16,
    #[serde(default, deserialize_with = "crate::management::null_as_default")]
    pub(crate) body: QueryResults,
}

/// Results of one query as sent by the service.
#[derive(Debug, Clone, Default, Deserialize)]
pub(crate) struct QueryResults {
    #[serde(default)]
    pub(crate) tables: Option<Vec<Table>>,
    #[serde(default)]
    pub(crate) statistics: Option<Value>,
    #[serde(default)]
    pub(crate) render: Option<Value>,
    #[serde(default)]
    pub(crate) error: Option<ErrorInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Table {
    #[serde(default, deserialize_with = "crate::management::null_as_default")]
    pub(crate) name: String,
    #[serde(default, deserialize_with = "crate::management::null_as_default")]
    pub(crate) columns: Vec<Column>,
    #[serde(default, deserialize_with = "crate::management::null_as_default")]
    pub(crate) rows: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct Column {
    #[serde(default, deserialize_with = "crate::management::null_as_default")]
    pub(crate) name: String,
    #[serde(rename = "type", default, deserialize_with = "crate::management::null_as_default")]
    pub(crate) column_type: String,
}

/// Log Analytics error envelope, possibly nested through `innererror`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorInfo {
    /// Error code.
    #[serde(default, deserialize_with = "crate::management::null_as_default")]
    pub code: String,
    /// Human readable message.
    #[serde(default, deserialize_with = "crate::management::null_as_default")]
    pub message: String,
    /// Per-item details.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ErrorDetail>>,
    /// A more specific error.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub innererror: Option<Box<ErrorInfo>>,
    /// Anything else the service sent.
    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

/// One entry of [`ErrorInfo::details`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Error code.
    #[serde(default, deserialize_with = "crate::management::null_as_default")]
    pub code: String,
    /// Human readable message.
    #[serde(default, deserialize_with = "crate::management::null_as_default")]
    pub message: String,
    /// What the error refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Offending value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Resources involved.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<String>>,
    /// Anything else the service sent.
    #[serde(flatten)]
    pub additional_properties: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: ErrorInfo,
}
