//! Log Analytics query errors.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

use super::models::{ErrorDetail, ErrorInfo};

/// A query error as surfaced to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogsQueryError {
    /// Error code, collapsed through the inner-error chain.
    pub code: String,
    /// Message of the outermost error.
    pub message: String,
    /// Details of the outermost error.
    pub details: Vec<LogsQueryErrorDetail>,
}

/// One detail entry of a [`LogsQueryError`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogsQueryErrorDetail {
    /// Error code.
    pub code: String,
    /// Message.
    pub message: String,
    /// What the detail refers to.
    pub target: Option<String>,
    /// Offending value.
    pub value: Option<String>,
    /// Resources involved.
    pub resources: Vec<String>,
    /// Anything else the service sent.
    pub additional_properties: Map<String, Value>,
}

impl LogsQueryError {
    /// Create an error without details.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: Vec::new(),
        }
    }
}

impl fmt::Display for LogsQueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for LogsQueryError {}

impl From<&ErrorDetail> for LogsQueryErrorDetail {
    fn from(detail: &ErrorDetail) -> Self {
        Self {
            code: detail.code.clone(),
            message: detail.message.clone(),
            target: detail.target.clone(),
            value: detail.value.clone(),
            resources: detail.resources.clone().unwrap_or_default(),
            additional_properties: detail.additional_properties.clone(),
        }
    }
}

/// Collapse a nested error envelope into a [`LogsQueryError`].
///
/// The message and details come from the outermost error. The code is the
/// outer code unless the deepest inner error repeats it, in which case the
/// deepest node's code is surfaced.
pub fn collapse(error: &ErrorInfo) -> LogsQueryError {
    let mut deepest = error.innererror.as_deref();
    while let Some(inner) = deepest.and_then(|e| e.innererror.as_deref()) {
        deepest = Some(inner);
    }

    let code = match deepest {
        Some(inner) if inner.code == error.code => inner.code.clone(),
        _ => error.code.clone(),
    };

    LogsQueryError {
        code,
        message: error.message.clone(),
        details: error
            .details
            .iter()
            .flatten()
            .map(LogsQueryErrorDetail::from)
            .collect(),
    }
}
