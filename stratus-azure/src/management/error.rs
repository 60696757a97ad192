//! Resource Manager error envelope.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Extra context attached to a Resource Manager error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdditionalInfo {
    /// Kind of the additional info.
    #[serde(rename = "type", default, deserialize_with = "crate::management::null_as_default")]
    pub info_type: String,
    /// The payload.
    #[serde(default, deserialize_with = "crate::management::null_as_default")]
    pub info: serde_json::Value,
}

/// Resource Manager error: a code, a message and nested details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagementError {
    /// Machine readable error code.
    #[serde(default, deserialize_with = "crate::management::null_as_default")]
    pub code: String,
    /// Human readable message.
    #[serde(default, deserialize_with = "crate::management::null_as_default")]
    pub message: String,
    /// The element the error refers to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    /// Finer grained errors.
    #[serde(
        default,
        deserialize_with = "crate::management::null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub details: Vec<ManagementError>,
    /// Additional context.
    #[serde(
        default,
        deserialize_with = "crate::management::null_as_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub additional_info: Vec<AdditionalInfo>,
}

#[derive(Deserialize)]
struct Wrapped {
    error: ManagementError,
}

impl ManagementError {
    /// Create an error with a code and a message.
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            target: None,
            details: Vec::new(),
            additional_info: Vec::new(),
        }
    }

    /// Parse an error body, accepting both `{"error": {...}}` and a bare
    /// error object. Returns `None` when the body carries no error code.
    pub fn from_body(body: &[u8]) -> Option<Self> {
        if let Ok(wrapped) = serde_json::from_slice::<Wrapped>(body) {
            return Some(wrapped.error);
        }
        serde_json::from_slice::<ManagementError>(body)
            .ok()
            .filter(|e| !e.code.is_empty())
    }

    /// Depth-first iterator over this error and all nested details.
    pub fn iter(&self) -> impl Iterator<Item = &ManagementError> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.details.iter().rev());
            Some(next)
        })
    }
}

impl fmt::Display for ManagementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_wrapped_body() {
        let body = br#"{"error":{"code":"DeploymentFailed","message":"At least one resource deployment operation failed.","details":[{"code":"Conflict","message":"Subnet2 is in use"}]}}"#;
        let error = ManagementError::from_body(body).unwrap();

        assert_eq!(error.code, "DeploymentFailed");
        assert_eq!(error.details.len(), 1);
        assert!(error.iter().any(|e| e.message.contains("Subnet2")));
    }

    #[test]
    fn test_from_bare_body_and_garbage() {
        let error = ManagementError::from_body(br#"{"code":"BadRequest","message":"nope"}"#).unwrap();
        assert_eq!(error.code, "BadRequest");

        assert!(ManagementError::from_body(b"<html>").is_none());
        assert!(ManagementError::from_body(b"{}").is_none());
    }

    #[test]
    fn test_null_collections_decode_as_empty() {
        let body = br#"{"error":{"code":"ServerBusy","message":"busy","details":null,"additionalInfo":null}}"#;
        let error = ManagementError::from_body(body).unwrap();

        assert_eq!(error.code, "ServerBusy");
        assert!(error.details.is_empty());
        assert!(error.additional_info.is_empty());
    }

    #[test]
    fn test_iter_visits_nested_details_in_order() {
        let mut root = ManagementError::new("A", "a");
        let mut b = ManagementError::new("B", "b");
        b.details.push(ManagementError::new("C", "c"));
        root.details.push(b);
        root.details.push(ManagementError::new("D", "d"));

        let codes: Vec<_> = root.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, ["A", "B", "C", "D"]);
    }
}
