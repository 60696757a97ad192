//! Azure client error types.

use stratus_http_client::{HeaderMap, HttpClientError, StatusCode};
use thiserror::Error;

use crate::lro::LongRunningOperationStatus;
use crate::management::ManagementError;

#[cfg(feature = "logs")]
use crate::logs::LogsQueryError;

/// Result type for Azure client operations.
pub type Result<T> = std::result::Result<T, AzureError>;

/// Azure client errors.
///
/// The variants separate three failure families callers need to branch on:
/// the call never completed (`Transport`), the service rejected the call
/// (`LogsQuery`, `Management`), or the service accepted a long-running
/// operation that later failed (`OperationFailed`).
#[derive(Debug, Error)]
pub enum AzureError {
    /// Service not enabled.
    #[error("Service '{0}' is not enabled. Enable the feature flag in Cargo.toml")]
    ServiceNotEnabled(&'static str),

    /// Service not configured.
    #[error("Service '{0}' is not configured. Call enable_{0}() on AzureConfig")]
    ServiceNotConfigured(&'static str),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request could not be completed.
    #[error("Transport error: {0}")]
    Transport(#[from] HttpClientError),

    /// The Log Analytics service rejected the request.
    #[cfg(feature = "logs")]
    #[error("Logs query failed with status {status}: {error}")]
    LogsQuery {
        /// HTTP status of the failed call.
        status: StatusCode,
        /// Response headers, kept for diagnostics (request ids).
        headers: HeaderMap,
        /// The collapsed service error.
        error: LogsQueryError,
    },

    /// Resource Manager rejected the request.
    #[error("Management request failed with status {status}: {error}")]
    Management {
        /// HTTP status of the failed call.
        status: StatusCode,
        /// Response headers, kept for diagnostics (request ids).
        headers: HeaderMap,
        /// The service error.
        error: ManagementError,
    },

    /// A long-running operation was accepted but did not succeed.
    #[error("Operation on '{resource_id}' ended {status}: {error}")]
    OperationFailed {
        /// Resource the operation targeted.
        resource_id: String,
        /// Terminal status reported by the service.
        status: LongRunningOperationStatus,
        /// The service's account of the failure.
        error: ManagementError,
    },

    /// Waiting was aborted by the caller's cancellation signal.
    #[error("Operation wait was cancelled")]
    Cancelled,

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// An invariant of this crate did not hold.
    #[error("Internal consistency error: {0}")]
    Internal(String),
}

impl AzureError {
    /// Create a service not enabled error.
    pub fn not_enabled(service: &'static str) -> Self {
        Self::ServiceNotEnabled(service)
    }

    /// Create a service not configured error.
    pub fn not_configured(service: &'static str) -> Self {
        Self::ServiceNotConfigured(service)
    }

    /// The service error code, when the service supplied one.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            #[cfg(feature = "logs")]
            Self::LogsQuery { error, .. } => Some(error.code.as_str()),
            Self::Management { error, .. } | Self::OperationFailed { error, .. } => {
                Some(error.code.as_str())
            }
            _ => None,
        }
    }

    /// The HTTP status code of a rejected call.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            #[cfg(feature = "logs")]
            Self::LogsQuery { status, .. } => Some(status.as_u16()),
            Self::Management { status, .. } => Some(status.as_u16()),
            Self::Transport(e) => e.status_code(),
            _ => None,
        }
    }

    /// True when an accepted operation failed, as opposed to the call itself.
    pub fn is_operation_failure(&self) -> bool {
        matches!(self, Self::OperationFailed { .. })
    }

    /// True when the service answered 404.
    pub fn is_not_found(&self) -> bool {
        self.status_code() == Some(404)
    }
}

impl From<serde_json::Error> for AzureError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<url::ParseError> for AzureError {
    fn from(e: url::ParseError) -> Self {
        Self::Config(format!("invalid URL: {e}"))
    }
}
