//! Long-running operation status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Status of a long-running operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LongRunningOperationStatus {
    /// Accepted but not yet running.
    NotStarted,
    /// Running.
    InProgress,
    /// Finished successfully.
    Succeeded,
    /// Finished with an error.
    Failed,
    /// Cancelled by a user or by the service.
    UserCancelled,
}

impl LongRunningOperationStatus {
    /// Map a service status string (`provisioningState` or an operation
    /// status body) to a status. Unknown strings mean the operation is still
    /// in flight.
    pub fn from_service_status(status: &str) -> Self {
        match status.to_ascii_lowercase().as_str() {
            "succeeded" => Self::Succeeded,
            "failed" => Self::Failed,
            "canceled" | "cancelled" => Self::UserCancelled,
            "notstarted" => Self::NotStarted,
            _ => Self::InProgress,
        }
    }

    /// True for states from which no further transition happens.
    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::UserCancelled)
    }

    /// Service-style name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "NotStarted",
            Self::InProgress => "InProgress",
            Self::Succeeded => "Succeeded",
            Self::Failed => "Failed",
            Self::UserCancelled => "Canceled",
        }
    }
}

impl fmt::Display for LongRunningOperationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What one round trip told us about an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct PollResponse<T> {
    status: LongRunningOperationStatus,
    value: Option<T>,
    retry_after: Option<Duration>,
}

impl<T> PollResponse<T> {
    /// Create a poll response.
    pub fn new(
        status: LongRunningOperationStatus,
        value: Option<T>,
        retry_after: Option<Duration>,
    ) -> Self {
        Self {
            status,
            value,
            retry_after,
        }
    }

    /// Operation status.
    pub fn status(&self) -> LongRunningOperationStatus {
        self.status
    }

    /// Latest known resource snapshot.
    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// Server hint for the next poll.
    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }
}
