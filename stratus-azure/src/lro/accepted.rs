//! The answer to a "begin" call.

use super::poller::{PollableResource, Poller};
use super::status::{LongRunningOperationStatus, PollResponse};
use crate::Result;

/// An operation the service accepted but may not have finished.
///
/// Holds what the activation response said plus the poller that continues
/// from it. Dropping it does not stop the operation on the service side.
#[derive(Debug)]
pub struct Accepted<T> {
    activation: PollResponse<T>,
    poller: Poller<T>,
}

impl<T: PollableResource> Accepted<T> {
    pub(crate) fn new(poller: Poller<T>) -> Self {
        Self {
            activation: poller.latest().clone(),
            poller,
        }
    }

    /// What the activation response reported.
    pub fn activation(&self) -> &PollResponse<T> {
        &self.activation
    }

    /// Current status of the operation.
    pub fn status(&self) -> LongRunningOperationStatus {
        self.poller.status()
    }

    /// Resource id of the operation's target.
    pub fn resource_id(&self) -> &str {
        self.poller.resource_id()
    }

    /// The poller, for step-by-step control.
    pub fn poller(&mut self) -> &mut Poller<T> {
        &mut self.poller
    }

    /// Give up the activation snapshot and keep only the poller.
    pub fn into_poller(self) -> Poller<T> {
        self.poller
    }

    /// Wait for the operation and resolve it. See [`Poller::final_result`].
    pub async fn final_result(&mut self) -> Result<T> {
        self.poller.final_result().await
    }
}
