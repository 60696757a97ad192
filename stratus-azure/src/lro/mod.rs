//! Long-running operations.
//!
//! A "begin" call returns an [`Accepted`] wrapping the activation response
//! and a [`Poller`]. The poller picks its polling mode from the activation
//! response (`Azure-AsyncOperation`, `Location`, or the resource's own
//! `provisioningState`), honours the service's retry hints, and caches the
//! terminal outcome.
//!
//! ```rust,ignore
//! let mut accepted = deployments.begin_create_or_update("rg", "dp", &deployment).await?;
//! match accepted.final_result().await {
//!     Ok(done) => println!("{:?}", done.properties),
//!     Err(e) if e.is_operation_failure() => {
//!         let ops = deployments.list_operations("rg", "dp").await?;
//!         for op in failed_operations(&ops) {
//!             eprintln!("{:?}", op.properties.target_resource);
//!         }
//!     }
//!     Err(e) => return Err(e),
//! }
//! ```

mod accepted;
mod poller;
mod status;

pub use accepted::Accepted;
pub use poller::{DEFAULT_POLL_INTERVAL, PollableResource, Poller, decode_json};
pub use status::{LongRunningOperationStatus, PollResponse};
