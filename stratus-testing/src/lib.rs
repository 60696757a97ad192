//! Testing utilities for Stratus Azure clients.
//!
//! [`MockTransport`] stands in for the network: register canned responses
//! per route, run the client under test, then inspect what was sent.
//!
//! ```
//! use stratus_http_client::Method;
//! use stratus_testing::{MockResponse, MockTransport};
//!
//! let mock = MockTransport::new();
//! mock.respond(
//!     Method::GET,
//!     "/subscriptions/sub/operationStatuses/op1",
//!     MockResponse::json(200, &serde_json::json!({ "status": "InProgress" }))
//!         .header("retry-after", "2"),
//! );
//!
//! assert_eq!(mock.request_count(), 0);
//! ```

mod mock;

pub use mock::{MockResponse, MockTransport};
