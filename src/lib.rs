// Stratus - Azure data-plane and management clients for Rust
//
// This library re-exports the service clients, the HTTP transport they are
// written against and, behind the `testing` feature, the in-memory transport
// used to test them.

// Re-export the service clients
pub use stratus_azure::*;

// Re-export the transport layer
pub use stratus_http_client as http;

#[cfg(feature = "testing")]
pub use stratus_testing as testing;

// Prelude for common imports
pub mod prelude {
    pub use stratus_azure::prelude::*;
    pub use stratus_http_client::{HttpClient, HttpClientConfig, RetryConfig, Transport};
}
