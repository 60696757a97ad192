//! # Stratus HTTP Client
//!
//! The transport layer underneath the Stratus Azure clients: a `reqwest`
//! based client with retry and timeout handling, an owned [`Request`] type
//! that can be replayed across attempts, and the [`Transport`] trait that
//! every service client is written against.
//!
//! ## Features
//!
//! - **Retry with Backoff**: exponential, constant or immediate schedules
//! - **Retry-After aware**: server supplied delays win over the backoff schedule
//! - **Timeouts**: per-request and global timeout configuration
//! - **Request ids**: a fresh `x-ms-client-request-id` per call, kept across retries
//! - **Transport seam**: swap the network for an in-memory double in tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use stratus_http_client::{HttpClient, HttpClientConfig, Method, Request, Transport};
//! use std::time::Duration;
//!
//! # async fn run() -> stratus_http_client::Result<()> {
//! let transport = HttpClient::new(HttpClientConfig::default())?;
//! let request = Request::new(Method::POST, "https://api.loganalytics.io/v1/$batch".parse()?)
//!     .bearer_auth("token")
//!     .json(&serde_json::json!({ "requests": [] }))?
//!     .timeout(Duration::from_secs(35));
//!
//! let response = transport.send(request).await?;
//! println!("Status: {}", response.status());
//! # Ok(())
//! # }
//! ```

mod client;
mod config;
mod error;
mod request;
mod response;
mod retry;
mod transport;

pub use client::HttpClient;
pub use config::{CLIENT_REQUEST_ID_HEADER, HttpClientConfig, HttpClientConfigBuilder};
pub use error::{HttpClientError, Result};
pub use request::Request;
pub use response::Response;
pub use retry::{BackoffStrategy, RetryConfig, RetryStrategy};
pub use transport::Transport;

// Re-export common types
pub use bytes::Bytes;
pub use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
pub use url::Url;

/// Prelude for common imports.
///
/// ```
/// use stratus_http_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::client::HttpClient;
    pub use crate::config::{HttpClientConfig, HttpClientConfigBuilder};
    pub use crate::error::{HttpClientError, Result};
    pub use crate::request::Request;
    pub use crate::response::Response;
    pub use crate::retry::{BackoffStrategy, RetryConfig, RetryStrategy};
    pub use crate::transport::Transport;
    pub use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
}
