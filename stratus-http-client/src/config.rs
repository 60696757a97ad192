//! Transport settings.

use crate::retry::RetryConfig;
use std::time::Duration;

/// Header Azure services log against, and echo back, to tie a call to its
/// server-side trace.
pub const CLIENT_REQUEST_ID_HEADER: &str = "x-ms-client-request-id";

/// Settings for [`HttpClient`](crate::HttpClient).
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Applied to every request that has no timeout of its own.
    pub timeout: Duration,
    pub connect_timeout: Duration,
    /// `None` sends every request exactly once.
    pub retry: Option<RetryConfig>,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub user_agent: String,
    /// Added to every request that does not set the header itself.
    pub default_headers: Vec<(String, String)>,
    /// Stamp a fresh `x-ms-client-request-id` on requests that lack one.
    /// Retries of a request reuse its id.
    pub client_request_id: bool,
    /// Accept gzip and brotli encoded bodies.
    pub compression: bool,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(100),
            connect_timeout: Duration::from_secs(10),
            retry: Some(RetryConfig::default()),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 32,
            user_agent: format!("stratus-http-client/{}", env!("CARGO_PKG_VERSION")),
            default_headers: Vec::new(),
            client_request_id: true,
            compression: true,
        }
    }
}

impl HttpClientConfig {
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for [`HttpClientConfig`].
#[derive(Debug, Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.config.retry = Some(config);
        self
    }

    /// Disable retries entirely.
    pub fn no_retry(mut self) -> Self {
        self.config.retry = None;
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.config.user_agent = user_agent.into();
        self
    }

    /// Add a header sent with every request, e.g. `x-ms-app`.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.push((name.into(), value.into()));
        self
    }

    /// Whether to stamp `x-ms-client-request-id` on outgoing requests.
    pub fn client_request_id(mut self, enable: bool) -> Self {
        self.config.client_request_id = enable;
        self
    }

    pub fn compression(mut self, enable: bool) -> Self {
        self.config.compression = enable;
        self
    }

    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}
