//! HTTP client implementation.

use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::config::CLIENT_REQUEST_ID_HEADER;
use crate::{HttpClientConfig, HttpClientError, Request, Response, Result, RetryConfig, RetryStrategy};

/// `reqwest` based [`Transport`](crate::Transport) with retry and timeout
/// support.
#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    config: Arc<HttpClientConfig>,
}

impl HttpClient {
    /// Build a client. Fails only if the TLS backend cannot be initialized.
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let inner = reqwest::Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .gzip(config.compression)
            .brotli(config.compression)
            .build()?;

        Ok(Self {
            inner,
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &HttpClientConfig {
        &self.config
    }

    /// Execute a request, retrying when configured.
    pub(crate) async fn execute(&self, mut request: Request) -> Result<Response> {
        if self.config.client_request_id && request.header_value(CLIENT_REQUEST_ID_HEADER).is_none() {
            request = request.header(CLIENT_REQUEST_ID_HEADER, Uuid::new_v4().to_string());
        }

        match &self.config.retry {
            Some(retry_config) => self.execute_with_retry(&request, retry_config).await,
            None => self.execute_once(&request).await,
        }
    }

    async fn execute_with_retry(
        &self,
        request: &Request,
        retry_config: &RetryConfig,
    ) -> Result<Response> {
        let mut attempt = 0;
        let start = Instant::now();

        loop {
            let out_of_time = retry_config
                .max_retry_time
                .is_some_and(|max_time| start.elapsed() > max_time);

            match self.execute_once(request).await {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if !out_of_time
                        && retry_config.should_retry_status(status)
                        && attempt + 1 < retry_config.max_attempts
                    {
                        let delay = retry_config.delay_for(attempt, response.retry_after());
                        debug!(
                            attempt = attempt + 1,
                            status,
                            delay_ms = delay.as_millis() as u64,
                            url = %request.url(),
                            "Retrying request due to status code"
                        );
                        attempt += 1;
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    return Ok(response);
                }
                Err(e) => {
                    if !out_of_time && retry_config.should_retry(attempt, &e) {
                        let delay = retry_config.retry_delay(attempt);
                        debug!(
                            attempt = attempt + 1,
                            error = %e,
                            delay_ms = delay.as_millis() as u64,
                            "Retrying request due to error"
                        );
                        attempt += 1;
                        tokio::time::sleep(delay).await;
                        continue;
                    }

                    if attempt == 0 {
                        return Err(e);
                    }

                    warn!(attempts = attempt + 1, error = %e, "Giving up on request");
                    return Err(HttpClientError::RetryExhausted {
                        attempts: attempt + 1,
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    async fn execute_once(&self, request: &Request) -> Result<Response> {
        let wire = request.to_reqwest(&self.config.default_headers);

        match self.inner.execute(wire).await {
            Ok(response) => Response::from_reqwest(response).await,
            Err(e) if e.is_timeout() => Err(HttpClientError::Timeout(
                request.timeout_override().unwrap_or(self.config.timeout),
            )),
            Err(e) if e.is_connect() => Err(HttpClientError::Connection(e.to_string())),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_config() {
        let client = HttpClient::new(HttpClientConfig::default()).unwrap();
        assert!(client.config().compression);
        assert!(client.config().client_request_id);
        assert_eq!(client.config().retry.as_ref().map(|r| r.max_attempts), Some(4));
    }

    #[test]
    fn test_client_with_config() {
        let config = HttpClientConfig::builder()
            .timeout(Duration::from_secs(60))
            .user_agent("stratus-azure/0.1.0")
            .client_request_id(false)
            .no_retry()
            .build();

        let client = HttpClient::new(config).unwrap();
        assert_eq!(client.config().timeout, Duration::from_secs(60));
        assert_eq!(client.config().user_agent, "stratus-azure/0.1.0");
        assert!(!client.config().client_request_id);
        assert!(client.config().retry.is_none());
    }
}
