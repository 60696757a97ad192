//! HTTP response wrapper.

use crate::{HttpClientError, Result};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Millisecond retry hints, checked before `Retry-After`.
const RETRY_AFTER_MS_HEADERS: [&str; 2] = ["retry-after-ms", "x-ms-retry-after-ms"];

/// HTTP response wrapper.
#[derive(Debug, Clone)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    url: url::Url,
}

impl Response {
    /// Create a response from its parts.
    pub fn new(status: StatusCode, headers: HeaderMap, body: impl Into<Bytes>, url: url::Url) -> Self {
        Self {
            status,
            headers,
            body: body.into(),
            url,
        }
    }

    /// Create a response from a reqwest response, reading the whole body.
    pub(crate) async fn from_reqwest(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let headers = response.headers().clone();
        let url = response.url().clone();
        let body = response.bytes().await?;

        Ok(Self {
            status,
            headers,
            body,
            url,
        })
    }

    /// Get the status code.
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// Check if the response was successful (2xx).
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Get the response headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Get a specific header value.
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers
            .get(name.as_ref())
            .and_then(|v| v.to_str().ok())
    }

    /// Get the response URL.
    pub fn url(&self) -> &url::Url {
        &self.url
    }

    /// Get the response body as bytes.
    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Get the response body as text.
    pub fn text(&self) -> Result<String> {
        String::from_utf8(self.body.to_vec())
            .map_err(|e| HttpClientError::Json(e.to_string()))
    }

    /// Parse the response body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body)
            .map_err(|e| HttpClientError::Json(e.to_string()))
    }

    /// The delay the server asked for before the next request.
    ///
    /// Millisecond headers win over `Retry-After`, which may hold either a
    /// number of seconds or an HTTP date.
    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after_at(Utc::now())
    }

    fn retry_after_at(&self, now: DateTime<Utc>) -> Option<Duration> {
        for name in RETRY_AFTER_MS_HEADERS {
            if let Some(ms) = self.header(name).and_then(|v| v.trim().parse::<u64>().ok()) {
                return Some(Duration::from_millis(ms));
            }
        }

        let value = self.header(http::header::RETRY_AFTER)?.trim();
        if let Ok(seconds) = value.parse::<u64>() {
            return Some(Duration::from_secs(seconds));
        }

        let at = DateTime::parse_from_rfc2822(value).ok()?.with_timezone(&Utc);
        Some((at - now).to_std().unwrap_or(Duration::ZERO))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use http::HeaderValue;

    fn response_with(headers: &[(&'static str, &'static str)]) -> Response {
        let mut map = HeaderMap::new();
        for (name, value) in headers {
            map.insert(*name, HeaderValue::from_static(*value));
        }
        Response::new(
            StatusCode::ACCEPTED,
            map,
            Bytes::new(),
            url::Url::parse("https://example.com/op").unwrap(),
        )
    }

    #[test]
    fn test_retry_after_seconds() {
        let response = response_with(&[("retry-after", "2")]);
        assert_eq!(response.retry_after(), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_retry_after_ms_headers_take_priority() {
        let response = response_with(&[("retry-after", "10"), ("x-ms-retry-after-ms", "250")]);
        assert_eq!(response.retry_after(), Some(Duration::from_millis(250)));

        let response = response_with(&[("retry-after-ms", "100"), ("x-ms-retry-after-ms", "250")]);
        assert_eq!(response.retry_after(), Some(Duration::from_millis(100)));
    }

    #[test]
    fn test_retry_after_http_date() {
        let response = response_with(&[("retry-after", "Wed, 21 Oct 2015 07:28:30 GMT")]);
        let now = Utc.with_ymd_and_hms(2015, 10, 21, 7, 28, 0).unwrap();
        assert_eq!(response.retry_after_at(now), Some(Duration::from_secs(30)));

        let later = Utc.with_ymd_and_hms(2015, 10, 21, 8, 0, 0).unwrap();
        assert_eq!(response.retry_after_at(later), Some(Duration::ZERO));
    }

    #[test]
    fn test_retry_after_absent_or_garbage() {
        assert_eq!(response_with(&[]).retry_after(), None);
        assert_eq!(response_with(&[("retry-after", "soon")]).retry_after(), None);
    }
}
