// Mock transport for testing

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use stratus_http_client::{
    HeaderMap, HeaderValue, HttpClientError, Method, Request, Response, Result, StatusCode,
    Transport, header::HeaderName,
};

/// A canned response served by [`MockTransport`].
#[derive(Debug, Clone)]
pub struct MockResponse {
    status: u16,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl MockResponse {
    /// An empty response with the given status.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    /// A JSON response.
    pub fn json<T: Serialize + ?Sized>(status: u16, body: &T) -> Self {
        let body = serde_json::to_vec(body).unwrap_or_default();
        Self::new(status)
            .header("content-type", "application/json")
            .body(body)
    }

    /// Add a response header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set a raw body.
    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    fn into_response(self, request: &Request) -> Response {
        let mut headers = HeaderMap::new();
        for (name, value) in &self.headers {
            if let (Ok(name), Ok(value)) = (
                HeaderName::try_from(name.as_str()),
                HeaderValue::try_from(value.as_str()),
            ) {
                headers.insert(name, value);
            }
        }
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Response::new(status, headers, self.body, request.url().clone())
    }
}

#[derive(Debug, Clone)]
enum Reply {
    Respond(MockResponse),
    Disconnect(String),
}

#[derive(Debug)]
struct Route {
    method: Method,
    path: String,
    replies: VecDeque<Reply>,
}

#[derive(Default)]
struct State {
    routes: Vec<Route>,
    requests: Vec<Request>,
}

/// Scripted in-memory [`Transport`].
///
/// Replies are registered per `(method, path)` and served in order. The last
/// reply of a route keeps being served once the others are used up. Every
/// request is recorded, matched or not.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<State>>,
}

impl MockTransport {
    /// Create a transport with no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `method path`.
    pub fn respond(&self, method: Method, path: &str, response: MockResponse) -> &Self {
        self.push(method, path, Reply::Respond(response));
        self
    }

    /// Queue a connection failure for `method path`.
    pub fn disconnect(&self, method: Method, path: &str, message: &str) -> &Self {
        self.push(method, path, Reply::Disconnect(message.to_string()));
        self
    }

    fn push(&self, method: Method, path: &str, reply: Reply) {
        let mut state = self.state.lock();
        if let Some(route) = state
            .routes
            .iter_mut()
            .find(|r| r.method == method && r.path == path)
        {
            route.replies.push_back(reply);
        } else {
            state.routes.push(Route {
                method,
                path: path.to_string(),
                replies: VecDeque::from([reply]),
            });
        }
    }

    /// All recorded requests, oldest first.
    pub fn requests(&self) -> Vec<Request> {
        self.state.lock().requests.clone()
    }

    /// Number of recorded requests.
    pub fn request_count(&self) -> usize {
        self.state.lock().requests.len()
    }

    /// Recorded requests for one route.
    pub fn requests_to(&self, method: Method, path: &str) -> Vec<Request> {
        self.state
            .lock()
            .requests
            .iter()
            .filter(|r| *r.method() == method && r.url().path() == path)
            .cloned()
            .collect()
    }

    /// The most recent request.
    pub fn last_request(&self) -> Option<Request> {
        self.state.lock().requests.last().cloned()
    }

    /// Forget recorded requests, keeping the routes.
    pub fn clear_requests(&self) {
        self.state.lock().requests.clear();
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: Request) -> Result<Response> {
        let mut state = self.state.lock();
        state.requests.push(request.clone());

        let reply = state
            .routes
            .iter_mut()
            .find(|r| r.method == *request.method() && r.path == request.url().path())
            .and_then(|route| {
                if route.replies.len() > 1 {
                    route.replies.pop_front()
                } else {
                    route.replies.front().cloned()
                }
            });

        match reply {
            Some(Reply::Respond(response)) => Ok(response.into_response(&request)),
            Some(Reply::Disconnect(message)) => Err(HttpClientError::Connection(message)),
            None => Err(HttpClientError::Connection(format!(
                "no mock response for {} {}",
                request.method(),
                request.url()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stratus_http_client::Url;

    fn get(path: &str) -> Request {
        Request::new(
            Method::GET,
            Url::parse(&format!("https://management.azure.com{path}")).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_replies_in_order_and_last_repeats() {
        let mock = MockTransport::new();
        mock.respond(Method::GET, "/op", MockResponse::new(202))
            .respond(Method::GET, "/op", MockResponse::json(200, &serde_json::json!({"status": "Succeeded"})));

        assert_eq!(mock.send(get("/op")).await.unwrap().status().as_u16(), 202);
        assert_eq!(mock.send(get("/op")).await.unwrap().status().as_u16(), 200);
        let again = mock.send(get("/op")).await.unwrap();
        assert_eq!(again.status().as_u16(), 200);
        assert_eq!(again.header("content-type"), Some("application/json"));
        assert_eq!(mock.request_count(), 3);
    }

    #[tokio::test]
    async fn test_unmatched_request_is_connection_error() {
        let mock = MockTransport::new();
        let err = mock.send(get("/missing")).await.unwrap_err();

        assert!(err.is_connection());
        assert_eq!(mock.requests_to(Method::GET, "/missing").len(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_reply() {
        let mock = MockTransport::new();
        mock.disconnect(Method::GET, "/flaky", "reset by peer");

        let err = mock.send(get("/flaky")).await.unwrap_err();
        assert!(matches!(err, HttpClientError::Connection(m) if m == "reset by peer"));
    }

    #[test]
    fn test_clear_requests_keeps_routes() {
        let mock = MockTransport::new();
        mock.respond(Method::GET, "/r", MockResponse::new(200));

        tokio_test::block_on(async {
            mock.send(get("/r")).await.unwrap();
            mock.clear_requests();
            assert_eq!(mock.request_count(), 0);
            assert!(mock.send(get("/r")).await.is_ok());
        });
        assert!(mock.last_request().is_some());
    }
}
