//! Integration tests for the HTTP transport against a local mock server.

use std::time::Duration;
use stratus_http_client::{
    CLIENT_REQUEST_ID_HEADER, HttpClient, HttpClientConfig, HttpClientError, Method, Request, RetryConfig,
    Transport,
};
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_with_retry(retry: RetryConfig) -> HttpClient {
    HttpClient::new(HttpClientConfig::builder().retry(retry).build()).unwrap()
}

fn get(uri: &str) -> Request {
    Request::new(Method::GET, uri.parse().unwrap())
}

#[tokio::test]
async fn test_send_posts_json_and_reads_response() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/$batch"))
        .and(header("content-type", "application/json"))
        .and(body_json(serde_json::json!({"requests": []})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"responses": []})))
        .expect(1)
        .mount(&server)
        .await;

    let transport = HttpClient::new(HttpClientConfig::builder().no_retry().build()).unwrap();
    let request = Request::new(
        Method::POST,
        format!("{}/v1/$batch", server.uri()).parse().unwrap(),
    )
    .json(&serde_json::json!({"requests": []}))
    .unwrap();

    let response = transport.send(request).await.unwrap();
    assert!(response.is_success());
    let body: serde_json::Value = response.json().unwrap();
    assert_eq!(body["responses"], serde_json::json!([]));
}

#[tokio::test]
async fn test_retries_on_service_unavailable_then_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(503).insert_header("retry-after-ms", "10"))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/status"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .mount(&server)
        .await;

    let client = client_with_retry(RetryConfig::constant(4, Duration::from_millis(5)));
    let response = client.send(get(&format!("{}/status", server.uri()))).await.unwrap();

    assert_eq!(response.status().as_u16(), 200);
    assert_eq!(response.text().unwrap(), "ok");
    assert_eq!(server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_retry_budget_returns_last_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = client_with_retry(RetryConfig::immediate(2));
    let response = client.send(get(&server.uri())).await.unwrap();

    assert_eq!(response.status().as_u16(), 503);
    assert_eq!(server.received_requests().await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_request_body_survives_retries() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(body_json(serde_json::json!({"properties": {"mode": "Incremental"}})))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(body_json(serde_json::json!({"properties": {"mode": "Incremental"}})))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;

    let client = client_with_retry(RetryConfig::immediate(3));
    let request = Request::new(
        Method::PUT,
        format!("{}/deployments/dp1", server.uri()).parse().unwrap(),
    )
    .json(&serde_json::json!({"properties": {"mode": "Incremental"}}))
    .unwrap();
    let response = client.send(request).await.unwrap();

    assert_eq!(response.status().as_u16(), 201);
}

#[tokio::test]
async fn test_per_request_timeout_maps_to_timeout_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let transport = HttpClient::new(HttpClientConfig::builder().no_retry().build()).unwrap();
    let request = Request::new(Method::GET, server.uri().parse().unwrap())
        .timeout(Duration::from_millis(50));

    let err = transport.send(request).await.unwrap_err();
    assert!(matches!(err, HttpClientError::Timeout(d) if d == Duration::from_millis(50)));
    assert!(err.is_timeout());
}

#[tokio::test]
async fn test_client_request_id_is_stamped_and_kept_across_retries() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header_exists(CLIENT_REQUEST_ID_HEADER))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(header_exists(CLIENT_REQUEST_ID_HEADER))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let client = client_with_retry(RetryConfig::immediate(3));
    client.send(get(&server.uri())).await.unwrap();
    client.send(get(&server.uri())).await.unwrap();

    let received = server.received_requests().await.unwrap();
    assert_eq!(received.len(), 3);
    let ids: Vec<String> = received
        .iter()
        .map(|r| r.headers.get(CLIENT_REQUEST_ID_HEADER).unwrap().to_str().unwrap().to_string())
        .collect();
    assert_eq!(ids[0], ids[1]);
    assert_ne!(ids[1], ids[2]);
}

#[tokio::test]
async fn test_caller_supplied_request_id_wins() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(header(CLIENT_REQUEST_ID_HEADER, "caller-id"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let client = HttpClient::new(HttpClientConfig::builder().no_retry().build()).unwrap();
    let response = client
        .send(get(&server.uri()).header(CLIENT_REQUEST_ID_HEADER, "caller-id"))
        .await
        .unwrap();
    assert!(response.is_success());
}
