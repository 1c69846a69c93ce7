//! Retry-policy tests for the HTTP transport.

use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use relay::session::Session;

fn session(base_url: &str, max_attempts: u32) -> Session {
    Session::new(base_url, Duration::from_secs(2), None, max_attempts).unwrap()
}

#[tokio::test]
async fn client_errors_are_returned_without_retry() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/version"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let response = session(&server.uri(), 3).get("v1/version").await.unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn server_errors_are_retried_up_to_the_attempt_cap() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/version"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    // All attempts exhausted: the final 503 comes back instead of an error.
    let response = session(&server.uri(), 3).get("v1/version").await.unwrap();
    assert_eq!(response.status(), 503);
}

#[tokio::test]
async fn recovery_within_the_attempt_cap_succeeds() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/version"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/version"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"version": "7.9"})))
        .expect(1)
        .mount(&server)
        .await;

    let response = session(&server.uri(), 3).get("v1/version").await.unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn connection_failure_is_classified() {
    // Port 9 (discard) is not listening.
    let result = session("http://127.0.0.1:9", 2).get("v1/version").await;
    let error = result.unwrap_err();
    assert!(error.to_string().contains("unable to reach"));
}
