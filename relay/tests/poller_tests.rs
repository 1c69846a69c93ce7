//! Integration tests for the poll-transport dispatcher, with the gateway
//! and the presentation target both mocked.

use serde_json::{json, Value};
use std::time::Duration;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use relay::executor::Executor;
use relay::poller::Poller;
use relay::session::Session;

const TIMEOUT: Duration = Duration::from_secs(2);

fn session(base_url: &str, api_key: Option<&str>, max_attempts: u32) -> Session {
    Session::new(
        base_url,
        TIMEOUT,
        api_key.map(|key| key.to_string()),
        max_attempts,
    )
    .unwrap()
}

fn poller(gateway: &MockServer, target: &MockServer, max_attempts: u32) -> Poller {
    let gateway_session = session(&gateway.uri(), None, max_attempts);
    let target_session = session(&target.uri(), None, max_attempts);
    Poller::new(
        gateway_session,
        Executor::new(target_session),
        Duration::from_secs(5),
    )
}

fn trigger_command(id: Uuid) -> Value {
    json!({
        "id": id,
        "endpoint": "trigger",
        "method": "POST",
        "payload": {
            "messageID": "m1",
            "messageToken": "t1",
            "messageContent": "hi"
        },
        "created_at": chrono::Utc::now()
    })
}

async fn mock_commands(gateway: &MockServer, commands: Value) {
    Mock::given(method("GET"))
        .and(path("/api/v1/commands"))
        .respond_with(ResponseTemplate::new(200).set_body_json(commands))
        .expect(1)
        .mount(gateway)
        .await;
}

#[tokio::test]
async fn cycle_executes_trigger_and_reports_the_result() {
    let gateway = MockServer::start().await;
    let target = MockServer::start().await;

    let id = Uuid::new_v4();
    mock_commands(&gateway, json!([trigger_command(id)])).await;

    Mock::given(method("POST"))
        .and(path("/v1/message/m1/trigger"))
        .and(body_partial_json(json!([
            {"name": "t1", "text": {"text": "hi"}}
        ])))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&target)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/updateStatus"))
        .and(body_partial_json(json!({
            "command": {"id": id},
            "status_code": 200,
            "response": "ok"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "received"})))
        .expect(1)
        .mount(&gateway)
        .await;

    poller(&gateway, &target, 3).cycle().await;
}

#[tokio::test]
async fn execute_retries_through_server_errors_and_reports_once() {
    let gateway = MockServer::start().await;
    let target = MockServer::start().await;

    let id = Uuid::new_v4();
    mock_commands(&gateway, json!([trigger_command(id)])).await;

    // Two 503s, then a recovery. The dispatcher must absorb the failures
    // internally and report the final 200 exactly once.
    Mock::given(method("POST"))
        .and(path("/v1/message/m1/trigger"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&target)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/message/m1/trigger"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&target)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/updateStatus"))
        .and(body_partial_json(json!({"status_code": 200, "response": "ok"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "received"})))
        .expect(1)
        .mount(&gateway)
        .await;

    poller(&gateway, &target, 4).cycle().await;
}

#[tokio::test]
async fn failed_fetch_degrades_to_no_work() {
    let gateway = MockServer::start().await;
    let target = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/commands"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&gateway)
        .await;

    // Nothing is executed and nothing is reported.
    Mock::given(method("POST"))
        .and(path("/api/v1/updateStatus"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&gateway)
        .await;

    poller(&gateway, &target, 2).cycle().await;
    assert!(target.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn malformed_commands_are_skipped_but_the_rest_execute() {
    let gateway = MockServer::start().await;
    let target = MockServer::start().await;

    let id = Uuid::new_v4();
    mock_commands(
        &gateway,
        json!([
            {"endpoint": "trigger"},           // no id
            {"id": "not-a-uuid", "endpoint": "x", "method": "GET"},
            trigger_command(id)
        ]),
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/v1/message/m1/trigger"))
        .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
        .expect(1)
        .mount(&target)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/updateStatus"))
        .and(body_partial_json(json!({"command": {"id": id}})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&gateway)
        .await;

    poller(&gateway, &target, 2).cycle().await;
}

#[tokio::test]
async fn incomplete_trigger_sends_nothing_and_reports_nothing() {
    let gateway = MockServer::start().await;
    let target = MockServer::start().await;

    mock_commands(
        &gateway,
        json!([{
            "id": Uuid::new_v4(),
            "endpoint": "trigger",
            "method": "POST",
            "payload": {"messageID": "m1", "messageToken": "t1"}
        }]),
    )
    .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/updateStatus"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&gateway)
        .await;

    poller(&gateway, &target, 2).cycle().await;
    assert!(target.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_target_reports_a_synthetic_failure() {
    let gateway = MockServer::start().await;

    let id = Uuid::new_v4();
    mock_commands(&gateway, json!([trigger_command(id)])).await;

    Mock::given(method("POST"))
        .and(path("/api/v1/updateStatus"))
        .and(body_partial_json(json!({
            "command": {"id": id},
            "status_code": 500,
            "response": "No response"
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&gateway)
        .await;

    // Nothing listens on the target port: connection refused.
    let gateway_session = session(&gateway.uri(), None, 1);
    let target_session = session("http://127.0.0.1:9", None, 1);
    let poller = Poller::new(
        gateway_session,
        Executor::new(target_session),
        Duration::from_secs(5),
    );
    poller.cycle().await;
}

#[tokio::test]
async fn gateway_requests_carry_the_api_key_header() {
    let gateway = MockServer::start().await;
    let target = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v1/commands"))
        .and(header("X-API-Key", "secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&gateway)
        .await;

    let gateway_session = session(&gateway.uri(), Some("secret"), 2);
    let target_session = session(&target.uri(), None, 2);
    Poller::new(
        gateway_session,
        Executor::new(target_session),
        Duration::from_secs(5),
    )
    .cycle()
    .await;
}

#[tokio::test]
async fn generic_get_command_hits_the_target_path() {
    let gateway = MockServer::start().await;
    let target = MockServer::start().await;

    let id = Uuid::new_v4();
    mock_commands(
        &gateway,
        json!([{
            "id": id,
            "endpoint": "stage/state",
            "method": "GET",
            "payload": {}
        }]),
    )
    .await;

    Mock::given(method("GET"))
        .and(path("/v1/stage/state"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"state": "active"})))
        .expect(1)
        .mount(&target)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/v1/updateStatus"))
        .and(body_partial_json(json!({"command": {"id": id}, "status_code": 200})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&gateway)
        .await;

    poller(&gateway, &target, 2).cycle().await;
}
