//! Request facade against a real HTTP stack.

mod common;

use common::{api, client_for, client_for_closed_port, setup_mock_server};
use fraudscan_client::{FailureKind, RequestOptions};
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_json, header, header_exists, method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_send_decodes_object() {
    let mock_server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path(api("/dashboard/stats")))
        .and(header("content-type", "application/json"))
        .and(header_exists("x-request-id"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"a": 1})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 3);
    let value: serde_json::Value = client
        .send("/dashboard/stats", RequestOptions::get())
        .await
        .unwrap();

    assert_eq!(value, json!({"a": 1}));
}

#[tokio::test]
async fn test_empty_body_yields_empty_object() {
    let mock_server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path(api("/dashboard/refresh")))
        .respond_with(ResponseTemplate::new(204))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 0);
    let value: serde_json::Value = client
        .send("/dashboard/refresh", RequestOptions::post())
        .await
        .unwrap();

    assert_eq!(value, json!({}));
}

#[tokio::test]
async fn test_non_json_body_is_parse_error() {
    let mock_server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path(api("/dashboard/stats")))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>gateway</html>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 3);
    let err = client
        .send::<serde_json::Value>("/dashboard/stats", RequestOptions::get())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::ParseError);
}

#[tokio::test]
async fn test_json_body_is_sent() {
    let mock_server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path(api("/scan/review")))
        .and(body_json(json!({"file_id": "doc-1", "verdict": "fraud"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"accepted": true})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 0);
    let options = RequestOptions::post_json(&json!({"file_id": "doc-1", "verdict": "fraud"})).unwrap();
    let value: serde_json::Value = client.send("/scan/review", options).await.unwrap();

    assert_eq!(value["accepted"], true);
}

#[tokio::test]
async fn test_server_errors_then_success() {
    let mock_server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path(api("/dashboard/chart")))
        .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
        .up_to_n_times(2)
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(api("/dashboard/chart")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 3);
    let chart = client.dashboard().chart().await.unwrap();

    assert!(chart.is_empty());
    assert_eq!(mock_server.received_requests().await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_client_error_is_not_retried() {
    let mock_server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path(api("/scan/result/missing")))
        .respond_with(ResponseTemplate::new(404).set_body_string("Scan result not found"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 3);
    let err = client.scans().fetch("missing").await.unwrap_err();

    assert_eq!(err.kind(), FailureKind::ClientError);
    assert_eq!(err.status_code(), Some(404));
    assert!(err.to_string().contains("Scan result not found"));
}

#[tokio::test]
async fn test_slow_server_times_out() {
    let mock_server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path(api("/dashboard/stats")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 0);
    let options = RequestOptions::get().timeout(Duration::from_millis(100));
    let err = client
        .send::<serde_json::Value>("/dashboard/stats", options)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Timeout);
}

#[tokio::test]
async fn test_cancel_returns_promptly() {
    let mock_server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path(api("/dashboard/stats")))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 3);
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let start = std::time::Instant::now();
    let err = client
        .send::<serde_json::Value>("/dashboard/stats", RequestOptions::get().cancel_on(token))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Cancelled);
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_connection_refused_is_network_error() {
    let client = client_for_closed_port(1);

    let err = client
        .send::<serde_json::Value>("/dashboard/stats", RequestOptions::get())
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::NetworkError);
    assert_eq!(err.status_code(), None);
}

#[tokio::test]
async fn test_health_hits_origin() {
    let mock_server = setup_mock_server().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "healthy"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 0);
    let health = client.health().await.unwrap();

    assert!(health.is_healthy());
}
