//! Multipart uploads and document submission against a real HTTP stack.

mod common;

use common::{api, client_for, setup_mock_server};
use fraudscan_client::{FailureKind, ProgressCallback, Severity, UploadFile, UploadProgress};
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

fn scan_result_body(file_id: &str) -> serde_json::Value {
    json!({
        "file_id": file_id,
        "filename": "invoice_demo.pdf",
        "status": "completed",
        "fraud_score": 88,
        "severity": "CRITICAL",
        "is_duplicate": false,
        "anomalies": [
            {"type": "Font Inconsistency", "description": "Multiple font families detected in amount field", "confidence": 0.85}
        ],
        "scanned_at": "2024-03-14T09:26:53Z",
        "processing_time": 2400
    })
}

fn recorder() -> (ProgressCallback, Arc<Mutex<Vec<UploadProgress>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let callback: ProgressCallback = Arc::new(move |p| sink.lock().unwrap().push(p));
    (callback, seen)
}

#[tokio::test]
async fn test_upload_sends_single_file_field() {
    let mock_server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path(api("/scan/upload")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"task_id": "t-1"})))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 3);
    let (callback, seen) = recorder();
    let data = vec![b'x'; 200 * 1024];
    let value: serde_json::Value = client
        .upload(
            "/scan/upload",
            UploadFile::new("invoice.pdf", data),
            Some(callback),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(value["task_id"], "t-1");

    let requests = mock_server.received_requests().await.unwrap();
    let content_type = requests[0]
        .headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("multipart/form-data"));
    let body = String::from_utf8_lossy(&requests[0].body);
    assert!(body.contains(r#"name="file""#));
    assert!(body.contains(r#"filename="invoice.pdf""#));

    let seen = seen.lock().unwrap();
    assert!(seen.windows(2).all(|w| w[0].bytes_sent <= w[1].bytes_sent));
    assert!(seen.iter().all(|p| p.total_bytes == 200 * 1024));
    assert_eq!(seen.last().map(|p| p.fraction_complete), Some(1.0));
}

#[tokio::test]
async fn test_upload_failure_is_not_retried() {
    let mock_server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path(api("/scan/upload")))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 3);
    let err = client
        .upload::<serde_json::Value>(
            "/scan/upload",
            UploadFile::new("invoice.pdf", vec![1u8; 16]),
            None,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::ServerError);
    assert_eq!(err.status_code(), Some(500));
    assert!(err.to_string().contains("Upload failed: Internal Server Error"));
}

#[tokio::test]
async fn test_upload_cancel() {
    let mock_server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path(api("/scan/upload")))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(10)))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 3);
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let start = std::time::Instant::now();
    let err = client
        .upload::<serde_json::Value>(
            "/scan/upload",
            UploadFile::new("invoice.pdf", vec![1u8; 16]),
            None,
            &token,
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Cancelled);
    assert!(err.to_string().contains("Upload cancelled"));
    assert!(start.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_submit_queued_document() {
    let mock_server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path(api("/scan/upload")))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"task_id": "doc-42", "message": "File uploaded successfully"})),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(api("/scan/result/doc-42")))
        .respond_with(ResponseTemplate::new(200).set_body_json(scan_result_body("doc-42")))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 3);
    let result = client
        .scans()
        .submit(
            UploadFile::new("invoice_demo.pdf", vec![1u8; 4096]),
            None,
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert_eq!(result.severity, Severity::Critical);
    assert_eq!(client.scans().cached("doc-42"), Some(result));
}

#[tokio::test]
async fn test_upload_with_bad_content_type_is_client_error() {
    let mock_server = setup_mock_server().await;
    Mock::given(method("POST"))
        .and(path(api("/scan/upload")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"task_id": "t-1"})))
        .expect(0)
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server, 3);
    let err = client
        .upload::<serde_json::Value>(
            "/scan/upload",
            UploadFile::new("invoice.pdf", vec![1u8; 16]).with_content_type("not a mime"),
            None,
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::ClientError);
    assert!(!err.is_retryable());
}
