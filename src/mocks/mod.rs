//! Mock implementations for testing.
//!
//! Provides a scripted transport for exercising the request layer without
//! a network: queued responses, transport failures, artificial latency,
//! hanging calls and scripted upload progress.

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::transport::{
    HttpMethod, HttpRequest, HttpResponse, HttpTransport, MultipartRequest, TransferObserver,
    TransportError,
};

/// A recorded request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Request URL.
    pub url: String,
    /// Request body (`None` for multipart uploads).
    pub body: Option<Vec<u8>>,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// Uploaded file name, for multipart uploads.
    pub filename: Option<String>,
}

/// A mock response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Vec<u8>,
    /// Latency before the response is delivered.
    pub delay: Option<Duration>,
}

impl MockResponse {
    /// Creates a successful JSON response.
    pub fn json<T: serde::Serialize>(value: &T) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_default();
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "application/json".to_string());

        Self {
            status: 200,
            headers,
            body,
            delay: None,
        }
    }

    /// Creates a plain-text response with the given status.
    pub fn text(status: u16, body: &str) -> Self {
        let mut headers = HashMap::new();
        headers.insert("content-type".to_string(), "text/plain".to_string());

        Self {
            status,
            headers,
            body: body.as_bytes().to_vec(),
            delay: None,
        }
    }

    /// Creates a response with an empty body.
    pub fn empty(status: u16) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: Vec::new(),
            delay: None,
        }
    }

    /// Adds a header.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    /// Delays delivery of the response.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

/// How a queued call resolves.
#[derive(Debug, Clone)]
enum MockAction {
    Respond(MockResponse),
    Fail(TransportError),
    Hang,
    Panic,
}

/// Progress reports a mock upload emits before it resolves.
#[derive(Debug, Clone)]
pub struct ProgressScript {
    steps: u32,
    known_length: bool,
    interval: Option<Duration>,
    raw: Vec<(u64, Option<u64>)>,
}

impl ProgressScript {
    /// Reports the file in `steps` equal slices.
    pub fn steps(steps: u32) -> Self {
        Self {
            steps: steps.max(1),
            known_length: true,
            interval: None,
            raw: Vec::new(),
        }
    }

    /// Emits exactly these `(bytes_sent, total)` reports, in order, whatever
    /// the file size.
    pub fn reports(reports: impl IntoIterator<Item = (u64, Option<u64>)>) -> Self {
        Self {
            raw: reports.into_iter().collect(),
            ..Self::steps(1)
        }
    }

    /// Reports progress without a total.
    pub fn unknown_length(mut self) -> Self {
        self.known_length = false;
        self
    }

    /// Waits `interval` before each report.
    pub fn every(mut self, interval: Duration) -> Self {
        self.interval = Some(interval);
        self
    }
}

/// Mock HTTP transport for testing.
pub struct MockTransport {
    actions: Mutex<VecDeque<MockAction>>,
    requests: Mutex<Vec<RecordedRequest>>,
    default_response: Mutex<Option<MockResponse>>,
    progress: Mutex<Option<ProgressScript>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self {
            actions: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            default_response: Mutex::new(None),
            progress: Mutex::new(None),
        }
    }

    /// Queues a response.
    pub fn queue(&self, response: MockResponse) {
        lock(&self.actions).push_back(MockAction::Respond(response));
    }

    /// Queues a JSON response.
    pub fn queue_json<T: serde::Serialize>(&self, value: &T) {
        self.queue(MockResponse::json(value));
    }

    /// Queues a text response with the given status.
    pub fn queue_status(&self, status: u16, body: &str) {
        self.queue(MockResponse::text(status, body));
    }

    /// Queues a transport-level failure.
    pub fn queue_failure(&self, error: TransportError) {
        lock(&self.actions).push_back(MockAction::Fail(error));
    }

    /// Queues a call that never resolves.
    pub fn queue_hang(&self) {
        lock(&self.actions).push_back(MockAction::Hang);
    }

    /// Queues a call that panics inside the transport.
    pub fn queue_panic(&self) {
        lock(&self.actions).push_back(MockAction::Panic);
    }

    /// Sets the response used once the queue is empty.
    pub fn set_default(&self, response: MockResponse) {
        *lock(&self.default_response) = Some(response);
    }

    /// Sets the progress reports emitted by multipart uploads.
    pub fn set_progress(&self, script: ProgressScript) {
        *lock(&self.progress) = Some(script);
    }

    /// Gets all recorded requests.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// Gets the last recorded request.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        lock(&self.requests).last().cloned()
    }

    /// Returns the number of requests made.
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    fn next_action(&self) -> MockAction {
        if let Some(action) = lock(&self.actions).pop_front() {
            return action;
        }
        let response = lock(&self.default_response)
            .clone()
            .unwrap_or_else(|| MockResponse::text(500, "No mock response configured"));
        MockAction::Respond(response)
    }

    fn record(&self, request: RecordedRequest) {
        lock(&self.requests).push(request);
    }

    async fn resolve(&self) -> Result<HttpResponse, TransportError> {
        match self.next_action() {
            MockAction::Respond(response) => {
                if let Some(delay) = response.delay {
                    tokio::time::sleep(delay).await;
                }
                Ok(HttpResponse {
                    status: response.status,
                    headers: response.headers,
                    body: response.body,
                })
            }
            MockAction::Fail(error) => Err(error),
            MockAction::Hang => std::future::pending().await,
            MockAction::Panic => panic!("mock transport panic"),
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.record(RecordedRequest {
            method: request.method,
            url: request.url,
            body: request.body,
            headers: request.headers,
            filename: None,
        });

        self.resolve().await
    }

    async fn send_multipart(
        &self,
        request: MultipartRequest,
        observer: Option<TransferObserver>,
    ) -> Result<HttpResponse, TransportError> {
        let total = request.data.len() as u64;
        self.record(RecordedRequest {
            method: HttpMethod::Post,
            url: request.url,
            body: None,
            headers: request.headers,
            filename: Some(request.filename),
        });

        let script = lock(&self.progress).clone();
        if let (Some(script), Some(observer)) = (script, observer) {
            let reports: Vec<(u64, Option<u64>)> = if script.raw.is_empty() {
                let steps = u64::from(script.steps);
                (1..=steps)
                    .map(|step| (total * step / steps, script.known_length.then_some(total)))
                    .collect()
            } else {
                script.raw
            };
            for (sent, length) in reports {
                if let Some(interval) = script.interval {
                    tokio::time::sleep(interval).await;
                }
                observer(sent, length);
            }
        }

        self.resolve().await
    }
}

impl std::fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockTransport")
            .field("request_count", &self.request_count())
            .finish()
    }
}

/// Test fixtures for common response payloads.
pub mod fixtures {
    use chrono::{TimeZone, Utc};

    use crate::types::dashboard::{ChartDataPoint, DashboardStats, FileStatus, RecentFile};
    use crate::types::scan::{Anomaly, ScanResult, ScanStatus, Severity};

    /// A critical scan result with two anomalies.
    pub fn scan_result(file_id: &str) -> ScanResult {
        ScanResult {
            file_id: file_id.to_string(),
            filename: "invoice_demo.pdf".to_string(),
            status: ScanStatus::Completed,
            fraud_score: 88,
            severity: Severity::Critical,
            is_duplicate: true,
            duplicate_source_id: Some("doc-5510".to_string()),
            anomalies: vec![
                Anomaly {
                    kind: "Metadata Mismatch".to_string(),
                    description: "Creation date is in the future".to_string(),
                    confidence: 0.98,
                },
                Anomaly {
                    kind: "Forged Signature".to_string(),
                    description: "Pixel alteration detected around signature area".to_string(),
                    confidence: 0.92,
                },
            ],
            scanned_at: Utc.with_ymd_and_hms(2024, 3, 14, 9, 26, 53).single().unwrap_or_default(),
            processing_time: 3000,
        }
    }

    /// Headline dashboard figures.
    pub fn dashboard_stats() -> DashboardStats {
        DashboardStats {
            total_scanned: 14_200,
            fraud_detected: 45,
            total_savings: 12_000_000.0,
            pending_review: 12,
            accuracy_rate: 99.7,
        }
    }

    /// A week of chart data.
    pub fn chart_data() -> Vec<ChartDataPoint> {
        ["Mon 11", "Tue 12", "Wed 13", "Thu 14", "Fri 15", "Sat 16", "Sun 17"]
            .iter()
            .enumerate()
            .map(|(i, date)| ChartDataPoint {
                date: date.to_string(),
                uploads: 150 + 20 * i as u32,
                fraud: 2 + i as u32,
            })
            .collect()
    }

    /// Recent files, deliberately out of chronological order.
    pub fn recent_files() -> Vec<RecentFile> {
        let at = |minute| {
            Utc.with_ymd_and_hms(2024, 3, 14, 10, minute, 0)
                .single()
                .unwrap_or_default()
        };
        vec![
            RecentFile {
                id: "f-1".to_string(),
                filename: "Invoice_4821.pdf".to_string(),
                department: "Treasury Department".to_string(),
                status: FileStatus::Safe,
                fraud_score: 12,
                scanned_at: at(5),
            },
            RecentFile {
                id: "f-2".to_string(),
                filename: "Contract_1093.pdf".to_string(),
                department: "Public Works".to_string(),
                status: FileStatus::Critical,
                fraud_score: 91,
                scanned_at: at(40),
            },
            RecentFile {
                id: "f-3".to_string(),
                filename: "Receipt_7710.pdf".to_string(),
                department: "Health Services".to_string(),
                status: FileStatus::Warning,
                fraud_score: 47,
                scanned_at: at(20),
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_transport_queue() {
        let transport = MockTransport::new();
        transport.queue_json(&serde_json::json!({"test": "value"}));

        let response = transport.send(HttpRequest::get("http://test/a")).await.unwrap();

        assert_eq!(response.status, 200);
        assert!(String::from_utf8_lossy(&response.body).contains("value"));
    }

    #[tokio::test]
    async fn test_mock_transport_records_requests() {
        let transport = MockTransport::new();
        transport.set_default(MockResponse::json(&serde_json::json!({})));

        transport.send(HttpRequest::get("http://test/path1")).await.unwrap();
        transport.send(HttpRequest::post("http://test/path2")).await.unwrap();

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].url, "http://test/path1");
        assert_eq!(requests[1].method, HttpMethod::Post);
    }

    #[tokio::test]
    async fn test_mock_transport_failure() {
        let transport = MockTransport::new();
        transport.queue_failure(TransportError::Connection {
            message: "refused".to_string(),
        });

        let result = transport.send(HttpRequest::get("http://test/a")).await;
        assert!(matches!(result, Err(TransportError::Connection { .. })));
    }
}
