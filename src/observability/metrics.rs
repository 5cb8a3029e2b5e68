//! Request metrics.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use std::time::Duration;

use crate::errors::FailureKind;

/// Metrics collector interface.
pub trait MetricsCollector: Send + Sync {
    /// Records a finished request and the attempts it took.
    fn record_request(&self, endpoint: &str, attempts: u32, duration: Duration, failure: Option<FailureKind>);

    /// Records a finished upload.
    fn record_upload(&self, bytes: u64, duration: Duration, failure: Option<FailureKind>);

    /// Gets current metrics.
    fn get_metrics(&self) -> RequestMetrics;

    /// Resets all metrics.
    fn reset(&self);
}

/// Request metrics snapshot.
#[derive(Debug, Clone, Default)]
pub struct RequestMetrics {
    /// Total requests, uploads included.
    pub total_requests: u64,
    /// Requests that produced a value.
    pub successful_requests: u64,
    /// Requests that produced an error.
    pub failed_requests: u64,
    /// Attempts beyond the first, summed over all requests.
    pub retries: u64,
    /// Uploads attempted.
    pub uploads: u64,
    /// File bytes in successful uploads.
    pub uploaded_bytes: u64,
    /// Total latency in milliseconds.
    pub total_latency_ms: u64,
    /// Requests per endpoint.
    pub endpoints: HashMap<String, u64>,
    /// Failures by kind.
    pub failures: HashMap<FailureKind, u64>,
}

impl RequestMetrics {
    /// Calculates average latency in milliseconds.
    pub fn average_latency_ms(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.total_latency_ms as f64 / self.total_requests as f64
        }
    }

    /// Calculates success rate as a percentage.
    pub fn success_rate(&self) -> f64 {
        if self.total_requests == 0 {
            100.0
        } else {
            (self.successful_requests as f64 / self.total_requests as f64) * 100.0
        }
    }

    /// Failures of the given kind.
    pub fn failures_of(&self, kind: FailureKind) -> u64 {
        self.failures.get(&kind).copied().unwrap_or(0)
    }
}

/// Default metrics collector implementation.
pub struct DefaultMetricsCollector {
    total_requests: AtomicU64,
    successful_requests: AtomicU64,
    failed_requests: AtomicU64,
    retries: AtomicU64,
    uploads: AtomicU64,
    uploaded_bytes: AtomicU64,
    total_latency_ms: AtomicU64,
    endpoints: RwLock<HashMap<String, u64>>,
    failures: RwLock<HashMap<FailureKind, u64>>,
}

impl DefaultMetricsCollector {
    /// Creates a new metrics collector.
    pub fn new() -> Self {
        Self {
            total_requests: AtomicU64::new(0),
            successful_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            retries: AtomicU64::new(0),
            uploads: AtomicU64::new(0),
            uploaded_bytes: AtomicU64::new(0),
            total_latency_ms: AtomicU64::new(0),
            endpoints: RwLock::new(HashMap::new()),
            failures: RwLock::new(HashMap::new()),
        }
    }

    fn record_outcome(&self, duration: Duration, failure: Option<FailureKind>) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        self.total_latency_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);

        match failure {
            None => {
                self.successful_requests.fetch_add(1, Ordering::Relaxed);
            }
            Some(kind) => {
                self.failed_requests.fetch_add(1, Ordering::Relaxed);
                if let Ok(mut failures) = self.failures.write() {
                    *failures.entry(kind).or_insert(0) += 1;
                }
            }
        }
    }
}

impl Default for DefaultMetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsCollector for DefaultMetricsCollector {
    fn record_request(&self, endpoint: &str, attempts: u32, duration: Duration, failure: Option<FailureKind>) {
        self.record_outcome(duration, failure);
        self.retries
            .fetch_add(u64::from(attempts.saturating_sub(1)), Ordering::Relaxed);

        if let Ok(mut endpoints) = self.endpoints.write() {
            *endpoints.entry(endpoint.to_string()).or_insert(0) += 1;
        }
    }

    fn record_upload(&self, bytes: u64, duration: Duration, failure: Option<FailureKind>) {
        self.record_outcome(duration, failure);
        self.uploads.fetch_add(1, Ordering::Relaxed);
        if failure.is_none() {
            self.uploaded_bytes.fetch_add(bytes, Ordering::Relaxed);
        }
    }

    fn get_metrics(&self) -> RequestMetrics {
        RequestMetrics {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            uploads: self.uploads.load(Ordering::Relaxed),
            uploaded_bytes: self.uploaded_bytes.load(Ordering::Relaxed),
            total_latency_ms: self.total_latency_ms.load(Ordering::Relaxed),
            endpoints: self.endpoints.read().map(|e| e.clone()).unwrap_or_default(),
            failures: self.failures.read().map(|f| f.clone()).unwrap_or_default(),
        }
    }

    fn reset(&self) {
        self.total_requests.store(0, Ordering::Relaxed);
        self.successful_requests.store(0, Ordering::Relaxed);
        self.failed_requests.store(0, Ordering::Relaxed);
        self.retries.store(0, Ordering::Relaxed);
        self.uploads.store(0, Ordering::Relaxed);
        self.uploaded_bytes.store(0, Ordering::Relaxed);
        self.total_latency_ms.store(0, Ordering::Relaxed);

        if let Ok(mut endpoints) = self.endpoints.write() {
            endpoints.clear();
        }
        if let Ok(mut failures) = self.failures.write() {
            failures.clear();
        }
    }
}

impl std::fmt::Debug for DefaultMetricsCollector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefaultMetricsCollector")
            .field("total_requests", &self.total_requests.load(Ordering::Relaxed))
            .field("failed_requests", &self.failed_requests.load(Ordering::Relaxed))
            .field("retries", &self.retries.load(Ordering::Relaxed))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_request() {
        let collector = DefaultMetricsCollector::new();

        collector.record_request("/dashboard/stats", 1, Duration::from_millis(100), None);
        collector.record_request("/dashboard/stats", 3, Duration::from_millis(200), None);
        collector.record_request(
            "/scan/result/x",
            4,
            Duration::from_millis(50),
            Some(FailureKind::ServerError),
        );

        let metrics = collector.get_metrics();
        assert_eq!(metrics.total_requests, 3);
        assert_eq!(metrics.successful_requests, 2);
        assert_eq!(metrics.failed_requests, 1);
        assert_eq!(metrics.retries, 5);
        assert_eq!(metrics.total_latency_ms, 350);
        assert_eq!(metrics.endpoints.get("/dashboard/stats"), Some(&2));
        assert_eq!(metrics.failures_of(FailureKind::ServerError), 1);
        assert_eq!(metrics.failures_of(FailureKind::Timeout), 0);
    }

    #[test]
    fn test_record_upload() {
        let collector = DefaultMetricsCollector::new();

        collector.record_upload(1_000, Duration::from_millis(10), None);
        collector.record_upload(500, Duration::from_millis(10), Some(FailureKind::Cancelled));

        let metrics = collector.get_metrics();
        assert_eq!(metrics.uploads, 2);
        assert_eq!(metrics.uploaded_bytes, 1_000);
        assert_eq!(metrics.failures_of(FailureKind::Cancelled), 1);
    }

    #[test]
    fn test_rates() {
        let collector = DefaultMetricsCollector::new();
        assert_eq!(collector.get_metrics().success_rate(), 100.0);

        collector.record_request("/a", 1, Duration::from_millis(100), None);
        collector.record_request("/a", 1, Duration::from_millis(200), Some(FailureKind::Timeout));

        let metrics = collector.get_metrics();
        assert!((metrics.success_rate() - 50.0).abs() < 0.1);
        assert!((metrics.average_latency_ms() - 150.0).abs() < 0.1);
    }

    #[test]
    fn test_reset() {
        let collector = DefaultMetricsCollector::new();

        collector.record_request("/a", 2, Duration::from_millis(100), Some(FailureKind::NetworkError));
        collector.record_upload(10, Duration::from_millis(1), None);
        collector.reset();

        let metrics = collector.get_metrics();
        assert_eq!(metrics.total_requests, 0);
        assert_eq!(metrics.retries, 0);
        assert!(metrics.failures.is_empty());
        assert!(metrics.endpoints.is_empty());
    }
}
