//! Observability for the request layer.
//!
//! Structured logging goes through `tracing`; [`init_tracing`] installs a
//! subscriber for binaries and tests that want output. Request and upload
//! outcomes are counted by a [`MetricsCollector`].

mod logging;
mod metrics;

pub use logging::{init_tracing, LogFormat, LogLevel, LoggingConfig};
pub use metrics::{DefaultMetricsCollector, MetricsCollector, RequestMetrics};

use std::time::{Duration, Instant};

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Generates a correlation id for one logical request.
pub fn new_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Measures the duration of one logical request.
#[derive(Debug)]
pub struct RequestTimer {
    start: Instant,
}

impl RequestTimer {
    /// Starts a timer.
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Returns the elapsed time.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_ids_are_unique_uuids() {
        let a = new_request_id();
        let b = new_request_id();
        assert_ne!(a, b);
        assert!(uuid::Uuid::parse_str(&a).is_ok());
    }
}
