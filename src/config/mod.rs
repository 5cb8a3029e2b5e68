//! Configuration module for the fraud-screening client.
//!
//! Holds the base address relative endpoints are resolved against and the
//! default timeout and retry settings. Defaults are applied once, when the
//! configuration is built, so each client instance carries its own policy.

use std::time::Duration;
use url::Url;

use crate::errors::{ScanError, ScanOutcome};

/// Default base URL for the scanning backend (local development server).
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api/v1";

/// Default request timeout (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Default maximum retry attempts.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default backoff unit (1 second).
pub const DEFAULT_RETRY_BASE_DELAY: Duration = Duration::from_millis(1_000);

/// Default wait between a queued upload and the first result fetch.
pub const DEFAULT_RESULT_SETTLE_DELAY: Duration = Duration::from_millis(1_000);

/// Configuration for the fraud-screening client.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Base URL for relative endpoints, without a trailing slash.
    pub base_url: String,
    /// Per-attempt request timeout.
    pub timeout: Duration,
    /// Maximum retry attempts after the first try.
    pub max_retries: u32,
    /// Backoff unit between retries.
    pub retry_base_delay: Duration,
    /// Wait before fetching the result of a queued upload. Zero fetches at once.
    pub result_settle_delay: Duration,
    /// Headers added to every JSON request, before per-call headers.
    pub default_headers: Vec<(String, String)>,
}

impl ScanConfig {
    /// Creates a new configuration builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::new()
    }

    /// Creates a configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `FRAUDSCAN_API_BASE` (optional): base URL for relative endpoints
    /// - `FRAUDSCAN_TIMEOUT_MS` (optional): request timeout in milliseconds
    /// - `FRAUDSCAN_MAX_RETRIES` (optional): maximum retry attempts
    /// - `FRAUDSCAN_RETRY_DELAY_MS` (optional): backoff unit in milliseconds
    /// - `FRAUDSCAN_RESULT_DELAY_MS` (optional): wait before fetching a queued result
    pub fn from_env() -> ScanOutcome<Self> {
        let mut builder = ScanConfigBuilder::new();

        if let Ok(base_url) = std::env::var("FRAUDSCAN_API_BASE") {
            builder = builder.base_url(base_url);
        }

        if let Some(timeout_ms) = env_number::<u64>("FRAUDSCAN_TIMEOUT_MS") {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }

        if let Some(retries) = env_number::<u32>("FRAUDSCAN_MAX_RETRIES") {
            builder = builder.max_retries(retries);
        }

        if let Some(delay_ms) = env_number::<u64>("FRAUDSCAN_RETRY_DELAY_MS") {
            builder = builder.retry_base_delay(Duration::from_millis(delay_ms));
        }

        if let Some(delay_ms) = env_number::<u64>("FRAUDSCAN_RESULT_DELAY_MS") {
            builder = builder.result_settle_delay(Duration::from_millis(delay_ms));
        }

        builder.build()
    }

    /// Returns the full URL for an endpoint.
    ///
    /// Absolute `http(s)://` endpoints are returned unchanged; anything else
    /// is appended to the base URL.
    pub fn endpoint_url(&self, endpoint: &str) -> String {
        if is_absolute(endpoint) {
            endpoint.to_string()
        } else if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }

    /// Returns `scheme://host[:port]` of the base URL.
    pub fn origin(&self) -> ScanOutcome<String> {
        let url = Url::parse(&self.base_url)?;
        Ok(url.origin().ascii_serialization())
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay: DEFAULT_RETRY_BASE_DELAY,
            result_settle_delay: DEFAULT_RESULT_SETTLE_DELAY,
            default_headers: Vec::new(),
        }
    }
}

fn is_absolute(endpoint: &str) -> bool {
    endpoint.starts_with("http://") || endpoint.starts_with("https://")
}

fn env_number<T: std::str::FromStr>(var: &str) -> Option<T> {
    let raw = std::env::var(var).ok()?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(var, value = %raw, "Ignoring unparsable environment variable");
            None
        }
    }
}

/// Builder for `ScanConfig`.
#[derive(Debug, Default)]
pub struct ScanConfigBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    max_retries: Option<u32>,
    retry_base_delay: Option<Duration>,
    result_settle_delay: Option<Duration>,
    default_headers: Vec<(String, String)>,
}

impl ScanConfigBuilder {
    /// Creates a new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the timeout in milliseconds.
    pub fn timeout_ms(mut self, millis: u64) -> Self {
        self.timeout = Some(Duration::from_millis(millis));
        self
    }

    /// Sets the maximum retry attempts.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Sets the backoff unit.
    pub fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = Some(delay);
        self
    }

    /// Sets the wait before fetching the result of a queued upload.
    pub fn result_settle_delay(mut self, delay: Duration) -> Self {
        self.result_settle_delay = Some(delay);
        self
    }

    /// Adds a header sent with every JSON request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.push((name.into(), value.into()));
        self
    }

    /// Builds the configuration.
    pub fn build(self) -> ScanOutcome<ScanConfig> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let parsed = Url::parse(&base_url)?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(ScanError::configuration(format!(
                "Base URL must use http or https, got '{}'",
                parsed.scheme()
            )));
        }

        let timeout = self.timeout.unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            return Err(ScanError::configuration("Timeout must be greater than zero"));
        }

        Ok(ScanConfig {
            base_url,
            timeout,
            max_retries: self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES),
            retry_base_delay: self.retry_base_delay.unwrap_or(DEFAULT_RETRY_BASE_DELAY),
            result_settle_delay: self
                .result_settle_delay
                .unwrap_or(DEFAULT_RESULT_SETTLE_DELAY),
            default_headers: self.default_headers,
        })
    }
}
