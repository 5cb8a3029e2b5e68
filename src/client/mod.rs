//! Fraud-screening client.
//!
//! [`RequestFacade`] is the single entry point for JSON calls and uploads;
//! [`ScanClient`] wires it to the backend services.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::cache::{KeyValueStore, MemoryStore, ResultCache};
use crate::config::{ScanConfig, ScanConfigBuilder};
use crate::errors::{ScanError, ScanOutcome};
use crate::observability::{
    new_request_id, DefaultMetricsCollector, MetricsCollector, RequestTimer, REQUEST_ID_HEADER,
};
use crate::resilience::{ResilienceConfig, ResilienceOrchestrator, RetryConfig};
use crate::services::{DashboardService, ScanService};
use crate::transport::{HttpMethod, HttpRequest, HttpResponse, HttpTransport, ReqwestTransport};
use crate::types::HealthStatus;
use crate::upload::{ProgressCallback, UploadFile, UploadTracker};

/// Placeholder used when an error body cannot be read.
const UNKNOWN_ERROR: &str = "Unknown error";

/// Per-call options for [`RequestFacade::send`].
///
/// Unset timeout and retry values fall back to the client configuration.
#[derive(Debug, Clone)]
pub struct RequestOptions {
    /// HTTP method.
    pub method: HttpMethod,
    /// Headers merged over the defaults.
    pub headers: Vec<(String, String)>,
    /// Serialized JSON body.
    pub body: Option<Vec<u8>>,
    /// Per-attempt deadline.
    pub timeout: Option<Duration>,
    /// Retry budget.
    pub max_retries: Option<u32>,
    /// Caller-held abort handle.
    pub cancel: Option<CancellationToken>,
    /// Route template requests are counted under in metrics. Defaults to
    /// the endpoint itself.
    pub route: Option<String>,
}

impl RequestOptions {
    /// Creates options for `method` with no body.
    pub fn new(method: HttpMethod) -> Self {
        Self {
            method,
            headers: Vec::new(),
            body: None,
            timeout: None,
            max_retries: None,
            cancel: None,
            route: None,
        }
    }

    /// GET with defaults.
    pub fn get() -> Self {
        Self::new(HttpMethod::Get)
    }

    /// POST with no body.
    pub fn post() -> Self {
        Self::new(HttpMethod::Post)
    }

    /// POST with `body` serialized as JSON.
    pub fn post_json<B: Serialize>(body: &B) -> ScanOutcome<Self> {
        Self::post().json(body)
    }

    /// Serializes `body` as the JSON payload.
    pub fn json<B: Serialize>(mut self, body: &B) -> ScanOutcome<Self> {
        let encoded = serde_json::to_vec(body)
            .map_err(|e| ScanError::validation(format!("Could not encode request body: {}", e)))?;
        self.body = Some(encoded);
        Ok(self)
    }

    /// Adds a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Overrides the per-attempt deadline.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Overrides the retry budget.
    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Attaches an abort handle.
    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Counts the call under `route` (e.g. `/scan/result/{id}`) instead of
    /// the concrete endpoint.
    pub fn route(mut self, route: impl Into<String>) -> Self {
        self.route = Some(route.into());
        self
    }
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::get()
    }
}

/// Resolves endpoints, runs JSON calls through the resilience chain and
/// hands uploads to the [`UploadTracker`].
pub struct RequestFacade {
    config: ScanConfig,
    transport: Arc<dyn HttpTransport>,
    uploader: UploadTracker,
    metrics: Arc<dyn MetricsCollector>,
}

impl RequestFacade {
    /// Creates a facade.
    pub fn new(
        config: ScanConfig,
        transport: Arc<dyn HttpTransport>,
        metrics: Arc<dyn MetricsCollector>,
    ) -> Self {
        Self {
            uploader: UploadTracker::new(Arc::clone(&transport)),
            config,
            transport,
            metrics,
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Returns the metrics collector.
    pub fn metrics(&self) -> &Arc<dyn MetricsCollector> {
        &self.metrics
    }

    /// Sends a JSON request and decodes the JSON response.
    ///
    /// Relative endpoints are resolved against the base URL. Server errors,
    /// network errors and timeouts are retried with linear backoff; any
    /// other failure is returned at once. An empty success body decodes as
    /// `{}`.
    #[instrument(skip(self, options), fields(method = options.method.as_str()))]
    pub async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> ScanOutcome<T> {
        let timer = RequestTimer::start();
        let route = options.route.clone();
        let (result, attempts) = self.execute(endpoint, options).await;
        let result = result.and_then(|response| decode_json(&response));

        self.metrics.record_request(
            route.as_deref().unwrap_or(endpoint),
            attempts,
            timer.elapsed(),
            result.as_ref().err().map(ScanError::kind),
        );
        if let Err(e) = &result {
            tracing::debug!(attempts, kind = %e.kind(), error = %e, "Request failed");
        }
        result
    }

    async fn execute(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> (ScanOutcome<HttpResponse>, u32) {
        let orchestrator = match ResilienceOrchestrator::new(ResilienceConfig {
            retry: RetryConfig::new()
                .max_retries(options.max_retries.unwrap_or(self.config.max_retries))
                .base_delay(self.config.retry_base_delay),
            timeout: options.timeout.unwrap_or(self.config.timeout),
        }) {
            Ok(orchestrator) => orchestrator,
            Err(e) => return (Err(e), 0),
        };

        let mut headers = self.base_headers();
        headers.insert("content-type".to_string(), "application/json".to_string());
        for (name, value) in &options.headers {
            headers.insert(name.to_ascii_lowercase(), value.clone());
        }

        let request = HttpRequest {
            method: options.method,
            url: self.config.endpoint_url(endpoint),
            headers,
            body: options.body,
        };
        tracing::debug!(url = %request.url, "Sending request");

        let transport = &self.transport;
        orchestrator
            .execute(
                || {
                    let request = request.clone();
                    async move {
                        let response = transport.send(request).await?;
                        if response.is_success() {
                            Ok(response)
                        } else {
                            let message = response
                                .text()
                                .filter(|t| !t.is_empty())
                                .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
                            Err(ScanError::from_status(response.status, message))
                        }
                    }
                },
                options.cancel.as_ref(),
            )
            .await
    }

    /// Uploads `file` to `endpoint` as the single `file` form field.
    ///
    /// Uploads are never retried or put under a deadline; use `cancel` to
    /// abandon one.
    #[instrument(skip(self, file, on_progress, cancel))]
    pub async fn upload<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        file: UploadFile,
        on_progress: Option<ProgressCallback>,
        cancel: &CancellationToken,
    ) -> ScanOutcome<T> {
        let timer = RequestTimer::start();
        let bytes = file.len();
        let url = self.config.endpoint_url(endpoint);

        let result = self
            .uploader
            .upload(&url, file, self.base_headers(), on_progress, cancel)
            .await;

        self.metrics.record_upload(
            bytes,
            timer.elapsed(),
            result.as_ref().err().map(ScanError::kind),
        );
        if result.is_ok() {
            tracing::info!(bytes, elapsed_ms = timer.elapsed().as_millis() as u64, "Upload complete");
        }
        result
    }

    /// Checks the backend health endpoint at the origin of the base URL.
    pub async fn health(&self) -> ScanOutcome<HealthStatus> {
        let url = format!("{}/health", self.config.origin()?);
        self.send(&url, RequestOptions::get().route("/health")).await
    }

    /// Configured headers plus a fresh request id, keyed in lower case.
    fn base_headers(&self) -> HashMap<String, String> {
        let mut headers: HashMap<String, String> = self
            .config
            .default_headers
            .iter()
            .map(|(name, value)| (name.to_ascii_lowercase(), value.clone()))
            .collect();
        headers
            .entry(REQUEST_ID_HEADER.to_string())
            .or_insert_with(new_request_id);
        headers
    }
}

impl std::fmt::Debug for RequestFacade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestFacade")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Decodes a success body; an empty body decodes as `{}`.
fn decode_json<T: DeserializeOwned>(response: &HttpResponse) -> ScanOutcome<T> {
    let body: &[u8] = if response.body.is_empty() {
        b"{}"
    } else {
        &response.body
    };
    serde_json::from_slice(body).map_err(|e| ScanError::parse(e.to_string(), Some(response.status)))
}

/// The fraud-screening client.
///
/// # Example
///
/// ```rust,no_run
/// use fraudscan_client::ScanClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = ScanClient::builder()
///         .base_url("http://localhost:8000/api/v1")
///         .build()?;
///
///     let stats = client.dashboard().stats().await?;
///     println!("{} documents screened", stats.total_scanned);
///     Ok(())
/// }
/// ```
pub struct ScanClient {
    facade: Arc<RequestFacade>,
    dashboard: DashboardService,
    scans: ScanService,
}

impl ScanClient {
    /// Creates a new client builder.
    pub fn builder() -> ScanClientBuilder {
        ScanClientBuilder::new()
    }

    /// Creates a client from environment variables.
    pub fn from_env() -> ScanOutcome<Self> {
        ScanClientBuilder::from_config(ScanConfig::from_env()?).build()
    }

    /// Returns the dashboard service.
    pub fn dashboard(&self) -> &DashboardService {
        &self.dashboard
    }

    /// Returns the scan service.
    pub fn scans(&self) -> &ScanService {
        &self.scans
    }

    /// Returns the request facade for calls not covered by a service.
    pub fn facade(&self) -> &RequestFacade {
        &self.facade
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ScanConfig {
        self.facade.config()
    }

    /// Sends a JSON request. See [`RequestFacade::send`].
    pub async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        options: RequestOptions,
    ) -> ScanOutcome<T> {
        self.facade.send(endpoint, options).await
    }

    /// Uploads a file. See [`RequestFacade::upload`].
    pub async fn upload<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        file: UploadFile,
        on_progress: Option<ProgressCallback>,
        cancel: &CancellationToken,
    ) -> ScanOutcome<T> {
        self.facade.upload(endpoint, file, on_progress, cancel).await
    }

    /// Checks backend health.
    pub async fn health(&self) -> ScanOutcome<HealthStatus> {
        self.facade.health().await
    }
}

impl std::fmt::Debug for ScanClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanClient")
            .field("config", self.facade.config())
            .finish()
    }
}

/// Builder for the fraud-screening client.
pub struct ScanClientBuilder {
    config: Option<ScanConfig>,
    config_builder: ScanConfigBuilder,
    transport: Option<Arc<dyn HttpTransport>>,
    metrics: Option<Arc<dyn MetricsCollector>>,
    store: Option<Arc<dyn KeyValueStore>>,
}

impl ScanClientBuilder {
    /// Creates a new client builder.
    pub fn new() -> Self {
        Self {
            config: None,
            config_builder: ScanConfigBuilder::new(),
            transport: None,
            metrics: None,
            store: None,
        }
    }

    /// Creates a builder from an existing configuration.
    pub fn from_config(config: ScanConfig) -> Self {
        Self {
            config: Some(config),
            ..Self::new()
        }
    }

    /// Sets the base URL.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config_builder = self.config_builder.base_url(base_url);
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config_builder = self.config_builder.timeout(timeout);
        self
    }

    /// Sets the maximum retry attempts.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config_builder = self.config_builder.max_retries(retries);
        self
    }

    /// Sets the backoff unit.
    pub fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.config_builder = self.config_builder.retry_base_delay(delay);
        self
    }

    /// Sets the wait before fetching the result of a queued upload.
    pub fn result_settle_delay(mut self, delay: Duration) -> Self {
        self.config_builder = self.config_builder.result_settle_delay(delay);
        self
    }

    /// Sets a custom transport.
    pub fn transport(mut self, transport: Arc<dyn HttpTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Sets a custom metrics collector.
    pub fn metrics(mut self, metrics: Arc<dyn MetricsCollector>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Sets the store backing the result cache.
    pub fn store(mut self, store: Arc<dyn KeyValueStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Builds the client.
    pub fn build(self) -> ScanOutcome<ScanClient> {
        let config = match self.config {
            Some(config) => config,
            None => self.config_builder.build()?,
        };

        let transport: Arc<dyn HttpTransport> = match self.transport {
            Some(t) => t,
            None => Arc::new(
                ReqwestTransport::new().map_err(|e| ScanError::configuration(e.to_string()))?,
            ),
        };
        let metrics = self
            .metrics
            .unwrap_or_else(|| Arc::new(DefaultMetricsCollector::new()));
        let store = self.store.unwrap_or_else(|| Arc::new(MemoryStore::new()));

        let facade = Arc::new(RequestFacade::new(config, transport, metrics));
        let cache = Arc::new(ResultCache::new(store));

        Ok(ScanClient {
            dashboard: DashboardService::new(Arc::clone(&facade)),
            scans: ScanService::new(Arc::clone(&facade), cache),
            facade,
        })
    }
}

impl Default for ScanClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
