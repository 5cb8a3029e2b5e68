//! Document submission and scan results.

use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use super::endpoints;
use crate::cache::ResultCache;
use crate::client::{RequestFacade, RequestOptions};
use crate::errors::{ScanError, ScanOutcome};
use crate::types::scan::{ScanResult, UploadResponse};
use crate::upload::{ProgressCallback, UploadFile};
use crate::validation::validate_file;

/// Submits documents for screening and retrieves their results.
///
/// Every result obtained here is written to the result cache, so a results
/// view can show the last known result without another round trip.
pub struct ScanService {
    facade: Arc<RequestFacade>,
    cache: Arc<ResultCache>,
}

impl ScanService {
    /// Creates a new scan service.
    pub fn new(facade: Arc<RequestFacade>, cache: Arc<ResultCache>) -> Self {
        Self { facade, cache }
    }

    /// Validates and uploads `file`, then returns its scan result.
    ///
    /// If the backend queues the document instead of screening it inline,
    /// the result is fetched by task id after the configured settle delay.
    #[instrument(skip(self, file, on_progress, cancel), fields(filename = %file.filename))]
    pub async fn submit(
        &self,
        file: UploadFile,
        on_progress: Option<ProgressCallback>,
        cancel: &CancellationToken,
    ) -> ScanOutcome<ScanResult> {
        validate_file(&file)?;

        let response: UploadResponse = self
            .facade
            .upload(endpoints::SCAN_UPLOAD, file, on_progress, cancel)
            .await?;

        match response {
            UploadResponse::Completed(result) => {
                self.cache.put(&result);
                Ok(*result)
            }
            UploadResponse::Queued(receipt) => {
                let delay = self.facade.config().result_settle_delay;
                tracing::info!(
                    task_id = %receipt.task_id,
                    delay_ms = delay.as_millis() as u64,
                    "Upload accepted, fetching result"
                );
                if !delay.is_zero() {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            return Err(ScanError::cancelled("Submission cancelled"));
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                self.fetch_with(&receipt.task_id, RequestOptions::get().cancel_on(cancel.clone()))
                    .await
            }
        }
    }

    /// Fetches the result for `file_id` from the backend.
    pub async fn fetch(&self, file_id: &str) -> ScanOutcome<ScanResult> {
        self.fetch_with(file_id, RequestOptions::get()).await
    }

    #[instrument(skip(self, options))]
    async fn fetch_with(&self, file_id: &str, options: RequestOptions) -> ScanOutcome<ScanResult> {
        check_file_id(file_id)?;

        let result: ScanResult = self
            .facade
            .send(
                &endpoints::scan_result(file_id),
                options.route(endpoints::SCAN_RESULT_ROUTE),
            )
            .await?;
        self.cache.put(&result);
        Ok(result)
    }

    /// Returns the last known result for `file_id`, without a request.
    pub fn cached(&self, file_id: &str) -> Option<ScanResult> {
        self.cache.get(file_id)
    }
}

impl std::fmt::Debug for ScanService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScanService").finish_non_exhaustive()
    }
}

fn check_file_id(file_id: &str) -> ScanOutcome<()> {
    let valid = !file_id.is_empty()
        && file_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        && !file_id.chars().all(|c| c == '.');
    if valid {
        Ok(())
    } else {
        Err(ScanError::validation(format!("Invalid file id '{}'", file_id)))
    }
}
