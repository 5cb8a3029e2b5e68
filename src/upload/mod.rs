//! Binary upload with progress reporting.
//!
//! Uploads bypass the retry orchestrator: a partially sent body cannot be
//! resumed, so a caller that wants another try must start a fresh upload.

use bytes::Bytes;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::errors::{ScanError, ScanOutcome};
use crate::transport::{HttpResponse, HttpTransport, MultipartRequest, TransferObserver};
use crate::validation::detect_content_type;

/// Form field the file is sent under.
pub const FIELD_NAME: &str = "file";

/// A snapshot of upload progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UploadProgress {
    /// File bytes handed to the connection so far.
    pub bytes_sent: u64,
    /// File size, fixed when the transfer starts.
    pub total_bytes: u64,
    /// `bytes_sent / total_bytes`, clamped to `[0, 1]`.
    pub fraction_complete: f64,
}

impl UploadProgress {
    /// Creates a snapshot.
    pub fn new(bytes_sent: u64, total_bytes: u64) -> Self {
        let fraction_complete = if total_bytes == 0 {
            1.0
        } else {
            (bytes_sent as f64 / total_bytes as f64).clamp(0.0, 1.0)
        };
        Self {
            bytes_sent,
            total_bytes,
            fraction_complete,
        }
    }

    /// Progress as a percentage.
    pub fn percent(&self) -> f64 {
        self.fraction_complete * 100.0
    }

    /// Returns true once every byte has been sent.
    pub fn is_complete(&self) -> bool {
        self.fraction_complete >= 1.0
    }
}

/// Callback receiving progress snapshots.
pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync>;

/// A file to upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    /// File name sent to the server.
    pub filename: String,
    /// Content type of the part.
    pub content_type: String,
    /// File contents.
    pub data: Bytes,
}

impl UploadFile {
    /// Creates a file, guessing the content type from the name.
    pub fn new(filename: impl Into<String>, data: impl Into<Bytes>) -> Self {
        let filename = filename.into();
        let content_type = detect_content_type(&filename).to_string();
        Self {
            filename,
            content_type,
            data: data.into(),
        }
    }

    /// Reads a file from disk.
    pub async fn from_path(path: impl AsRef<Path>) -> ScanOutcome<Self> {
        let path = path.as_ref();
        let data = tokio::fs::read(path).await.map_err(|e| {
            ScanError::validation(format!("Could not read {}: {}", path.display(), e))
        })?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(filename, data))
    }

    /// Overrides the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// File size in bytes.
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    /// Returns true for an empty file.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Turns raw transport reports into well-formed snapshots.
///
/// The total is fixed by the first measurable report; reports that go
/// backwards, change the total, or arrive after cancellation are dropped.
struct ProgressGate {
    callback: Option<ProgressCallback>,
    cancel: CancellationToken,
    total: OnceLock<u64>,
    sent: AtomicU64,
}

impl ProgressGate {
    fn report(&self, bytes_sent: u64, total: Option<u64>) {
        let Some(total) = total else {
            return;
        };
        if self.cancel.is_cancelled() {
            return;
        }
        let fixed = *self.total.get_or_init(|| total);
        if fixed != total {
            tracing::debug!(fixed, reported = total, "Ignoring progress with changed total");
            return;
        }

        let bytes_sent = bytes_sent.min(fixed);
        let previous = self.sent.fetch_max(bytes_sent, Ordering::SeqCst);
        if bytes_sent < previous {
            return;
        }

        let snapshot = UploadProgress::new(bytes_sent, fixed);
        tracing::trace!(bytes_sent, total_bytes = fixed, "Upload progress");
        if let Some(callback) = &self.callback {
            callback(snapshot);
        }
    }

    /// Emits a final full snapshot if progress was measurable and the last
    /// one fell short.
    fn complete(&self) {
        if let Some(&total) = self.total.get() {
            if self.sent.load(Ordering::SeqCst) < total {
                self.report(total, Some(total));
            }
        }
    }
}

/// Performs single-field multipart uploads with progress and cancellation.
#[derive(Clone)]
pub struct UploadTracker {
    transport: Arc<dyn HttpTransport>,
}

impl UploadTracker {
    /// Creates a tracker sending the file under the `file` field.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// Uploads `file` to `url` and parses the JSON response.
    ///
    /// Cancelling `cancel` aborts the transfer immediately, stops progress
    /// snapshots, and resolves to [`ScanError::Cancelled`].
    #[instrument(skip(self, file, headers, on_progress, cancel), fields(filename = %file.filename, bytes = file.len()))]
    pub async fn upload<T: DeserializeOwned>(
        &self,
        url: &str,
        file: UploadFile,
        headers: HashMap<String, String>,
        on_progress: Option<ProgressCallback>,
        cancel: &CancellationToken,
    ) -> ScanOutcome<T> {
        let gate = Arc::new(ProgressGate {
            callback: on_progress,
            cancel: cancel.clone(),
            total: OnceLock::new(),
            sent: AtomicU64::new(0),
        });
        let observer: TransferObserver = {
            let gate = Arc::clone(&gate);
            Arc::new(move |sent, total| gate.report(sent, total))
        };

        let request = MultipartRequest {
            url: url.to_string(),
            headers,
            field_name: FIELD_NAME.to_string(),
            filename: file.filename,
            content_type: file.content_type,
            data: file.data,
        };

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!("Upload cancelled");
                return Err(ScanError::cancelled("Upload cancelled"));
            }
            result = self.transport.send_multipart(request, Some(observer)) => {
                result.map_err(|e| match ScanError::from(e) {
                    ScanError::Network { message } => {
                        ScanError::network(format!("during upload: {}", message))
                    }
                    ScanError::Configuration { message } => {
                        ScanError::configuration(format!("Upload request could not be built: {}", message))
                    }
                    other => other,
                })?
            }
        };

        let parsed = parse_upload_response(&response)?;
        gate.complete();
        Ok(parsed)
    }
}

impl std::fmt::Debug for UploadTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UploadTracker").finish_non_exhaustive()
    }
}

fn parse_upload_response<T: DeserializeOwned>(response: &HttpResponse) -> ScanOutcome<T> {
    if !response.is_success() {
        let reason = response.reason().unwrap_or("Unknown error");
        return Err(ScanError::from_status(
            response.status,
            format!("Upload failed: {}", reason),
        ));
    }

    serde_json::from_slice(&response.body)
        .map_err(|e| ScanError::parse(e.to_string(), Some(response.status)))
}
