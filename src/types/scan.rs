//! Scan result types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Risk band derived from a fraud score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Score below 30.
    Safe,
    /// Score from 30 up to 70.
    Warning,
    /// Score of 70 or more.
    Critical,
}

impl Severity {
    /// Maps a 0-100 fraud score onto a severity band.
    pub fn from_score(score: u32) -> Self {
        match score {
            0..=29 => Severity::Safe,
            30..=69 => Severity::Warning,
            _ => Severity::Critical,
        }
    }
}

/// Processing state of a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    /// Queued, not started.
    Pending,
    /// Being analysed.
    Scanning,
    /// Analysis finished.
    Completed,
    /// Analysis failed.
    Error,
}

/// A single finding raised against a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    /// Finding category, e.g. "Metadata Mismatch".
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable explanation.
    pub description: String,
    /// Detector confidence in `[0, 1]`.
    pub confidence: f64,
}

/// Result of screening one uploaded document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanResult {
    /// Identifier of the scanned file.
    pub file_id: String,
    /// Original file name.
    pub filename: String,
    /// Processing state.
    pub status: ScanStatus,
    /// Fraud score, 0-100.
    pub fraud_score: u32,
    /// Severity band reported by the backend.
    pub severity: Severity,
    /// Whether the document duplicates an earlier submission.
    #[serde(default)]
    pub is_duplicate: bool,
    /// Identifier of the earlier submission, when a duplicate.
    #[serde(default)]
    pub duplicate_source_id: Option<String>,
    /// Findings, empty for a clean document.
    #[serde(default)]
    pub anomalies: Vec<Anomaly>,
    /// When the scan finished.
    pub scanned_at: DateTime<Utc>,
    /// Processing time in milliseconds.
    pub processing_time: u64,
}

impl ScanResult {
    /// Returns true if no anomalies were raised.
    pub fn is_clean(&self) -> bool {
        self.anomalies.is_empty()
    }

    /// Returns the anomaly with the highest confidence.
    pub fn strongest_anomaly(&self) -> Option<&Anomaly> {
        self.anomalies
            .iter()
            .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
    }
}

/// Acknowledgement from a backend that screens uploads asynchronously.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadReceipt {
    /// Identifier to poll the result with.
    pub task_id: String,
    /// Status message.
    #[serde(default)]
    pub message: String,
}

/// Body returned by the upload endpoint.
///
/// Some deployments screen inline and return the finished result, others
/// queue the document and return a task id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UploadResponse {
    /// The document was screened inline.
    Completed(Box<ScanResult>),
    /// The document was queued.
    Queued(UploadReceipt),
}
