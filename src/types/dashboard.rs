//! Dashboard feed types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::scan::Severity;

/// Headline figures for the dashboard cards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    /// Documents screened in total.
    pub total_scanned: u64,
    /// Documents flagged as fraudulent.
    pub fraud_detected: u64,
    /// Estimated amount saved, in rupees.
    pub total_savings: f64,
    /// Flagged documents awaiting manual review.
    pub pending_review: u64,
    /// Detection accuracy as a percentage.
    pub accuracy_rate: f64,
}

/// One day of the uploads-versus-fraud chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartDataPoint {
    /// Display label for the day.
    pub date: String,
    /// Documents uploaded that day.
    pub uploads: u32,
    /// Documents flagged that day.
    pub fraud: u32,
}

/// Lower-case status used by the live feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    /// Score below 30.
    Safe,
    /// Score from 30 up to 70.
    Warning,
    /// Score of 70 or more.
    Critical,
}

impl From<Severity> for FileStatus {
    fn from(severity: Severity) -> Self {
        match severity {
            Severity::Safe => FileStatus::Safe,
            Severity::Warning => FileStatus::Warning,
            Severity::Critical => FileStatus::Critical,
        }
    }
}

/// An entry in the recently scanned feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentFile {
    /// File identifier.
    pub id: String,
    /// File name.
    pub filename: String,
    /// Submitting department.
    pub department: String,
    /// Feed status.
    pub status: FileStatus,
    /// Fraud score, 0-100.
    pub fraud_score: u32,
    /// When the file was scanned.
    pub scanned_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_status_from_severity() {
        assert_eq!(FileStatus::from(Severity::from_score(12)), FileStatus::Safe);
        assert_eq!(FileStatus::from(Severity::from_score(45)), FileStatus::Warning);
        assert_eq!(FileStatus::from(Severity::from_score(91)), FileStatus::Critical);
    }

    #[test]
    fn test_recent_file_wire_format() {
        let json = r#"{"id":"a1","filename":"Invoice_4821.pdf","department":"Public Works",
            "status":"warning","fraud_score":52,"scanned_at":"2024-03-14T09:26:53Z"}"#;
        let file: RecentFile = serde_json::from_str(json).unwrap();
        assert_eq!(file.status, FileStatus::Warning);
        assert_eq!(file.department, "Public Works");
    }
}
