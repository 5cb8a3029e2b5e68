//! Type definitions for the scanning backend.
//!
//! Scan results returned by the upload endpoint and the feeds shown on the
//! dashboard.

pub mod dashboard;
pub mod scan;

use serde::{Deserialize, Serialize};

/// Body of the backend health endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Reported status, e.g. "healthy".
    #[serde(default)]
    pub status: Option<String>,
    /// Any other fields the backend reports.
    #[serde(flatten)]
    pub details: serde_json::Map<String, serde_json::Value>,
}

impl HealthStatus {
    /// Returns true unless the backend reported a status other than
    /// "healthy" or "ok".
    pub fn is_healthy(&self) -> bool {
        self.status
            .as_deref()
            .map_or(true, |s| s.eq_ignore_ascii_case("healthy") || s.eq_ignore_ascii_case("ok"))
    }
}
