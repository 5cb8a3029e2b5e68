//! Service implementations for the scanning backend.
//!
//! Provides the dashboard feeds and document submission on top of the
//! request facade.

mod dashboard;
mod scans;

pub use dashboard::DashboardService;
pub use scans::ScanService;

/// Endpoint paths relative to the API base.
pub mod endpoints {
    /// Headline statistics.
    pub const DASHBOARD_STATS: &str = "/dashboard/stats";
    /// Uploads-versus-fraud chart series.
    pub const DASHBOARD_CHART: &str = "/dashboard/chart";
    /// Recently scanned files.
    pub const DASHBOARD_RECENT: &str = "/dashboard/recent";
    /// Document upload.
    pub const SCAN_UPLOAD: &str = "/scan/upload";

    /// Metrics route shared by every scan result.
    pub const SCAN_RESULT_ROUTE: &str = "/scan/result/{id}";

    /// Result of one scan.
    pub fn scan_result(file_id: &str) -> String {
        format!("/scan/result/{}", file_id)
    }
}
