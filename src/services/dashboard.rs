//! Dashboard feeds.

use std::sync::Arc;
use tracing::instrument;

use super::endpoints;
use crate::client::{RequestFacade, RequestOptions};
use crate::errors::ScanOutcome;
use crate::types::dashboard::{ChartDataPoint, DashboardStats, RecentFile};

/// Statistics, chart series and the live feed shown on the dashboard.
pub struct DashboardService {
    facade: Arc<RequestFacade>,
}

impl DashboardService {
    /// Creates a new dashboard service.
    pub fn new(facade: Arc<RequestFacade>) -> Self {
        Self { facade }
    }

    /// Fetches the headline figures.
    #[instrument(skip(self))]
    pub async fn stats(&self) -> ScanOutcome<DashboardStats> {
        self.facade
            .send(endpoints::DASHBOARD_STATS, RequestOptions::get())
            .await
    }

    /// Fetches the uploads-versus-fraud series, oldest day first.
    #[instrument(skip(self))]
    pub async fn chart(&self) -> ScanOutcome<Vec<ChartDataPoint>> {
        self.facade
            .send(endpoints::DASHBOARD_CHART, RequestOptions::get())
            .await
    }

    /// Fetches recently scanned files, most recent first.
    #[instrument(skip(self))]
    pub async fn recent_files(&self) -> ScanOutcome<Vec<RecentFile>> {
        let mut files: Vec<RecentFile> = self
            .facade
            .send(endpoints::DASHBOARD_RECENT, RequestOptions::get())
            .await?;
        files.sort_by(|a, b| b.scanned_at.cmp(&a.scanned_at));
        Ok(files)
    }
}

impl std::fmt::Debug for DashboardService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DashboardService").finish_non_exhaustive()
    }
}
