//! Fraud-Screening Client Library
//!
//! A resilient request layer for the document fraud-screening backend.
//! JSON calls get a per-attempt deadline, typed failure classification and
//! linear-backoff retries of transient failures; document uploads report
//! progress and can be cancelled by the caller.
//!
//! # Features
//!
//! - **Timeouts**: every attempt races a deadline and is aborted when it loses
//! - **Retries**: server errors, network errors and timeouts are retried
//!   with `base * n` backoff; client, parse and cancellation errors never are
//! - **Typed errors**: one [`FailureKind`] per failure class, with the HTTP
//!   status when one was received
//! - **Uploads**: single-field multipart with monotonic progress snapshots
//! - **Services**: dashboard feeds, document submission and a last-known
//!   result cache
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use fraudscan_client::{ScanClient, UploadFile};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ScanClient::builder()
//!         .base_url("http://localhost:8000/api/v1")
//!         .build()?;
//!
//!     let file = UploadFile::from_path("invoice.pdf").await?;
//!     let result = client
//!         .scans()
//!         .submit(file, None, &CancellationToken::new())
//!         .await?;
//!     println!("{}: {:?} ({})", result.filename, result.severity, result.fraud_score);
//!     Ok(())
//! }
//! ```
//!
//! # Raw Requests
//!
//! ```rust,no_run
//! use fraudscan_client::{RequestOptions, ScanClient};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ScanClient::from_env()?;
//!
//!     let options = RequestOptions::get()
//!         .timeout(Duration::from_secs(5))
//!         .max_retries(1);
//!     let stats: serde_json::Value = client.send("/dashboard/stats", options).await?;
//!     println!("{}", stats);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod errors;
pub mod observability;
pub mod resilience;
pub mod services;
pub mod transport;
pub mod types;
pub mod upload;
pub mod validation;

// Re-exports for convenience
pub use client::{RequestFacade, RequestOptions, ScanClient, ScanClientBuilder};
pub use config::ScanConfig;
pub use errors::{FailureKind, ScanError, ScanOutcome};
pub use upload::{ProgressCallback, UploadFile, UploadProgress};

// Type re-exports
pub use types::dashboard::{ChartDataPoint, DashboardStats, FileStatus, RecentFile};
pub use types::scan::{Anomaly, ScanResult, ScanStatus, Severity, UploadReceipt, UploadResponse};
pub use types::HealthStatus;

/// Mock implementations for testing.
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
