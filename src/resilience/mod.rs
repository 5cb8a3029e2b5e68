//! Resilience layer for the fraud-screening client.
//!
//! The chain for JSON calls is retry → timeout → network: each attempt made
//! by the [`RetryPolicy`] is wrapped in its own [`TimeoutGuard`] race, so a
//! slow attempt is aborted and counted as a transient failure.

mod retry;
mod timeout;

pub use retry::{RetryConfig, RetryDecision, RetryPolicy, RetryState};
pub use timeout::TimeoutGuard;

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::config::DEFAULT_TIMEOUT;
use crate::errors::ScanOutcome;

/// Configuration for the resilience orchestrator.
#[derive(Debug, Clone)]
pub struct ResilienceConfig {
    /// Retry configuration.
    pub retry: RetryConfig,
    /// Per-attempt deadline.
    pub timeout: Duration,
}

impl Default for ResilienceConfig {
    fn default() -> Self {
        Self {
            retry: RetryConfig::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

/// Orchestrates the retry policy and the per-attempt timeout guard.
#[derive(Debug, Clone)]
pub struct ResilienceOrchestrator {
    retry_policy: RetryPolicy,
    guard: TimeoutGuard,
}

impl ResilienceOrchestrator {
    /// Creates a new resilience orchestrator. Fails if the deadline is zero.
    pub fn new(config: ResilienceConfig) -> ScanOutcome<Self> {
        Ok(Self {
            retry_policy: RetryPolicy::new(config.retry),
            guard: TimeoutGuard::new(config.timeout)?,
        })
    }

    /// Returns the retry policy.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry_policy
    }

    /// Returns the timeout guard.
    pub fn guard(&self) -> &TimeoutGuard {
        &self.guard
    }

    /// Executes an operation with retries, each attempt under the deadline.
    ///
    /// Returns the outcome together with the number of attempts made.
    pub async fn execute<F, Fut, T>(
        &self,
        operation: F,
        cancel: Option<&CancellationToken>,
    ) -> (ScanOutcome<T>, u32)
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ScanOutcome<T>>,
    {
        self.retry_policy
            .execute_traced(|| self.guard.run(operation(), cancel), cancel)
            .await
    }
}
