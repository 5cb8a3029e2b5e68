//! Retry policy implementation.

use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::config::{DEFAULT_MAX_RETRIES, DEFAULT_RETRY_BASE_DELAY};
use crate::errors::{ScanError, ScanOutcome};

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt.
    pub max_retries: u32,
    /// Backoff unit. The delay before retry `n` is `base_delay * n`.
    pub base_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay: DEFAULT_RETRY_BASE_DELAY,
        }
    }
}

impl RetryConfig {
    /// Creates a new retry configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the maximum number of retries.
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Sets the backoff unit.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = delay;
        self
    }

    /// Creates a configuration with no retries.
    pub fn no_retries() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }
}

/// Progress of one logical call. Each failed attempt produces a new state;
/// nothing outlives the call.
#[derive(Debug, Clone, Default)]
pub struct RetryState {
    attempt: u32,
    last_error: Option<ScanError>,
}

impl RetryState {
    /// State before the first attempt.
    pub fn initial() -> Self {
        Self::default()
    }

    /// Zero-based number of the attempt about to run (or that just ran).
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// The failure of the previous attempt, if any.
    pub fn last_error(&self) -> Option<&ScanError> {
        self.last_error.as_ref()
    }

    /// State for the next attempt after `error`.
    pub fn after_failure(self, error: ScanError) -> Self {
        Self {
            attempt: self.attempt + 1,
            last_error: Some(error),
        }
    }
}

/// What to do after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Sleep for the given delay, then try again.
    Retry(Duration),
    /// Surface the failure.
    GiveUp,
}

/// Retry policy with linear backoff.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Creates a new retry policy.
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Total number of attempts this policy allows.
    pub fn max_attempts(&self) -> u32 {
        self.config.max_retries.saturating_add(1)
    }

    /// Delay before retry `retry` (1-indexed): `base_delay * retry`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.config.base_delay.saturating_mul(retry)
    }

    /// Decides what follows a failure of the attempt recorded in `state`.
    pub fn decide(&self, state: &RetryState, error: &ScanError) -> RetryDecision {
        if !error.is_retryable() || state.attempt() >= self.config.max_retries {
            RetryDecision::GiveUp
        } else {
            RetryDecision::Retry(self.delay_for(state.attempt() + 1))
        }
    }

    /// Executes an operation with retries.
    ///
    /// Attempts run strictly one after another. A panic inside an attempt
    /// is reported as a network error. Cancellation is honoured before each
    /// attempt and during backoff.
    #[instrument(skip(self, operation, cancel), fields(max_retries = self.config.max_retries))]
    pub async fn execute<F, Fut, T>(
        &self,
        operation: F,
        cancel: Option<&CancellationToken>,
    ) -> ScanOutcome<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ScanOutcome<T>>,
    {
        let mut state = RetryState::initial();

        loop {
            if cancel.map_or(false, CancellationToken::is_cancelled) {
                return Err(ScanError::cancelled("request aborted by caller"));
            }

            let outcome = match AssertUnwindSafe(async { operation().await })
                .catch_unwind()
                .await
            {
                Ok(outcome) => outcome,
                Err(_) => Err(ScanError::network("request attempt panicked")),
            };

            let err = match outcome {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            match self.decide(&state, &err) {
                RetryDecision::GiveUp => {
                    if err.is_retryable() {
                        tracing::warn!(
                            attempts = state.attempt() + 1,
                            error = %err,
                            "Giving up after exhausting retries"
                        );
                    }
                    return Err(err);
                }
                RetryDecision::Retry(delay) => {
                    tracing::info!(
                        attempt = state.attempt() + 1,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        kind = %err.kind(),
                        error = %err,
                        "Retrying after error"
                    );

                    state = state.after_failure(err);
                    if !backoff(delay, cancel).await {
                        return Err(ScanError::cancelled("request aborted by caller"));
                    }
                }
            }
        }
    }

    /// Like [`execute`](Self::execute), but also returns how many attempts
    /// were made.
    pub async fn execute_traced<F, Fut, T>(
        &self,
        operation: F,
        cancel: Option<&CancellationToken>,
    ) -> (ScanOutcome<T>, u32)
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ScanOutcome<T>>,
    {
        let attempts = std::sync::atomic::AtomicU32::new(0);
        let result = self
            .execute(
                || {
                    attempts.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    operation()
                },
                cancel,
            )
            .await;
        (result, attempts.into_inner())
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}

/// Sleeps for `delay`. Returns false if `cancel` fired first.
async fn backoff(delay: Duration, cancel: Option<&CancellationToken>) -> bool {
    match cancel {
        Some(token) => tokio::select! {
            _ = token.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        },
        None => {
            tokio::time::sleep(delay).await;
            true
        }
    }
}
