//! Deadline enforcement for a single network call.

use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::errors::{ScanError, ScanOutcome};

/// Races one operation against a deadline and an optional cancellation token.
///
/// Whichever settles first wins. On deadline expiry or cancellation the
/// operation's future is dropped, which aborts the in-flight request and
/// releases its connection. The deadline timer is dropped together with the
/// race, so nothing lingers after a normal completion.
#[derive(Debug, Clone, Copy)]
pub struct TimeoutGuard {
    deadline: Duration,
}

impl TimeoutGuard {
    /// Creates a guard. A zero deadline is rejected rather than treated as
    /// "no timeout".
    pub fn new(deadline: Duration) -> ScanOutcome<Self> {
        if deadline.is_zero() {
            return Err(ScanError::configuration("timeout must be greater than zero"));
        }
        Ok(Self { deadline })
    }

    /// Creates a guard from a millisecond count. Zero and negative values are
    /// configuration errors.
    pub fn from_millis(millis: i64) -> ScanOutcome<Self> {
        if millis <= 0 {
            return Err(ScanError::configuration(format!(
                "timeout must be greater than zero, got {}ms",
                millis
            )));
        }
        Self::new(Duration::from_millis(millis.unsigned_abs()))
    }

    /// Returns the deadline.
    pub fn deadline(&self) -> Duration {
        self.deadline
    }

    /// Runs `operation` under the deadline.
    pub async fn run<F, T>(&self, operation: F, cancel: Option<&CancellationToken>) -> ScanOutcome<T>
    where
        F: Future<Output = ScanOutcome<T>>,
    {
        let cancelled = async {
            match cancel {
                Some(token) => token.cancelled().await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            _ = cancelled => {
                tracing::debug!("Request aborted by caller");
                Err(ScanError::cancelled("request aborted by caller"))
            }
            result = tokio::time::timeout(self.deadline, operation) => match result {
                Ok(outcome) => outcome,
                Err(_) => {
                    tracing::debug!(timeout_ms = self.deadline.as_millis() as u64, "Request deadline elapsed");
                    Err(ScanError::Timeout { timeout: self.deadline })
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::FailureKind;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_rejects_non_positive_deadline() {
        assert_eq!(
            TimeoutGuard::from_millis(0).unwrap_err().kind(),
            FailureKind::ClientError
        );
        assert!(matches!(
            TimeoutGuard::from_millis(-5),
            Err(ScanError::Configuration { .. })
        ));
        assert!(matches!(
            TimeoutGuard::new(Duration::ZERO),
            Err(ScanError::Configuration { .. })
        ));
        assert_eq!(
            TimeoutGuard::from_millis(250).unwrap().deadline(),
            Duration::from_millis(250)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_returns_result_when_operation_settles_first() {
        let guard = TimeoutGuard::new(Duration::from_secs(1)).unwrap();

        let result = guard
            .run(
                async {
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Ok::<_, ScanError>(7)
                },
                None,
            )
            .await;

        assert_eq!(result.unwrap(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn test_times_out_operation_that_never_settles() {
        let guard = TimeoutGuard::new(Duration::from_millis(500)).unwrap();
        let start = tokio::time::Instant::now();

        let result = guard
            .run(std::future::pending::<ScanOutcome<()>>(), None)
            .await;

        assert!(matches!(result, Err(ScanError::Timeout { timeout }) if timeout == Duration::from_millis(500)));
        assert!(start.elapsed() >= Duration::from_millis(500));
        assert!(start.elapsed() < Duration::from_millis(520));
    }

    struct DropFlag(Arc<AtomicBool>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::SeqCst);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_expiry_drops_in_flight_operation() {
        let guard = TimeoutGuard::new(Duration::from_millis(100)).unwrap();
        let dropped = Arc::new(AtomicBool::new(false));
        let flag = DropFlag(Arc::clone(&dropped));

        let result = guard
            .run(
                async move {
                    let _flag = flag;
                    std::future::pending::<ScanOutcome<()>>().await
                },
                None,
            )
            .await;

        assert!(result.is_err());
        assert!(dropped.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_wins_over_long_deadline() {
        let guard = TimeoutGuard::new(Duration::from_secs(30)).unwrap();
        let token = CancellationToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let start = tokio::time::Instant::now();
        let result = guard
            .run(std::future::pending::<ScanOutcome<()>>(), Some(&token))
            .await;

        assert_eq!(result.unwrap_err().kind(), FailureKind::Cancelled);
        assert!(start.elapsed() < Duration::from_millis(100));
    }
}
