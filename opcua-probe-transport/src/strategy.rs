//! Connect strategy with deterministic exponential backoff
//!
//! The strategy is configuration handed to the protocol stack's connect
//! primitive. Stacks call [`connect_with_retry`] to honour it, so the backoff
//! schedule and the per-attempt timeout are identical regardless of which
//! stack is plugged in.

use opcua_probe_core::{UaError, UaResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};

/// Retry configuration for the connect phase
///
/// Delays grow by a factor of two from `initial_delay` and are capped at
/// `max_delay`. There is no jitter: two strategies with the same values always
/// produce the same schedule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectStrategy {
    /// Reconnect attempts after the first one
    pub max_retry: u32,
    /// Delay before the first reconnect
    pub initial_delay: Duration,
    /// Upper bound on any single delay
    pub max_delay: Duration,
    /// Bound on each individual attempt; `None` leaves attempts unbounded
    pub attempt_timeout: Option<Duration>,
}

impl Default for ConnectStrategy {
    fn default() -> Self {
        Self {
            max_retry: 1,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(10_000),
            attempt_timeout: None,
        }
    }
}

impl ConnectStrategy {
    /// Single attempt, no backoff
    pub fn no_retry() -> Self {
        Self {
            max_retry: 0,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            attempt_timeout: None,
        }
    }

    pub fn with_max_retry(mut self, max_retry: u32) -> Self {
        self.max_retry = max_retry;
        self
    }

    pub fn with_delays(mut self, initial: Duration, max: Duration) -> Self {
        self.initial_delay = initial;
        self.max_delay = max.max(initial);
        self
    }

    pub fn with_attempt_timeout(mut self, attempt_timeout: Duration) -> Self {
        self.attempt_timeout = Some(attempt_timeout);
        self
    }

    /// Delay before reconnect number `retry` (zero-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 2u32.checked_pow(retry).unwrap_or(u32::MAX);
        self.initial_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }

    /// The full backoff schedule, one entry per reconnect
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        (0..self.max_retry).map(|retry| self.delay_for(retry))
    }

    /// Sum of all backoff delays
    pub fn total_backoff(&self) -> Duration {
        self.delays().sum()
    }

    /// Longest a full [`connect_with_retry`] run can take: every attempt
    /// timing out plus the whole backoff schedule
    ///
    /// `None` when attempts are unbounded.
    pub fn worst_case(&self) -> Option<Duration> {
        let attempts = self.max_retry.saturating_add(1);
        let per_attempt = self.attempt_timeout?;
        Some(
            per_attempt
                .checked_mul(attempts)
                .and_then(|total| total.checked_add(self.total_backoff()))
                .unwrap_or(Duration::MAX),
        )
    }
}

/// Run `attempt` until it succeeds, the error is not retryable, or the
/// strategy is exhausted
///
/// # Arguments
/// * `strategy` - Backoff schedule and retry limit
/// * `attempt` - Produces one connect attempt per call
///
/// An attempt that outlives `strategy.attempt_timeout` is dropped and counts
/// as a retryable `UaError::Timeout`.
///
/// # Errors
/// Returns the error of the last attempt
pub async fn connect_with_retry<T, F, Fut>(strategy: &ConnectStrategy, mut attempt: F) -> UaResult<T>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = UaResult<T>>,
{
    let mut retry = 0;

    loop {
        let outcome = match strategy.attempt_timeout {
            Some(limit) => timeout(limit, attempt(retry))
                .await
                .unwrap_or(Err(UaError::Timeout)),
            None => attempt(retry).await,
        };

        match outcome {
            Ok(value) => return Ok(value),
            Err(err) => {
                if retry >= strategy.max_retry || !err.is_retryable() {
                    return Err(err);
                }

                let delay = strategy.delay_for(retry);
                log::debug!(
                    "Connect attempt {}/{} failed: {}. Retrying in {:?}",
                    retry + 1,
                    strategy.max_retry + 1,
                    err,
                    delay
                );
                sleep(delay).await;
                retry += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio_test::{assert_err, assert_ok};

    #[test]
    fn test_default_strategy() {
        let strategy = ConnectStrategy::default();
        assert_eq!(strategy.max_retry, 1);
        assert_eq!(strategy.initial_delay, Duration::from_secs(1));
        assert_eq!(strategy.max_delay, Duration::from_secs(10));
    }

    #[test]
    fn test_schedule_is_deterministic_and_capped() {
        let strategy = ConnectStrategy::default()
            .with_max_retry(6)
            .with_delays(Duration::from_millis(500), Duration::from_secs(5));
        let schedule: Vec<_> = strategy.delays().map(|d| d.as_millis()).collect();
        assert_eq!(schedule, vec![500, 1000, 2000, 4000, 5000, 5000]);
        assert_eq!(strategy.delays().collect::<Vec<_>>(), strategy.delays().collect::<Vec<_>>());
        assert_eq!(strategy.total_backoff(), Duration::from_millis(17_500));
    }

    #[test]
    fn test_large_retry_index_does_not_overflow() {
        let strategy = ConnectStrategy::default();
        assert_eq!(strategy.delay_for(40), strategy.max_delay);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_errors() {
        let calls = AtomicU32::new(0);
        let strategy = ConnectStrategy::default().with_max_retry(3);

        let result = connect_with_retry(&strategy, |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(UaError::Connection("connection refused".into()))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(assert_ok!(result), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gives_up_after_max_retry() {
        let calls = AtomicU32::new(0);
        let strategy = ConnectStrategy::default().with_max_retry(2);

        let result: UaResult<()> = connect_with_retry(&strategy, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(UaError::Connection("no route to host".into())) }
        })
        .await;

        assert_err!(result);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_worst_case_covers_every_attempt() {
        let strategy = ConnectStrategy::default()
            .with_max_retry(2)
            .with_attempt_timeout(Duration::from_millis(2000));
        // 3 x 2000 ms attempts, then 1000 + 2000 ms of backoff
        assert_eq!(strategy.worst_case(), Some(Duration::from_millis(9000)));
        assert_eq!(ConnectStrategy::default().worst_case(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hung_attempt_times_out_and_is_retried() {
        let calls = AtomicU32::new(0);
        let strategy = ConnectStrategy::default()
            .with_max_retry(1)
            .with_attempt_timeout(Duration::from_millis(2000));

        let started = tokio::time::Instant::now();
        let result = connect_with_retry(&strategy, |retry| {
            calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if retry == 0 {
                    std::future::pending::<UaResult<u32>>().await
                } else {
                    Ok(retry)
                }
            }
        })
        .await;

        assert_eq!(assert_ok!(result), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(started.elapsed() >= Duration::from_millis(3000));
        assert!(started.elapsed() < Duration::from_millis(3100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_attempt_hanging_reports_timeout() {
        let strategy = ConnectStrategy::default()
            .with_max_retry(2)
            .with_attempt_timeout(Duration::from_millis(500));

        let result: UaResult<()> =
            connect_with_retry(&strategy, |_| std::future::pending::<UaResult<()>>()).await;

        assert_eq!(result, Err(UaError::Timeout));
    }

    #[tokio::test]
    async fn test_does_not_retry_permanent_errors() {
        let calls = AtomicU32::new(0);
        let strategy = ConnectStrategy::default().with_max_retry(5);

        let result: UaResult<()> = connect_with_retry(&strategy, |_| {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(UaError::InvalidEndpoint("http://x".into())) }
        })
        .await;

        assert_eq!(result, Err(UaError::InvalidEndpoint("http://x".into())));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
