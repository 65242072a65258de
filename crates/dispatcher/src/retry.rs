//! Retry with capped exponential backoff and additive jitter
//!
//! Delay before retry `n` (0-based) is `min(base * 2^n + jitter, max_delay)`,
//! with jitter drawn uniformly from `[0, jitter]`.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use contracts::RetryConfig;
use rand::Rng;
use tokio::time::Instant;
use tracing::debug;

/// Backoff parameters for one batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Upper bound of the random jitter
    pub jitter: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: config.base_delay(),
            max_delay: config.max_delay(),
            jitter: config.jitter(),
        }
    }

    /// Single attempt, no backoff
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_jitter(mut self, jitter: Duration) -> Self {
        self.jitter = jitter;
        self
    }

    /// Total delivery calls allowed
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Delay before retry `attempt` (0-based) for a given jitter sample
    pub fn delay_for_attempt(&self, attempt: u32, jitter: Duration) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .saturating_mul(factor)
            .saturating_add(jitter)
            .min(self.max_delay)
    }

    /// Delay before retry `attempt` with a fresh jitter sample
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.delay_for_attempt(attempt, self.sample_jitter())
    }

    fn sample_jitter(&self) -> Duration {
        if self.jitter.is_zero() {
            return Duration::ZERO;
        }
        let bound = u64::try_from(self.jitter.as_nanos()).unwrap_or(u64::MAX);
        Duration::from_nanos(rand::rng().random_range(0..=bound))
    }
}

/// Why the retry loop gave up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError<E> {
    /// Non-retryable error; returned immediately
    Rejected(E),
    /// Budget used up; carries the last error
    Exhausted(E),
}

impl<E> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            Self::Rejected(e) | Self::Exhausted(e) => e,
        }
    }
}

/// Result of a retried operation
#[derive(Debug)]
pub struct RetryOutcome<T, E> {
    pub result: Result<T, RetryError<E>>,
    /// Number of times the operation was invoked
    pub attempts: u32,
    /// Total time spent, sleeps included
    pub elapsed: Duration,
}

/// Run `operation` until it succeeds, fails fatally, or the budget runs out
///
/// `operation` receives the 0-based attempt number. `is_retryable` decides
/// whether an error is worth another attempt.
///
/// # Example
///
/// ```rust,ignore
/// let outcome = retry_with_backoff(&policy, DeliveryError::is_retryable, |attempt| {
///     transport.deliver(&payload)
/// })
/// .await;
/// ```
pub async fn retry_with_backoff<T, E, F, Fut, P>(
    policy: &RetryPolicy,
    is_retryable: P,
    mut operation: F,
) -> RetryOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
    P: Fn(&E) -> bool,
    E: Display,
{
    let start = Instant::now();
    let mut attempt = 0u32;

    loop {
        let error = match operation(attempt).await {
            Ok(value) => {
                return RetryOutcome {
                    result: Ok(value),
                    attempts: attempt + 1,
                    elapsed: start.elapsed(),
                };
            }
            Err(e) => e,
        };

        let result = if !is_retryable(&error) {
            Err(RetryError::Rejected(error))
        } else if attempt >= policy.max_retries {
            Err(RetryError::Exhausted(error))
        } else {
            let delay = policy.backoff(attempt);
            debug!(
                attempt = attempt + 1,
                max_attempts = policy.max_attempts(),
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Backing off before retry"
            );
            observability::record_retry(delay);
            tokio::time::sleep(delay).await;
            attempt += 1;
            continue;
        };

        return RetryOutcome {
            result,
            attempts: attempt + 1,
            elapsed: start.elapsed(),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[derive(Debug, PartialEq)]
    enum TestError {
        Transient,
        Fatal,
    }

    impl Display for TestError {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{:?}", self)
        }
    }

    fn retryable(e: &TestError) -> bool {
        *e == TestError::Transient
    }

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            jitter: Duration::ZERO,
        }
    }

    #[test]
    fn test_delay_schedule() {
        let p = policy(7);
        let delays: Vec<_> = (0..7)
            .map(|n| p.delay_for_attempt(n, Duration::ZERO).as_millis())
            .collect();
        assert_eq!(delays, vec![500, 1000, 2000, 4000, 8000, 10000, 10000]);

        assert_eq!(
            p.delay_for_attempt(1, Duration::from_millis(250)),
            Duration::from_millis(1250)
        );
        assert_eq!(p.delay_for_attempt(40, Duration::ZERO), p.max_delay);
    }

    #[test]
    fn test_backoff_bounds() {
        let p = policy(7).with_jitter(Duration::from_millis(250));
        for attempt in 0..10 {
            let low = p.delay_for_attempt(attempt, Duration::ZERO);
            let high = p.delay_for_attempt(attempt, p.jitter);
            let sampled = p.backoff(attempt);
            assert!(sampled >= low && sampled <= high);
            assert!(sampled <= p.max_delay);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let outcome = retry_with_backoff(&policy(7), retryable, |_| {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(TestError::Transient)
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(outcome.result, Ok(2));
        assert_eq!(outcome.attempts, 3);
        assert!(outcome.elapsed >= Duration::from_millis(1500));
        assert!(outcome.elapsed < Duration::from_millis(1600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_error_stops_immediately() {
        let outcome: RetryOutcome<(), _> =
            retry_with_backoff(&policy(7), retryable, |_| async { Err(TestError::Fatal) }).await;

        assert_eq!(outcome.result, Err(RetryError::Rejected(TestError::Fatal)));
        assert_eq!(outcome.attempts, 1);
        assert!(outcome.elapsed < Duration::from_millis(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_exhausted() {
        let seen = std::sync::Mutex::new(Vec::new());
        let outcome: RetryOutcome<(), _> = retry_with_backoff(&policy(3), retryable, |attempt| {
            seen.lock().unwrap().push(attempt);
            async { Err(TestError::Transient) }
        })
        .await;

        assert_eq!(outcome.result, Err(RetryError::Exhausted(TestError::Transient)));
        assert_eq!(outcome.attempts, 4);
        assert_eq!(*seen.lock().unwrap(), vec![0, 1, 2, 3]);
        // 500 + 1000 + 2000, no sleep after the last attempt
        assert!(outcome.elapsed >= Duration::from_millis(3500));
        assert!(outcome.elapsed < Duration::from_millis(3600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_retry_policy() {
        let outcome: RetryOutcome<(), _> =
            retry_with_backoff(&RetryPolicy::no_retry(), retryable, |_| async {
                Err(TestError::Transient)
            })
            .await;
        assert_eq!(outcome.attempts, 1);
        assert!(matches!(outcome.result, Err(RetryError::Exhausted(_))));
    }
}
