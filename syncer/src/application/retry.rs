use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

use crate::utils::logging;

/// Delay policy for a retried operation. Injectable so tests can
/// substitute a deterministic strategy.
pub trait RetryStrategy: Send + Sync {
    /// Delay before the given attempt (1-based)
    fn delay(&self, attempt: u32) -> Duration;
}

/// Exponential backoff with bounded jitter
pub struct ExponentialBackoff {
    min_ms: u64,
    max_ms: u64,
    max_jitter_ms: u64,
}

impl ExponentialBackoff {
    pub fn new(min_ms: u64, max_ms: u64, max_jitter_ms: u64) -> Self {
        Self {
            min_ms,
            max_ms,
            max_jitter_ms,
        }
    }
}

impl Default for ExponentialBackoff {
    fn default() -> Self {
        Self::new(1_000, 20_000, 250)
    }
}

impl RetryStrategy for ExponentialBackoff {
    fn delay(&self, attempt: u32) -> Duration {
        let exp = self
            .min_ms
            .saturating_mul(2u64.saturating_pow(attempt.saturating_sub(1)))
            .min(self.max_ms);
        let jitter = if self.max_jitter_ms > 0 {
            rand::thread_rng().gen_range(0..=self.max_jitter_ms)
        } else {
            0
        };
        Duration::from_millis(exp + jitter)
    }
}

/// Constant delay, for tests
pub struct FixedDelay(pub Duration);

impl RetryStrategy for FixedDelay {
    fn delay(&self, _attempt: u32) -> Duration {
        self.0
    }
}

/// Runs operations under a bounded retry policy
pub struct RetryHandler {
    max_attempts: u32,
    strategy: Box<dyn RetryStrategy>,
}

impl RetryHandler {
    pub fn new() -> Self {
        Self::with_strategy(10, Box::new(ExponentialBackoff::default()))
    }

    pub fn with_strategy(max_attempts: u32, strategy: Box<dyn RetryStrategy>) -> Self {
        Self {
            max_attempts,
            strategy,
        }
    }

    /// Execute an operation, retrying transient failures until the
    /// attempt cap is reached. The final error is returned unchanged.
    pub async fn execute_with_retry<F, Fut, T, E>(
        &self,
        operation: F,
        operation_name: &str,
    ) -> Result<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: std::fmt::Display,
    {
        let mut attempt = 0;

        loop {
            match operation().await {
                Ok(result) => {
                    if attempt > 0 {
                        logging::log_info(&format!(
                            "{} succeeded after {} retries",
                            operation_name, attempt
                        ));
                    }
                    return Ok(result);
                }
                Err(e) => {
                    attempt += 1;

                    if attempt >= self.max_attempts {
                        logging::log_error(&format!(
                            "{} failed after {} attempts: {}",
                            operation_name, self.max_attempts, e
                        ));
                        return Err(e);
                    }

                    let delay = self.strategy.delay(attempt);
                    logging::log_error(&format!(
                        "{} failed (attempt {}/{}): {}. Retrying in {}ms",
                        operation_name,
                        attempt,
                        self.max_attempts,
                        e,
                        delay.as_millis()
                    ));

                    sleep(delay).await;
                }
            }
        }
    }
}

impl Default for RetryHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn instant_handler(max_attempts: u32) -> RetryHandler {
        RetryHandler::with_strategy(max_attempts, Box::new(FixedDelay(Duration::ZERO)))
    }

    #[tokio::test]
    async fn returns_first_success() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = instant_handler(10)
            .execute_with_retry(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Ok(7) }
                },
                "op",
            )
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_failures_then_succeeds() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = instant_handler(10)
            .execute_with_retry(
                || {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    async move {
                        if n < 2 {
                            Err("transient".to_string())
                        } else {
                            Ok(42)
                        }
                    }
                },
                "op",
            )
            .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn stops_at_attempt_cap() {
        let calls = AtomicU32::new(0);
        let result: Result<u32, String> = instant_handler(10)
            .execute_with_retry(
                || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    async { Err("always".to_string()) }
                },
                "op",
            )
            .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 10);
    }

    #[test]
    fn exponential_backoff_is_bounded() {
        let strategy = ExponentialBackoff::new(1_000, 20_000, 0);
        assert_eq!(strategy.delay(1), Duration::from_millis(1_000));
        assert_eq!(strategy.delay(2), Duration::from_millis(2_000));
        assert_eq!(strategy.delay(5), Duration::from_millis(16_000));
        assert_eq!(strategy.delay(6), Duration::from_millis(20_000));
        assert_eq!(strategy.delay(60), Duration::from_millis(20_000));
    }

    #[test]
    fn jitter_stays_within_cap() {
        let strategy = ExponentialBackoff::new(1_000, 20_000, 250);
        for attempt in 1..=10 {
            let base = ExponentialBackoff::new(1_000, 20_000, 0).delay(attempt);
            let jittered = strategy.delay(attempt);
            assert!(jittered >= base);
            assert!(jittered <= base + Duration::from_millis(250));
        }
    }
}
