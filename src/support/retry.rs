//! Retry with exponential backoff
//!
//! Wraps persistence updates that can lose an optimistic version race
//! (bill numbering, payments, late fees). The rating core is never retried.

use std::future::Future;
use std::time::Duration;

use tracing::{info, warn};

use super::errors::DomainError;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Attempts including the first one
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub backoff_multiplier: f64,
    pub max_delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(25),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_millis(500),
        }
    }
}

impl RetryConfig {
    pub fn with_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Sleep before each retry: `initial, initial×m, initial×m², ...`
    /// capped at `max_delay`. Yields `max_attempts - 1` values.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + '_ {
        let retries = self.max_attempts.max(1) - 1;
        std::iter::successors(Some(self.initial_delay), move |d| {
            Some(d.mul_f64(self.backoff_multiplier).min(self.max_delay))
        })
        .map(move |d| d.min(self.max_delay))
        .take(retries as usize)
    }
}

/// Run `operation` until it succeeds, fails with an error `should_retry`
/// rejects, or the attempts run out. The last error is returned.
pub async fn retry_with_backoff<F, Fut, T, E>(
    config: RetryConfig,
    mut operation: F,
    should_retry: impl Fn(&E) -> bool,
    operation_name: &str,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    let mut delays = config.delays();
    let mut attempt = 1u32;

    loop {
        let err = match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    info!(operation = operation_name, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) => err,
        };

        let next_delay = if should_retry(&err) { delays.next() } else { None };
        let Some(delay) = next_delay else {
            warn!(operation = operation_name, attempt, error = %err, "Giving up");
            return Err(err);
        };

        warn!(
            operation = operation_name,
            attempt,
            error = %err,
            retry_in_ms = delay.as_millis() as u64,
            "Retrying"
        );
        tokio::time::sleep(delay).await;
        attempt += 1;
    }
}

/// [`retry_with_backoff`] that retries only on [`DomainError::Conflict`],
/// i.e. a lost optimistic-version or unique-number race.
pub async fn retry_on_conflict<F, Fut, T>(
    config: RetryConfig,
    operation: F,
    operation_name: &str,
) -> Result<T, DomainError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, DomainError>>,
{
    retry_with_backoff(
        config,
        operation,
        |e: &DomainError| matches!(e, DomainError::Conflict(_)),
        operation_name,
    )
    .await
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn fast() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            initial_delay: Duration::from_millis(1),
            backoff_multiplier: 2.0,
            max_delay: Duration::from_millis(5),
        }
    }

    #[test]
    fn delays_grow_then_cap() {
        let config = RetryConfig {
            max_attempts: 5,
            initial_delay: Duration::from_millis(10),
            backoff_multiplier: 3.0,
            max_delay: Duration::from_millis(50),
        };
        let delays: Vec<u64> = config.delays().map(|d| d.as_millis() as u64).collect();
        assert_eq!(delays, vec![10, 30, 50, 50]);
        assert_eq!(RetryConfig::with_attempts(1).delays().count(), 0);
    }

    #[tokio::test]
    async fn conflicts_are_retried_until_success() {
        let calls = AtomicU32::new(0);
        let result = retry_on_conflict(
            fast(),
            || async {
                let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                if n < 3 {
                    Err(DomainError::Conflict(format!("version race {n}")))
                } else {
                    Ok(n)
                }
            },
            "test",
        )
        .await;

        assert_eq!(result, Ok(3));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn validation_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), DomainError> = retry_on_conflict(
            fast(),
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(DomainError::Validation("overpayment".into()))
            },
            "test",
        )
        .await;

        assert!(matches!(result, Err(DomainError::Validation(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), String> = retry_with_backoff(
            fast(),
            || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err("still busy".to_string())
            },
            |_| true,
            "test",
        )
        .await;

        assert_eq!(result, Err("still busy".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
