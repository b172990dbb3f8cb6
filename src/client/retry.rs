//! Retry wrapper for the course search host.
//!
//! The upstream host drops connections regularly but always comes back, so
//! transient failures are retried without limit unless a ceiling is
//! configured. Permanent failures are handed straight back to the caller.

use super::Fetch;
use crate::error::FetchError;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// Exponential backoff with an optional attempt ceiling.
///
/// ```text
/// delay(n) = min(base_delay * multiplier^(n - 1), max_delay)
/// ```
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    base_delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    max_attempts: Option<u32>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(60),
            multiplier: 2.0,
            max_attempts: None,
        }
    }
}

impl RetryPolicy {
    pub fn new(
        base_delay: Duration,
        max_delay: Duration,
        multiplier: f64,
        max_attempts: Option<u32>,
    ) -> Self {
        Self {
            base_delay,
            max_delay: max_delay.max(base_delay),
            multiplier: multiplier.max(1.0),
            max_attempts: max_attempts.map(|n| n.max(1)),
        }
    }

    /// Retries immediately and forever.
    pub fn immediate() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO, 1.0, None)
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts.max(1));
        self
    }

    pub fn max_attempts(&self) -> Option<u32> {
        self.max_attempts
    }

    /// Delay to wait after `attempt` (1-indexed) failed.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(63) as i32;
        let delay_ms = self.base_delay.as_millis() as f64 * self.multiplier.powi(exponent);
        let capped = delay_ms.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    fn exhausted(&self, attempt: u32) -> bool {
        self.max_attempts.is_some_and(|max| attempt >= max)
    }
}

pub struct RetryingFetcher<F> {
    inner: F,
    policy: RetryPolicy,
}

impl<F: Fetch> RetryingFetcher<F> {
    pub fn new(inner: F, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl<F: Fetch> Fetch for RetryingFetcher<F> {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let mut attempt = 1;
        loop {
            match self.inner.fetch(url).await {
                Ok(body) => {
                    if attempt > 1 {
                        debug!(url, attempt, "[retry] recovered");
                    }
                    return Ok(body);
                }
                Err(FetchError::Transient(reason)) => {
                    if self.policy.exhausted(attempt) {
                        warn!(url, attempt, "[retry] giving up: {}", reason);
                        return Err(FetchError::Exhausted {
                            url: url.to_string(),
                            attempts: attempt,
                            last_error: reason,
                        });
                    }
                    let delay = self.policy.delay_for(attempt);
                    debug!(
                        url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "[retry] transient failure: {}",
                        reason
                    );
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                    attempt += 1;
                }
                Err(other) => return Err(other),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    struct Flaky {
        failures: u32,
        calls: AtomicU32,
        permanent: bool,
    }

    impl Flaky {
        fn new(failures: u32) -> Self {
            Self {
                failures,
                calls: AtomicU32::new(0),
                permanent: false,
            }
        }
    }

    #[async_trait]
    impl Fetch for Flaky {
        async fn fetch(&self, url: &str) -> Result<String, FetchError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if self.permanent {
                return Err(FetchError::Permanent("bad url".into()));
            }
            if call <= self.failures {
                Err(FetchError::Transient("connection reset".into()))
            } else {
                Ok(format!("<html>{}</html>", url))
            }
        }
    }

    #[tokio::test]
    async fn two_connection_failures_then_success_looks_like_one_success() {
        let flaky = RetryingFetcher::new(Flaky::new(2), RetryPolicy::immediate());
        let steady = RetryingFetcher::new(Flaky::new(0), RetryPolicy::immediate());

        let retried = flaky.fetch("http://host/detail").await.unwrap();
        let direct = steady.fetch("http://host/detail").await.unwrap();

        assert_eq!(retried, direct);
        assert_eq!(flaky.inner.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn ceiling_stops_retrying() {
        let fetcher = RetryingFetcher::new(
            Flaky::new(10),
            RetryPolicy::immediate().with_max_attempts(4),
        );
        let err = fetcher.fetch("http://host/x").await.unwrap_err();
        assert!(matches!(err, FetchError::Exhausted { attempts: 4, .. }));
        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn permanent_failures_are_not_retried() {
        let mut inner = Flaky::new(0);
        inner.permanent = true;
        let fetcher = RetryingFetcher::new(inner, RetryPolicy::immediate());
        let err = fetcher.fetch("http://host/x").await.unwrap_err();
        assert!(matches!(err, FetchError::Permanent(_)));
        assert_eq!(fetcher.inner.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn backoff_grows_and_caps() {
        let policy = RetryPolicy::new(
            Duration::from_millis(100),
            Duration::from_millis(1000),
            2.0,
            None,
        );
        assert_eq!(policy.delay_for(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for(4), Duration::from_millis(800));
        assert_eq!(policy.delay_for(5), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(500), Duration::from_millis(1000));
    }
}
