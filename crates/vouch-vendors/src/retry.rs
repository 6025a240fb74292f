//! Bounded retry with jittered exponential backoff.
//!
//! Retry decisions are driven by [`VendorError::is_retryable`]: transport
//! timeouts, connection failures, and the transient HTTP statuses retry;
//! vendor error envelopes and decode failures do not. Each attempt is
//! logged with its attempt count and the computed delay.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use vouch_common::{RetryConfig, VendorError};

/// Observes retry attempts, for analytics sinks that want more than the
/// ambient log line.
pub trait RetryObserver: Send + Sync {
    fn retried(&self, vendor: &str, attempt: u32, next_retry: Duration);
}

/// Retry policy for one vendor endpoint.
#[derive(Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
    observer: Option<Arc<dyn RetryObserver>>,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            observer: None,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn RetryObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Delay before retry number `attempt` (1-based), with ±25% jitter so
    /// a fleet retrying against the same vendor staggers its calls.
    fn delay_for(&self, attempt: u32) -> Duration {
        let base = self.config.base_interval().as_millis() as f64;
        let factor = self.config.backoff_factor.max(1.0);
        let raw = base * factor.powi(attempt.saturating_sub(1) as i32);
        let jitter = rand::rng().random_range(0.75..=1.25);
        let capped = (raw * jitter).min(self.config.max_interval().as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// Run `operation` up to the configured attempt budget.
    ///
    /// Returns the first success, the first permanent failure, or
    /// [`VendorError::RetriesExhausted`] wrapping the final attempt's
    /// error.
    pub async fn run<T, F, Fut>(&self, vendor: &str, mut operation: F) -> Result<T, VendorError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, VendorError>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) if error.is_retryable() && attempt < max_attempts => {
                    let delay = self.delay_for(attempt);
                    tracing::warn!(
                        vendor,
                        attempt,
                        next_retry_ms = delay.as_millis() as u64,
                        error = %error,
                        "vendor call failed, retrying"
                    );
                    if let Some(observer) = &self.observer {
                        observer.retried(vendor, attempt, delay);
                    }
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(error) if error.is_retryable() => {
                    return Err(VendorError::RetriesExhausted {
                        attempts: attempt,
                        last: Box::new(error),
                    });
                }
                Err(error) => return Err(error),
            }
        }
    }
}
