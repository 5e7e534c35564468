use std::future::Future;
use std::time::Duration;
use tokio_retry::strategy::FixedInterval;
use tokio_retry::Retry;

use crate::config::RetryConfig;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            delay: Duration::from_secs(3),
        }
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            attempts: config.attempts,
            delay: Duration::from_secs(config.delay_secs),
        }
    }
}

impl RetryPolicy {
    pub fn new(attempts: u32, delay: Duration) -> Self {
        Self { attempts, delay }
    }

    /// Attempts actually made; zero is treated as a single try.
    pub fn effective_attempts(&self) -> u32 {
        self.attempts.max(1)
    }
}

/// Runs `op` until it succeeds or the policy's attempts are used up.
///
/// Every failure is logged and followed by a pause, except the last one.
/// Exhaustion yields `default`; errors never escape.
pub async fn retry_or_default<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    default: T,
    mut op: F,
) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.effective_attempts();
    let strategy = FixedInterval::new(policy.delay).take(attempts as usize - 1);
    let mut attempt = 0u32;

    let outcome = Retry::spawn(strategy, || {
        attempt += 1;
        let current = attempt;
        let fut = op();
        async move {
            fut.await.map_err(|e| {
                tracing::warn!("{}: attempt {}/{} failed: {}", label, current, attempts, e);
                e
            })
        }
    })
    .await;

    match outcome {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!("{}: giving up after {} attempts, last error: {}", label, attempts, e);
            default
        }
    }
}

/// Boolean form of [`retry_or_default`]; exhaustion means "not in stock".
pub async fn reliable_check<F, Fut>(policy: &RetryPolicy, label: &str, op: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    retry_or_default(policy, label, false, op).await
}
