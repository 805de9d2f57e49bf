//! Fixed-delay retry for document-store calls.
//!
//! A [`RetryPolicy`] is built once (from config or in tests) and shared
//! through `AppState`; every retried read goes through [`retry`].

use std::{fmt, future::Future, sync::Arc, time::Duration};

use crate::store::StoreError;

type Retryable = Arc<dyn Fn(&StoreError) -> bool + Send + Sync>;

#[derive(Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
    retryable: Retryable,
}

impl RetryPolicy {
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);

    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            retryable: Arc::new(|_| true),
        }
    }

    /// Zero-delay policy.
    pub fn immediate(max_attempts: u32) -> Self {
        Self::new(max_attempts, Duration::ZERO)
    }

    /// Only retry errors accepted by `predicate`; anything else fails on the spot.
    pub fn retry_if<F>(mut self, predicate: F) -> Self
    where
        F: Fn(&StoreError) -> bool + Send + Sync + 'static,
    {
        self.retryable = Arc::new(predicate);
        self
    }

    pub fn is_retryable(&self, err: &StoreError) -> bool {
        (self.retryable)(err)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ATTEMPTS, Self::DEFAULT_DELAY)
    }
}

impl fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_attempts", &self.max_attempts)
            .field("delay", &self.delay)
            .finish_non_exhaustive()
    }
}

/// Run `operation` until it succeeds, hits a non-retryable error, or the
/// policy's attempts are used up. The last error is returned.
pub async fn retry<T, F, Fut>(policy: &RetryPolicy, op: &str, mut operation: F) -> Result<T, StoreError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, StoreError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if attempt < max_attempts && policy.is_retryable(&err) => {
                tracing::warn!(
                    op,
                    attempt,
                    max_attempts,
                    error = %err,
                    delay_ms = %policy.delay.as_millis(),
                    "store operation failed, retrying"
                );
                tokio::time::sleep(policy.delay).await;
                attempt += 1;
            }
            Err(err) => {
                tracing::warn!(op, attempt, error = %err, "store operation failed, giving up");
                return Err(err);
            }
        }
    }
}
