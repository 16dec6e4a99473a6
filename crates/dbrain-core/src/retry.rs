//! Bounded exponential backoff for rate-limited upstream calls.
//!
//! Every call site runs its own loop; nothing about past 429s is remembered
//! between calls.

use std::{future::Future, time::Duration};

use tokio::time::sleep;
use tracing::{error, warn};

use crate::{errors::Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BackoffPolicy {
    /// Retries after the first attempt; `0` means "call once".
    pub max_retries: u32,
    pub base_delay: Duration,
    /// Upper bound for a single wait.
    pub max_delay: Duration,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl BackoffPolicy {
    /// Wait before retry number `attempt + 1`: `base_delay * 2^attempt`, capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

/// Parse an HTTP `Retry-After` value given in seconds. HTTP-date forms are ignored.
pub fn parse_retry_after(value: Option<&str>) -> Option<Duration> {
    let secs: f64 = value?.trim().parse().ok()?;
    (secs.is_finite() && secs >= 0.0).then(|| Duration::from_secs_f64(secs))
}

/// Run `op`, retrying with exponential backoff while it fails with a rate-limit error.
///
/// Non-rate-limit errors are returned as-is on the first occurrence. Once
/// `policy.max_retries` retries are spent the result is
/// [`Error::RateLimitExceeded`] for `service`.
pub async fn handle_rate_limit<T, F, Fut>(policy: &BackoffPolicy, service: &str, mut op: F) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let mut attempt = 0u32;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) if e.is_rate_limit() => {
                if attempt >= policy.max_retries {
                    error!(
                        "{service}: rate limit persisted after {} retries: {e}",
                        policy.max_retries
                    );
                    return Err(Error::RateLimitExceeded {
                        service: service.to_string(),
                        attempts: policy.max_retries,
                    });
                }
                let wait = policy.delay_for(attempt);
                attempt += 1;
                warn!(
                    "{service}: rate limit hit (attempt {attempt}/{}), waiting {:.1}s before retry",
                    policy.max_retries,
                    wait.as_secs_f64()
                );
                sleep(wait).await;
            }
            Err(e) => return Err(e),
        }
    }
}
