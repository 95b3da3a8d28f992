//! Shared exponential-backoff-with-jitter retry helper, used by the
//! Conversation Generator and the LLM-as-Judge scorer alike so the two call
//! sites never drift into inconsistent backoff shapes.

use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Backoff parameters for a bounded retry loop.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            attempts,
            base_delay,
            max_delay,
        }
    }

    /// `base_delay * 2^attempt`, capped at `max_delay`, plus up to 250ms of jitter.
    fn delay_for(&self, attempt: u32) -> Duration {
        let scaled = self
            .base_delay
            .saturating_mul(1u32.checked_shl(attempt).unwrap_or(u32::MAX));
        let capped = scaled.min(self.max_delay);
        let jitter_ms = rand::thread_rng().gen_range(0..250);
        capped + Duration::from_millis(jitter_ms)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1), Duration::from_secs(30))
    }
}

/// Run `op` up to `policy.attempts` times, sleeping with exponential backoff
/// and jitter between failures. Returns the last error if every attempt
/// fails.
pub async fn retry<T, E, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut last_err = None;
    for attempt in 0..policy.attempts {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) => {
                last_err = Some(err);
                if attempt + 1 < policy.attempts {
                    tokio::time::sleep(policy.delay_for(attempt)).await;
                }
            }
        }
    }
    Err(last_err.expect("loop runs at least once since attempts > 0"))
}
