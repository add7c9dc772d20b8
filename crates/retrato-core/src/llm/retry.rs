//! Rate-limit retry with pluggable backoff.
//!
//! Only [`LlmError::RateLimited`] is retried. Any other failure propagates
//! on the spot without touching the retry budget. The delay between attempts
//! comes from the policy's [`BackoffStrategy`], and the wait is an async
//! sleep so other sessions keep running.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use retrato_types::config::{BackoffStrategy, RetryPolicy};
use retrato_types::llm::LlmError;

/// Delay before retry number `attempt` (1-based).
pub fn backoff_delay(strategy: &BackoffStrategy, attempt: u32) -> Duration {
    match strategy {
        BackoffStrategy::Exponential {
            base_ms,
            cap_ms,
            max_jitter_ms,
        } => {
            let jitter = if *max_jitter_ms == 0 {
                0
            } else {
                rand::thread_rng().gen_range(0..*max_jitter_ms)
            };
            Duration::from_millis(exponential_ms(*base_ms, *cap_ms, attempt, jitter))
        }
        BackoffStrategy::Linear { step_ms } => {
            Duration::from_millis(step_ms.saturating_mul(u64::from(attempt)))
        }
    }
}

/// `min(2^attempt * base + jitter, cap)`, saturating instead of overflowing.
fn exponential_ms(base_ms: u64, cap_ms: u64, attempt: u32, jitter_ms: u64) -> u64 {
    let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
    base_ms
        .saturating_mul(factor)
        .saturating_add(jitter_ms)
        .min(cap_ms)
}

/// Run `call` until it succeeds, fails fatally, or exhausts `policy.max_retries`.
///
/// The underlying call runs at most `max_retries + 1` times. `provider` is only
/// used for log fields.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    provider: &str,
    mut call: F,
) -> Result<T, LlmError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, LlmError>>,
{
    let mut retries = 0u32;

    loop {
        match call().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_rate_limited() && retries < policy.max_retries => {
                retries += 1;
                let delay = backoff_delay(&policy.backoff, retries);
                tracing::warn!(
                    provider,
                    attempt = retries,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Rate limited, backing off before retry"
                );
                tokio::time::sleep(delay).await;
            }
            Err(err) => {
                if err.is_rate_limited() {
                    tracing::error!(
                        provider,
                        retries,
                        error = %err,
                        "Rate limit retries exhausted"
                    );
                }
                return Err(err);
            }
        }
    }
}
