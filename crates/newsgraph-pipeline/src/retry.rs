//! Retry with exponential back-off and jitter for external lookups.
//!
//! [`retry_with_backoff`] wraps any fallible async operation and retries on
//! errors that [`FetchError::is_transient`] accepts. Everything else is
//! returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::FetchError;

const MAX_DELAY_MS: u64 = 30_000;

/// Back-off before retry `attempt` (1-based), before jitter.
fn backoff_ms(attempt: u32, backoff_base_ms: u64) -> u64 {
    backoff_base_ms
        .saturating_mul(1u64 << (attempt - 1).min(10))
        .min(MAX_DELAY_MS)
}

/// Longest [`retry_with_backoff`] can take when every attempt runs for the
/// full `per_attempt` and fails transiently: all attempts plus the largest
/// jittered sleep between each.
pub(crate) fn worst_case_duration(
    per_attempt: Duration,
    max_retries: u32,
    backoff_base_ms: u64,
) -> Duration {
    let attempts = per_attempt.saturating_mul(max_retries.saturating_add(1));
    let sleeps_ms: u64 = (1..=max_retries)
        .map(|attempt| backoff_ms(attempt, backoff_base_ms).saturating_mul(5) / 4)
        .fold(0, u64::saturating_add);
    attempts.saturating_add(Duration::from_millis(sleeps_ms))
}

/// Runs `operation` with up to `max_retries` additional attempts on transient
/// errors.
///
/// Back-off schedule with `backoff_base_ms = 500`:
///
/// | Attempt | Sleep before next attempt     |
/// |---------|-------------------------------|
/// | 1       | 500 ms × 2⁰ ± 25 % jitter     |
/// | 2       | 500 ms × 2¹ ± 25 % jitter     |
///
/// Delay is capped at 30 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !err.is_transient() || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let capped = backoff_ms(attempt, backoff_base_ms);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient lookup error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
