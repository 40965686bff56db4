//! Exponential backoff with optional jitter.

use std::time::Duration;

use rand::Rng;

/// Delay before retry number `retry_index` (0 for the first retry).
///
/// `base * 2^retry_index`, capped at `max`. With `jitter`, up to 10% is added
/// on top of the capped value.
pub fn backoff_delay(retry_index: u32, base: Duration, max: Duration, jitter: bool) -> Duration {
    let base_ms = base.as_millis() as u64;
    let max_ms = max.as_millis() as u64;

    let exponential = 2u64.saturating_pow(retry_index);
    let capped = base_ms.saturating_mul(exponential).min(max_ms);

    let jitter_range = if jitter { capped / 10 } else { 0 };
    let extra = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped + extra)
}

/// Sum of the delays slept before `retries` retries, without jitter.
pub fn total_backoff(retries: u32, base: Duration, max: Duration) -> Duration {
    (0..retries).map(|i| backoff_delay(i, base, max, false)).sum()
}
