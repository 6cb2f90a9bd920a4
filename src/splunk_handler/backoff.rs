//! Exponential backoff policy used by the batch sender.

use std::time::Duration;

/// Default number of retries after the first failed attempt.
pub const DEFAULT_RETRY_COUNT: u32 = 5;
/// Default delay before the first retry.
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(2);
/// Upper bound applied to any single backoff delay.
pub const DEFAULT_BACKOFF_CAP: Duration = Duration::from_secs(60);

/// Retry budget and delays for transient delivery failures.
///
/// The delay before retry `n` (zero-based) is `base * 2^n`, capped at `cap`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Number of retries after the initial attempt.
    pub retry_count: u32,
    pub base: Duration,
    pub cap: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            retry_count: DEFAULT_RETRY_COUNT,
            base: DEFAULT_RETRY_BACKOFF,
            cap: DEFAULT_BACKOFF_CAP,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait before retry number `attempt` (zero-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base.saturating_mul(factor).min(self.cap)
    }

    /// Whether another retry is allowed after `attempt` retries so far.
    pub fn allows_retry(&self, attempt: u32) -> bool {
        attempt < self.retry_count
    }
}
