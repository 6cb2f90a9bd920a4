use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;

/// Default interval between dropped-event warnings.
pub const DEFAULT_WARN_INTERVAL: Duration = Duration::from_secs(5);

/// Aggregates dropped-event notices into periodic warnings.
///
/// Callers count drops with [`record_drop`]. [`warn_if_due`] hands the
/// accumulated count to its callback at most once per interval, and
/// [`flush`] hands over whatever is pending regardless of the interval.
///
/// [`record_drop`]: RateLimitedWarner::record_drop
/// [`warn_if_due`]: RateLimitedWarner::warn_if_due
/// [`flush`]: RateLimitedWarner::flush
#[derive(Debug)]
pub struct RateLimitedWarner {
    interval: Duration,
    last_warn: Mutex<Option<Instant>>,
    dropped: AtomicU64,
}

impl Default for RateLimitedWarner {
    fn default() -> Self {
        Self::new(DEFAULT_WARN_INTERVAL)
    }
}

impl RateLimitedWarner {
    /// Create a new warner. The first warning is emitted without delay.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_warn: Mutex::new(None),
            dropped: AtomicU64::new(0),
        }
    }

    pub fn record_drop(&self) {
        self.dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of drops recorded since the last emitted warning.
    pub fn pending(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Emit a warning if the interval has elapsed since the previous one.
    pub fn warn_if_due(&self, warn: impl FnOnce(u64)) {
        let now = Instant::now();
        let mut last = self.last_warn.lock();
        if last.is_some_and(|at| now.duration_since(at) < self.interval) {
            return;
        }
        let count = self.dropped.swap(0, Ordering::Relaxed);
        if count > 0 {
            *last = Some(now);
            warn(count);
        }
    }

    /// Emit a warning for pending drops immediately.
    pub fn flush(&self, warn: impl FnOnce(u64)) {
        let mut last = self.last_warn.lock();
        let count = self.dropped.swap(0, Ordering::Relaxed);
        if count > 0 {
            *last = Some(Instant::now());
            warn(count);
        }
    }
}
