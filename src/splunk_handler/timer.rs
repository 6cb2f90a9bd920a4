//! One-shot, re-armable flush schedule.
//!
//! The worker owns a single [`FlushTimer`]. It is armed for
//! `flush_interval` from "now", fires once, and is re-armed only after the
//! flush completes, so two timer-driven flushes can never overlap.

use std::time::{Duration, Instant};

/// Lifecycle of the flush schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TimerState {
    /// No flush is scheduled.
    Idle,
    /// A flush is due at the given instant.
    Scheduled(Instant),
    /// A flush is in progress.
    Firing,
}

#[derive(Debug)]
pub(crate) struct FlushTimer {
    interval: Duration,
    state: TimerState,
}

impl FlushTimer {
    pub(crate) fn new(interval: Duration) -> Self {
        Self {
            interval,
            state: TimerState::Idle,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> TimerState {
        self.state
    }

    /// Arm (or re-arm) the timer to fire one interval after `now`.
    ///
    /// An interval too large to represent as an `Instant` leaves the timer
    /// idle; only explicit flushes and drains send in that case.
    pub(crate) fn schedule(&mut self, now: Instant) {
        self.state = match now.checked_add(self.interval) {
            Some(at) => TimerState::Scheduled(at),
            None => TimerState::Idle,
        };
    }

    /// Instant of the next firing, if armed.
    pub(crate) fn deadline(&self) -> Option<Instant> {
        match self.state {
            TimerState::Scheduled(at) => Some(at),
            TimerState::Idle | TimerState::Firing => None,
        }
    }

    /// Transition `Scheduled -> Firing` when the deadline has passed.
    ///
    /// Returns `false` (and leaves the state untouched) otherwise.
    pub(crate) fn begin_firing(&mut self, now: Instant) -> bool {
        match self.state {
            TimerState::Scheduled(at) if at <= now => {
                self.state = TimerState::Firing;
                true
            }
            _ => false,
        }
    }

    /// Complete a firing and re-arm one interval after `now`.
    ///
    /// Shutdown goes through [`cancel`](Self::cancel) instead.
    pub(crate) fn finish_firing(&mut self, now: Instant) {
        self.schedule(now);
    }

    /// Drop any pending schedule.
    pub(crate) fn cancel(&mut self) {
        self.state = TimerState::Idle;
    }
}
