//! Diagnostic side channel for the Splunk handler.
//!
//! Queue overflow and delivery failures never surface as errors on the
//! application's logging path. They are reported to a [`Reporter`] instead.
//! The default [`LogReporter`] writes them through the `log` facade under
//! [`DIAGNOSTIC_TARGET`]; the `log` and `tracing` bridges refuse to forward
//! records from that target, so diagnostics never loop back into Splunk.

use std::fmt;
use std::time::Duration;

use log::{debug, warn};

use crate::rate_limited_warner::RateLimitedWarner;

/// `log` target used for all diagnostics emitted by this crate.
pub const DIAGNOSTIC_TARGET: &str = "splunk_logging::diagnostics";

/// A notice emitted by the handler about its own operation.
#[derive(Clone, Debug, PartialEq)]
pub enum Diagnostic {
    /// An event was rejected because the queue was full.
    QueueFull,
    /// An event arrived after the handler was closed.
    HandlerClosed,
    /// A batch was delivered successfully.
    BatchDelivered { events: usize, bytes: usize },
    /// A delivery attempt failed transiently and will be retried.
    DeliveryRetry {
        attempt: u32,
        delay: Duration,
        reason: String,
    },
    /// Retries were exhausted; the batch was dropped.
    DeliveryFailed { events: usize, reason: String },
    /// The collector rejected the batch with a non-retryable status.
    DeliveryRejected { events: usize, status: u16 },
}

impl Diagnostic {
    /// Whether the notice represents lost data.
    pub fn is_drop(&self) -> bool {
        matches!(
            self,
            Self::QueueFull
                | Self::HandlerClosed
                | Self::DeliveryFailed { .. }
                | Self::DeliveryRejected { .. }
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull => f.write_str("log queue full; log data will be dropped"),
            Self::HandlerClosed => f.write_str("handler closed; log data will be dropped"),
            Self::BatchDelivered { events, bytes } => {
                write!(f, "delivered {events} events ({bytes} bytes)")
            }
            Self::DeliveryRetry {
                attempt,
                delay,
                reason,
            } => write!(
                f,
                "delivery attempt failed ({reason}); retry {attempt} in {delay:?}"
            ),
            Self::DeliveryFailed { events, reason } => {
                write!(f, "dropped {events} events after exhausting retries: {reason}")
            }
            Self::DeliveryRejected { events, status } => {
                write!(f, "collector rejected {events} events with status {status}")
            }
        }
    }
}

/// Receiver for handler diagnostics.
///
/// Implementations are called from producer threads (queue notices) and from
/// the worker thread (delivery notices), so they must not block for long.
pub trait Reporter: Send + Sync {
    fn report(&self, diagnostic: &Diagnostic);

    /// Emit anything the reporter is holding back. Called on drain and close.
    fn flush(&self) {}
}

/// Default reporter writing diagnostics through the `log` facade.
///
/// Queue-full notices are aggregated through a [`RateLimitedWarner`] so a
/// saturated queue does not flood the diagnostic log. Successful deliveries
/// and retries are only logged when `debug` is enabled.
#[derive(Debug)]
pub struct LogReporter {
    debug: bool,
    warner: RateLimitedWarner,
}

impl LogReporter {
    pub fn new(debug: bool, warner: RateLimitedWarner) -> Self {
        Self { debug, warner }
    }
}

fn warn_queue_full(count: u64) {
    warn!(
        target: DIAGNOSTIC_TARGET,
        "Splunk handler {}; {count} events dropped",
        Diagnostic::QueueFull
    );
}

impl Reporter for LogReporter {
    fn report(&self, diagnostic: &Diagnostic) {
        match diagnostic {
            Diagnostic::QueueFull => {
                self.warner.record_drop();
                self.warner.warn_if_due(warn_queue_full);
            }
            Diagnostic::HandlerClosed => {
                warn!(target: DIAGNOSTIC_TARGET, "Splunk handler {diagnostic}");
            }
            Diagnostic::BatchDelivered { .. } | Diagnostic::DeliveryRetry { .. } => {
                if self.debug {
                    debug!(target: DIAGNOSTIC_TARGET, "Splunk handler {diagnostic}");
                }
            }
            Diagnostic::DeliveryFailed { .. } | Diagnostic::DeliveryRejected { .. } => {
                warn!(target: DIAGNOSTIC_TARGET, "Splunk handler {diagnostic}");
            }
        }
    }

    /// Emit any queue-full notices still held back by the rate limiter.
    fn flush(&self) {
        self.warner.flush(warn_queue_full);
    }
}

/// Returns `true` for `log`/`tracing` targets that must never be forwarded to
/// Splunk: this crate's own diagnostics and the HTTP transport's logging.
pub(crate) fn is_internal_target(target: &str) -> bool {
    ["splunk_logging", "ureq", "rustls", "native_tls"]
        .iter()
        .any(|prefix| {
            target == *prefix
                || target
                    .strip_prefix(prefix)
                    .is_some_and(|rest| rest.starts_with("::"))
        })
}
