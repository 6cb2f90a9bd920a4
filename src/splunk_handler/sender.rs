//! Batch delivery with retry and backoff.
//!
//! The sender drains one batch from the queue, concatenates the events into a
//! single payload and POSTs it to the collector. Responses are classified for
//! retry decisions:
//!
//! - **2xx**: delivered.
//! - **429 / 5xx / network errors**: retried with exponential backoff until
//!   the retry budget is spent, then the batch is dropped.
//! - **Other statuses (4xx)**: dropped without retry.
//!
//! Every outcome is reported through the diagnostic side channel; nothing is
//! returned to producers and a failed batch is never re-queued.

use std::{sync::Arc, thread};

use crate::diagnostics::{Diagnostic, Reporter};
use crate::formatter::{Event, build_payload};

use super::backoff::RetryPolicy;
use super::config::SplunkHandlerConfig;
use super::queue::QueueReceiver;
use super::transport::{HecRequest, Transport};

/// Classification of an HTTP response for retry logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseClass {
    /// 2xx responses - request succeeded.
    Success,
    /// 5xx or 429 - retry with backoff.
    Retryable,
    /// Anything else - permanent failure, do not retry.
    Permanent,
}

/// Classifies an HTTP status code for retry logic.
pub(crate) fn classify_status(status: u16) -> ResponseClass {
    match status {
        200..=299 => ResponseClass::Success,
        429 => ResponseClass::Retryable,
        500..=599 => ResponseClass::Retryable,
        _ => ResponseClass::Permanent,
    }
}

/// Final result of delivering one batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeliveryOutcome {
    Delivered,
    /// Non-retryable status; batch dropped.
    Rejected,
    /// Retries exhausted; batch dropped.
    Failed,
}

pub(crate) struct BatchSender {
    transport: Arc<dyn Transport>,
    url: String,
    authorization: String,
    retry: RetryPolicy,
    reporter: Arc<dyn Reporter>,
}

impl BatchSender {
    pub(crate) fn new(
        config: &SplunkHandlerConfig,
        transport: Arc<dyn Transport>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            transport,
            url: config.endpoint_url(),
            authorization: config.authorization(),
            retry: config.retry.clone(),
            reporter,
        }
    }

    /// Drain one batch and deliver it. Returns the number of events drained;
    /// zero means the queue was empty and nothing was sent.
    pub(crate) fn send_batch(&self, queue: &QueueReceiver) -> usize {
        let batch = queue.drain_batch();
        if batch.is_empty() {
            return 0;
        }
        self.deliver(&batch);
        batch.len()
    }

    /// POST `events` as one payload, retrying transient failures.
    pub(crate) fn deliver(&self, events: &[Event]) -> DeliveryOutcome {
        let request = HecRequest {
            url: self.url.clone(),
            authorization: self.authorization.clone(),
            body: build_payload(events),
        };

        let mut attempt = 0;
        loop {
            let reason = match self.transport.post(&request) {
                Ok(status) => match classify_status(status) {
                    ResponseClass::Success => {
                        self.reporter.report(&Diagnostic::BatchDelivered {
                            events: events.len(),
                            bytes: request.body.len(),
                        });
                        return DeliveryOutcome::Delivered;
                    }
                    ResponseClass::Permanent => {
                        self.reporter.report(&Diagnostic::DeliveryRejected {
                            events: events.len(),
                            status,
                        });
                        return DeliveryOutcome::Rejected;
                    }
                    ResponseClass::Retryable => format!("server returned status {status}"),
                },
                Err(err) => err.to_string(),
            };

            if !self.retry.allows_retry(attempt) {
                self.reporter.report(&Diagnostic::DeliveryFailed {
                    events: events.len(),
                    reason,
                });
                return DeliveryOutcome::Failed;
            }

            let delay = self.retry.delay(attempt);
            attempt += 1;
            self.reporter.report(&Diagnostic::DeliveryRetry {
                attempt,
                delay,
                reason,
            });
            thread::sleep(delay);
        }
    }
}
