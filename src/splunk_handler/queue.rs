//! Bounded event queue shared by producers and the worker.
//!
//! The queue is a channel hand-off: every producer enqueues through an
//! [`EventQueue`] (the sending half) and the worker is the single consumer of
//! the [`QueueReceiver`]. The channel provides the mutual exclusion, so length
//! checks, enqueues and drains never race into lost or duplicated events.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TrySendError, bounded, unbounded};

use crate::diagnostics::{Diagnostic, Reporter};
use crate::formatter::Event;
use crate::handler::HandlerError;

use super::config::OverflowPolicy;
use super::worker::WorkerCommand;

/// Create a queue holding at most `max_queue_size` events (0 = unbounded).
///
/// `nudge` is the worker's command channel; producers blocked by
/// [`OverflowPolicy::Block`] use it to request an immediate flush.
pub(crate) fn event_queue(
    max_queue_size: usize,
    policy: OverflowPolicy,
    reporter: Arc<dyn Reporter>,
    nudge: Sender<WorkerCommand>,
) -> (EventQueue, QueueReceiver) {
    let (tx, rx) = if max_queue_size == 0 {
        unbounded()
    } else {
        bounded(max_queue_size)
    };
    let queue = EventQueue {
        tx,
        policy,
        reporter,
        nudge,
    };
    let receiver = QueueReceiver {
        rx,
        batch_limit: max_queue_size,
    };
    (queue, receiver)
}

/// Producer half of the queue.
pub(crate) struct EventQueue {
    tx: Sender<Event>,
    policy: OverflowPolicy,
    reporter: Arc<dyn Reporter>,
    nudge: Sender<WorkerCommand>,
}

impl EventQueue {
    /// Enqueue `event`, applying the overflow policy when the queue is full.
    ///
    /// # Errors
    ///
    /// * [`HandlerError::QueueFull`] - the queue is at capacity under
    ///   [`OverflowPolicy::Drop`]; one drop notice has been reported.
    /// * [`HandlerError::Closed`] - the worker has exited.
    pub(crate) fn enqueue(&self, event: Event) -> Result<(), HandlerError> {
        match self.tx.try_send(event) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(event)) => match self.policy {
                OverflowPolicy::Drop => {
                    self.reporter.report(&Diagnostic::QueueFull);
                    Err(HandlerError::QueueFull)
                }
                OverflowPolicy::Block => {
                    // Ignore send error: a missing worker surfaces below.
                    let _ = self.nudge.send(WorkerCommand::Flush);
                    self.tx.send(event).map_err(|_| self.closed())
                }
            },
            Err(TrySendError::Disconnected(_)) => Err(self.closed()),
        }
    }

    fn closed(&self) -> HandlerError {
        self.reporter.report(&Diagnostic::HandlerClosed);
        HandlerError::Closed
    }

    pub(crate) fn len(&self) -> usize {
        self.tx.len()
    }
}

/// Consumer half of the queue, owned by the worker.
pub(crate) struct QueueReceiver {
    rx: Receiver<Event>,
    batch_limit: usize,
}

impl QueueReceiver {
    /// Remove up to `max_items` of the oldest events, in FIFO order.
    pub(crate) fn drain(&self, max_items: usize) -> Vec<Event> {
        let mut batch = Vec::with_capacity(max_items.min(self.rx.len()));
        while batch.len() < max_items {
            match self.rx.try_recv() {
                Ok(event) => batch.push(event),
                Err(_) => break,
            }
        }
        batch
    }

    /// Drain one flush-sized batch: at most the queue capacity, or everything
    /// queued right now when the queue is unbounded.
    pub(crate) fn drain_batch(&self) -> Vec<Event> {
        let limit = match self.batch_limit {
            0 => self.rx.len(),
            limit => limit,
        };
        self.drain(limit)
    }

    pub(crate) fn len(&self) -> usize {
        self.rx.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
