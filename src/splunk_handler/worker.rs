//! Worker thread driving the flush timer and batch delivery.
//!
//! The worker is the only consumer of the event queue. It sleeps on its
//! command channel until either a command arrives or the flush timer's
//! deadline passes, so timer firings, producer nudges, drains and shutdown are
//! all serialised on one thread and no two flushes ever run concurrently.

use std::{io, sync::Arc, thread, time::Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use log::debug;

use crate::diagnostics::{DIAGNOSTIC_TARGET, Reporter};

use super::{
    config::SplunkHandlerConfig,
    queue::{EventQueue, QueueReceiver, event_queue},
    sender::BatchSender,
    timer::FlushTimer,
    transport::Transport,
};

/// Commands processed by the worker thread.
pub(crate) enum WorkerCommand {
    /// Flush one batch immediately; sent by producers blocked on a full queue.
    Flush,
    /// Flush every event queued at receipt, then acknowledge with `true`, or
    /// `false` when `deadline` passed first.
    Drain {
        ack: Sender<bool>,
        deadline: Option<Instant>,
    },
    /// Final drain, cancel the timer, acknowledge and exit.
    Shutdown(Sender<()>),
}

/// Handles returned by [`spawn_worker`].
pub(crate) struct WorkerParts {
    pub(crate) queue: EventQueue,
    pub(crate) control: Sender<WorkerCommand>,
    pub(crate) handle: thread::JoinHandle<()>,
}

/// Spawns the background worker owning the queue's consumer half.
pub(crate) fn spawn_worker(
    config: &SplunkHandlerConfig,
    transport: Arc<dyn Transport>,
    reporter: Arc<dyn Reporter>,
) -> io::Result<WorkerParts> {
    let (control, control_rx) = unbounded();
    let (queue, receiver) = event_queue(
        config.max_queue_size,
        config.overflow_policy,
        Arc::clone(&reporter),
        control.clone(),
    );
    let worker = Worker {
        queue: receiver,
        sender: BatchSender::new(config, transport, reporter),
        timer: FlushTimer::new(config.flush_interval),
        debug: config.debug,
    };
    let handle = thread::Builder::new()
        .name("splunk-logging-worker".into())
        .spawn(move || worker.run(control_rx))?;
    Ok(WorkerParts {
        queue,
        control,
        handle,
    })
}

struct Worker {
    queue: QueueReceiver,
    sender: BatchSender,
    timer: FlushTimer,
    debug: bool,
}

impl Worker {
    fn run(mut self, control: Receiver<WorkerCommand>) {
        self.timer.schedule(Instant::now());
        loop {
            let command = match self.timer.deadline() {
                Some(deadline) => control.recv_deadline(deadline),
                None => control.recv().map_err(|_| RecvTimeoutError::Disconnected),
            };
            match command {
                Ok(WorkerCommand::Flush) => self.flush_now(),
                Ok(WorkerCommand::Drain { ack, deadline }) => {
                    let drained = self.drain(deadline);
                    // Ignore send error: the caller may have stopped waiting.
                    let _ = ack.send(drained);
                }
                Ok(WorkerCommand::Shutdown(ack)) => {
                    self.shutdown();
                    let _ = ack.send(());
                    break;
                }
                Err(RecvTimeoutError::Timeout) => self.fire_timer(),
                Err(RecvTimeoutError::Disconnected) => {
                    self.shutdown();
                    break;
                }
            }
        }
    }

    fn fire_timer(&mut self) {
        if !self.timer.begin_firing(Instant::now()) {
            return;
        }
        self.sender.send_batch(&self.queue);
        self.timer.finish_firing(Instant::now());
    }

    fn flush_now(&mut self) {
        if self.sender.send_batch(&self.queue) > 0 {
            self.timer.schedule(Instant::now());
        }
    }

    /// Send batches until every event queued on entry has been flushed.
    ///
    /// Events enqueued while draining may ride along in the same batches but
    /// are not waited for, so concurrent producers cannot stall the drain.
    fn drain(&mut self, deadline: Option<Instant>) -> bool {
        let mut remaining = self.queue.len();
        if self.debug {
            debug!(target: DIAGNOSTIC_TARGET, "Splunk handler draining {remaining} queued events");
        }
        let mut completed = true;
        while remaining > 0 {
            if deadline.is_some_and(|d| Instant::now() >= d) {
                completed = false;
                break;
            }
            let sent = self.sender.send_batch(&self.queue);
            if sent == 0 {
                break;
            }
            remaining = remaining.saturating_sub(sent);
        }
        self.timer.schedule(Instant::now());
        completed
    }

    fn shutdown(&mut self) {
        self.drain(None);
        self.timer.cancel();
        if self.debug {
            debug!(target: DIAGNOSTIC_TARGET, "Splunk handler worker stopped");
        }
    }
}
