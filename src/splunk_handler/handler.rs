//! Public handler type exported by the crate.

use std::{
    sync::Arc,
    thread,
    time::{Duration, Instant},
};

use crossbeam_channel::{Sender, bounded};
use log::warn;
use parking_lot::Mutex;

use crate::{
    diagnostics::{DIAGNOSTIC_TARGET, Diagnostic, LogReporter, Reporter},
    formatter::EventFormatter,
    handler::{HandlerError, LogHandler},
    handlers::HandlerBuildError,
    log_record::LogRecord,
    rate_limited_warner::RateLimitedWarner,
};

use super::{
    config::SplunkHandlerConfig,
    queue::EventQueue,
    transport::{Transport, UreqTransport},
    worker::{WorkerCommand, WorkerParts, spawn_worker},
};

/// Handler forwarding records to a Splunk HTTP Event Collector.
///
/// Records are formatted on the caller's thread and queued; a background
/// worker flushes the queue every `flush_interval` as one concatenated POST.
/// Producers never wait on the network. They only block on a full queue when
/// the overflow policy is [`Block`](super::OverflowPolicy::Block).
///
/// Dropping the handler performs a final drain, bounded by
/// `shutdown_timeout`.
pub struct SplunkHandler {
    queue: Option<EventQueue>,
    control: Option<Sender<WorkerCommand>>,
    handle: Mutex<Option<thread::JoinHandle<()>>>,
    formatter: EventFormatter,
    reporter: Arc<dyn Reporter>,
    /// Timeout for `flush` and for the final drain on `close`.
    flush_timeout: Duration,
}

impl SplunkHandler {
    /// Construct the handler with the default `ureq` transport and a
    /// [`LogReporter`] for diagnostics.
    pub fn with_config(config: SplunkHandlerConfig) -> Result<Self, HandlerBuildError> {
        let transport = Arc::new(UreqTransport::from_config(&config)?);
        let reporter = default_reporter(&config);
        Self::with_parts(config, transport, reporter)
    }

    /// Construct the handler with an explicit transport and reporter.
    pub fn with_parts(
        config: SplunkHandlerConfig,
        transport: Arc<dyn Transport>,
        reporter: Arc<dyn Reporter>,
    ) -> Result<Self, HandlerBuildError> {
        let WorkerParts {
            queue,
            control,
            handle,
        } = spawn_worker(&config, transport, Arc::clone(&reporter))?;
        Ok(Self {
            queue: Some(queue),
            control: Some(control),
            handle: Mutex::new(Some(handle)),
            formatter: EventFormatter::from_config(&config),
            reporter,
            flush_timeout: config.shutdown_timeout,
        })
    }

    /// Number of events waiting in the queue.
    pub fn queued(&self) -> usize {
        self.queue.as_ref().map_or(0, EventQueue::len)
    }

    /// Flush immediately, bypassing the timer, until every event queued when
    /// this was called has been sent or `timeout` elapses.
    ///
    /// Returns `true` when the drain completed. Events enqueued concurrently
    /// may or may not be included. `None`, or a timeout too large to
    /// represent, waits without a deadline.
    pub fn wait_until_empty(&self, timeout: Option<Duration>) -> bool {
        let Some(control) = self.control.as_ref() else {
            return false;
        };
        // A timeout past the end of `Instant`'s range means no deadline.
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        let (ack_tx, ack_rx) = bounded(1);
        if control
            .send(WorkerCommand::Drain {
                ack: ack_tx,
                deadline,
            })
            .is_err()
        {
            return false;
        }
        let drained = match deadline {
            Some(deadline) => ack_rx.recv_deadline(deadline).unwrap_or(false),
            None => ack_rx.recv().unwrap_or(false),
        };
        self.reporter.flush();
        drained
    }

    /// Close the handler: final drain, then wait for the worker to exit.
    pub fn close(&mut self) {
        self.queue.take();
        self.request_shutdown();
        self.reporter.flush();
    }

    fn request_shutdown(&mut self) {
        let Some(control) = self.control.take() else {
            return;
        };
        let (ack_tx, ack_rx) = bounded(1);
        if control.send(WorkerCommand::Shutdown(ack_tx)).is_err() {
            self.join_worker();
            return;
        }
        if ack_rx.recv_timeout(self.flush_timeout).is_err() {
            warn!(
                target: DIAGNOSTIC_TARGET,
                "SplunkHandler: worker did not finish its final drain within {:?}",
                self.flush_timeout
            );
            return;
        }
        self.join_worker();
    }

    fn join_worker(&mut self) {
        let Some(handle) = self.handle.lock().take() else {
            return;
        };
        if handle.join().is_err() {
            warn!(target: DIAGNOSTIC_TARGET, "SplunkHandler: worker thread panicked");
        }
    }
}

/// [`LogReporter`] honouring the config's `debug` flag and warning interval.
pub fn default_reporter(config: &SplunkHandlerConfig) -> Arc<dyn Reporter> {
    Arc::new(LogReporter::new(
        config.debug,
        RateLimitedWarner::new(config.warn_interval),
    ))
}

impl LogHandler for SplunkHandler {
    fn handle(&self, record: LogRecord) -> Result<(), HandlerError> {
        let Some(queue) = self.queue.as_ref() else {
            self.reporter.report(&Diagnostic::HandlerClosed);
            return Err(HandlerError::Closed);
        };
        queue.enqueue(self.formatter.format_record(&record))
    }

    fn flush(&self) -> bool {
        self.wait_until_empty(Some(self.flush_timeout))
    }
}

impl Drop for SplunkHandler {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for SplunkHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SplunkHandler")
            .field("queued", &self.queued())
            .field("flush_timeout", &self.flush_timeout)
            .finish()
    }
}
