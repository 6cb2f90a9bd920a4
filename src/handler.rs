use thiserror::Error;

use crate::log_record::LogRecord;

/// Reasons a record was not accepted by a handler.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum HandlerError {
    /// The queue was at capacity and the overflow policy drops records.
    #[error("queue full; event dropped")]
    QueueFull,
    /// The handler has been closed and its worker has exited.
    #[error("handler is closed")]
    Closed,
}

/// Trait implemented by log sinks.
///
/// Implementations must be shareable across producer threads. `handle` never
/// performs network I/O on the caller's thread.
pub trait LogHandler: Send + Sync {
    /// Dispatch a log record for handling.
    fn handle(&self, record: LogRecord) -> Result<(), HandlerError>;

    /// Flush pending records, returning `true` when the flush completed.
    fn flush(&self) -> bool {
        true
    }
}
