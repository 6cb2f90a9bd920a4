//! Buffered handler forwarding records to a Splunk HTTP Event Collector.
//!
//! [`SplunkHandler`] formats each record into a HEC event on the caller's
//! thread and places it on a bounded queue. A dedicated worker thread flushes
//! the queue on a re-armed one-shot timer, posting each batch as a single
//! concatenated JSON payload with exponential-backoff retries. Callers can
//! force a synchronous flush through
//! [`wait_until_empty`](SplunkHandler::wait_until_empty).

mod backoff;
mod config;
mod handler;
mod queue;
mod sender;
mod timer;
mod transport;
mod worker;

pub use backoff::{DEFAULT_BACKOFF_CAP, DEFAULT_RETRY_BACKOFF, DEFAULT_RETRY_COUNT, RetryPolicy};
pub use config::{
    COLLECTOR_PATH, DEFAULT_FLUSH_INTERVAL, DEFAULT_INDEX, DEFAULT_PORT, DEFAULT_QUEUE_SIZE,
    DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_SOURCETYPE, DEFAULT_TIMEOUT, OverflowPolicy, Protocol,
    SplunkHandlerConfig, local_hostname,
};
pub use handler::{SplunkHandler, default_reporter};
pub use sender::ResponseClass;
pub use transport::{HecRequest, Transport, TransportError, UreqTransport};

#[cfg(test)]
mod tests;
