//! Buffered log forwarding to a Splunk HTTP Event Collector.
//!
//! Records handed to a [`SplunkHandler`] are formatted into HEC events,
//! queued in memory and shipped in batches by a background worker. The
//! optional `log` and `tracing` bridges plug the handler into an
//! application's existing logging setup.
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! use splunk_logging::{HandlerBuilderTrait, SplunkHandlerBuilder, SplunkLogAdapter};
//!
//! let handler = SplunkHandlerBuilder::new()
//!     .with_host("splunk.example.com")
//!     .with_token("00000000-0000-0000-0000-000000000000")
//!     .with_flush_interval(Duration::from_secs(5))
//!     .build_inner()?;
//! splunk_logging::install_global_logger(SplunkLogAdapter::new(
//!     Arc::new(handler),
//!     log::LevelFilter::Info,
//! ))?;
//! log::info!("service started");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod diagnostics;
pub mod formatter;
pub mod handler;
pub mod handlers;
pub mod level;
#[cfg(feature = "log-compat")]
pub mod log_compat;
pub mod log_record;
pub mod rate_limited_warner;
pub mod splunk_handler;
#[cfg(any(test, feature = "test-util"))]
pub mod test_utils;
#[cfg(feature = "tracing-compat")]
pub mod tracing_compat;

pub use diagnostics::{DIAGNOSTIC_TARGET, Diagnostic, LogReporter, Reporter};
pub use formatter::{Event, EventFormatter, build_payload};
pub use handler::{HandlerError, LogHandler};
pub use handlers::{HandlerBuildError, HandlerBuilderTrait, HandlerOptions, SplunkHandlerBuilder};
pub use level::Level;
#[cfg(feature = "log-compat")]
pub use log_compat::{SplunkLogAdapter, install_global_logger};
pub use log_record::{LogRecord, Overrides, RecordMetadata};
pub use rate_limited_warner::RateLimitedWarner;
pub use splunk_handler::{
    HecRequest, OverflowPolicy, Protocol, RetryPolicy, SplunkHandler, SplunkHandlerConfig,
    Transport, TransportError, UreqTransport,
};
#[cfg(feature = "tracing-compat")]
pub use tracing_compat::SplunkLayer;
