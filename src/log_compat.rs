//! Compatibility bridge for the Rust `log` crate.
//!
//! [`SplunkLogAdapter`] implements `log::Log`, converting each record into a
//! [`LogRecord`] and handing it to a shared [`LogHandler`]. The record target
//! becomes the logger name. Key-value pairs whose key starts with `_` become
//! per-record override fields; other pairs are ignored.
//!
//! Records from this crate's diagnostic target and from the HTTP stack are
//! never forwarded, so handler diagnostics cannot feed back into Splunk.

use std::sync::Arc;

use log::kv::{self, VisitSource};
use log::{LevelFilter, Metadata, Record, SetLoggerError};
use serde_json::Value;

use crate::diagnostics::is_internal_target;
use crate::handler::LogHandler;
use crate::level::Level;
use crate::log_record::{LogRecord, Overrides, RecordMetadata};

/// Adapter implementing the Rust `log::Log` trait on top of a handler.
pub struct SplunkLogAdapter {
    handler: Arc<dyn LogHandler>,
    max_level: LevelFilter,
}

impl SplunkLogAdapter {
    /// Forward records at or above `max_level` to `handler`.
    pub fn new(handler: Arc<dyn LogHandler>, max_level: LevelFilter) -> Self {
        Self { handler, max_level }
    }

    fn to_log_record(record: &Record<'_>) -> LogRecord {
        let metadata = RecordMetadata {
            overrides: collect_overrides(record.key_values()),
            ..Default::default()
        };
        LogRecord::with_metadata(
            record.target(),
            Level::from(record.level()),
            &record.args().to_string(),
            metadata,
        )
    }
}

impl log::Log for SplunkLogAdapter {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.level() <= self.max_level && !is_internal_target(metadata.target())
    }

    fn log(&self, record: &Record<'_>) {
        if !self.enabled(record.metadata()) {
            return;
        }
        // Failures are already reported through the handler's diagnostics.
        let _ = self.handler.handle(Self::to_log_record(record));
    }

    fn flush(&self) {
        self.handler.flush();
    }
}

struct OverrideVisitor(Overrides);

impl<'kvs> VisitSource<'kvs> for OverrideVisitor {
    fn visit_pair(&mut self, key: kv::Key<'kvs>, value: kv::Value<'kvs>) -> Result<(), kv::Error> {
        if key.as_str().starts_with('_') {
            self.0.insert(key.as_str().to_owned(), kv_to_json(&value));
        }
        Ok(())
    }
}

fn collect_overrides(source: &dyn kv::Source) -> Overrides {
    let mut visitor = OverrideVisitor(Overrides::new());
    // The visitor never fails.
    let _ = source.visit(&mut visitor);
    visitor.0
}

fn kv_to_json(value: &kv::Value<'_>) -> Value {
    if let Some(b) = value.to_bool() {
        Value::from(b)
    } else if let Some(n) = value.to_i64() {
        Value::from(n)
    } else if let Some(n) = value.to_u64() {
        Value::from(n)
    } else if let Some(n) = value.to_f64() {
        Value::from(n)
    } else {
        Value::String(value.to_string())
    }
}

/// Install `adapter` as the global `log` logger and raise the global maximum
/// level to the adapter's.
///
/// Fails when another global logger is already installed.
pub fn install_global_logger(adapter: SplunkLogAdapter) -> Result<(), SetLoggerError> {
    let max_level = adapter.max_level;
    log::set_boxed_logger(Box::new(adapter))?;
    log::set_max_level(max_level);
    Ok(())
}
