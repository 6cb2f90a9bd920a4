//! Log record representation handed to the Splunk handler.
//!
//! A [`LogRecord`] is what the host logging framework produces: a logger
//! name, a level, a message, and the time the record was created. Callers may
//! attach override fields (`_time`, `_host`, `_index`, `_source`,
//! `_sourcetype`) which the formatter applies to that single event when the
//! handler allows overrides.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::Value;

use crate::level::Level;

/// Per-record override fields keyed by their reserved `_`-prefixed name.
pub type Overrides = BTreeMap<String, Value>;

/// Additional context associated with a log record.
#[derive(Clone, Debug, PartialEq)]
pub struct RecordMetadata {
    /// Time the record was created.
    pub timestamp: SystemTime,
    /// Override fields supplied by the caller.
    pub overrides: Overrides,
}

impl Default for RecordMetadata {
    fn default() -> Self {
        Self {
            timestamp: SystemTime::now(),
            overrides: Overrides::new(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LogRecord {
    /// Name of the logger that created this record.
    pub logger: String,
    pub level: Level,
    /// The log message content.
    pub message: String,
    /// Contextual metadata for the record.
    pub metadata: RecordMetadata,
}

impl LogRecord {
    /// Construct a new log record stamped with the current time.
    pub fn new(logger: &str, level: Level, message: &str) -> Self {
        Self::with_metadata(logger, level, message, RecordMetadata::default())
    }

    /// Construct a log record with explicit metadata.
    pub fn with_metadata(
        logger: &str,
        level: Level,
        message: &str,
        metadata: RecordMetadata,
    ) -> Self {
        Self {
            logger: logger.to_owned(),
            level,
            message: message.to_owned(),
            metadata,
        }
    }

    /// Replace the creation timestamp.
    pub fn at(mut self, timestamp: SystemTime) -> Self {
        self.metadata.timestamp = timestamp;
        self
    }

    /// Attach a single override field.
    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.overrides.insert(key.into(), value.into());
        self
    }

    pub fn overrides(&self) -> &Overrides {
        &self.metadata.overrides
    }

    /// Creation time in fractional seconds since the Unix epoch.
    ///
    /// Timestamps before the epoch collapse to zero.
    pub fn created(&self) -> f64 {
        self.metadata
            .timestamp
            .duration_since(UNIX_EPOCH)
            .map(|dur| dur.as_secs_f64())
            .unwrap_or_default()
    }
}

impl fmt::Display for LogRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] {}", self.logger, self.level, self.message)
    }
}
