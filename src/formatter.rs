//! Conversion of log records into HEC events.
//!
//! [`EventFormatter`] captures the configured defaults (host, index, source,
//! sourcetype) and turns each [`LogRecord`] into an immutable [`Event`]. The
//! event is serialised exactly once, at construction, with the fixed key order
//! `event, host, index, source, sourcetype, time` so batches are byte-for-byte
//! reproducible.

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::log_record::{LogRecord, Overrides};
use crate::splunk_handler::SplunkHandlerConfig;

pub const OVERRIDE_TIME: &str = "_time";
pub const OVERRIDE_HOST: &str = "_host";
pub const OVERRIDE_INDEX: &str = "_index";
pub const OVERRIDE_SOURCE: &str = "_source";
pub const OVERRIDE_SOURCETYPE: &str = "_sourcetype";

/// Event timestamp in seconds, kept at millisecond precision.
///
/// Whole seconds serialise as integers (`10`), fractional ones as floats
/// (`10.25`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EventTime(f64);

impl EventTime {
    fn from_secs(secs: f64) -> Self {
        Self((secs * 1000.0).round() / 1000.0)
    }

    pub fn as_secs(self) -> f64 {
        self.0
    }
}

impl Serialize for EventTime {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        // Beyond 2^53 an f64 no longer has an exact integer form.
        if self.0.fract() == 0.0 && self.0.abs() < 9.0e15 {
            serializer.serialize_i64(self.0 as i64)
        } else {
            serializer.serialize_f64(self.0)
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
struct EventBody {
    event: Value,
    host: String,
    index: String,
    source: String,
    sourcetype: String,
    time: EventTime,
}

/// One serialised log record ready for transmission.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    body: EventBody,
    json: String,
}

impl Event {
    fn new(body: EventBody) -> Self {
        // Strings, JSON values and finite numbers cannot fail to serialise.
        let json = serde_json::to_string(&body).unwrap_or_default();
        Self { body, json }
    }

    pub fn event(&self) -> &Value {
        &self.body.event
    }

    pub fn host(&self) -> &str {
        &self.body.host
    }

    pub fn index(&self) -> &str {
        &self.body.index
    }

    pub fn source(&self) -> &str {
        &self.body.source
    }

    pub fn sourcetype(&self) -> &str {
        &self.body.sourcetype
    }

    pub fn time(&self) -> f64 {
        self.body.time.as_secs()
    }

    /// The canonical JSON form sent on the wire.
    pub fn as_json(&self) -> &str {
        &self.json
    }
}

/// Builds [`Event`]s from records using the handler's configured defaults.
#[derive(Clone, Debug)]
pub struct EventFormatter {
    hostname: String,
    index: String,
    source: Option<String>,
    sourcetype: String,
    allow_overrides: bool,
    record_format: bool,
}

impl EventFormatter {
    pub fn from_config(config: &SplunkHandlerConfig) -> Self {
        Self {
            hostname: config.hostname.clone(),
            index: config.index.clone(),
            source: config.source.clone(),
            sourcetype: config.sourcetype.clone(),
            allow_overrides: config.allow_overrides,
            record_format: config.record_format,
        }
    }

    /// Format `record` using its own override fields.
    pub fn format_record(&self, record: &LogRecord) -> Event {
        self.format(record, record.overrides())
    }

    /// Format `record`, applying `overrides` when the handler allows them.
    ///
    /// Unknown override keys are ignored. Non-string values are coerced to
    /// their JSON text; a `_time` that is not numeric keeps the record
    /// timestamp.
    pub fn format(&self, record: &LogRecord, overrides: &Overrides) -> Event {
        let mut body = EventBody {
            event: self.event_value(&record.message),
            host: self.hostname.clone(),
            index: self.index.clone(),
            source: self
                .source
                .clone()
                .unwrap_or_else(|| record.logger.clone()),
            sourcetype: self.sourcetype.clone(),
            time: EventTime::from_secs(record.created()),
        };

        if self.allow_overrides {
            apply_overrides(&mut body, overrides);
        }
        Event::new(body)
    }

    fn event_value(&self, message: &str) -> Value {
        if self.record_format {
            if let Ok(value) = serde_json::from_str::<Value>(message) {
                return value;
            }
        }
        Value::String(message.to_owned())
    }
}

fn apply_overrides(body: &mut EventBody, overrides: &Overrides) {
    for (key, value) in overrides {
        match key.as_str() {
            OVERRIDE_TIME => {
                if let Some(secs) = coerce_time(value) {
                    body.time = EventTime::from_secs(secs);
                }
            }
            OVERRIDE_HOST => body.host = coerce_string(value),
            OVERRIDE_INDEX => body.index = coerce_string(value),
            OVERRIDE_SOURCE => body.source = coerce_string(value),
            OVERRIDE_SOURCETYPE => body.sourcetype = coerce_string(value),
            _ => {}
        }
    }
}

fn coerce_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn coerce_time(value: &Value) -> Option<f64> {
    let secs = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    // Millisecond rounding scales by 1000, which must stay finite too.
    (secs * 1000.0).is_finite().then_some(secs)
}

/// Concatenate events into one HEC payload: no separators, no array.
pub fn build_payload(events: &[Event]) -> String {
    let capacity = events.iter().map(|e| e.as_json().len()).sum();
    let mut payload = String::with_capacity(capacity);
    for event in events {
        payload.push_str(event.as_json());
    }
    payload
}
