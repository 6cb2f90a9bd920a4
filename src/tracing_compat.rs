//! Compatibility bridge for the `tracing` ecosystem.
//!
//! [`SplunkLayer`] is a `tracing_subscriber::Layer` that turns each event into
//! a [`LogRecord`]: the `message` field becomes the event text, the event
//! target becomes the logger name, and `_`-prefixed fields become per-record
//! override fields. Other fields are appended to the message as `key=value`
//! pairs.

use std::fmt::{Debug, Write as _};
use std::sync::Arc;

use serde_json::Value;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::diagnostics::is_internal_target;
use crate::handler::LogHandler;
use crate::level::Level;
use crate::log_record::{LogRecord, Overrides, RecordMetadata};

/// Layer forwarding `tracing` events to a shared handler.
pub struct SplunkLayer {
    handler: Arc<dyn LogHandler>,
}

impl SplunkLayer {
    pub fn new(handler: Arc<dyn LogHandler>) -> Self {
        Self { handler }
    }
}

impl<S: Subscriber> Layer<S> for SplunkLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let meta = event.metadata();
        if is_internal_target(meta.target()) {
            return;
        }

        let mut fields = EventFields::default();
        event.record(&mut fields);
        let (message, overrides) = fields.finish();

        let metadata = RecordMetadata {
            overrides,
            ..Default::default()
        };
        let record = LogRecord::with_metadata(
            meta.target(),
            Level::from(meta.level()),
            &message,
            metadata,
        );
        // Failures are already reported through the handler's diagnostics.
        let _ = self.handler.handle(record);
    }
}

#[derive(Default)]
struct EventFields {
    message: String,
    extra: Vec<(&'static str, String)>,
    overrides: Overrides,
}

impl EventFields {
    fn insert(&mut self, field: &Field, value: Value) {
        let name = field.name();
        if name == "message" {
            self.message = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
        } else if name.starts_with('_') {
            self.overrides.insert(name.to_owned(), value);
        } else {
            let text = match value {
                Value::String(s) => s,
                other => other.to_string(),
            };
            self.extra.push((name, text));
        }
    }

    /// Message with the non-override fields appended, plus the overrides.
    fn finish(self) -> (String, Overrides) {
        let mut message = self.message;
        for (key, value) in self.extra {
            if !message.is_empty() {
                message.push(' ');
            }
            let _ = write!(message, "{key}={value}");
        }
        (message, self.overrides)
    }
}

impl Visit for EventFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        self.insert(field, Value::String(format!("{value:?}")));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, Value::from(value));
    }
}
