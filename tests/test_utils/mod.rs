//! Fixtures shared by the integration tests.
//!
//! Handlers are wired to an in-memory [`RecordingTransport`] and a
//! [`CollectingReporter`] so tests can inspect every request and diagnostic
//! without a live collector.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::{Duration, UNIX_EPOCH};

use serde_json::Value;
use splunk_logging::test_utils::{CollectingReporter, RecordingTransport};
use splunk_logging::{
    HandlerBuilderTrait, HecRequest, Level, LogRecord, SplunkHandler, SplunkHandlerBuilder,
};

pub struct Harness {
    pub handler: SplunkHandler,
    pub transport: Arc<RecordingTransport>,
    pub reporter: Arc<CollectingReporter>,
}

/// Builder pointed at a fake collector, with fast retries and a flush
/// interval long enough that only explicit drains send data.
pub fn builder() -> SplunkHandlerBuilder {
    SplunkHandlerBuilder::new()
        .with_host("splunk.example.com")
        .with_token("TOKEN")
        .with_hostname("test_host")
        .with_flush_interval(Duration::from_secs(3600))
        .with_retry_backoff(Duration::from_millis(1))
}

pub fn harness(builder: SplunkHandlerBuilder) -> Harness {
    harness_with(builder, RecordingTransport::default())
}

pub fn harness_with(builder: SplunkHandlerBuilder, transport: RecordingTransport) -> Harness {
    let transport = Arc::new(transport);
    let reporter = Arc::new(CollectingReporter::default());
    let handler = builder
        .with_transport(transport.clone())
        .with_reporter(reporter.clone())
        .build_inner()
        .expect("handler builds");
    Harness {
        handler,
        transport,
        reporter,
    }
}

pub fn record(message: &str) -> LogRecord {
    LogRecord::new("app", Level::Info, message).at(UNIX_EPOCH + Duration::from_secs(10))
}

/// Split a concatenated HEC payload back into its events.
pub fn decode_events(request: &HecRequest) -> Vec<Value> {
    serde_json::Deserializer::from_str(&request.body)
        .into_iter::<Value>()
        .collect::<Result<_, _>>()
        .expect("payload is concatenated JSON objects")
}

/// The `event` field of every event across `requests`, in send order.
pub fn delivered_messages(requests: &[HecRequest]) -> Vec<String> {
    requests
        .iter()
        .flat_map(decode_events)
        .map(|event| event["event"].as_str().unwrap_or_default().to_owned())
        .collect()
}
