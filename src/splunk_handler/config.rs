//! Configuration structures consumed by the Splunk handler lifecycle.
//!
//! `SplunkHandlerBuilder` constructs these values before passing them to
//! [`SplunkHandler`](super::SplunkHandler) for runtime use. The config is an
//! immutable snapshot: the handler copies what it needs at construction.

use std::fmt;
use std::time::Duration;

use crate::rate_limited_warner::DEFAULT_WARN_INTERVAL;

use super::backoff::RetryPolicy;

/// Default HEC port.
pub const DEFAULT_PORT: u16 = 8088;
/// Default maximum number of queued events.
pub const DEFAULT_QUEUE_SIZE: usize = 5000;
/// Default delay between timer-driven flushes.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_secs(15);
/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
/// Default time `close` waits for the final drain.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_INDEX: &str = "main";
pub const DEFAULT_SOURCETYPE: &str = "text";
/// Path of the HEC event endpoint.
pub const COLLECTOR_PATH: &str = "/services/collector";

/// Web protocol used to reach the collector.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Protocol {
    Http,
    #[default]
    Https,
}

impl Protocol {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Http => "http",
            Self::Https => "https",
        }
    }

    /// Parse a protocol name, case-insensitively.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "http" => Some(Self::Http),
            "https" => Some(Self::Https),
            _ => None,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Determines how the handler reacts when its queue is full.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OverflowPolicy {
    /// Drop new events and report each drop.
    #[default]
    Drop,
    /// Block the producer until the worker frees space ("force keep ahead").
    Block,
}

/// Resolve the local machine name, falling back to `localhost`.
pub fn local_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| "localhost".to_owned())
}

/// Configuration object describing how to construct a
/// [`SplunkHandler`](super::SplunkHandler).
#[derive(Clone, Debug)]
pub struct SplunkHandlerConfig {
    pub protocol: Protocol,
    /// Collector host name or address.
    pub host: String,
    pub port: u16,
    /// HEC token sent as `Authorization: Splunk <token>`.
    pub token: String,
    pub index: String,
    /// Event source; the record's logger name when `None`.
    pub source: Option<String>,
    pub sourcetype: String,
    /// Host identity stamped on every event.
    pub hostname: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Whether TLS certificates and host names are verified.
    pub verify: bool,
    /// Proxy URL for outbound requests.
    pub proxy: Option<String>,
    /// Delay between timer-driven flushes.
    pub flush_interval: Duration,
    pub retry: RetryPolicy,
    /// Maximum queued events; 0 means unbounded. Also the batch size limit.
    pub max_queue_size: usize,
    pub overflow_policy: OverflowPolicy,
    /// Honour `_time`, `_host`, `_index`, `_source`, `_sourcetype` overrides.
    pub allow_overrides: bool,
    /// Embed messages that parse as JSON as structured events.
    pub record_format: bool,
    /// Log flush and retry activity to the diagnostic target.
    pub debug: bool,
    /// Time `close` waits for the worker's final drain.
    pub shutdown_timeout: Duration,
    /// Interval between rate-limited queue-full warnings.
    pub warn_interval: Duration,
}

impl Default for SplunkHandlerConfig {
    fn default() -> Self {
        Self {
            protocol: Protocol::default(),
            host: "localhost".into(),
            port: DEFAULT_PORT,
            token: String::new(),
            index: DEFAULT_INDEX.into(),
            source: None,
            sourcetype: DEFAULT_SOURCETYPE.into(),
            hostname: local_hostname(),
            timeout: DEFAULT_TIMEOUT,
            verify: true,
            proxy: None,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            retry: RetryPolicy::default(),
            max_queue_size: DEFAULT_QUEUE_SIZE,
            overflow_policy: OverflowPolicy::default(),
            allow_overrides: false,
            record_format: false,
            debug: false,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
            warn_interval: DEFAULT_WARN_INTERVAL,
        }
    }
}

impl SplunkHandlerConfig {
    /// Full collector URL, e.g. `https://splunk:8088/services/collector`.
    pub fn endpoint_url(&self) -> String {
        format!(
            "{}://{}:{}{}",
            self.protocol, self.host, self.port, COLLECTOR_PATH
        )
    }

    /// Value of the `Authorization` header.
    pub fn authorization(&self) -> String {
        format!("Splunk {}", self.token)
    }
}
