//! Serde-friendly configuration surface for the Splunk handler.
//!
//! [`HandlerOptions`] mirrors the handler's settings using plain types
//! (seconds as floats, protocol as a string, proxies keyed by scheme) so host
//! applications can load it from any serde format and pass it to
//! [`SplunkHandlerBuilder::from_options`](super::SplunkHandlerBuilder::from_options).
//! Every field is optional in the serialised form and falls back to the
//! handler defaults.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::splunk_handler::{
    DEFAULT_FLUSH_INTERVAL, DEFAULT_INDEX, DEFAULT_PORT, DEFAULT_QUEUE_SIZE, DEFAULT_RETRY_BACKOFF,
    DEFAULT_RETRY_COUNT, DEFAULT_SOURCETYPE, DEFAULT_TIMEOUT,
};

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HandlerOptions {
    pub host: String,
    pub port: u16,
    pub token: String,
    pub index: String,
    pub allow_overrides: bool,
    pub debug: bool,
    /// Seconds between timer-driven flushes.
    pub flush_interval: f64,
    pub force_keep_ahead: bool,
    /// Host identity; the machine name when unset.
    pub hostname: Option<String>,
    pub protocol: String,
    /// Proxy URLs keyed by scheme (`"http"`, `"https"`). Only the entry for
    /// the configured protocol is used.
    pub proxies: BTreeMap<String, String>,
    /// Maximum queued events; 0 means unbounded.
    pub queue_size: usize,
    pub record_format: bool,
    /// Seconds before the first retry; doubles per retry.
    pub retry_backoff: f64,
    pub retry_count: u32,
    pub source: Option<String>,
    pub sourcetype: String,
    /// Per-request timeout in seconds.
    pub timeout: f64,
    pub verify: bool,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_PORT,
            token: String::new(),
            index: DEFAULT_INDEX.into(),
            allow_overrides: false,
            debug: false,
            flush_interval: DEFAULT_FLUSH_INTERVAL.as_secs_f64(),
            force_keep_ahead: false,
            hostname: None,
            protocol: "https".into(),
            proxies: BTreeMap::new(),
            queue_size: DEFAULT_QUEUE_SIZE,
            record_format: false,
            retry_backoff: DEFAULT_RETRY_BACKOFF.as_secs_f64(),
            retry_count: DEFAULT_RETRY_COUNT,
            source: None,
            sourcetype: DEFAULT_SOURCETYPE.into(),
            timeout: DEFAULT_TIMEOUT.as_secs_f64(),
            verify: true,
        }
    }
}
