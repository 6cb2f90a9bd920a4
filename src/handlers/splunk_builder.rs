//! Builder for [`SplunkHandler`](crate::splunk_handler::SplunkHandler).
//!
//! Exposes the collector endpoint, token, event metadata, queue and flush
//! behaviour, retry parameters and TLS/proxy settings. Unset options fall back
//! to the defaults on [`SplunkHandlerConfig`].

use std::{sync::Arc, time::Duration};

use crate::diagnostics::Reporter;
use crate::splunk_handler::{
    OverflowPolicy, Protocol, SplunkHandler, SplunkHandlerConfig, Transport, UreqTransport,
    default_reporter,
};

use super::builder_macros::{ensure_positive, option_setter};
use super::{HandlerBuildError, HandlerBuilderTrait, HandlerOptions};

/// Builder for constructing [`SplunkHandler`] instances.
#[derive(Clone, Default)]
pub struct SplunkHandlerBuilder {
    protocol: Option<String>,
    host: Option<String>,
    port: Option<u16>,
    token: Option<String>,
    index: Option<String>,
    source: Option<String>,
    sourcetype: Option<String>,
    hostname: Option<String>,
    timeout: Option<Duration>,
    verify: Option<bool>,
    proxy: Option<String>,
    flush_interval: Option<Duration>,
    retry_count: Option<u32>,
    retry_backoff: Option<Duration>,
    queue_size: Option<usize>,
    force_keep_ahead: bool,
    allow_overrides: bool,
    record_format: bool,
    debug: bool,
    shutdown_timeout: Option<Duration>,
    transport: Option<Arc<dyn Transport>>,
    reporter: Option<Arc<dyn Reporter>>,
}

impl SplunkHandlerBuilder {
    /// Create a new builder with no collector host configured.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a builder from deserialised [`HandlerOptions`].
    ///
    /// Durations given in seconds must be finite and non-negative; the
    /// remaining checks run in [`build_config`](Self::build_config).
    pub fn from_options(options: &HandlerOptions) -> Result<Self, HandlerBuildError> {
        let mut builder = Self::new()
            .with_host(options.host.as_str())
            .with_port(options.port)
            .with_token(options.token.as_str())
            .with_index(options.index.as_str())
            .with_sourcetype(options.sourcetype.as_str())
            .with_protocol(options.protocol.as_str())
            .with_timeout(seconds(options.timeout, "timeout")?)
            .with_verify(options.verify)
            .with_flush_interval(seconds(options.flush_interval, "flush_interval")?)
            .with_retry_count(options.retry_count)
            .with_retry_backoff(seconds(options.retry_backoff, "retry_backoff")?)
            .with_queue_size(options.queue_size)
            .with_force_keep_ahead(options.force_keep_ahead)
            .with_allow_overrides(options.allow_overrides)
            .with_record_format(options.record_format)
            .with_debug(options.debug);
        if let Some(source) = &options.source {
            builder = builder.with_source(source.as_str());
        }
        if let Some(hostname) = &options.hostname {
            builder = builder.with_hostname(hostname.as_str());
        }
        if let Some(proxy) = options.proxies.get(&options.protocol.to_ascii_lowercase()) {
            builder = builder.with_proxy(proxy.as_str());
        }
        Ok(builder)
    }

    option_setter!(
        #[doc = "Set the collector host name or address (required)."]
        with_host,
        host,
        into String
    );
    option_setter!(
        #[doc = "Set the collector port. Defaults to 8088."]
        with_port,
        port,
        u16
    );
    option_setter!(
        #[doc = "Set the HEC token."]
        with_token,
        token,
        into String
    );
    option_setter!(
        #[doc = "Set the Splunk index events are written to."]
        with_index,
        index,
        into String
    );
    option_setter!(
        #[doc = "Set the event source. Defaults to each record's logger name."]
        with_source,
        source,
        into String
    );
    option_setter!(
        #[doc = "Set the event sourcetype."]
        with_sourcetype,
        sourcetype,
        into String
    );
    option_setter!(
        #[doc = "Set the host identity stamped on events."]
        with_hostname,
        hostname,
        into String
    );
    option_setter!(
        #[doc = "Set the protocol, `http` or `https`."]
        with_protocol,
        protocol,
        into String
    );
    option_setter!(
        #[doc = "Set the per-request timeout."]
        with_timeout,
        timeout,
        Duration
    );
    option_setter!(
        #[doc = "Enable or disable TLS certificate verification."]
        with_verify,
        verify,
        bool
    );
    option_setter!(
        #[doc = "Route requests through the given proxy URL."]
        with_proxy,
        proxy,
        into String
    );
    option_setter!(
        #[doc = "Set the delay between timer-driven flushes."]
        with_flush_interval,
        flush_interval,
        Duration
    );
    option_setter!(
        #[doc = "Set how many times a failed batch is retried."]
        with_retry_count,
        retry_count,
        u32
    );
    option_setter!(
        #[doc = "Set the delay before the first retry; it doubles per retry."]
        with_retry_backoff,
        retry_backoff,
        Duration
    );
    option_setter!(
        #[doc = "Set the maximum number of queued events (0 = unbounded)."]
        with_queue_size,
        queue_size,
        usize
    );
    option_setter!(
        #[doc = "Set how long `close` waits for the final drain."]
        with_shutdown_timeout,
        shutdown_timeout,
        Duration
    );

    /// Block producers on a full queue instead of dropping events.
    pub fn with_force_keep_ahead(mut self, enabled: bool) -> Self {
        self.force_keep_ahead = enabled;
        self
    }

    /// Honour per-record `_time`, `_host`, `_index`, `_source` and
    /// `_sourcetype` overrides.
    pub fn with_allow_overrides(mut self, enabled: bool) -> Self {
        self.allow_overrides = enabled;
        self
    }

    /// Send messages that parse as JSON as structured events.
    pub fn with_record_format(mut self, enabled: bool) -> Self {
        self.record_format = enabled;
        self
    }

    /// Log flush and retry activity to the diagnostic target.
    pub fn with_debug(mut self, enabled: bool) -> Self {
        self.debug = enabled;
        self
    }

    /// Replace the default `ureq` transport.
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Receive diagnostics through `reporter` instead of the `log` facade.
    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    fn validate(&self) -> Result<Protocol, HandlerBuildError> {
        self.validate_host()?;
        let protocol = self.validate_protocol()?;
        if let Some(port) = self.port {
            ensure_positive!(port, u16, "port")?;
        }
        if let Some(timeout) = self.timeout {
            ensure_positive!(timeout, Duration, "timeout")?;
        }
        if let Some(interval) = self.flush_interval {
            ensure_positive!(interval, Duration, "flush_interval")?;
        }
        Ok(protocol)
    }

    fn validate_host(&self) -> Result<(), HandlerBuildError> {
        match &self.host {
            None => Err(HandlerBuildError::InvalidConfig(
                "Splunk handler requires a host".into(),
            )),
            Some(host) if host.trim().is_empty() => Err(HandlerBuildError::InvalidConfig(
                "host must not be empty".into(),
            )),
            _ => Ok(()),
        }
    }

    fn validate_protocol(&self) -> Result<Protocol, HandlerBuildError> {
        match &self.protocol {
            None => Ok(Protocol::default()),
            Some(value) => Protocol::parse(value).ok_or_else(|| {
                HandlerBuildError::InvalidConfig(format!(
                    "protocol must be 'http' or 'https', got '{value}'"
                ))
            }),
        }
    }

    /// Validate the settings and produce the handler configuration.
    pub fn build_config(&self) -> Result<SplunkHandlerConfig, HandlerBuildError> {
        let protocol = self.validate()?;

        let defaults = SplunkHandlerConfig::default();
        let mut retry = defaults.retry.clone();
        if let Some(count) = self.retry_count {
            retry.retry_count = count;
        }
        if let Some(base) = self.retry_backoff {
            retry.base = base;
        }

        Ok(SplunkHandlerConfig {
            protocol,
            host: self.host.clone().unwrap_or_default().trim().to_owned(),
            port: self.port.unwrap_or(defaults.port),
            token: self.token.clone().unwrap_or(defaults.token),
            index: self.index.clone().unwrap_or(defaults.index),
            source: self.source.clone(),
            sourcetype: self.sourcetype.clone().unwrap_or(defaults.sourcetype),
            hostname: self.hostname.clone().unwrap_or(defaults.hostname),
            timeout: self.timeout.unwrap_or(defaults.timeout),
            verify: self.verify.unwrap_or(defaults.verify),
            proxy: self.proxy.clone(),
            flush_interval: self.flush_interval.unwrap_or(defaults.flush_interval),
            retry,
            max_queue_size: self.queue_size.unwrap_or(defaults.max_queue_size),
            overflow_policy: if self.force_keep_ahead {
                OverflowPolicy::Block
            } else {
                OverflowPolicy::Drop
            },
            allow_overrides: self.allow_overrides,
            record_format: self.record_format,
            debug: self.debug,
            shutdown_timeout: self.shutdown_timeout.unwrap_or(defaults.shutdown_timeout),
            warn_interval: defaults.warn_interval,
        })
    }
}

fn seconds(value: f64, field: &str) -> Result<Duration, HandlerBuildError> {
    Duration::try_from_secs_f64(value).map_err(|_| {
        HandlerBuildError::InvalidConfig(format!(
            "{field} must be a finite, non-negative number of seconds, got {value}"
        ))
    })
}

impl HandlerBuilderTrait for SplunkHandlerBuilder {
    type Handler = SplunkHandler;

    fn build_inner(&self) -> Result<Self::Handler, HandlerBuildError> {
        let config = self.build_config()?;
        let transport: Arc<dyn Transport> = match &self.transport {
            Some(transport) => Arc::clone(transport),
            None => Arc::new(UreqTransport::from_config(&config)?),
        };
        let reporter = match &self.reporter {
            Some(reporter) => Arc::clone(reporter),
            None => default_reporter(&config),
        };
        SplunkHandler::with_parts(config, transport, reporter)
    }
}

impl std::fmt::Debug for SplunkHandlerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SplunkHandlerBuilder")
            .field("protocol", &self.protocol)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("index", &self.index)
            .field("flush_interval", &self.flush_interval)
            .field("queue_size", &self.queue_size)
            .field("force_keep_ahead", &self.force_keep_ahead)
            .field("custom_transport", &self.transport.is_some())
            .finish_non_exhaustive()
    }
}
