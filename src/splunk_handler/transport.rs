//! HTTP delivery capability used by the batch sender.
//!
//! The sender only needs "POST this body, tell me the status". [`Transport`]
//! is that seam; [`UreqTransport`] is the production implementation and keeps
//! one `ureq::Agent` (and therefore its connection pool) for the lifetime of
//! the handler.

use std::sync::Arc;

use thiserror::Error;
use ureq::{Agent, AgentBuilder};

use crate::handlers::HandlerBuildError;

use super::config::{Protocol, SplunkHandlerConfig};

/// A fully prepared HEC request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HecRequest {
    pub url: String,
    /// `Authorization` header value (`Splunk <token>`).
    pub authorization: String,
    /// Concatenated event JSON.
    pub body: String,
}

impl HecRequest {
    pub const CONTENT_TYPE: &'static str = "application/json";
}

/// Failure to obtain any HTTP response.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    /// Connection, DNS, TLS or timeout failure.
    #[error("network error: {0}")]
    Network(String),
}

/// Sends HEC requests and reports the response status code.
///
/// Implementations must return `Ok(status)` for every HTTP response, including
/// 4xx and 5xx; only the absence of a response is an error.
pub trait Transport: Send + Sync {
    fn post(&self, request: &HecRequest) -> Result<u16, TransportError>;
}

/// Blocking transport backed by a pooled `ureq::Agent`.
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    /// Build an agent honouring the configured timeout, proxy and TLS
    /// verification flag.
    pub fn from_config(config: &SplunkHandlerConfig) -> Result<Self, HandlerBuildError> {
        let mut builder = AgentBuilder::new().timeout(config.timeout);

        if let Some(proxy) = &config.proxy {
            let proxy = ureq::Proxy::new(proxy).map_err(|err| {
                HandlerBuildError::InvalidConfig(format!("invalid proxy '{proxy}': {err}"))
            })?;
            builder = builder.proxy(proxy);
        }

        if config.protocol == Protocol::Https {
            let connector = native_tls::TlsConnector::builder()
                .danger_accept_invalid_certs(!config.verify)
                .danger_accept_invalid_hostnames(!config.verify)
                .build()?;
            builder = builder.tls_connector(Arc::new(connector));
        }

        Ok(Self {
            agent: builder.build(),
        })
    }
}

impl Transport for UreqTransport {
    fn post(&self, request: &HecRequest) -> Result<u16, TransportError> {
        let result = self
            .agent
            .post(&request.url)
            .set("Authorization", &request.authorization)
            .set("Content-Type", HecRequest::CONTENT_TYPE)
            .send_string(&request.body);

        match result {
            Ok(response) => Ok(response.status()),
            Err(ureq::Error::Status(code, _)) => Ok(code),
            Err(ureq::Error::Transport(err)) => Err(TransportError::Network(err.to_string())),
        }
    }
}

impl std::fmt::Debug for UreqTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UreqTransport").finish_non_exhaustive()
    }
}
