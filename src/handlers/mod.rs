//! Handler builders and associated traits.
//!
//! Builders validate user supplied settings before any thread is spawned or
//! socket opened. Each builder implements [`HandlerBuilderTrait`], producing
//! either its concrete handler or a boxed [`LogHandler`].

use std::io;

use thiserror::Error;

use crate::handler::LogHandler;

mod builder_macros;
pub mod options;
pub mod splunk_builder;

pub use options::HandlerOptions;
pub use splunk_builder::SplunkHandlerBuilder;

/// Errors that may occur while building a handler.
#[derive(Debug, Error)]
pub enum HandlerBuildError {
    /// Invalid user supplied configuration.
    #[error("invalid handler configuration: {0}")]
    InvalidConfig(String),
    /// The worker thread could not be spawned.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// The TLS connector could not be initialised.
    #[error("TLS setup failed: {0}")]
    Tls(#[from] native_tls::Error),
}

/// Trait implemented by all handler builders.
pub trait HandlerBuilderTrait: Send + Sync {
    /// Concrete handler produced by the builder.
    type Handler: LogHandler + 'static;

    /// Build the concrete handler.
    fn build_inner(&self) -> Result<Self::Handler, HandlerBuildError>;

    /// Build the handler boxed for registration behind the [`LogHandler`]
    /// trait object.
    fn build(&self) -> Result<Box<dyn LogHandler>, HandlerBuildError> {
        Ok(Box::new(self.build_inner()?))
    }
}
