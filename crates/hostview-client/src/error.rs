//! Client error types.

use thiserror::Error;

use hostview_core::{ConfigError, TracingError};
use hostview_server::ServerError;

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors that stop the `hostview` binary.
///
/// Transport and decode failures are not here: the session reports those as
/// events.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Configuration file or flag problem.
    #[error("configuration error: {0}")]
    Config(String),

    /// Rejected endpoint.
    #[error("invalid endpoint: {0}")]
    Endpoint(#[from] ConfigError),

    /// Inventory server failure.
    #[error("server error: {0}")]
    Server(#[from] ServerError),

    /// Subscriber could not be installed; `main` reports it and goes on.
    #[error("tracing setup failed: {0}")]
    Tracing(#[from] TracingError),
}

impl ClientError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}
