//! Server error types.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// IO error (socket, file, etc.).
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Failed to encode the response payload.
    #[error("Protocol error: {0}")]
    Protocol(#[from] hostview_protocol::ProtocolError),

    /// Listen address already taken by another process.
    #[error("Address already in use: {addr}")]
    AddressInUse { addr: String },

    /// Inventory data file could not be used.
    #[error("Invalid inventory file {}: {message}", path.display())]
    Inventory { path: PathBuf, message: String },

    /// A socket operation took longer than the connection timeout.
    #[error("Timeout during {operation}")]
    Timeout { operation: String },

    /// The server stopped accepting connections.
    #[error("Server is shut down")]
    Closed,

    /// Configuration error.
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl ServerError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates an address in use error.
    pub fn address_in_use(addr: impl Into<String>) -> Self {
        Self::AddressInUse { addr: addr.into() }
    }

    /// Creates an inventory file error.
    pub fn inventory(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Inventory {
            path: path.into(),
            message: message.into(),
        }
    }

    pub(crate) fn timeout(operation: impl Into<String>) -> Self {
        Self::Timeout {
            operation: operation.into(),
        }
    }
}
