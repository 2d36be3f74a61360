//! Protocol error types.

use thiserror::Error;

/// Result type for response decoding.
pub type DecodeResult<T> = Result<T, DecodeError>;

/// Result type for other protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Reasons a response payload could not be turned into records.
///
/// These are reported and the payload discarded; none of them is fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// The payload is not valid JSON (or is truncated).
    #[error("malformed JSON: {0}")]
    MalformedJson(String),

    /// Valid JSON whose top-level value is not an array.
    #[error("response is not a JSON array (got {found})")]
    NotAnArray { found: &'static str },

    /// The accumulated response exceeded the size limit.
    #[error("response too large: {size} bytes (max: {max})")]
    TooLarge { size: usize, max: usize },
}

impl From<serde_json::Error> for DecodeError {
    fn from(err: serde_json::Error) -> Self {
        Self::MalformedJson(err.to_string())
    }
}

/// Errors produced when building wire payloads.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// Failed to serialize records to JSON.
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Payload would exceed the size a client accepts.
    #[error("payload too large: {size} bytes (max: {max})")]
    PayloadTooLarge { size: usize, max: usize },
}
