//! Error types for the protocol crate.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while encoding or decoding protocol values.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// JSON encoding or decoding failed.
    #[error("json codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// CBOR encoding or decoding failed.
    #[error("cbor codec error: {message}")]
    Cbor {
        /// Description of the failure.
        message: String,
    },

    /// A message was well-formed but not valid in context.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}

impl ProtocolError {
    /// Create a CBOR codec error.
    pub fn cbor(message: impl Into<String>) -> Self {
        Self::Cbor {
            message: message.into(),
        }
    }
}
