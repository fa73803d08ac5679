//! Error types for the sync server.

use stepsync_protocol::ProtocolError;
use stepsync_transform::TransformError;
use thiserror::Error;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Errors that can occur in the sync server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Invalid request format.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The proposal is based on a version the authority has not reached.
    #[error("base version {base} is ahead of current version {current}")]
    FutureBase {
        /// Declared base version.
        base: u64,
        /// Current authority version.
        current: u64,
    },

    /// The proposal carries more steps than allowed.
    #[error("too many steps: {count} > {max}")]
    TooManySteps {
        /// Steps in the proposal.
        count: usize,
        /// Configured maximum.
        max: usize,
    },

    /// Accepted history could not be replayed.
    #[error("transform error: {0}")]
    Transform(#[from] TransformError),

    /// Encoding or decoding failed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl ServerError {
    /// Returns true if this is a client error (4xx).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            ServerError::InvalidRequest(_)
                | ServerError::FutureBase { .. }
                | ServerError::TooManySteps { .. }
                | ServerError::Protocol(_)
        )
    }

    /// Returns true if this is a server error (5xx).
    pub fn is_server_error(&self) -> bool {
        matches!(self, ServerError::Transform(_))
    }
}
