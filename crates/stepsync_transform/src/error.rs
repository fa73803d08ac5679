//! Error types for the transform crate.

use thiserror::Error;

/// Result type for transform operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Errors that can occur while applying or mapping edit operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransformError {
    /// The step cannot apply to the current document.
    ///
    /// This is the expected outcome of concurrent editing and is
    /// recovered by dropping the step.
    #[error("step rejected: {reason}")]
    StepRejected {
        /// Why the document engine refused the step.
        reason: String,
    },

    /// Mapping bookkeeping could not reconcile a batch of steps.
    ///
    /// Signals a corrupted invariant; never recovered inline.
    #[error("inconsistent step sequence at index {index}")]
    InconsistentSequence {
        /// Index of the step that failed to map or apply.
        index: usize,
    },

    /// A position lies outside the document.
    #[error("position {pos} out of range (size: {size})")]
    PositionOutOfRange {
        /// The offending position.
        pos: usize,
        /// Size of the document.
        size: usize,
    },
}

impl TransformError {
    /// Create a step rejected error.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::StepRejected {
            reason: reason.into(),
        }
    }

    /// Create an inconsistent sequence error.
    pub fn inconsistent(index: usize) -> Self {
        Self::InconsistentSequence { index }
    }

    /// Returns true if this error is a recoverable step rejection.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            TransformError::StepRejected { .. } | TransformError::PositionOutOfRange { .. }
        )
    }
}
