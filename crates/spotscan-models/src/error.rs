//! Error types for model construction.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while assembling the reference library.
#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("Reference library is empty")]
    EmptyLibrary,

    #[error("Reference clip '{0}' has no frames")]
    EmptyClip(String),

    #[error("Duplicate reference clip name: {0}")]
    DuplicateClip(String),

    #[error("Clip '{clip}' frame {index} has {found} samples, expected {expected}")]
    DimensionMismatch {
        clip: String,
        index: usize,
        expected: usize,
        found: usize,
    },
}
