//! Error types for matching, tracking and log I/O.

use std::path::{Path, PathBuf};

use spotscan_models::{ModelError, TimestampError};
use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while scanning a broadcast.
///
/// Misses and exhausted error budgets are not errors; the tracker absorbs
/// them. Everything here aborts the current input.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("Malformed line {line} in {}: {reason}", path.display())]
    MalformedLine {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    #[error("Feature dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("Reference clip {reference} has {len} frames, index {index} is out of range")]
    IndexOutOfRange {
        reference: String,
        index: usize,
        len: usize,
    },

    #[error("Timestamp {timestamp} does not follow previous timestamp {previous}")]
    OutOfOrder { previous: f64, timestamp: f64 },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Reference library error: {0}")]
    Library(#[from] ModelError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MediaError {
    /// Create a malformed-line error. `line` is 1-based.
    pub fn malformed(path: impl Into<PathBuf>, line: usize, reason: impl Into<String>) -> Self {
        Self::MalformedLine {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }

    /// Create an invalid configuration error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig(message.into())
    }

    /// Map a failed file read, keeping missing files distinct from other I/O
    /// failures.
    pub(crate) fn on_read(path: &Path, err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound(path.to_path_buf())
        } else {
            Self::Io(err)
        }
    }

    /// Attach a path and line number to a line-level parse failure.
    pub(crate) fn at_line(path: impl Into<PathBuf>, line: usize, err: LineError) -> Self {
        Self::malformed(path, line, err.to_string())
    }
}

/// Parse failure within a single line, before file context is known.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LineError {
    #[error("missing '{0}' separator")]
    MissingSeparator(&'static str),

    #[error("no neighbor entries")]
    NoEntries,

    #[error("empty reference name")]
    EmptyName,

    #[error("invalid index '{0}'")]
    InvalidIndex(String),

    #[error("no feature samples")]
    NoSamples,

    #[error("invalid sample '{0}'")]
    InvalidSample(String),

    #[error("expected {expected} samples, found {found}")]
    SampleCount { expected: usize, found: usize },

    #[error("expected {expected} neighbor pairs, found {found}")]
    PairCount { expected: usize, found: usize },

    #[error("invalid timestamp: {0}")]
    Timestamp(#[from] TimestampError),
}
