//! Worker error types.

use spotscan_media::MediaError;
use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Scan failed: {0}")]
    ScanFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Metrics setup failed: {0}")]
    MetricsFailed(String),

    #[error("Media error: {0}")]
    Media(#[from] MediaError),

    #[error("Blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn scan_failed(msg: impl Into<String>) -> Self {
        Self::ScanFailed(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Whether the error is confined to one input file, as opposed to the
    /// environment (library, disk, runtime).
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            WorkerError::ScanFailed(_)
                | WorkerError::Media(
                    MediaError::MalformedLine { .. }
                        | MediaError::FileNotFound(_)
                        | MediaError::DimensionMismatch { .. }
                        | MediaError::OutOfOrder { .. }
                        | MediaError::IndexOutOfRange { .. }
                )
        )
    }
}
