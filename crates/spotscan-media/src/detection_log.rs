//! Append-only result log of detections.

use std::path::{Path, PathBuf};

use spotscan_models::DetectionEvent;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::error::MediaResult;

/// Tab-separated result log shared by every scanned broadcast.
#[derive(Debug, Clone)]
pub struct DetectionLog {
    path: PathBuf,
}

impl DetectionLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render the lines `video` would contribute for `events`.
    pub fn render(video: &str, events: &[DetectionEvent]) -> String {
        events
            .iter()
            .map(|event| event.to_result_line(video) + "\n")
            .collect()
    }

    /// Append `events` for `video`, creating the file (and its directory)
    /// if needed. Nothing is written for an empty slice.
    pub async fn append(&self, video: &str, events: &[DetectionEvent]) -> MediaResult<()> {
        if events.is_empty() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(Self::render(video, events).as_bytes()).await?;
        file.flush().await?;

        debug!(
            path = %self.path.display(),
            video,
            detections = events.len(),
            "Appended detections"
        );
        Ok(())
    }
}
