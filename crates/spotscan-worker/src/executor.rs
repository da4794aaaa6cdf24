//! Batch executor.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use spotscan_media::video_name;
use tracing::info;

use crate::error::{WorkerError, WorkerResult};
use crate::metrics;
use crate::processor::{process_broadcast, replay_neighbor_log, ScanContext, ScanOutcome};

/// Which half of the pipeline a batch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanMode {
    /// Feature files in, full search and tracking.
    Broadcast,
    /// Neighbor logs in, tracking only.
    Replay,
}

impl ScanMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScanMode::Broadcast => "process_broadcast",
            ScanMode::Replay => "replay_neighbor_log",
        }
    }
}

/// Per-file results of a batch, in input order.
#[derive(Debug, Serialize)]
pub struct BatchSummary {
    pub succeeded: Vec<ScanOutcome>,
    pub failed: Vec<FailedScan>,
}

#[derive(Debug, Serialize)]
pub struct FailedScan {
    pub path: PathBuf,
    pub error: String,
}

impl BatchSummary {
    pub fn detections(&self) -> usize {
        self.succeeded.iter().map(|o| o.detections.len()).sum()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Runs many inputs against one shared context, a bounded number at a time.
pub struct ScanExecutor {
    ctx: Arc<ScanContext>,
    video_semaphore: Arc<Semaphore>,
}

impl ScanExecutor {
    pub fn new(ctx: ScanContext) -> Self {
        let video_semaphore = Arc::new(Semaphore::new(ctx.config.max_concurrent_videos));
        Self {
            ctx: Arc::new(ctx),
            video_semaphore,
        }
    }

    pub fn context(&self) -> &Arc<ScanContext> {
        &self.ctx
    }

    /// Scan every path. One file failing does not stop the others.
    pub async fn run(&self, paths: Vec<PathBuf>, mode: ScanMode) -> WorkerResult<BatchSummary> {
        info!(
            run_id = %self.ctx.run_id,
            files = paths.len(),
            mode = mode.as_str(),
            "Starting scan batch with {} max concurrent videos",
            self.ctx.config.max_concurrent_videos
        );

        let mut handles = Vec::with_capacity(paths.len());
        for path in paths {
            let permit = Arc::clone(&self.video_semaphore)
                .acquire_owned()
                .await
                .map_err(|e| WorkerError::scan_failed(format!("semaphore closed: {}", e)))?;
            let ctx = Arc::clone(&self.ctx);

            handles.push(tokio::spawn(async move {
                let _permit = permit;
                let result = match mode {
                    ScanMode::Broadcast => process_broadcast(&ctx, &path).await,
                    ScanMode::Replay => replay_neighbor_log(&ctx, &path).await,
                };
                (path, result)
            }));
        }

        let mut summary = BatchSummary {
            succeeded: Vec::new(),
            failed: Vec::new(),
        };
        for handle in handles {
            let (path, result) = handle.await?;
            metrics::record_video_processed(mode.as_str(), result.is_ok());
            match result {
                Ok(outcome) => summary.succeeded.push(outcome),
                Err(e) => {
                    self.ctx.logger(&video_name(&path), mode).scan_failed(&e);
                    summary.failed.push(FailedScan {
                        path,
                        error: e.to_string(),
                    });
                }
            }
        }

        info!(
            run_id = %self.ctx.run_id,
            succeeded = summary.succeeded.len(),
            failed = summary.failed.len(),
            detections = summary.detections(),
            "Scan batch finished"
        );
        Ok(summary)
    }
}
