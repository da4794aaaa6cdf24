//! Per-broadcast scan pipeline.
//!
//! `process_broadcast` runs the whole chain for one broadcast feature file:
//! neighbor search, neighbor log, tracking and the result log.
//! `replay_neighbor_log` re-runs only the tracking half from a log written
//! by an earlier run, which is how tracker settings are tuned without
//! paying for the search again.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use spotscan_media::{
    load_reference_library, read_feature_file, read_neighbor_log, video_name,
    write_neighbor_log, CandidateTracker, ClipLengths, DetectionLog, NeighborMatcher,
    TrackerStats,
};
use spotscan_models::{BroadcastFrame, DetectionEvent, ReferenceLibrary, TimedNeighbors};
use tokio::sync::Mutex;
use tracing::Instrument;

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};
use crate::executor::ScanMode;
use crate::logging::ScanLogger;
use crate::metrics;

/// Shared state for every broadcast of a run.
pub struct ScanContext {
    pub config: WorkerConfig,
    pub run_id: String,
    library: Arc<ReferenceLibrary>,
    matcher: NeighborMatcher,
    clip_lengths: ClipLengths,
    // Serializes appends from concurrently scanned broadcasts.
    detection_log: Mutex<DetectionLog>,
}

impl ScanContext {
    /// Validate the config and load the reference library it points at.
    pub async fn new(config: WorkerConfig) -> WorkerResult<Self> {
        config.validate()?;
        let library = load_reference_library(&config.reference_dir).await?;
        Self::with_library(config, Arc::new(library))
    }

    /// Build a context around an already loaded library.
    pub fn with_library(config: WorkerConfig, library: Arc<ReferenceLibrary>) -> WorkerResult<Self> {
        config.validate()?;
        let matcher = NeighborMatcher::from_config(Arc::clone(&library), &config.matcher)?;
        let clip_lengths = ClipLengths::from(library.as_ref());
        let detection_log = Mutex::new(DetectionLog::new(&config.result_log));

        Ok(Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            config,
            library,
            matcher,
            clip_lengths,
            detection_log,
        })
    }

    pub fn library(&self) -> &Arc<ReferenceLibrary> {
        &self.library
    }

    pub(crate) fn logger(&self, video: &str, mode: ScanMode) -> ScanLogger {
        ScanLogger::new(&self.run_id, video, mode)
    }
}

/// What one broadcast produced.
#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    pub video: String,
    /// Timestamps fed to the tracker.
    pub frames: usize,
    pub detections: Vec<DetectionEvent>,
    pub stats: TrackerStats,
    /// Neighbor log written for this broadcast, if the search ran.
    pub neighbor_log: Option<PathBuf>,
}

/// Search, log and track one broadcast feature file.
pub async fn process_broadcast(ctx: &ScanContext, path: &Path) -> WorkerResult<ScanOutcome> {
    let video = video_name(path);
    let logger = ctx.logger(&video, ScanMode::Broadcast);
    let span = logger.create_span();
    run_broadcast(ctx, path, video, &logger).instrument(span).await
}

/// Track detections from an existing neighbor log.
pub async fn replay_neighbor_log(ctx: &ScanContext, path: &Path) -> WorkerResult<ScanOutcome> {
    let video = video_name(path);
    let logger = ctx.logger(&video, ScanMode::Replay);
    let span = logger.create_span();
    run_replay(ctx, path, video, &logger).instrument(span).await
}

async fn run_broadcast(
    ctx: &ScanContext,
    path: &Path,
    video: String,
    logger: &ScanLogger,
) -> WorkerResult<ScanOutcome> {
    let started = Instant::now();
    let broadcast = read_feature_file(path).await?;
    if broadcast.is_empty() {
        return Err(WorkerError::scan_failed(format!("{}: no frames", video)));
    }
    logger.search_started(broadcast.len(), ctx.config.matcher.k);

    let neighbors = search_with_progress(ctx, broadcast.frames, logger, started).await?;

    let log_path = ctx.config.neighbor_log_path(&video);
    write_neighbor_log(&log_path, &neighbors).await?;
    logger.neighbor_log_written(&log_path, started.elapsed());

    let (detections, stats) = track_and_record(ctx, &video, &neighbors, logger).await?;
    Ok(ScanOutcome {
        video,
        frames: neighbors.len(),
        detections,
        stats,
        neighbor_log: Some(log_path),
    })
}

async fn run_replay(
    ctx: &ScanContext,
    path: &Path,
    video: String,
    logger: &ScanLogger,
) -> WorkerResult<ScanOutcome> {
    logger.replay_started(path);
    let neighbors = read_neighbor_log(path).await?;
    let (detections, stats) = track_and_record(ctx, &video, &neighbors, logger).await?;

    Ok(ScanOutcome {
        video,
        frames: neighbors.len(),
        detections,
        stats,
        neighbor_log: None,
    })
}

/// Match in chunks of `progress_every` frames on the blocking pool,
/// reporting progress after each chunk.
async fn search_with_progress(
    ctx: &ScanContext,
    frames: Vec<BroadcastFrame>,
    logger: &ScanLogger,
    started: Instant,
) -> WorkerResult<Vec<TimedNeighbors>> {
    let total = frames.len();
    let frames = Arc::new(frames);
    let mut neighbors = Vec::with_capacity(total);

    for chunk_start in (0..total).step_by(ctx.config.progress_every) {
        let chunk_end = (chunk_start + ctx.config.progress_every).min(total);
        let matcher = ctx.matcher.clone();
        let frames = Arc::clone(&frames);

        let chunk_started = Instant::now();
        let chunk = tokio::task::spawn_blocking(move || {
            matcher.par_search_all(&frames[chunk_start..chunk_end])
        })
        .await??;
        metrics::record_frames_matched(
            ctx.matcher.metric_name(),
            chunk.len(),
            chunk_started.elapsed().as_secs_f64(),
        );
        neighbors.extend(chunk);

        if chunk_end < total {
            logger.search_progress(chunk_end, total, started.elapsed());
        }
    }

    Ok(neighbors)
}

async fn track_and_record(
    ctx: &ScanContext,
    video: &str,
    neighbors: &[TimedNeighbors],
    logger: &ScanLogger,
) -> WorkerResult<(Vec<DetectionEvent>, TrackerStats)> {
    let mut tracker = CandidateTracker::new(ctx.config.tracker.clone(), ctx.clip_lengths.clone())?;
    let detections = tracker.run(neighbors)?;
    let stats = tracker.finish();

    for event in &detections {
        metrics::record_detection(&event.reference);
        logger.detection(event);
    }
    metrics::record_candidates_failed(stats.failed);

    ctx.detection_log
        .lock()
        .await
        .append(video, &detections)
        .await?;

    logger.tracking_finished(detections.len(), &stats);
    Ok((detections, stats))
}

#[cfg(test)]
mod tests {
    use super::*;
    use spotscan_models::{FeatureVector, ReferenceClip};
    use tempfile::TempDir;

    fn context(dir: &Path, progress_every: usize) -> ScanContext {
        let library = ReferenceLibrary::new(vec![
            ReferenceClip::new(
                "adA",
                (0..4).map(|i| FeatureVector::new(vec![i as f32 * 10.0, 0.0])).collect(),
            ),
            ReferenceClip::new(
                "adB",
                (0..3).map(|i| FeatureVector::new(vec![0.0, 100.0 + i as f32 * 10.0])).collect(),
            ),
        ])
        .unwrap();

        let config = WorkerConfig {
            neighbor_dir: dir.join("cercanos"),
            result_log: dir.join("comerciales.txt"),
            progress_every,
            ..WorkerConfig::default()
        };
        ScanContext::with_library(config, Arc::new(library)).unwrap()
    }

    /// Two noise frames, adA in full, one noise frame.
    async fn write_broadcast(dir: &Path) -> PathBuf {
        let path = dir.join("mega.txt");
        let content = "0.0 500 500\n0.5 500 500\n1.0 0 0\n1.5 10 0\n2.0 20 0\n2.5 30 0\n3.0 500 500\n";
        tokio::fs::write(&path, content).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_process_broadcast_detects_clip() {
        let dir = TempDir::new().unwrap();
        let ctx = context(dir.path(), 3);
        let path = write_broadcast(dir.path()).await;

        let outcome = process_broadcast(&ctx, &path).await.unwrap();
        assert_eq!(outcome.video, "mega");
        assert_eq!(outcome.frames, 7);
        assert_eq!(outcome.detections, vec![DetectionEvent::new("adA", 1.0, 1.5)]);

        let log_path = outcome.neighbor_log.unwrap();
        assert_eq!(log_path, dir.path().join("cercanos").join("mega.txt"));
        assert_eq!(read_neighbor_log(&log_path).await.unwrap().len(), 7);

        let results = tokio::fs::read_to_string(dir.path().join("comerciales.txt"))
            .await
            .unwrap();
        assert_eq!(results, "mega\t1.0\t1.5\tadA\n");
    }

    #[tokio::test]
    async fn test_replay_reproduces_detections() {
        let dir = TempDir::new().unwrap();
        let ctx = context(dir.path(), 500);
        let path = write_broadcast(dir.path()).await;

        let processed = process_broadcast(&ctx, &path).await.unwrap();
        let replayed = replay_neighbor_log(&ctx, &processed.neighbor_log.clone().unwrap())
            .await
            .unwrap();

        assert_eq!(replayed.video, "mega");
        assert_eq!(replayed.detections, processed.detections);
        assert_eq!(replayed.stats, processed.stats);
        assert!(replayed.neighbor_log.is_none());

        let results = tokio::fs::read_to_string(dir.path().join("comerciales.txt"))
            .await
            .unwrap();
        assert_eq!(results.lines().count(), 2);
    }

    #[tokio::test]
    async fn test_empty_broadcast_is_rejected() {
        let dir = TempDir::new().unwrap();
        let ctx = context(dir.path(), 500);
        let path = dir.path().join("blank.txt");
        tokio::fs::write(&path, "\n").await.unwrap();

        let err = process_broadcast(&ctx, &path).await.unwrap_err();
        assert!(matches!(err, WorkerError::ScanFailed(_)));
        assert!(err.is_input_error());
    }

    #[tokio::test]
    async fn test_dimension_mismatch_surfaces() {
        let dir = TempDir::new().unwrap();
        let ctx = context(dir.path(), 500);
        let path = dir.path().join("wide.txt");
        tokio::fs::write(&path, "0.0 1 2 3\n").await.unwrap();

        let err = process_broadcast(&ctx, &path).await.unwrap_err();
        assert!(matches!(
            err,
            WorkerError::Media(spotscan_media::MediaError::DimensionMismatch {
                expected: 2,
                found: 3
            })
        ));
    }
}
