//! Per-video scan logging.
//!
//! A [`ScanLogger`] is created for each input a batch touches and tags every
//! event with the run, the video and the scan mode, so one broadcast can be
//! followed through interleaved output from concurrent scans.

use std::path::Path;
use std::time::Duration;

use spotscan_media::TrackerStats;
use spotscan_models::{format_seconds, DetectionEvent};
use tracing::{error, info, warn, Level, Span};

use crate::error::WorkerError;
use crate::executor::ScanMode;

#[derive(Debug, Clone)]
pub struct ScanLogger {
    run_id: String,
    video: String,
    mode: ScanMode,
}

impl ScanLogger {
    pub fn new(run_id: &str, video: &str, mode: ScanMode) -> Self {
        Self {
            run_id: run_id.to_string(),
            video: video.to_string(),
            mode,
        }
    }

    pub fn search_started(&self, frames: usize, k: usize) {
        info!(
            run_id = %self.run_id,
            video = %self.video,
            mode = self.mode.as_str(),
            frames,
            k,
            "Searching nearest reference frames"
        );
    }

    pub fn search_progress(&self, done: usize, total: usize, elapsed: Duration) {
        info!(
            run_id = %self.run_id,
            video = %self.video,
            done,
            total,
            elapsed_secs = elapsed.as_secs(),
            "Neighbor search progress"
        );
    }

    pub fn neighbor_log_written(&self, path: &Path, elapsed: Duration) {
        info!(
            run_id = %self.run_id,
            video = %self.video,
            path = %path.display(),
            elapsed_secs = elapsed.as_secs(),
            "Neighbor search finished"
        );
    }

    pub fn replay_started(&self, path: &Path) {
        info!(
            run_id = %self.run_id,
            video = %self.video,
            mode = self.mode.as_str(),
            path = %path.display(),
            "Replaying neighbor log"
        );
    }

    pub fn detection(&self, event: &DetectionEvent) {
        info!(
            run_id = %self.run_id,
            video = %self.video,
            reference = %event.reference,
            start = %format_seconds(event.start),
            duration = event.duration,
            "Detected reference clip"
        );
    }

    /// Summary of a finished tracking pass. Unknown clip names get their own
    /// warning since they usually mean the neighbor log came from another
    /// library.
    pub fn tracking_finished(&self, detections: usize, stats: &TrackerStats) {
        if stats.unknown_references > 0 {
            warn!(
                run_id = %self.run_id,
                video = %self.video,
                unknown_references = stats.unknown_references,
                "Neighbors named clips missing from the library"
            );
        }
        info!(
            run_id = %self.run_id,
            video = %self.video,
            mode = self.mode.as_str(),
            detections,
            spawned = stats.spawned,
            failed = stats.failed,
            superseded = stats.superseded,
            abandoned = stats.abandoned,
            "Scan completed"
        );
    }

    /// Log a scan that ended in `err`: bad inputs at warn, everything else
    /// at error.
    pub fn scan_failed(&self, err: &WorkerError) {
        if failure_level(err) == Level::WARN {
            warn!(
                run_id = %self.run_id,
                video = %self.video,
                mode = self.mode.as_str(),
                "Skipping input: {}", err
            );
        } else {
            error!(
                run_id = %self.run_id,
                video = %self.video,
                mode = self.mode.as_str(),
                "Scan failed: {}", err
            );
        }
    }

    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "scan",
            run_id = %self.run_id,
            video = %self.video,
            mode = self.mode.as_str()
        )
    }
}

fn failure_level(err: &WorkerError) -> Level {
    if err.is_input_error() {
        Level::WARN
    } else {
        Level::ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spotscan_media::MediaError;
    use std::path::PathBuf;

    #[test]
    fn test_failure_level() {
        let missing: WorkerError = MediaError::FileNotFound(PathBuf::from("mega.txt")).into();
        assert_eq!(failure_level(&missing), Level::WARN);

        let config = WorkerError::config_error("k must be greater than zero");
        assert_eq!(failure_level(&config), Level::ERROR);
    }

    #[test]
    fn test_logging_without_subscriber() {
        let logger = ScanLogger::new("run-1", "mega", ScanMode::Broadcast);
        let _guard = logger.create_span().entered();
        logger.search_started(7, 5);
        logger.search_progress(3, 7, Duration::from_millis(20));
        logger.neighbor_log_written(Path::new("cercanos/mega.txt"), Duration::from_secs(1));
        logger.detection(&DetectionEvent::new("adA", 1.0, 1.5));
        logger.tracking_finished(
            1,
            &TrackerStats {
                unknown_references: 2,
                ..TrackerStats::default()
            },
        );
        logger.scan_failed(&WorkerError::scan_failed("mega: no frames"));

        let replay = ScanLogger::new("run-1", "mega", ScanMode::Replay);
        replay.replay_started(Path::new("cercanos/mega.txt"));
    }
}
