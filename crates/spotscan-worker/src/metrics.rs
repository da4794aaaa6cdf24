//! Prometheus metrics for scan runs.
//!
//! Recording is a no-op until a recorder is installed, so library users
//! and tests pay nothing unless they opt in.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::error::{WorkerError, WorkerResult};

/// Install the Prometheus recorder for this process.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> WorkerResult<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| WorkerError::MetricsFailed(e.to_string()))
}

/// Metric names as constants for consistency.
pub mod names {
    pub const FRAMES_MATCHED_TOTAL: &str = "spotscan_frames_matched_total";
    pub const MATCH_DURATION_SECONDS: &str = "spotscan_match_duration_seconds";
    pub const DETECTIONS_TOTAL: &str = "spotscan_detections_total";
    pub const CANDIDATES_FAILED_TOTAL: &str = "spotscan_candidates_failed_total";
    pub const VIDEOS_PROCESSED_TOTAL: &str = "spotscan_videos_processed_total";
}

/// Record a batch of broadcast frames run through the matcher.
pub fn record_frames_matched(distance: &str, frames: usize, duration_secs: f64) {
    let labels = [("distance", distance.to_string())];
    counter!(names::FRAMES_MATCHED_TOTAL, &labels).increment(frames as u64);
    histogram!(names::MATCH_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record one detection.
pub fn record_detection(reference: &str) {
    let labels = [("reference", reference.to_string())];
    counter!(names::DETECTIONS_TOTAL, &labels).increment(1);
}

/// Record candidates dropped for exceeding their miss budget.
pub fn record_candidates_failed(count: u64) {
    counter!(names::CANDIDATES_FAILED_TOTAL).increment(count);
}

/// Record the outcome of one broadcast.
pub fn record_video_processed(operation: &str, success: bool) {
    let labels = [
        ("operation", operation.to_string()),
        ("status", if success { "ok" } else { "error" }.to_string()),
    ];
    counter!(names::VIDEOS_PROCESSED_TOTAL, &labels).increment(1);
}
