//! Worker configuration.

use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;
use spotscan_media::{DistanceKind, ErrorPolicy, MatcherConfig, TrackerConfig};
use tracing::warn;

use crate::error::{WorkerError, WorkerResult};

/// Worker configuration.
#[derive(Debug, Clone, Serialize)]
pub struct WorkerConfig {
    /// Directory of reference clip feature files
    pub reference_dir: PathBuf,
    /// Directory neighbor logs are written to, one file per broadcast
    pub neighbor_dir: PathBuf,
    /// Result log detections are appended to
    pub result_log: PathBuf,
    /// Neighbor search settings
    pub matcher: MatcherConfig,
    /// Candidate tracking settings
    pub tracker: TrackerConfig,
    /// Maximum broadcasts scanned at once
    pub max_concurrent_videos: usize,
    /// Frames matched between progress reports
    pub progress_every: usize,
    /// Install the Prometheus recorder and dump it when the run ends
    pub metrics_enabled: bool,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            reference_dir: PathBuf::from("comerciales_car"),
            neighbor_dir: PathBuf::from("television_cercanos"),
            result_log: PathBuf::from("comerciales.txt"),
            matcher: MatcherConfig::default(),
            tracker: TrackerConfig::default(),
            max_concurrent_videos: 2,
            progress_every: 500,
            metrics_enabled: false,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    ///
    /// Unset variables take their defaults. Values that fail to parse are
    /// reported and also fall back to the default.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            reference_dir: std::env::var("SPOTSCAN_REFERENCE_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.reference_dir),
            neighbor_dir: std::env::var("SPOTSCAN_NEIGHBOR_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.neighbor_dir),
            result_log: std::env::var("SPOTSCAN_RESULT_LOG")
                .map(PathBuf::from)
                .unwrap_or(defaults.result_log),
            matcher: MatcherConfig {
                k: env_or("SPOTSCAN_K", defaults.matcher.k),
                distance: env_or::<DistanceKind>("SPOTSCAN_DISTANCE", defaults.matcher.distance),
            },
            tracker: TrackerConfig {
                tolerance: env_or("SPOTSCAN_TOLERANCE", defaults.tracker.tolerance),
                max_start_index: env_or(
                    "SPOTSCAN_MAX_START_INDEX",
                    defaults.tracker.max_start_index,
                ),
                error_policy: env_or::<ErrorPolicy>(
                    "SPOTSCAN_ERROR_POLICY",
                    defaults.tracker.error_policy,
                ),
            },
            max_concurrent_videos: env_or(
                "SPOTSCAN_MAX_CONCURRENT_VIDEOS",
                defaults.max_concurrent_videos,
            ),
            progress_every: env_or("SPOTSCAN_PROGRESS_EVERY", defaults.progress_every),
            metrics_enabled: std::env::var("SPOTSCAN_METRICS")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> WorkerResult<()> {
        self.matcher.validate()?;
        self.tracker.validate()?;
        if self.max_concurrent_videos == 0 {
            return Err(WorkerError::config_error(
                "max_concurrent_videos must be greater than zero",
            ));
        }
        if self.progress_every == 0 {
            return Err(WorkerError::config_error(
                "progress_every must be greater than zero",
            ));
        }
        Ok(())
    }

    /// Neighbor log path for a broadcast named `video`.
    pub fn neighbor_log_path(&self, video: &str) -> PathBuf {
        self.neighbor_dir.join(format!("{video}.txt"))
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(key, value = %raw, "Ignoring invalid environment value");
            default
        }),
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = WorkerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.matcher.k, 5);
        assert_eq!(config.progress_every, 500);
        assert_eq!(
            config.neighbor_log_path("mega"),
            PathBuf::from("television_cercanos/mega.txt")
        );
    }

    #[test]
    fn test_validate_rejects_zero_limits() {
        let mut config = WorkerConfig::default();
        config.max_concurrent_videos = 0;
        assert!(matches!(config.validate(), Err(WorkerError::ConfigError(_))));

        let mut config = WorkerConfig::default();
        config.progress_every = 0;
        assert!(config.validate().is_err());

        let mut config = WorkerConfig::default();
        config.matcher.k = 0;
        assert!(matches!(config.validate(), Err(WorkerError::Media(_))));
    }

    #[test]
    fn test_from_env_reads_overrides() {
        // Keys are unique to this test so parallel tests do not interfere.
        std::env::set_var("SPOTSCAN_K", "3");
        std::env::set_var("SPOTSCAN_DISTANCE", "euclidean");
        std::env::set_var("SPOTSCAN_ERROR_POLICY", "staged");
        std::env::set_var("SPOTSCAN_PROGRESS_EVERY", "not-a-number");

        let config = WorkerConfig::from_env();
        assert_eq!(config.matcher.k, 3);
        assert_eq!(config.matcher.distance, DistanceKind::L2);
        assert_eq!(config.tracker.error_policy, ErrorPolicy::staged());
        assert_eq!(config.progress_every, 500);

        for key in [
            "SPOTSCAN_K",
            "SPOTSCAN_DISTANCE",
            "SPOTSCAN_ERROR_POLICY",
            "SPOTSCAN_PROGRESS_EVERY",
        ] {
            std::env::remove_var(key);
        }
    }
}
