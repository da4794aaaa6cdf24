#![deny(unreachable_patterns)]
//! Broadcast scanning for known reference clips.
//!
//! This crate provides:
//! - Pluggable distance metrics and an exact top-k neighbor matcher
//! - Rayon-parallel matching across broadcast frames
//! - The candidate tracker that turns neighbor lists into detections
//! - Feature-file, neighbor-log and detection-log I/O

pub mod detection_log;
pub mod error;
pub mod features;
pub mod matcher;
pub mod neighbor_log;
pub mod tracker;

pub use detection_log::DetectionLog;
pub use error::{LineError, MediaError, MediaResult};
pub use features::{load_reference_library, read_feature_file, video_name, FeatureFile};
pub use matcher::{DistanceKind, DistanceMetric, MatcherConfig, NeighborMatcher, L1, L2};
pub use neighbor_log::{
    format_neighbor_line, parse_neighbor_line, read_neighbor_log, write_neighbor_log,
};
pub use tracker::{
    track_all, CandidateTracker, ClipLengths, ErrorPolicy, TrackerConfig, TrackerStats,
};
