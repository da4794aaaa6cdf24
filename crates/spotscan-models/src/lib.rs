//! Shared data models for spotscan.
//!
//! This crate provides Serde-serializable types for:
//! - Per-frame feature vectors and broadcast frames
//! - Reference clips and the reference library
//! - Nearest-neighbor matches and neighbor lists
//! - Detection events and their result-log rendering

pub mod detection;
pub mod error;
pub mod feature;
pub mod neighbor;
pub mod reference;
pub mod timestamp;

// Re-export common types
pub use detection::DetectionEvent;
pub use error::{ModelError, ModelResult};
pub use feature::{BroadcastFrame, FeatureVector};
pub use neighbor::{NeighborList, NeighborMatch, TimedNeighbors};
pub use reference::{ReferenceClip, ReferenceLibrary};
pub use timestamp::{format_seconds, parse_seconds, TimestampError};
