//! Exhaustive k-nearest-neighbor search over the reference library.
//!
//! For every broadcast frame the matcher scans every frame of every
//! reference clip, in library order, and keeps the k closest in a bounded
//! sorted buffer ([`TopK`]). The scan is linear on purpose: results are
//! exact and deterministic, including tie order.
//!
//! # Usage
//!
//! ```rust,ignore
//! use spotscan_media::matcher::{MatcherConfig, NeighborMatcher};
//!
//! let matcher = NeighborMatcher::from_config(library, &MatcherConfig::default())?;
//! let neighbors = matcher.par_search_all(&broadcast.frames)?;
//! ```

pub mod distance;
pub mod topk;

use std::sync::Arc;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use spotscan_models::{
    BroadcastFrame, NeighborList, NeighborMatch, ReferenceLibrary, TimedNeighbors,
};

use crate::error::{MediaError, MediaResult};

pub use distance::{DistanceKind, DistanceMetric, L1, L2};
pub use topk::{Ranked, TopK};

/// Run-level matcher settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Neighbors kept per broadcast frame (default: 5)
    pub k: usize,
    /// Distance metric (default: L1)
    pub distance: DistanceKind,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            k: 5,
            distance: DistanceKind::L1,
        }
    }
}

impl MatcherConfig {
    /// Builder-style setter for k.
    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    /// Builder-style setter for the metric.
    pub fn with_distance(mut self, distance: DistanceKind) -> Self {
        self.distance = distance;
        self
    }

    pub fn validate(&self) -> MediaResult<()> {
        if self.k == 0 {
            return Err(MediaError::invalid_config("k must be greater than zero"));
        }
        Ok(())
    }
}

/// Finds the k closest reference frames for broadcast frames.
///
/// Holds the library as a shared read-only handle; cloning the matcher is
/// cheap and clones can be used from any thread.
#[derive(Clone)]
pub struct NeighborMatcher {
    library: Arc<ReferenceLibrary>,
    k: usize,
    metric: Arc<dyn DistanceMetric>,
}

impl NeighborMatcher {
    pub fn new(
        library: Arc<ReferenceLibrary>,
        k: usize,
        metric: Arc<dyn DistanceMetric>,
    ) -> MediaResult<Self> {
        if k == 0 {
            return Err(MediaError::invalid_config("k must be greater than zero"));
        }
        Ok(Self { library, k, metric })
    }

    pub fn from_config(library: Arc<ReferenceLibrary>, config: &MatcherConfig) -> MediaResult<Self> {
        config.validate()?;
        Self::new(library, config.k, config.distance.metric())
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn library(&self) -> &Arc<ReferenceLibrary> {
        &self.library
    }

    pub fn metric_name(&self) -> &'static str {
        self.metric.name()
    }

    /// The k nearest reference frames to `query`, ascending by distance.
    ///
    /// Fails if the query's dimensionality differs from the library's.
    pub fn search(&self, query: &[f32]) -> MediaResult<NeighborList> {
        let expected = self.library.dimension();
        if query.len() != expected {
            return Err(MediaError::DimensionMismatch {
                expected,
                found: query.len(),
            });
        }

        let mut topk = TopK::new(self.k);
        for (clip_pos, clip) in self.library.iter().enumerate() {
            for (index, frame) in clip.frames().iter().enumerate() {
                let distance = self.metric.distance(query, frame.as_slice());
                topk.push(Ranked {
                    clip: clip_pos,
                    index,
                    distance,
                });
            }
        }

        let clips = self.library.clips();
        Ok(topk
            .into_sorted()
            .into_iter()
            .map(|r| NeighborMatch::new(clips[r.clip].name(), r.index, r.distance))
            .collect::<Vec<_>>()
            .into())
    }

    /// Search every frame sequentially, preserving frame order.
    pub fn search_all(&self, frames: &[BroadcastFrame]) -> MediaResult<Vec<TimedNeighbors>> {
        frames.iter().map(|frame| self.search_frame(frame)).collect()
    }

    /// Search every frame on the rayon pool. Output order matches `frames`,
    /// so the result is identical to [`search_all`](Self::search_all).
    pub fn par_search_all(&self, frames: &[BroadcastFrame]) -> MediaResult<Vec<TimedNeighbors>> {
        frames
            .par_iter()
            .map(|frame| self.search_frame(frame))
            .collect()
    }

    fn search_frame(&self, frame: &BroadcastFrame) -> MediaResult<TimedNeighbors> {
        let neighbors = self.search(frame.feature.as_slice())?;
        Ok(TimedNeighbors::new(frame.timestamp, neighbors))
    }
}

impl std::fmt::Debug for NeighborMatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NeighborMatcher")
            .field("clips", &self.library.len())
            .field("k", &self.k)
            .field("metric", &self.metric.name())
            .finish()
    }
}
