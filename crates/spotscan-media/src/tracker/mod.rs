//! Temporal candidate tracking.
//!
//! The tracker consumes one neighbor list per broadcast timestamp and keeps a
//! set of live [`Candidate`]s, each a hypothesis that a given reference clip
//! started airing at some earlier timestamp. A candidate that walks all the
//! way to the clip's final frame without exhausting its miss budget becomes a
//! [`DetectionEvent`].
//!
//! # State Machine
//!
//! ```text
//!   neighbor at index <= max_start_index
//!                  │
//!                  ▼
//!             ┌─────────┐   advance, within budget   ┌───────────┐
//!             │ Active  │───────────────────────────▶│ Completed │──▶ event
//!             └─────────┘   reached final frame      └───────────┘
//!               │     ▲                                    │
//!               │     └─ advance, hit or miss              │ retires every
//!               │                                          ▼ other same-name
//!               │       miss budget exhausted        ┌───────────┐ candidate
//!               └───────────────────────────────────▶│  Failed   │
//!                                                    └───────────┘
//! ```
//!
//! Each step advances every live candidate, emits one event per completion,
//! retires the still-active candidates sharing a completed clip's name, then
//! opens at most one new candidate.

pub mod candidate;
pub mod config;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use spotscan_models::{DetectionEvent, NeighborList, ReferenceLibrary, TimedNeighbors};
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

pub use candidate::{Candidate, Outcome};
pub use config::{ErrorPolicy, TrackerConfig};

/// Frame count of every known reference clip, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClipLengths(HashMap<String, usize>);

impl ClipLengths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, len: usize) {
        self.0.insert(name.into(), len);
    }

    pub fn get(&self, name: &str) -> Option<usize> {
        self.0.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&ReferenceLibrary> for ClipLengths {
    fn from(library: &ReferenceLibrary) -> Self {
        library.frame_counts().collect()
    }
}

impl<S: Into<String>> FromIterator<(S, usize)> for ClipLengths {
    fn from_iter<I: IntoIterator<Item = (S, usize)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(name, len)| (name.into(), len)).collect())
    }
}

/// Counters describing one tracking pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerStats {
    /// Timestamps consumed.
    pub steps: u64,
    /// Candidates opened.
    pub spawned: u64,
    /// Candidates that produced a detection.
    pub completed: u64,
    /// Candidates retired for exceeding their miss budget.
    pub failed: u64,
    /// Active candidates retired because a same-name candidate completed.
    pub superseded: u64,
    /// Spawn-eligible neighbors naming a clip outside the library.
    pub unknown_references: u64,
    /// Candidates still live when the stream ended.
    pub abandoned: u64,
}

/// Single-pass tracker over one broadcast's neighbor lists.
#[derive(Debug)]
pub struct CandidateTracker {
    config: TrackerConfig,
    clip_lengths: ClipLengths,
    candidates: Vec<Candidate>,
    last_timestamp: Option<f64>,
    stats: TrackerStats,
}

impl CandidateTracker {
    pub fn new(config: TrackerConfig, clip_lengths: ClipLengths) -> MediaResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            clip_lengths,
            candidates: Vec::new(),
            last_timestamp: None,
            stats: TrackerStats::default(),
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Live candidates, oldest first.
    pub fn live_candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn stats(&self) -> TrackerStats {
        self.stats
    }

    /// Consume the neighbor list for `timestamp` and return the detections
    /// completed at it.
    ///
    /// Timestamps must be finite and strictly increasing across calls. On
    /// error the tracker state is left as it was before the call.
    pub fn step(
        &mut self,
        timestamp: f64,
        neighbors: &NeighborList,
    ) -> MediaResult<Vec<DetectionEvent>> {
        self.check_order(timestamp)?;
        let spawn = self.select_spawn(neighbors)?;
        self.last_timestamp = Some(timestamp);
        self.stats.steps += 1;

        let mut events = Vec::new();
        let mut completed: HashSet<String> = HashSet::new();
        let mut survivors = Vec::with_capacity(self.candidates.len() + 1);

        for mut candidate in std::mem::take(&mut self.candidates) {
            match candidate.advance(neighbors, self.config.tolerance, &self.config.error_policy) {
                Outcome::Active => survivors.push(candidate),
                Outcome::Failed => {
                    self.stats.failed += 1;
                    debug!(
                        reference = candidate.reference(),
                        start = candidate.start(),
                        index = candidate.current_index(),
                        errors = candidate.errors(),
                        "Candidate failed"
                    );
                }
                Outcome::Completed => {
                    let event = DetectionEvent::new(
                        candidate.reference(),
                        candidate.start(),
                        timestamp - candidate.start(),
                    );
                    debug!(
                        reference = %event.reference,
                        start = event.start,
                        duration = event.duration,
                        errors = candidate.errors(),
                        "Candidate completed"
                    );
                    self.stats.completed += 1;
                    completed.insert(event.reference.clone());
                    events.push(event);
                }
            }
        }

        if !completed.is_empty() {
            let before = survivors.len();
            survivors.retain(|c| !completed.contains(c.reference()));
            self.stats.superseded += (before - survivors.len()) as u64;
        }

        if let Some((reference, index, clip_len)) = spawn {
            debug!(reference = %reference, index, start = timestamp, "Candidate opened");
            survivors.push(Candidate::new(reference, index, timestamp, clip_len));
            self.stats.spawned += 1;
        }

        self.candidates = survivors;
        Ok(events)
    }

    /// Step through a whole sequence, collecting every detection in order.
    pub fn run(&mut self, sequence: &[TimedNeighbors]) -> MediaResult<Vec<DetectionEvent>> {
        let mut events = Vec::new();
        for frame in sequence {
            events.extend(self.step(frame.timestamp, &frame.neighbors)?);
        }
        Ok(events)
    }

    /// End of stream. Unfinished candidates are dropped without events.
    pub fn finish(mut self) -> TrackerStats {
        self.stats.abandoned = self.candidates.len() as u64;
        if !self.candidates.is_empty() {
            debug!(
                abandoned = self.candidates.len(),
                "Dropping unfinished candidates at end of stream"
            );
        }
        self.stats
    }

    fn check_order(&self, timestamp: f64) -> MediaResult<()> {
        let previous = self.last_timestamp.unwrap_or(f64::NEG_INFINITY);
        if !timestamp.is_finite() || timestamp <= previous {
            return Err(MediaError::OutOfOrder {
                previous,
                timestamp,
            });
        }
        Ok(())
    }

    /// Lowest-index spawn-eligible neighbor; the first one listed wins ties.
    fn select_spawn(
        &mut self,
        neighbors: &NeighborList,
    ) -> MediaResult<Option<(String, usize, usize)>> {
        let mut best: Option<(&str, usize, usize)> = None;

        for neighbor in neighbors {
            if neighbor.index > self.config.max_start_index {
                continue;
            }
            let Some(clip_len) = self.clip_lengths.get(&neighbor.reference) else {
                self.stats.unknown_references += 1;
                warn!(
                    reference = %neighbor.reference,
                    index = neighbor.index,
                    "Ignoring neighbor for unknown reference clip"
                );
                continue;
            };
            if neighbor.index >= clip_len {
                return Err(MediaError::IndexOutOfRange {
                    reference: neighbor.reference.clone(),
                    index: neighbor.index,
                    len: clip_len,
                });
            }
            if best.map_or(true, |(_, index, _)| neighbor.index < index) {
                best = Some((neighbor.reference.as_str(), neighbor.index, clip_len));
            }
        }

        Ok(best.map(|(reference, index, clip_len)| (reference.to_string(), index, clip_len)))
    }
}

/// Run a fresh tracker over `sequence` and return its detections and stats.
pub fn track_all(
    config: TrackerConfig,
    clip_lengths: ClipLengths,
    sequence: &[TimedNeighbors],
) -> MediaResult<(Vec<DetectionEvent>, TrackerStats)> {
    let mut tracker = CandidateTracker::new(config, clip_lengths)?;
    let events = tracker.run(sequence)?;
    Ok((events, tracker.finish()))
}
