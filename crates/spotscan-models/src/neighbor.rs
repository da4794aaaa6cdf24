//! Nearest-neighbor results for a single broadcast frame.

use serde::{Deserialize, Serialize};

/// One match between a broadcast frame and a reference frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborMatch {
    /// Name of the reference clip.
    pub reference: String,
    /// Frame index inside the reference clip.
    pub index: usize,
    /// Distance under the run's metric. Entries read back from a neighbor
    /// log carry 0.0, since the log does not persist distances.
    pub distance: f64,
}

impl NeighborMatch {
    pub fn new(reference: impl Into<String>, index: usize, distance: f64) -> Self {
        Self {
            reference: reference.into(),
            index,
            distance,
        }
    }
}

/// The k closest reference frames to one broadcast frame, ascending by
/// distance (rank order).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NeighborList(Vec<NeighborMatch>);

impl NeighborList {
    /// Wrap matches that are already in rank order.
    pub fn new(matches: Vec<NeighborMatch>) -> Self {
        Self(matches)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, NeighborMatch> {
        self.0.iter()
    }

    pub fn as_slice(&self) -> &[NeighborMatch] {
        &self.0
    }

    pub fn into_inner(self) -> Vec<NeighborMatch> {
        self.0
    }

    /// Whether any entry names `reference` at an index in `[low, high]`.
    pub fn contains_in_range(&self, reference: &str, low: usize, high: usize) -> bool {
        self.0
            .iter()
            .any(|m| m.reference == reference && (low..=high).contains(&m.index))
    }
}

impl<'a> IntoIterator for &'a NeighborList {
    type Item = &'a NeighborMatch;
    type IntoIter = std::slice::Iter<'a, NeighborMatch>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<Vec<NeighborMatch>> for NeighborList {
    fn from(matches: Vec<NeighborMatch>) -> Self {
        Self(matches)
    }
}

/// A neighbor list tagged with the broadcast timestamp it was computed for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimedNeighbors {
    pub timestamp: f64,
    pub neighbors: NeighborList,
}

impl TimedNeighbors {
    pub fn new(timestamp: f64, neighbors: impl Into<NeighborList>) -> Self {
        Self {
            timestamp,
            neighbors: neighbors.into(),
        }
    }
}
