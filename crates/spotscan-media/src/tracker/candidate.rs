//! A single in-flight "this clip is airing" hypothesis.

use spotscan_models::NeighborList;

use super::config::ErrorPolicy;

/// Where a candidate stands after one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Still tracking.
    Active,
    /// Reached the clip's final frame.
    Completed,
    /// Ran out of miss budget.
    Failed,
}

/// Live hypothesis that the broadcast is playing `reference`, which began
/// at `start`.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    reference: String,
    current_index: usize,
    start: f64,
    errors: u32,
    clip_len: usize,
}

impl Candidate {
    /// Open a candidate at `index` of a clip with `clip_len` frames.
    /// Callers guarantee `index < clip_len`.
    pub(crate) fn new(reference: String, index: usize, start: f64, clip_len: usize) -> Self {
        debug_assert!(index < clip_len);
        Self {
            reference,
            current_index: index,
            start,
            errors: 0,
            clip_len,
        }
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    /// Reference frame the candidate was last expected at.
    pub fn current_index(&self) -> usize {
        self.current_index
    }

    /// Broadcast timestamp the candidate was opened at.
    pub fn start(&self) -> f64 {
        self.start
    }

    /// Frames missed so far.
    pub fn errors(&self) -> u32 {
        self.errors
    }

    fn last_index(&self) -> usize {
        self.clip_len - 1
    }

    /// Move one reference frame forward against this step's neighbors.
    ///
    /// A candidate already at the final frame completes without advancing.
    /// Otherwise it advances and counts a miss when no neighbor of the same
    /// clip lies within `tolerance` of the new index. The miss budget is
    /// checked before completion, so the final frame's match is scored first
    /// and a candidate landing on the last index completes in that same step.
    pub(crate) fn advance(
        &mut self,
        neighbors: &NeighborList,
        tolerance: usize,
        policy: &ErrorPolicy,
    ) -> Outcome {
        if self.current_index >= self.last_index() {
            return Outcome::Completed;
        }

        self.current_index += 1;
        let low = self.current_index.saturating_sub(tolerance);
        let high = self.current_index.saturating_add(tolerance);
        if !neighbors.contains_in_range(&self.reference, low, high) {
            self.errors += 1;
        }

        if policy.is_exhausted(self.errors, self.current_index, self.clip_len) {
            Outcome::Failed
        } else if self.current_index == self.last_index() {
            Outcome::Completed
        } else {
            Outcome::Active
        }
    }
}
