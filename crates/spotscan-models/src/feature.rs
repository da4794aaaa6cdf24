//! Per-frame feature vectors.

use serde::{Deserialize, Serialize};

/// Fixed-dimension numeric summary of one video frame.
///
/// Immutable once built; every frame of a run (reference or broadcast)
/// must share the same dimensionality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureVector(Vec<f32>);

impl FeatureVector {
    pub fn new(samples: Vec<f32>) -> Self {
        Self(samples)
    }

    /// Number of samples in the vector.
    pub fn dim(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

impl From<Vec<f32>> for FeatureVector {
    fn from(samples: Vec<f32>) -> Self {
        Self(samples)
    }
}

impl AsRef<[f32]> for FeatureVector {
    fn as_ref(&self) -> &[f32] {
        &self.0
    }
}

/// One frame of the broadcast being scanned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastFrame {
    /// Position in the broadcast, in seconds.
    pub timestamp: f64,
    pub feature: FeatureVector,
}

impl BroadcastFrame {
    pub fn new(timestamp: f64, feature: impl Into<FeatureVector>) -> Self {
        Self {
            timestamp,
            feature: feature.into(),
        }
    }
}
