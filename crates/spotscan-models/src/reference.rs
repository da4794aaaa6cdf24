//! Reference clips and the read-only reference library.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ModelError, ModelResult};
use crate::feature::FeatureVector;

/// A known clip (e.g. an advertisement) and its frames in playback order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceClip {
    name: String,
    frames: Vec<FeatureVector>,
}

impl ReferenceClip {
    pub fn new(name: impl Into<String>, frames: Vec<FeatureVector>) -> Self {
        Self {
            name: name.into(),
            frames,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frames(&self) -> &[FeatureVector] {
        &self.frames
    }

    /// Number of frames in the clip.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Index of the final frame. Zero for an empty clip, which the
    /// library never admits.
    pub fn last_index(&self) -> usize {
        self.frames.len().saturating_sub(1)
    }
}

/// The set of all reference clips, keyed by name.
///
/// Iteration order is the order the clips were supplied in, and is part of
/// the matcher's observable tie-break behaviour.
#[derive(Debug, Clone)]
pub struct ReferenceLibrary {
    clips: Vec<ReferenceClip>,
    by_name: HashMap<String, usize>,
    dimension: usize,
}

impl ReferenceLibrary {
    /// Build a library, validating that it is non-empty, that names are
    /// unique, that no clip is empty and that every frame shares one
    /// dimensionality.
    pub fn new(clips: Vec<ReferenceClip>) -> ModelResult<Self> {
        let dimension = clips
            .first()
            .and_then(|clip| clip.frames.first())
            .map(FeatureVector::dim)
            .ok_or(ModelError::EmptyLibrary)?;

        let mut by_name = HashMap::with_capacity(clips.len());
        for (position, clip) in clips.iter().enumerate() {
            if clip.is_empty() {
                return Err(ModelError::EmptyClip(clip.name.clone()));
            }
            if by_name.insert(clip.name.clone(), position).is_some() {
                return Err(ModelError::DuplicateClip(clip.name.clone()));
            }
            if let Some((index, frame)) = clip
                .frames
                .iter()
                .enumerate()
                .find(|(_, frame)| frame.dim() != dimension)
            {
                return Err(ModelError::DimensionMismatch {
                    clip: clip.name.clone(),
                    index,
                    expected: dimension,
                    found: frame.dim(),
                });
            }
        }

        Ok(Self {
            clips,
            by_name,
            dimension,
        })
    }

    pub fn get(&self, name: &str) -> Option<&ReferenceClip> {
        self.by_name.get(name).map(|&position| &self.clips[position])
    }

    pub fn clips(&self) -> &[ReferenceClip] {
        &self.clips
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceClip> {
        self.clips.iter()
    }

    /// Shared dimensionality of every reference frame.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of clips.
    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Frame count summed over every clip.
    pub fn total_frames(&self) -> usize {
        self.clips.iter().map(ReferenceClip::len).sum()
    }

    /// `(name, frame count)` for every clip, in library order.
    pub fn frame_counts(&self) -> impl Iterator<Item = (&str, usize)> {
        self.clips.iter().map(|clip| (clip.name(), clip.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clip(name: &str, frames: Vec<Vec<f32>>) -> ReferenceClip {
        ReferenceClip::new(name, frames.into_iter().map(FeatureVector::new).collect())
    }

    #[test]
    fn test_library_lookup_and_order() {
        let library = ReferenceLibrary::new(vec![
            clip("zeta", vec![vec![1.0, 2.0]]),
            clip("alpha", vec![vec![0.0, 0.0], vec![3.0, 3.0]]),
        ])
        .unwrap();

        assert_eq!(library.len(), 2);
        assert_eq!(library.dimension(), 2);
        assert_eq!(library.total_frames(), 3);
        assert_eq!(library.get("alpha").unwrap().last_index(), 1);
        assert!(library.get("missing").is_none());

        let names: Vec<_> = library.iter().map(ReferenceClip::name).collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }

    #[test]
    fn test_empty_library_rejected() {
        assert_eq!(
            ReferenceLibrary::new(Vec::new()).unwrap_err(),
            ModelError::EmptyLibrary
        );
    }

    #[test]
    fn test_empty_clip_rejected() {
        let err = ReferenceLibrary::new(vec![
            clip("a", vec![vec![1.0]]),
            ReferenceClip::new("b", Vec::new()),
        ])
        .unwrap_err();
        assert_eq!(err, ModelError::EmptyClip("b".to_string()));
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let err = ReferenceLibrary::new(vec![clip("a", vec![vec![1.0]]), clip("a", vec![vec![2.0]])])
            .unwrap_err();
        assert_eq!(err, ModelError::DuplicateClip("a".to_string()));
    }

    #[test]
    fn test_dimension_mismatch_rejected() {
        let err = ReferenceLibrary::new(vec![
            clip("a", vec![vec![1.0, 2.0]]),
            clip("b", vec![vec![1.0, 2.0], vec![1.0]]),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            ModelError::DimensionMismatch {
                clip: "b".to_string(),
                index: 1,
                expected: 2,
                found: 1,
            }
        );
    }
}
