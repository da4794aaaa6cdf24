//! Pluggable distance metrics over feature vectors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;

/// A distance between two equal-length feature vectors.
///
/// Implementations must be non-negative and symmetric. Callers guarantee
/// equal lengths; the matcher checks dimensionality once per query.
pub trait DistanceMetric: Send + Sync {
    fn distance(&self, a: &[f32], b: &[f32]) -> f64;

    /// Short metric name for logs.
    fn name(&self) -> &'static str;
}

/// Sum of absolute differences (city-block distance).
#[derive(Debug, Clone, Copy, Default)]
pub struct L1;

impl DistanceMetric for L1 {
    #[inline]
    fn distance(&self, a: &[f32], b: &[f32]) -> f64 {
        debug_assert_eq!(a.len(), b.len());
        a.iter()
            .zip(b)
            .map(|(&x, &y)| (f64::from(x) - f64::from(y)).abs())
            .sum()
    }

    fn name(&self) -> &'static str {
        "l1"
    }
}

/// Euclidean distance.
#[derive(Debug, Clone, Copy, Default)]
pub struct L2;

impl DistanceMetric for L2 {
    #[inline]
    fn distance(&self, a: &[f32], b: &[f32]) -> f64 {
        debug_assert_eq!(a.len(), b.len());
        a.iter()
            .zip(b)
            .map(|(&x, &y)| {
                let d = f64::from(x) - f64::from(y);
                d * d
            })
            .sum::<f64>()
            .sqrt()
    }

    fn name(&self) -> &'static str {
        "l2"
    }
}

/// Configurable choice of built-in metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DistanceKind {
    #[default]
    L1,
    L2,
}

impl DistanceKind {
    /// All built-in metrics.
    pub const ALL: &'static [DistanceKind] = &[DistanceKind::L1, DistanceKind::L2];

    pub fn as_str(&self) -> &'static str {
        match self {
            DistanceKind::L1 => "l1",
            DistanceKind::L2 => "l2",
        }
    }

    /// Build the metric implementation.
    pub fn metric(&self) -> Arc<dyn DistanceMetric> {
        match self {
            DistanceKind::L1 => Arc::new(L1),
            DistanceKind::L2 => Arc::new(L2),
        }
    }
}

impl fmt::Display for DistanceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DistanceKind {
    type Err = DistanceKindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "l1" | "cityblock" | "manhattan" => Ok(DistanceKind::L1),
            "l2" | "euclidean" => Ok(DistanceKind::L2),
            _ => Err(DistanceKindParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown distance metric: {0}")]
pub struct DistanceKindParseError(String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_l1() {
        assert_eq!(L1.distance(&[1.0, 2.0, 3.0], &[4.0, 0.0, 3.0]), 5.0);
        assert_eq!(L1.distance(&[], &[]), 0.0);
    }

    #[test]
    fn test_l2() {
        assert_eq!(L2.distance(&[0.0, 0.0], &[3.0, 4.0]), 5.0);
        assert_eq!(L2.distance(&[7.0], &[7.0]), 0.0);
    }

    #[test]
    fn test_metrics_are_symmetric() {
        let a = [10.0, 250.0, 3.5, 0.0];
        let b = [12.0, 3.0, 99.0, 1.0];
        for kind in DistanceKind::ALL {
            let metric = kind.metric();
            assert_eq!(metric.distance(&a, &b), metric.distance(&b, &a));
            assert!(metric.distance(&a, &b) >= 0.0);
        }
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!("l1".parse::<DistanceKind>().unwrap(), DistanceKind::L1);
        assert_eq!("L2".parse::<DistanceKind>().unwrap(), DistanceKind::L2);
        assert_eq!("euclidean".parse::<DistanceKind>().unwrap(), DistanceKind::L2);
        assert_eq!("cityblock".parse::<DistanceKind>().unwrap(), DistanceKind::L1);
        assert!("cosine".parse::<DistanceKind>().is_err());
    }

    #[test]
    fn test_kind_display_matches_metric_name() {
        for kind in DistanceKind::ALL {
            assert_eq!(kind.to_string(), kind.metric().name());
        }
    }
}
