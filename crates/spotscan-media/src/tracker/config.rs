//! Configuration for the candidate tracker.
//!
//! These parameters control how much index jitter and how many missed
//! frames a hypothesis may absorb before it is abandoned.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{MediaError, MediaResult};

/// When a candidate has missed too many frames to stay alive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ErrorPolicy {
    /// Fail once the miss count exceeds `max_errors`.
    Absolute { max_errors: u32 },

    /// Fail once misses reach `max_error_fraction` of the clip's frame
    /// count. Scales tolerance with clip length.
    Fraction { max_error_fraction: f64 },

    /// Fail once misses reach `max_errors`, or while still inside the first
    /// `warmup_frames` of the clip, once they exceed `warmup_max_errors`.
    /// Weeds out spurious starts quickly while tolerating noise later on.
    Staged {
        max_errors: u32,
        warmup_frames: usize,
        warmup_max_errors: u32,
    },
}

impl Default for ErrorPolicy {
    fn default() -> Self {
        Self::Fraction {
            max_error_fraction: 0.2,
        }
    }
}

impl ErrorPolicy {
    pub fn absolute(max_errors: u32) -> Self {
        Self::Absolute { max_errors }
    }

    pub fn fraction(max_error_fraction: f64) -> Self {
        Self::Fraction { max_error_fraction }
    }

    /// Staged policy with the classic 10 / 10 / 3 settings.
    pub fn staged() -> Self {
        Self::Staged {
            max_errors: 10,
            warmup_frames: 10,
            warmup_max_errors: 3,
        }
    }

    /// Whether a candidate with `errors` misses, sitting at `current_index`
    /// of a clip with `clip_len` frames, has used up its budget.
    pub fn is_exhausted(&self, errors: u32, current_index: usize, clip_len: usize) -> bool {
        match *self {
            Self::Absolute { max_errors } => errors > max_errors,
            Self::Fraction { max_error_fraction } => {
                f64::from(errors) >= max_error_fraction * clip_len as f64
            }
            Self::Staged {
                max_errors,
                warmup_frames,
                warmup_max_errors,
            } => {
                errors >= max_errors
                    || (current_index < warmup_frames && errors > warmup_max_errors)
            }
        }
    }

    pub fn validate(&self) -> MediaResult<()> {
        if let Self::Fraction { max_error_fraction } = *self {
            if !max_error_fraction.is_finite() || max_error_fraction <= 0.0 {
                return Err(MediaError::invalid_config(format!(
                    "max_error_fraction must be a positive number, got {}",
                    max_error_fraction
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for ErrorPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute { max_errors } => write!(f, "absolute:{}", max_errors),
            Self::Fraction { max_error_fraction } => write!(f, "fraction:{}", max_error_fraction),
            Self::Staged {
                max_errors,
                warmup_frames,
                warmup_max_errors,
            } => write!(
                f,
                "staged:{}:{}:{}",
                max_errors, warmup_frames, warmup_max_errors
            ),
        }
    }
}

/// Parses `absolute:N`, `fraction:F`, `staged` or `staged:MAX:WARMUP:WARMUP_MAX`.
impl FromStr for ErrorPolicy {
    type Err = MediaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || MediaError::invalid_config(format!("invalid error policy '{}'", s));
        let lowered = s.trim().to_lowercase();
        let mut parts = lowered.split(':');

        let policy = match (parts.next(), parts.next()) {
            (Some("absolute"), Some(n)) => Self::absolute(n.parse().map_err(|_| invalid())?),
            (Some("fraction"), Some(f)) => Self::fraction(f.parse().map_err(|_| invalid())?),
            (Some("staged"), None) => Self::staged(),
            (Some("staged"), Some(max)) => {
                let warmup = parts.next().ok_or_else(invalid)?;
                let warmup_max = parts.next().ok_or_else(invalid)?;
                Self::Staged {
                    max_errors: max.parse().map_err(|_| invalid())?,
                    warmup_frames: warmup.parse().map_err(|_| invalid())?,
                    warmup_max_errors: warmup_max.parse().map_err(|_| invalid())?,
                }
            }
            _ => return Err(invalid()),
        };

        if parts.next().is_some() {
            return Err(invalid());
        }
        policy.validate()?;
        Ok(policy)
    }
}

/// Run-level tracker settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Accepted index jitter around the expected frame (default: 1)
    pub tolerance: usize,
    /// Highest reference index that may open a new candidate (default: 1)
    pub max_start_index: usize,
    /// Miss budget before a candidate is abandoned
    pub error_policy: ErrorPolicy,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            tolerance: 1,
            max_start_index: 1,
            error_policy: ErrorPolicy::default(),
        }
    }
}

impl TrackerConfig {
    /// Builder-style setter for the tolerance window.
    pub fn with_tolerance(mut self, tolerance: usize) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Builder-style setter for the maximum start index.
    pub fn with_max_start_index(mut self, max_start_index: usize) -> Self {
        self.max_start_index = max_start_index;
        self
    }

    /// Builder-style setter for the error policy.
    pub fn with_error_policy(mut self, error_policy: ErrorPolicy) -> Self {
        self.error_policy = error_policy;
        self
    }

    pub fn validate(&self) -> MediaResult<()> {
        self.error_policy.validate()
    }
}
