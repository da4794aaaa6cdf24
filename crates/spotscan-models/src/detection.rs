//! Detection events emitted when a reference clip airing is confirmed.

use serde::{Deserialize, Serialize};

/// A confirmed, complete airing of a reference clip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionEvent {
    /// Name of the detected reference clip.
    pub reference: String,
    /// Broadcast timestamp where the airing started, in seconds.
    pub start: f64,
    /// Seconds between the start and the step that completed the match.
    pub duration: f64,
}

impl DetectionEvent {
    pub fn new(reference: impl Into<String>, start: f64, duration: f64) -> Self {
        Self {
            reference: reference.into(),
            start,
            duration,
        }
    }

    /// Broadcast timestamp at which the detection completed.
    pub fn end(&self) -> f64 {
        self.start + self.duration
    }

    /// Render as a result-log line (without trailing newline):
    /// `video<TAB>start<TAB>duration<TAB>reference`, times with one decimal.
    pub fn to_result_line(&self, video: &str) -> String {
        format!(
            "{}\t{:.1}\t{:.1}\t{}",
            video, self.start, self.duration, self.reference
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_line_format() {
        let event = DetectionEvent::new("adA", 120.04, 29.96);
        assert_eq!(
            event.to_result_line("mega-2014_04_11"),
            "mega-2014_04_11\t120.0\t30.0\tadA"
        );
    }

    #[test]
    fn test_end() {
        let event = DetectionEvent::new("adA", 10.0, 3.5);
        assert!((event.end() - 13.5).abs() < f64::EPSILON);
    }
}
