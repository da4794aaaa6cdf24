//! Broadcast timestamp parsing and display helpers.
//!
//! Timestamps are plain decimal seconds from the start of a video, as
//! written by the feature extractor and the neighbor log.

use thiserror::Error;

/// Parse a decimal-seconds timestamp.
///
/// # Examples
/// ```
/// use spotscan_models::timestamp::parse_seconds;
/// assert_eq!(parse_seconds("12.5").unwrap(), 12.5);
/// assert_eq!(parse_seconds(" 3 ").unwrap(), 3.0);
/// ```
pub fn parse_seconds(ts: &str) -> Result<f64, TimestampError> {
    let ts = ts.trim();
    if ts.is_empty() {
        return Err(TimestampError::Empty);
    }

    let seconds: f64 = ts
        .parse()
        .map_err(|_| TimestampError::InvalidValue(ts.to_string()))?;
    if !seconds.is_finite() {
        return Err(TimestampError::InvalidValue(ts.to_string()));
    }
    if seconds < 0.0 {
        return Err(TimestampError::Negative);
    }
    Ok(seconds)
}

/// Format seconds as `HH:MM:SS`, or `HH:MM:SS.mmm` when there is a
/// fractional part. Used for human-readable log output only.
///
/// # Examples
/// ```
/// use spotscan_models::timestamp::format_seconds;
/// assert_eq!(format_seconds(3725.0), "01:02:05");
/// assert_eq!(format_seconds(30.5), "00:00:30.500");
/// ```
pub fn format_seconds(total_secs: f64) -> String {
    let total_secs = total_secs.max(0.0);
    let hours = (total_secs / 3600.0).floor() as u32;
    let mins = ((total_secs % 3600.0) / 60.0).floor() as u32;
    let secs = total_secs % 60.0;

    if (secs - secs.floor()).abs() > 0.0001 {
        format!("{:02}:{:02}:{:06.3}", hours, mins, secs)
    } else {
        format!("{:02}:{:02}:{:02}", hours, mins, secs.floor() as u32)
    }
}

/// Timestamp parsing error.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TimestampError {
    #[error("Timestamp cannot be empty")]
    Empty,

    #[error("Timestamp cannot be negative")]
    Negative,

    #[error("Invalid timestamp value: {0}")]
    InvalidValue(String),
}
