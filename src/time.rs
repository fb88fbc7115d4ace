//! Time ranges and unit helpers.
//!
//! All timestamps are milliseconds since the epoch, stored as `f64`.

use serde::{Deserialize, Serialize};

/// Milliseconds per second.
pub const MILLIS_PER_SECOND: f64 = 1_000.0;

/// Time range with inclusive bounds, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start of the range.
    pub start: f64,
    /// End of the range.
    pub end: f64,
}

impl TimeRange {
    /// Create a new range, swapping bounds if needed.
    pub fn new(mut start: f64, mut end: f64) -> Self {
        if start > end {
            std::mem::swap(&mut start, &mut end);
        }
        Self { start, end }
    }

    /// A range covering exactly one timestamp.
    pub fn single(timestamp: f64) -> Self {
        Self {
            start: timestamp,
            end: timestamp,
        }
    }

    /// Span of the range.
    pub fn span(&self) -> f64 {
        self.end - self.start
    }

    /// Check whether two ranges share at least one timestamp.
    pub fn intersects(&self, other: &Self) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Convert a timestamp into a 0..1 value relative to this range.
    pub fn time_to_relative(&self, timestamp: f64) -> f64 {
        (timestamp - self.start) / self.span()
    }

    /// Convert a 0..1 value relative to this range into a timestamp.
    pub fn relative_to_time(&self, relative: f64) -> f64 {
        self.start + relative * self.span()
    }
}

/// Convert seconds into milliseconds.
pub fn seconds_to_millis(seconds: f64) -> f64 {
    seconds * MILLIS_PER_SECOND
}

/// Convert nanoseconds into milliseconds.
pub fn nanos_to_millis(nanos: f64) -> f64 {
    nanos / 1_000_000.0
}
