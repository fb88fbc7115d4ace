//! Sampling periods and downsampling modes.

use serde::{Deserialize, Serialize};

/// Number of samples covered by one storage bucket, for every period.
pub const SAMPLES_PER_BUCKET: f64 = 600.0;

/// Supported sampling granularities, ordered from finest to coarsest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SamplingPeriod {
    /// One sample per millisecond.
    EveryMillisecond,
    /// One sample every 10 ms.
    EveryTenMillis,
    /// One sample every 100 ms.
    EveryHundredMillis,
    /// One sample per second.
    EverySecond,
    /// One sample every 10 s.
    EveryTenSeconds,
    /// One sample per minute.
    EveryMinute,
    /// One sample every 10 min.
    EveryTenMinutes,
    /// One sample per hour.
    EveryHour,
    /// One sample every 6 h.
    EverySixHours,
    /// One sample per day.
    EveryTwentyFourHours,
}

impl SamplingPeriod {
    /// Every period, finest first.
    pub const ALL: [SamplingPeriod; 10] = [
        Self::EveryMillisecond,
        Self::EveryTenMillis,
        Self::EveryHundredMillis,
        Self::EverySecond,
        Self::EveryTenSeconds,
        Self::EveryMinute,
        Self::EveryTenMinutes,
        Self::EveryHour,
        Self::EverySixHours,
        Self::EveryTwentyFourHours,
    ];

    /// Distance between two samples in milliseconds.
    pub const fn distance(self) -> f64 {
        match self {
            Self::EveryMillisecond => 1.0,
            Self::EveryTenMillis => 10.0,
            Self::EveryHundredMillis => 100.0,
            Self::EverySecond => 1_000.0,
            Self::EveryTenSeconds => 10_000.0,
            Self::EveryMinute => 60_000.0,
            Self::EveryTenMinutes => 600_000.0,
            Self::EveryHour => 3_600_000.0,
            Self::EverySixHours => 21_600_000.0,
            Self::EveryTwentyFourHours => 86_400_000.0,
        }
    }

    /// Time span covered by one storage bucket.
    pub fn bucket_span(self) -> f64 {
        self.distance() * SAMPLES_PER_BUCKET
    }

    /// The next coarser period, if any.
    pub fn above(self) -> Option<Self> {
        Self::ALL.get(self.position() + 1).copied()
    }

    /// The next finer period, if any.
    pub fn below(self) -> Option<Self> {
        self.position()
            .checked_sub(1)
            .and_then(|index| Self::ALL.get(index).copied())
    }

    /// The finest period whose distance is at least `distance`.
    ///
    /// Falls back to the coarsest period.
    pub fn with_max_distance(distance: f64) -> Self {
        Self::ALL
            .iter()
            .copied()
            .find(|period| period.distance() >= distance)
            .unwrap_or(Self::EveryTwentyFourHours)
    }

    fn position(self) -> usize {
        self as usize
    }
}

/// Whether stored data is aggregated into coarser periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DownSamplingMode {
    /// Downsampling runs automatically between frames.
    #[default]
    Automatic,
    /// Downsampling is disabled.
    None,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periods_are_ordered_by_distance() {
        for pair in SamplingPeriod::ALL.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].distance() < pair[1].distance());
        }
    }

    #[test]
    fn above_and_below_navigate() {
        assert_eq!(
            SamplingPeriod::EveryHundredMillis.above(),
            Some(SamplingPeriod::EverySecond)
        );
        assert_eq!(
            SamplingPeriod::EveryHundredMillis.below(),
            Some(SamplingPeriod::EveryTenMillis)
        );
        assert_eq!(SamplingPeriod::EveryMillisecond.below(), None);
        assert_eq!(SamplingPeriod::EveryTwentyFourHours.above(), None);
    }

    #[test]
    fn with_max_distance_picks_finest_covering_period() {
        assert_eq!(
            SamplingPeriod::with_max_distance(100.0),
            SamplingPeriod::EveryHundredMillis
        );
        assert_eq!(
            SamplingPeriod::with_max_distance(150.0),
            SamplingPeriod::EverySecond
        );
        assert_eq!(
            SamplingPeriod::with_max_distance(f64::MAX),
            SamplingPeriod::EveryTwentyFourHours
        );
    }
}
