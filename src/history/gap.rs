//! Gap detection between consecutive samples.

use std::ops::Range;

use crate::history::sampling::SamplingPeriod;

/// Splits sample sequences where the distance between two neighbors
/// exceeds `factor * period.distance()`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GapCalculator {
    factor: f64,
}

impl GapCalculator {
    /// Default minimum gap size, in multiples of the period distance.
    pub const DEFAULT_FACTOR: f64 = 3.0;

    /// Create a calculator. Non-positive or non-finite factors fall back to
    /// [`Self::DEFAULT_FACTOR`].
    pub fn new(factor: f64) -> Self {
        let factor = if factor.is_finite() && factor > 0.0 {
            factor
        } else {
            Self::DEFAULT_FACTOR
        };
        Self { factor }
    }

    /// The configured factor.
    pub fn factor(&self) -> f64 {
        self.factor
    }

    /// Smallest distance (ms) that counts as a gap for the period.
    pub fn min_gap_size(&self, sampling_period: SamplingPeriod) -> f64 {
        self.factor * sampling_period.distance()
    }

    /// Check whether two consecutive timestamps are separated by a gap.
    pub fn is_gap(&self, sampling_period: SamplingPeriod, previous: f64, next: f64) -> bool {
        next - previous > self.min_gap_size(sampling_period)
    }

    /// Index ranges of gap-free runs within the timestamps.
    pub fn segments(&self, sampling_period: SamplingPeriod, timestamps: &[f64]) -> Vec<Range<usize>> {
        let mut segments = Vec::new();
        let mut start = 0;
        for index in 1..timestamps.len() {
            if self.is_gap(sampling_period, timestamps[index - 1], timestamps[index]) {
                segments.push(start..index);
                start = index;
            }
        }
        if start < timestamps.len() {
            segments.push(start..timestamps.len());
        }
        segments
    }
}

impl Default for GapCalculator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_FACTOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const P: SamplingPeriod = SamplingPeriod::EveryHundredMillis;

    #[test]
    fn splits_on_gaps() {
        let gaps = GapCalculator::new(2.0);
        let timestamps = [0.0, 100.0, 200.0, 600.0, 700.0, 1_000.0];
        assert_eq!(gaps.segments(P, &timestamps), vec![0..3, 3..5, 5..6]);
    }

    #[test]
    fn exact_limit_is_not_a_gap() {
        let gaps = GapCalculator::new(2.0);
        assert!(!gaps.is_gap(P, 0.0, 200.0));
        assert!(gaps.is_gap(P, 0.0, 200.5));
    }

    #[test]
    fn empty_input_has_no_segments() {
        assert!(GapCalculator::default().segments(P, &[]).is_empty());
    }

    #[test]
    fn invalid_factor_falls_back() {
        assert_eq!(GapCalculator::new(-1.0).factor(), GapCalculator::DEFAULT_FACTOR);
        assert_eq!(GapCalculator::new(f64::NAN).factor(), GapCalculator::DEFAULT_FACTOR);
    }
}
