//! Aggregation of fine samples into coarser sampling periods.
//!
//! Every slot of a coarse period (one period distance wide) is recomputed
//! from all rows of the finer period that fall into it. The result replaces
//! the previous value of that slot, so re-running a slot is idempotent.

use crate::history::chunk::{CalculatedRow, HistoryChunk, HistoryChunkBuilder};
use crate::history::configuration::{DecimalDataSeriesIndex, EnumDataSeriesIndex};
use crate::history::enums::{HistoryEnumOrdinal, HistoryEnumSet};
use crate::history::sampling::SamplingPeriod;

const ORDINAL_SLOTS: usize = HistoryEnumOrdinal::MAX as usize + 1;

/// Min/max/mean envelope of one decimal series within a slot.
#[derive(Debug, Clone, Copy)]
struct Envelope {
    sum: f64,
    count: usize,
    min: f64,
    max: f64,
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            sum: 0.0,
            count: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl Envelope {
    fn push(&mut self, value: f64, min: f64, max: f64) {
        if value.is_finite() {
            self.sum += value;
            self.count += 1;
        }
        if min.is_finite() && min < self.min {
            self.min = min;
        }
        if max.is_finite() && max > self.max {
            self.max = max;
        }
    }

    fn mean(&self) -> f64 {
        if self.count == 0 {
            f64::NAN
        } else {
            self.sum / self.count as f64
        }
    }

    fn min(&self) -> f64 {
        if self.min.is_finite() { self.min } else { f64::NAN }
    }

    fn max(&self) -> f64 {
        if self.max.is_finite() { self.max } else { f64::NAN }
    }
}

/// Enum union plus ordinal histogram of one enum series within a slot.
#[derive(Debug, Clone, Copy)]
struct EnumTally {
    union: HistoryEnumSet,
    counts: [u32; ORDINAL_SLOTS],
}

impl Default for EnumTally {
    fn default() -> Self {
        Self {
            union: HistoryEnumSet::EMPTY,
            counts: [0; ORDINAL_SLOTS],
        }
    }
}

impl EnumTally {
    fn push(&mut self, set: HistoryEnumSet, most_of_the_time: Option<HistoryEnumOrdinal>) {
        self.union = self.union.union(set);
        if let Some(ordinal) = most_of_the_time {
            self.counts[ordinal.value() as usize] += 1;
        }
    }

    /// Most frequent ordinal; ties resolve to the lower ordinal.
    fn most_of_the_time(&self) -> Option<HistoryEnumOrdinal> {
        let mut best: Option<(usize, u32)> = None;
        for (ordinal, count) in self.counts.iter().copied().enumerate() {
            if count == 0 {
                continue;
            }
            if best.is_none_or(|(_, best_count)| count > best_count) {
                best = Some((ordinal, count));
            }
        }
        best.and_then(|(ordinal, _)| HistoryEnumOrdinal::new(ordinal as u8))
    }
}

/// Timestamp that represents a slot of the period.
pub fn slot_timestamp(period: SamplingPeriod, slot: i64) -> f64 {
    slot as f64 * period.distance() + period.distance() * 0.5
}

/// Slot of the period that contains the timestamp.
pub fn slot_of(period: SamplingPeriod, timestamp: f64) -> i64 {
    (timestamp / period.distance()).floor() as i64
}

/// Aggregate all rows of `source` into one calculated row at `timestamp`.
pub fn aggregate(source: &HistoryChunk, timestamp: f64) -> Option<HistoryChunk> {
    let configuration = source.configuration().clone();
    let decimal_count = configuration.decimal_count();
    let enum_count = configuration.enum_count();

    let mut envelopes = vec![Envelope::default(); decimal_count];
    let mut tallies = vec![EnumTally::default(); enum_count];

    for row in 0..source.timestamp_count() {
        for (series, envelope) in envelopes.iter_mut().enumerate() {
            let series = DecimalDataSeriesIndex(series);
            let value = source.decimal_value(row, series).unwrap_or(f64::NAN);
            let min = source.decimal_min(row, series).unwrap_or(f64::NAN);
            let max = source.decimal_max(row, series).unwrap_or(f64::NAN);
            envelope.push(value, min, max);
        }
        for (series, tally) in tallies.iter_mut().enumerate() {
            let series = EnumDataSeriesIndex(series);
            let set = source.enum_value(row, series).unwrap_or(HistoryEnumSet::EMPTY);
            tally.push(set, source.most_of_the_time(row, series));
        }
    }

    let means: Vec<f64> = envelopes.iter().map(Envelope::mean).collect();
    let mins: Vec<f64> = envelopes.iter().map(Envelope::min).collect();
    let maxs: Vec<f64> = envelopes.iter().map(Envelope::max).collect();
    let enums: Vec<HistoryEnumSet> = tallies.iter().map(|tally| tally.union).collect();
    let most_of_the_time: Vec<Option<HistoryEnumOrdinal>> =
        tallies.iter().map(EnumTally::most_of_the_time).collect();

    let mut builder = HistoryChunkBuilder::new(configuration);
    builder
        .add_calculated(
            timestamp,
            CalculatedRow {
                means: &means,
                mins: &mins,
                maxs: &maxs,
                enums: &enums,
                most_of_the_time: &most_of_the_time,
            },
        )
        .ok()?;
    builder.build()
}
