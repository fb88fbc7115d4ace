//! Time-ordered blocks of samples.
//!
//! Values are stored row-major: one row per timestamp, holding one value per
//! decimal series followed by the enum sets in a separate column block.

use std::ops::Range;
use std::sync::Arc;

use crate::error::HistoryError;
use crate::history::configuration::{DecimalDataSeriesIndex, EnumDataSeriesIndex, HistoryConfiguration};
use crate::history::enums::{HistoryEnumOrdinal, HistoryEnumSet};
use crate::time::TimeRange;

/// Origin of the values in a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordingType {
    /// Values were recorded as provided.
    Measured,
    /// Values were aggregated from a finer sampling period.
    Calculated,
}

/// Aggregate columns carried by calculated chunks.
#[derive(Debug, Clone, PartialEq, Default)]
struct Aggregates {
    mins: Vec<f64>,
    maxs: Vec<f64>,
    most_of_the_time: Vec<Option<HistoryEnumOrdinal>>,
}

/// A borrowed view of one row of a chunk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistorySample<'a> {
    /// Timestamp of the row.
    pub timestamp: f64,
    /// One value per decimal series.
    pub decimals: &'a [f64],
    /// One ordinal set per enum series.
    pub enums: &'a [HistoryEnumSet],
}

/// A non-empty, strictly time-ordered block of samples for one configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryChunk {
    configuration: Arc<HistoryConfiguration>,
    timestamps: Vec<f64>,
    decimals: Vec<f64>,
    enums: Vec<HistoryEnumSet>,
    aggregates: Option<Aggregates>,
}

impl HistoryChunk {
    /// Start building a chunk for the configuration.
    pub fn builder(configuration: Arc<HistoryConfiguration>) -> HistoryChunkBuilder {
        HistoryChunkBuilder::new(configuration)
    }

    /// The configuration the values belong to.
    pub fn configuration(&self) -> &Arc<HistoryConfiguration> {
        &self.configuration
    }

    /// Whether the values were measured or calculated.
    pub fn recording_type(&self) -> RecordingType {
        if self.aggregates.is_some() {
            RecordingType::Calculated
        } else {
            RecordingType::Measured
        }
    }

    /// Number of timestamps.
    pub fn timestamp_count(&self) -> usize {
        self.timestamps.len()
    }

    /// All timestamps.
    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    /// First timestamp.
    pub fn first_timestamp(&self) -> f64 {
        self.timestamps[0]
    }

    /// Last timestamp.
    pub fn last_timestamp(&self) -> f64 {
        self.timestamps[self.timestamps.len() - 1]
    }

    /// Range from the first to the last timestamp.
    pub fn time_range(&self) -> TimeRange {
        TimeRange::new(self.first_timestamp(), self.last_timestamp())
    }

    /// Access one row.
    pub fn sample(&self, index: usize) -> Option<HistorySample<'_>> {
        let timestamp = *self.timestamps.get(index)?;
        let decimal_count = self.configuration.decimal_count();
        let enum_count = self.configuration.enum_count();
        Some(HistorySample {
            timestamp,
            decimals: &self.decimals[index * decimal_count..(index + 1) * decimal_count],
            enums: &self.enums[index * enum_count..(index + 1) * enum_count],
        })
    }

    /// Iterate every row.
    pub fn samples(&self) -> impl Iterator<Item = HistorySample<'_>> {
        (0..self.timestamps.len()).filter_map(|index| self.sample(index))
    }

    /// Decimal value of a series at a row.
    pub fn decimal_value(&self, index: usize, series: DecimalDataSeriesIndex) -> Option<f64> {
        self.decimal_slot(index, series).map(|slot| self.decimals[slot])
    }

    /// Minimum of a series at a row. Measured rows report their value.
    pub fn decimal_min(&self, index: usize, series: DecimalDataSeriesIndex) -> Option<f64> {
        let slot = self.decimal_slot(index, series)?;
        Some(match &self.aggregates {
            Some(aggregates) => aggregates.mins[slot],
            None => self.decimals[slot],
        })
    }

    /// Maximum of a series at a row. Measured rows report their value.
    pub fn decimal_max(&self, index: usize, series: DecimalDataSeriesIndex) -> Option<f64> {
        let slot = self.decimal_slot(index, series)?;
        Some(match &self.aggregates {
            Some(aggregates) => aggregates.maxs[slot],
            None => self.decimals[slot],
        })
    }

    /// All values of one decimal series, in time order.
    pub fn decimal_values(&self, series: DecimalDataSeriesIndex) -> impl Iterator<Item = f64> + '_ {
        (0..self.timestamps.len()).filter_map(move |index| self.decimal_value(index, series))
    }

    /// Enum set of a series at a row.
    pub fn enum_value(&self, index: usize, series: EnumDataSeriesIndex) -> Option<HistoryEnumSet> {
        self.enum_slot(index, series).map(|slot| self.enums[slot])
    }

    /// Ordinal present most of the time at a row.
    pub fn most_of_the_time(&self, index: usize, series: EnumDataSeriesIndex) -> Option<HistoryEnumOrdinal> {
        let slot = self.enum_slot(index, series)?;
        match &self.aggregates {
            Some(aggregates) => aggregates.most_of_the_time[slot],
            None => self.enums[slot].most_important(),
        }
    }

    /// Index of the first timestamp `>= timestamp`.
    pub fn lower_bound(&self, timestamp: f64) -> usize {
        self.timestamps.partition_point(|existing| *existing < timestamp)
    }

    /// Index after the last timestamp `<= timestamp`.
    pub fn upper_bound(&self, timestamp: f64) -> usize {
        self.timestamps.partition_point(|existing| *existing <= timestamp)
    }

    /// Rows within the inclusive range, or `None` if there are none.
    pub fn slice(&self, range: TimeRange) -> Option<Self> {
        let start = self.lower_bound(range.start);
        let end = self.upper_bound(range.end);
        self.slice_rows(start..end)
    }

    /// Rows with `start <= timestamp < end`.
    pub fn slice_half_open(&self, start: f64, end: f64) -> Option<Self> {
        let from = self.lower_bound(start);
        let to = self.lower_bound(end);
        self.slice_rows(from..to)
    }

    /// Rows by index.
    pub fn slice_rows(&self, rows: Range<usize>) -> Option<Self> {
        if rows.start >= rows.end || rows.end > self.timestamps.len() {
            return None;
        }
        if rows.start == 0 && rows.end == self.timestamps.len() {
            return Some(self.clone());
        }
        let mut builder = HistoryChunkBuilder::new(self.configuration.clone());
        for index in rows {
            builder.push_row_from(self, index);
        }
        builder.build()
    }

    /// Merge chunks of the same configuration, oldest first.
    ///
    /// Chunks that start after everything merged so far are appended in
    /// place; only overlapping chunks are interleaved through [`Self::merge`].
    pub fn merge_all(chunks: impl IntoIterator<Item = Self>) -> Option<Self> {
        let mut chunks = chunks.into_iter();
        let first = chunks.next()?;
        let mut last = first.last_timestamp();
        let mut builder = HistoryChunkBuilder::from_chunk(&first);
        for chunk in chunks {
            if chunk.first_timestamp() > last {
                for index in 0..chunk.timestamps.len() {
                    builder.push_row_from(&chunk, index);
                }
            } else {
                let merged = builder.build()?.merge(&chunk);
                builder = HistoryChunkBuilder::from_chunk(&merged);
            }
            last = last.max(chunk.last_timestamp());
        }
        builder.build()
    }

    /// Merge with a newer chunk of the same configuration.
    ///
    /// Rows are interleaved by timestamp; rows of `newer` replace rows with an
    /// identical timestamp.
    pub fn merge(&self, newer: &Self) -> Self {
        if self.last_timestamp() < newer.first_timestamp() {
            return self.concat(newer);
        }
        let mut builder = HistoryChunkBuilder::new(self.configuration.clone());
        let (mut old, mut new) = (0, 0);
        while old < self.timestamps.len() || new < newer.timestamps.len() {
            let old_ts = self.timestamps.get(old).copied();
            let new_ts = newer.timestamps.get(new).copied();
            match (old_ts, new_ts) {
                (Some(a), Some(b)) if a < b => {
                    builder.push_row_from(self, old);
                    old += 1;
                }
                (Some(a), Some(b)) if a == b => {
                    builder.push_row_from(newer, new);
                    old += 1;
                    new += 1;
                }
                (_, Some(_)) => {
                    builder.push_row_from(newer, new);
                    new += 1;
                }
                (Some(_), None) => {
                    builder.push_row_from(self, old);
                    old += 1;
                }
                (None, None) => break,
            }
        }
        builder.build().unwrap_or_else(|| newer.clone())
    }

    /// Split the chunk into groups keyed by `floor(timestamp / span)`.
    pub fn split_by_span(&self, span: f64) -> Vec<(i64, Self)> {
        let mut groups = Vec::new();
        let mut start = 0;
        while start < self.timestamps.len() {
            let key = (self.timestamps[start] / span).floor() as i64;
            let group_end = (key as f64 + 1.0) * span;
            let end = self.lower_bound(group_end).max(start + 1);
            if let Some(chunk) = self.slice_rows(start..end) {
                groups.push((key, chunk));
            }
            start = end;
        }
        groups
    }

    fn concat(&self, newer: &Self) -> Self {
        let mut builder = HistoryChunkBuilder::from_chunk(self);
        for index in 0..newer.timestamps.len() {
            builder.push_row_from(newer, index);
        }
        builder.build().unwrap_or_else(|| newer.clone())
    }

    fn decimal_slot(&self, index: usize, series: DecimalDataSeriesIndex) -> Option<usize> {
        let count = self.configuration.decimal_count();
        (index < self.timestamps.len() && series.0 < count).then_some(index * count + series.0)
    }

    fn enum_slot(&self, index: usize, series: EnumDataSeriesIndex) -> Option<usize> {
        let count = self.configuration.enum_count();
        (index < self.timestamps.len() && series.0 < count).then_some(index * count + series.0)
    }
}

/// Incremental builder for [`HistoryChunk`].
#[derive(Debug, Clone)]
pub struct HistoryChunkBuilder {
    configuration: Arc<HistoryConfiguration>,
    timestamps: Vec<f64>,
    decimals: Vec<f64>,
    enums: Vec<HistoryEnumSet>,
    aggregates: Option<Aggregates>,
}

impl HistoryChunkBuilder {
    /// Create an empty builder.
    pub fn new(configuration: Arc<HistoryConfiguration>) -> Self {
        Self {
            configuration,
            timestamps: Vec::new(),
            decimals: Vec::new(),
            enums: Vec::new(),
            aggregates: None,
        }
    }

    fn from_chunk(chunk: &HistoryChunk) -> Self {
        Self {
            configuration: chunk.configuration.clone(),
            timestamps: chunk.timestamps.clone(),
            decimals: chunk.decimals.clone(),
            enums: chunk.enums.clone(),
            aggregates: chunk.aggregates.clone(),
        }
    }

    /// Number of rows added so far.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Check if no rows were added.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Append a measured row.
    pub fn add(
        &mut self,
        timestamp: f64,
        decimals: &[f64],
        enums: &[HistoryEnumSet],
    ) -> Result<&mut Self, HistoryError> {
        self.validate(timestamp, decimals.len(), enums.len())?;
        self.timestamps.push(timestamp);
        self.decimals.extend_from_slice(decimals);
        self.enums.extend_from_slice(enums);
        if let Some(aggregates) = self.aggregates.as_mut() {
            aggregates.mins.extend_from_slice(decimals);
            aggregates.maxs.extend_from_slice(decimals);
            aggregates
                .most_of_the_time
                .extend(enums.iter().map(|set| set.most_important()));
        }
        Ok(self)
    }

    /// Append a calculated row with aggregate columns.
    pub(crate) fn add_calculated(
        &mut self,
        timestamp: f64,
        row: CalculatedRow<'_>,
    ) -> Result<&mut Self, HistoryError> {
        self.validate(timestamp, row.means.len(), row.enums.len())?;
        self.materialize_aggregates();
        self.timestamps.push(timestamp);
        self.decimals.extend_from_slice(row.means);
        self.enums.extend_from_slice(row.enums);
        if let Some(aggregates) = self.aggregates.as_mut() {
            aggregates.mins.extend_from_slice(row.mins);
            aggregates.maxs.extend_from_slice(row.maxs);
            aggregates
                .most_of_the_time
                .extend_from_slice(row.most_of_the_time);
        }
        Ok(self)
    }

    /// Finish the chunk. Returns `None` if no rows were added.
    pub fn build(self) -> Option<HistoryChunk> {
        if self.timestamps.is_empty() {
            return None;
        }
        Some(HistoryChunk {
            configuration: self.configuration,
            timestamps: self.timestamps,
            decimals: self.decimals,
            enums: self.enums,
            aggregates: self.aggregates,
        })
    }

    fn validate(&self, timestamp: f64, decimal_count: usize, enum_count: usize) -> Result<(), HistoryError> {
        if !timestamp.is_finite() {
            return Err(HistoryError::NonFiniteTimestamp(timestamp));
        }
        if decimal_count != self.configuration.decimal_count() {
            return Err(HistoryError::SeriesCountMismatch {
                kind: "decimal",
                expected: self.configuration.decimal_count(),
                actual: decimal_count,
            });
        }
        if enum_count != self.configuration.enum_count() {
            return Err(HistoryError::SeriesCountMismatch {
                kind: "enum",
                expected: self.configuration.enum_count(),
                actual: enum_count,
            });
        }
        if let Some(previous) = self.timestamps.last().copied()
            && timestamp <= previous
        {
            return Err(HistoryError::NonMonotonicTimestamp { previous, timestamp });
        }
        Ok(())
    }

    fn materialize_aggregates(&mut self) {
        if self.aggregates.is_some() {
            return;
        }
        self.aggregates = Some(Aggregates {
            mins: self.decimals.clone(),
            maxs: self.decimals.clone(),
            most_of_the_time: self.enums.iter().map(|set| set.most_important()).collect(),
        });
    }

    /// Copy a row of a chunk of the same configuration. Ordering is the
    /// caller's responsibility.
    fn push_row_from(&mut self, source: &HistoryChunk, index: usize) {
        let decimal_count = source.configuration.decimal_count();
        let enum_count = source.configuration.enum_count();
        let decimals = index * decimal_count..(index + 1) * decimal_count;
        let enums = index * enum_count..(index + 1) * enum_count;

        if source.aggregates.is_some() {
            self.materialize_aggregates();
        }
        self.timestamps.push(source.timestamps[index]);
        self.decimals.extend_from_slice(&source.decimals[decimals.clone()]);
        self.enums.extend_from_slice(&source.enums[enums.clone()]);

        if let Some(aggregates) = self.aggregates.as_mut() {
            match &source.aggregates {
                Some(source_aggregates) => {
                    aggregates.mins.extend_from_slice(&source_aggregates.mins[decimals.clone()]);
                    aggregates.maxs.extend_from_slice(&source_aggregates.maxs[decimals]);
                    aggregates
                        .most_of_the_time
                        .extend_from_slice(&source_aggregates.most_of_the_time[enums]);
                }
                None => {
                    aggregates.mins.extend_from_slice(&source.decimals[decimals.clone()]);
                    aggregates.maxs.extend_from_slice(&source.decimals[decimals]);
                    aggregates
                        .most_of_the_time
                        .extend(source.enums[enums].iter().map(|set| set.most_important()));
                }
            }
        }
    }
}

/// Values of one calculated row.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CalculatedRow<'a> {
    pub(crate) means: &'a [f64],
    pub(crate) mins: &'a [f64],
    pub(crate) maxs: &'a [f64],
    pub(crate) enums: &'a [HistoryEnumSet],
    pub(crate) most_of_the_time: &'a [Option<HistoryEnumOrdinal>],
}
