//! In-memory history storage.
//!
//! Data is partitioned by sampling period. Each partition holds buckets of
//! [`SamplingPeriod::bucket_span`] width, keyed by `floor(timestamp / span)`;
//! every bucket is a single merged chunk, so chunks within a partition never
//! overlap.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use crate::error::HistoryError;
use crate::history::chunk::{HistoryChunk, HistorySample};
use crate::history::configuration::{DecimalDataSeriesIndex, HistoryConfiguration};
use crate::history::downsampling;
use crate::history::sampling::SamplingPeriod;
use crate::observable::{Subscribers, SubscriptionHandle};
use crate::time::TimeRange;

const LOG_TARGET: &str = "meistercharts::history::storage";

/// Retention applied to the natural sampling period by default (one hour).
pub const DEFAULT_GUARANTEED_HISTORY_LENGTH: f64 = 60.0 * 60.0 * 1_000.0;

/// Number of slots downsampled per maintenance pass.
pub const DEFAULT_DOWN_SAMPLING_BUDGET: usize = 256;

/// Read access to a history.
pub trait HistoryStorage {
    /// All stored samples of the period intersecting the range.
    ///
    /// Only what is stored for exactly this period is returned; callers that
    /// need coarser data have to ask for a coarser period.
    fn query(&self, range: TimeRange, sampling_period: SamplingPeriod) -> HistoryQueryResult;

    /// The period samples are ingested at.
    fn natural_sampling_period(&self) -> SamplingPeriod;

    /// Whether coarser periods are filled from the natural one. If not, only
    /// the natural period holds ingested data.
    fn is_down_sampling_enabled(&self) -> bool;
}

/// Ordered chunks returned by a query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HistoryQueryResult {
    chunks: Vec<HistoryChunk>,
}

impl HistoryQueryResult {
    /// Wrap ordered, non-overlapping chunks.
    pub fn new(chunks: Vec<HistoryChunk>) -> Self {
        Self { chunks }
    }

    /// The chunks in time order.
    pub fn chunks(&self) -> &[HistoryChunk] {
        &self.chunks
    }

    /// Check if nothing was found.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Total number of samples.
    pub fn timestamp_count(&self) -> usize {
        self.chunks.iter().map(HistoryChunk::timestamp_count).sum()
    }

    /// All timestamps in order.
    pub fn timestamps(&self) -> Vec<f64> {
        self.chunks
            .iter()
            .flat_map(|chunk| chunk.timestamps().iter().copied())
            .collect()
    }

    /// All values of one decimal series in order.
    pub fn decimal_values(&self, series: DecimalDataSeriesIndex) -> Vec<f64> {
        self.chunks
            .iter()
            .flat_map(|chunk| chunk.decimal_values(series))
            .collect()
    }

    /// Iterate every sample in order.
    pub fn samples(&self) -> impl Iterator<Item = HistorySample<'_>> {
        self.chunks.iter().flat_map(HistoryChunk::samples)
    }

    /// Range from the first to the last returned timestamp.
    pub fn time_range(&self) -> Option<TimeRange> {
        let first = self.chunks.first()?;
        let last = self.chunks.last()?;
        Some(TimeRange::new(first.first_timestamp(), last.last_timestamp()))
    }
}

/// Describes which data changed on a store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryUpdateInfo {
    /// Period that received data.
    pub sampling_period: SamplingPeriod,
    /// Range covered by the stored data.
    pub time_range: TimeRange,
}

#[derive(Debug, Clone, Default)]
struct Partition {
    buckets: BTreeMap<i64, HistoryChunk>,
    latest: Option<f64>,
}

impl Partition {
    fn store(&mut self, chunk: &HistoryChunk, span: f64) {
        for (key, part) in chunk.split_by_span(span) {
            let merged = match self.buckets.remove(&key) {
                Some(existing) => existing.merge(&part),
                None => part,
            };
            self.buckets.insert(key, merged);
        }
        let last = chunk.last_timestamp();
        self.latest = Some(self.latest.map_or(last, |latest| latest.max(last)));
    }

    fn query(&self, range: TimeRange, span: f64) -> Vec<HistoryChunk> {
        if range.start.is_nan() || range.end.is_nan() {
            return Vec::new();
        }
        let first = (range.start / span).floor() as i64;
        let last = (range.end / span).floor() as i64;
        if first > last {
            return Vec::new();
        }
        self.buckets
            .range(first..=last)
            .filter_map(|(_, chunk)| chunk.slice(range))
            .collect()
    }

    fn rows_half_open(&self, start: f64, end: f64, span: f64) -> Option<HistoryChunk> {
        let first = (start / span).floor() as i64;
        let last = (end / span).floor() as i64;
        self.buckets
            .range(first..=last)
            .filter_map(|(_, chunk)| chunk.slice_half_open(start, end))
            .reduce(|merged, next| merged.merge(&next))
    }

    /// Drop every sample older than the cutoff. Returns the number removed.
    fn evict_before(&mut self, cutoff: f64) -> usize {
        let mut removed = 0;
        while let Some(mut entry) = self.buckets.first_entry() {
            if entry.get().last_timestamp() < cutoff {
                removed += entry.get().timestamp_count();
                entry.remove();
                continue;
            }
            if entry.get().first_timestamp() < cutoff {
                let trimmed = {
                    let chunk = entry.get();
                    let start = chunk.lower_bound(cutoff);
                    removed += start;
                    chunk.slice_rows(start..chunk.timestamp_count())
                };
                if let Some(trimmed) = trimmed {
                    *entry.get_mut() = trimmed;
                }
            }
            break;
        }
        removed
    }

    fn sample_count(&self) -> usize {
        self.buckets.values().map(HistoryChunk::timestamp_count).sum()
    }
}

/// History storage that keeps everything in memory.
///
/// Holds data for exactly one [`HistoryConfiguration`] at a time; storing a
/// chunk for another configuration fails until [`clear`](Self::clear) is
/// called.
#[derive(Debug)]
pub struct InMemoryHistoryStorage {
    natural_sampling_period: SamplingPeriod,
    guaranteed_history_length: f64,
    down_sampling_enabled: bool,
    configuration: Option<Arc<HistoryConfiguration>>,
    partitions: BTreeMap<SamplingPeriod, Partition>,
    pending_down_sampling: BTreeMap<SamplingPeriod, BTreeSet<i64>>,
    update_subscribers: Subscribers<HistoryUpdateInfo>,
}

impl InMemoryHistoryStorage {
    /// Create an empty storage with a natural period of 100 ms.
    pub fn new() -> Self {
        Self {
            natural_sampling_period: SamplingPeriod::EveryHundredMillis,
            guaranteed_history_length: DEFAULT_GUARANTEED_HISTORY_LENGTH,
            down_sampling_enabled: false,
            configuration: None,
            partitions: BTreeMap::new(),
            pending_down_sampling: BTreeMap::new(),
            update_subscribers: Subscribers::new(),
        }
    }

    /// Set the period samples are ingested at.
    pub fn set_natural_sampling_period(&mut self, sampling_period: SamplingPeriod) {
        self.natural_sampling_period = sampling_period;
    }

    /// Set the guaranteed history length (ms) of the natural period.
    ///
    /// Shorter retention takes effect on the next store into a partition or
    /// the next [`perform_maintenance`](Self::perform_maintenance).
    pub fn set_guaranteed_history_length(&mut self, length: f64) {
        self.guaranteed_history_length = length.max(0.0);
    }

    /// The guaranteed history length (ms) of the natural period.
    pub fn guaranteed_history_length(&self) -> f64 {
        self.guaranteed_history_length
    }

    /// Retention (ms) of a period.
    ///
    /// Scaled by the period distance so every level keeps the same number of
    /// samples; coarse data outlives fine data.
    pub fn retention(&self, sampling_period: SamplingPeriod) -> f64 {
        self.guaranteed_history_length * sampling_period.distance()
            / self.natural_sampling_period.distance()
    }

    /// Enable background downsampling and queue the data already stored.
    pub fn schedule_down_sampling(&mut self) {
        if self.down_sampling_enabled {
            return;
        }
        self.down_sampling_enabled = true;
        let stored: Vec<(SamplingPeriod, Vec<f64>)> = self
            .partitions
            .iter()
            .map(|(period, partition)| {
                let timestamps = partition
                    .buckets
                    .values()
                    .flat_map(|chunk| chunk.timestamps().iter().copied())
                    .collect();
                (*period, timestamps)
            })
            .collect();
        for (period, timestamps) in stored {
            self.mark_for_down_sampling(period, &timestamps);
        }
        tracing::debug!(target: LOG_TARGET, pending = self.pending_slot_count(), "down sampling scheduled");
    }

    /// Disable background downsampling and drop pending work.
    pub fn stop_down_sampling(&mut self) {
        self.down_sampling_enabled = false;
        self.pending_down_sampling.clear();
        tracing::debug!(target: LOG_TARGET, "down sampling stopped");
    }

    /// Number of coarse slots waiting to be recomputed.
    pub fn pending_slot_count(&self) -> usize {
        self.pending_down_sampling.values().map(BTreeSet::len).sum()
    }

    /// The configuration of the stored data, if any.
    pub fn configuration(&self) -> Option<&Arc<HistoryConfiguration>> {
        self.configuration.as_ref()
    }

    /// Store a chunk into the partition of the period.
    pub fn store(&mut self, chunk: &HistoryChunk, sampling_period: SamplingPeriod) -> Result<(), HistoryError> {
        match &self.configuration {
            Some(current) => {
                if !Arc::ptr_eq(current, chunk.configuration()) && **current != **chunk.configuration() {
                    return Err(HistoryError::ConfigurationMismatch);
                }
            }
            None => self.configuration = Some(chunk.configuration().clone()),
        }

        self.store_unchecked(chunk, sampling_period);
        if self.down_sampling_enabled {
            self.mark_for_down_sampling(sampling_period, chunk.timestamps());
        }
        self.evict(sampling_period);

        tracing::trace!(
            target: LOG_TARGET,
            ?sampling_period,
            samples = chunk.timestamp_count(),
            start = chunk.first_timestamp(),
            end = chunk.last_timestamp(),
            "stored chunk"
        );
        Ok(())
    }

    /// Number of samples stored for a period.
    pub fn sample_count(&self, sampling_period: SamplingPeriod) -> usize {
        self.partitions
            .get(&sampling_period)
            .map_or(0, Partition::sample_count)
    }

    /// Evict expired data in every partition and run a budgeted downsampling
    /// pass. Called between frames.
    pub fn perform_maintenance(&mut self) {
        let periods: Vec<SamplingPeriod> = self.partitions.keys().copied().collect();
        for period in periods {
            self.evict(period);
        }
        if self.down_sampling_enabled {
            self.run_down_sampling(DEFAULT_DOWN_SAMPLING_BUDGET);
        }
    }

    /// Recompute up to `budget` pending coarse slots, finest period first.
    /// Returns the number of slots processed.
    pub fn run_down_sampling(&mut self, budget: usize) -> usize {
        let mut processed = 0;
        while processed < budget {
            let Some(mut entry) = self.pending_down_sampling.first_entry() else {
                break;
            };
            let target = *entry.key();
            let slot = entry.get_mut().pop_first();
            if entry.get().is_empty() {
                entry.remove();
            }
            let Some(slot) = slot else {
                continue;
            };
            self.down_sample_slot(target, slot);
            processed += 1;
        }
        if processed > 0 {
            tracing::debug!(target: LOG_TARGET, processed, remaining = self.pending_slot_count(), "down sampling pass");
        }
        processed
    }

    /// Drop all stored data and pending work.
    pub fn clear(&mut self) {
        self.partitions.clear();
        self.pending_down_sampling.clear();
        self.configuration = None;
        tracing::debug!(target: LOG_TARGET, "history cleared");
    }

    /// Register a callback invoked after data was stored.
    pub fn on_stored(&mut self, callback: impl FnMut(&HistoryUpdateInfo) + 'static) -> SubscriptionHandle {
        self.update_subscribers.subscribe(callback)
    }

    /// Remove a store callback.
    pub fn unsubscribe(&mut self, handle: SubscriptionHandle) -> bool {
        self.update_subscribers.unsubscribe(handle)
    }

    fn store_unchecked(&mut self, chunk: &HistoryChunk, sampling_period: SamplingPeriod) {
        self.partitions
            .entry(sampling_period)
            .or_default()
            .store(chunk, sampling_period.bucket_span());
        self.update_subscribers.notify(&HistoryUpdateInfo {
            sampling_period,
            time_range: chunk.time_range(),
        });
    }

    fn evict(&mut self, sampling_period: SamplingPeriod) {
        let retention = self.retention(sampling_period);
        let Some(partition) = self.partitions.get_mut(&sampling_period) else {
            return;
        };
        let Some(latest) = partition.latest else {
            return;
        };
        let removed = partition.evict_before(latest - retention);
        if removed > 0 {
            tracing::debug!(target: LOG_TARGET, ?sampling_period, removed, "evicted samples");
        }
    }

    fn mark_for_down_sampling(&mut self, source: SamplingPeriod, timestamps: &[f64]) {
        let Some(target) = source.above() else {
            return;
        };
        let slots = self.pending_down_sampling.entry(target).or_default();
        for timestamp in timestamps {
            slots.insert(downsampling::slot_of(target, *timestamp));
        }
    }

    fn down_sample_slot(&mut self, target: SamplingPeriod, slot: i64) {
        let Some(source) = target.below() else {
            return;
        };
        let start = slot as f64 * target.distance();
        let end = start + target.distance();
        let rows = self
            .partitions
            .get(&source)
            .and_then(|partition| partition.rows_half_open(start, end, source.bucket_span()));
        let Some(rows) = rows else {
            return;
        };
        let Some(aggregated) = downsampling::aggregate(&rows, downsampling::slot_timestamp(target, slot)) else {
            return;
        };
        self.store_unchecked(&aggregated, target);
        self.mark_for_down_sampling(target, aggregated.timestamps());
        self.evict(target);
    }
}

impl Default for InMemoryHistoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryStorage for InMemoryHistoryStorage {
    fn query(&self, range: TimeRange, sampling_period: SamplingPeriod) -> HistoryQueryResult {
        let chunks = self
            .partitions
            .get(&sampling_period)
            .map(|partition| partition.query(range, sampling_period.bucket_span()))
            .unwrap_or_default();
        HistoryQueryResult::new(chunks)
    }

    fn natural_sampling_period(&self) -> SamplingPeriod {
        self.natural_sampling_period
    }

    fn is_down_sampling_enabled(&self) -> bool {
        self.down_sampling_enabled
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::history::chunk::tests::{chunk_of, single_decimal_configuration};
    use proptest::prelude::*;

    const P: SamplingPeriod = SamplingPeriod::EveryHundredMillis;
    const SERIES: DecimalDataSeriesIndex = DecimalDataSeriesIndex(0);

    #[test]
    fn store_then_query_then_clear() {
        let configuration = single_decimal_configuration();
        let mut storage = InMemoryHistoryStorage::new();
        storage
            .store(&chunk_of(&configuration, &[(0.0, 1.0), (100.0, 2.0), (200.0, 3.0)]), P)
            .unwrap();

        let result = storage.query(TimeRange::new(0.0, 200.0), P);
        assert_eq!(result.timestamp_count(), 3);
        assert_eq!(result.decimal_values(SERIES), vec![1.0, 2.0, 3.0]);

        storage.clear();
        assert!(storage.query(TimeRange::new(0.0, 200.0), P).is_empty());
    }

    #[test]
    fn query_other_period_is_empty() {
        let configuration = single_decimal_configuration();
        let mut storage = InMemoryHistoryStorage::new();
        storage.store(&chunk_of(&configuration, &[(0.0, 1.0)]), P).unwrap();
        assert!(storage.query(TimeRange::new(0.0, 200.0), SamplingPeriod::EverySecond).is_empty());
    }

    #[test]
    fn adjacent_stores_are_merged() {
        let configuration = single_decimal_configuration();
        let mut storage = InMemoryHistoryStorage::new();
        storage.store(&chunk_of(&configuration, &[(0.0, 1.0), (100.0, 2.0)]), P).unwrap();
        storage.store(&chunk_of(&configuration, &[(200.0, 3.0)]), P).unwrap();
        let result = storage.query(TimeRange::new(0.0, 1_000.0), P);
        assert_eq!(result.chunks().len(), 1);
        assert_eq!(result.timestamps(), vec![0.0, 100.0, 200.0]);
    }

    #[test]
    fn query_spanning_buckets_stays_ordered() {
        let configuration = single_decimal_configuration();
        let mut storage = InMemoryHistoryStorage::new();
        let span = P.bucket_span();
        let rows = [(span - 100.0, 1.0), (span, 2.0), (span + 100.0, 3.0)];
        storage.store(&chunk_of(&configuration, &rows), P).unwrap();
        let result = storage.query(TimeRange::new(0.0, span * 2.0), P);
        assert_eq!(result.chunks().len(), 2);
        assert_eq!(result.decimal_values(SERIES), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn retention_evicts_oldest_samples() {
        let configuration = single_decimal_configuration();
        let mut storage = InMemoryHistoryStorage::new();
        storage.set_guaranteed_history_length(50.0);
        let rows: Vec<(f64, f64)> = (0..=4).map(|i| (i as f64 * 50.0, i as f64)).collect();
        storage.store(&chunk_of(&configuration, &rows), P).unwrap();

        assert!(storage.query(TimeRange::new(0.0, 50.0), P).is_empty());
        assert_eq!(
            storage.query(TimeRange::new(0.0, 200.0), P).timestamps(),
            vec![150.0, 200.0]
        );
    }

    #[test]
    fn shorter_retention_applies_on_maintenance() {
        let configuration = single_decimal_configuration();
        let mut storage = InMemoryHistoryStorage::new();
        storage
            .store(&chunk_of(&configuration, &[(0.0, 1.0), (100.0, 2.0), (200.0, 3.0)]), P)
            .unwrap();
        storage.set_guaranteed_history_length(100.0);
        assert_eq!(storage.sample_count(P), 3);
        storage.perform_maintenance();
        assert_eq!(storage.sample_count(P), 2);
    }

    #[test]
    fn retention_scales_with_period() {
        let mut storage = InMemoryHistoryStorage::new();
        storage.set_guaranteed_history_length(1_000.0);
        assert_eq!(storage.retention(P), 1_000.0);
        assert_eq!(storage.retention(SamplingPeriod::EverySecond), 10_000.0);
    }

    #[test]
    fn mixing_configurations_is_rejected_until_cleared() {
        let first = single_decimal_configuration();
        let second = crate::history::configuration::HistoryConfiguration::builder()
            .decimal(1, "A", None)
            .decimal(2, "B", None)
            .build();
        let mut storage = InMemoryHistoryStorage::new();
        storage.store(&chunk_of(&first, &[(0.0, 1.0)]), P).unwrap();

        let mut builder = HistoryChunk::builder(second.clone());
        builder.add(100.0, &[1.0, 2.0], &[]).unwrap();
        let foreign = builder.build().unwrap();
        assert_eq!(storage.store(&foreign, P), Err(HistoryError::ConfigurationMismatch));

        storage.clear();
        assert_eq!(storage.store(&foreign, P), Ok(()));
    }

    #[test]
    fn equal_configuration_instances_are_compatible() {
        let mut storage = InMemoryHistoryStorage::new();
        storage.store(&chunk_of(&single_decimal_configuration(), &[(0.0, 1.0)]), P).unwrap();
        let result = storage.store(&chunk_of(&single_decimal_configuration(), &[(100.0, 1.0)]), P);
        assert_eq!(result, Ok(()));
    }

    #[test]
    fn down_sampling_fills_coarser_periods() {
        let configuration = single_decimal_configuration();
        let mut storage = InMemoryHistoryStorage::new();
        storage.schedule_down_sampling();
        let rows: Vec<(f64, f64)> = (0..20).map(|i| (i as f64 * 100.0, i as f64)).collect();
        storage.store(&chunk_of(&configuration, &rows), P).unwrap();
        assert!(storage.query(TimeRange::new(0.0, 2_000.0), SamplingPeriod::EverySecond).is_empty());

        storage.run_down_sampling(usize::MAX);

        let coarse = storage.query(TimeRange::new(0.0, 2_000.0), SamplingPeriod::EverySecond);
        assert_eq!(coarse.timestamps(), vec![500.0, 1_500.0]);
        assert_eq!(coarse.decimal_values(SERIES), vec![4.5, 14.5]);
        let chunk = &coarse.chunks()[0];
        assert_eq!(chunk.decimal_min(0, SERIES), Some(0.0));
        assert_eq!(chunk.decimal_max(0, SERIES), Some(9.0));

        let coarser = storage.query(TimeRange::new(0.0, 10_000.0), SamplingPeriod::EveryTenSeconds);
        assert_eq!(coarser.timestamp_count(), 1);
        assert_eq!(storage.pending_slot_count(), 0);
    }

    #[test]
    fn down_sampling_is_idempotent() {
        let configuration = single_decimal_configuration();
        let mut storage = InMemoryHistoryStorage::new();
        storage.schedule_down_sampling();
        let rows: Vec<(f64, f64)> = (0..10).map(|i| (i as f64 * 100.0, i as f64)).collect();
        let chunk = chunk_of(&configuration, &rows);
        storage.store(&chunk, P).unwrap();
        storage.run_down_sampling(usize::MAX);
        let first = storage.query(TimeRange::new(0.0, 1_000.0), SamplingPeriod::EverySecond);

        storage.store(&chunk, P).unwrap();
        storage.run_down_sampling(usize::MAX);
        let second = storage.query(TimeRange::new(0.0, 1_000.0), SamplingPeriod::EverySecond);
        assert_eq!(first, second);
    }

    #[test]
    fn coarse_data_outlives_evicted_fine_data() {
        let configuration = single_decimal_configuration();
        let mut storage = InMemoryHistoryStorage::new();
        storage.set_guaranteed_history_length(1_000.0);
        storage.schedule_down_sampling();
        for i in 0..50 {
            let timestamp = i as f64 * 100.0;
            storage.store(&chunk_of(&configuration, &[(timestamp, i as f64)]), P).unwrap();
            storage.perform_maintenance();
        }

        let early = TimeRange::new(0.0, 999.0);
        assert!(storage.query(early, P).is_empty());
        assert_eq!(storage.query(TimeRange::new(3_900.0, 4_900.0), P).timestamp_count(), 11);

        let coarse = storage.query(early, SamplingPeriod::EverySecond);
        assert_eq!(coarse.timestamps(), vec![500.0]);
        assert_eq!(coarse.decimal_values(SERIES), vec![4.5]);
    }

    #[test]
    fn enabling_down_sampling_queues_existing_data() {
        let configuration = single_decimal_configuration();
        let mut storage = InMemoryHistoryStorage::new();
        storage.store(&chunk_of(&configuration, &[(0.0, 1.0), (100.0, 3.0)]), P).unwrap();
        assert_eq!(storage.pending_slot_count(), 0);
        storage.schedule_down_sampling();
        assert_eq!(storage.pending_slot_count(), 1);
        storage.perform_maintenance();
        let coarse = storage.query(TimeRange::new(0.0, 1_000.0), SamplingPeriod::EverySecond);
        assert_eq!(coarse.decimal_values(SERIES), vec![2.0]);
    }

    #[test]
    fn stop_down_sampling_drops_pending_work() {
        let configuration = single_decimal_configuration();
        let mut storage = InMemoryHistoryStorage::new();
        storage.schedule_down_sampling();
        storage.store(&chunk_of(&configuration, &[(0.0, 1.0)]), P).unwrap();
        storage.stop_down_sampling();
        assert_eq!(storage.run_down_sampling(usize::MAX), 0);
        assert!(storage.query(TimeRange::new(0.0, 1_000.0), SamplingPeriod::EverySecond).is_empty());
    }

    #[test]
    fn budget_limits_down_sampling_pass() {
        let configuration = single_decimal_configuration();
        let mut storage = InMemoryHistoryStorage::new();
        storage.schedule_down_sampling();
        let rows: Vec<(f64, f64)> = (0..50).map(|i| (i as f64 * 100.0, 1.0)).collect();
        storage.store(&chunk_of(&configuration, &rows), P).unwrap();
        assert_eq!(storage.run_down_sampling(2), 2);
        assert!(storage.pending_slot_count() > 0);
    }

    #[test]
    fn store_notifies_update_subscribers() {
        let configuration = single_decimal_configuration();
        let mut storage = InMemoryHistoryStorage::new();
        let updates = Rc::new(RefCell::new(Vec::new()));
        {
            let updates = updates.clone();
            storage.on_stored(move |info| updates.borrow_mut().push(*info));
        }
        storage.store(&chunk_of(&configuration, &[(0.0, 1.0), (100.0, 2.0)]), P).unwrap();
        assert_eq!(
            *updates.borrow(),
            vec![HistoryUpdateInfo {
                sampling_period: P,
                time_range: TimeRange::new(0.0, 100.0),
            }]
        );
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn prop_store_query_roundtrip(
            start in -1_000_000i64..1_000_000,
            steps in prop::collection::vec(1u32..5_000, 1..200),
            values in prop::collection::vec(-1.0e6f64..1.0e6, 200),
        ) {
            let configuration = single_decimal_configuration();
            let mut timestamp = start as f64;
            let mut rows = Vec::new();
            for (step, value) in steps.iter().zip(values.iter()) {
                rows.push((timestamp, *value));
                timestamp += *step as f64;
            }
            let chunk = chunk_of(&configuration, &rows);
            let mut storage = InMemoryHistoryStorage::new();
            storage.set_guaranteed_history_length(f64::MAX);
            storage.store(&chunk, P).unwrap();

            let result = storage.query(chunk.time_range(), P);
            let expected_timestamps: Vec<f64> = rows.iter().map(|(ts, _)| *ts).collect();
            let expected_values: Vec<f64> = rows.iter().map(|(_, value)| *value).collect();
            prop_assert_eq!(result.timestamps(), expected_timestamps);
            prop_assert_eq!(result.decimal_values(SERIES), expected_values);
        }
    }
}
