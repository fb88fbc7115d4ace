//! Reports history reads for descriptors that were not seen before.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::history::sampling::SamplingPeriod;
use crate::history::storage::{HistoryQueryResult, HistoryStorage};
use crate::observable::{Subscribers, SubscriptionHandle};
use crate::time::TimeRange;

const LOG_TARGET: &str = "meistercharts::history::monitor";

/// Identity of one history read.
///
/// Equality is structural; floats compare by bit pattern.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryDescriptor {
    /// Start of the queried range (ms).
    pub start: f64,
    /// End of the queried range (ms).
    pub end: f64,
    /// Queried period.
    pub sampling_period: SamplingPeriod,
}

impl QueryDescriptor {
    /// Descriptor of a query.
    pub fn new(range: TimeRange, sampling_period: SamplingPeriod) -> Self {
        Self {
            start: range.start,
            end: range.end,
            sampling_period,
        }
    }

    /// The queried range.
    pub fn time_range(&self) -> TimeRange {
        TimeRange::new(self.start, self.end)
    }
}

impl PartialEq for QueryDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.start.to_bits() == other.start.to_bits()
            && self.end.to_bits() == other.end.to_bits()
            && self.sampling_period == other.sampling_period
    }
}

impl Eq for QueryDescriptor {}

impl Hash for QueryDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.start.to_bits().hash(state);
        self.end.to_bits().hash(state);
        self.sampling_period.hash(state);
    }
}

/// Wraps a storage and notifies about queries with new descriptors.
///
/// Callbacks fire inline from `query`, in registration order, at most once
/// per descriptor until [`clear_known_descriptors`](Self::clear_known_descriptors)
/// is called. A callback may query the monitor again; the nested
/// notification is delivered after the current one returns.
#[derive(Debug)]
pub struct HistoryStorageQueryMonitor<S> {
    storage: S,
    known: RefCell<FxHashSet<QueryDescriptor>>,
    queued: RefCell<VecDeque<QueryDescriptor>>,
    callbacks: RefCell<Subscribers<QueryDescriptor>>,
}

impl<S: HistoryStorage> HistoryStorageQueryMonitor<S> {
    /// Wrap a storage.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            known: RefCell::new(FxHashSet::default()),
            queued: RefCell::new(VecDeque::new()),
            callbacks: RefCell::new(Subscribers::new()),
        }
    }

    /// Access the wrapped storage. Reads through it are not monitored.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Mutable access to the wrapped storage.
    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Register a callback for new descriptors.
    pub fn on_query_for_new_descriptor(
        &mut self,
        callback: impl FnMut(&QueryDescriptor) + 'static,
    ) -> SubscriptionHandle {
        self.callbacks.get_mut().subscribe(callback)
    }

    /// Remove a callback.
    pub fn unsubscribe(&mut self, handle: SubscriptionHandle) -> bool {
        self.callbacks.get_mut().unsubscribe(handle)
    }

    /// Forget every descriptor so the next queries are reported again.
    pub fn clear_known_descriptors(&mut self) {
        self.known.get_mut().clear();
    }

    /// Number of descriptors seen since the last reset.
    pub fn known_descriptor_count(&self) -> usize {
        self.known.borrow().len()
    }

    fn record(&self, descriptor: QueryDescriptor) {
        let is_new = self.known.borrow_mut().insert(descriptor);
        if !is_new {
            return;
        }
        tracing::debug!(
            target: LOG_TARGET,
            start = descriptor.start,
            end = descriptor.end,
            sampling_period = ?descriptor.sampling_period,
            "query for new descriptor"
        );
        self.queued.borrow_mut().push_back(descriptor);

        // A nested query from inside a callback leaves its descriptor queued
        // for the outer loop.
        let Ok(mut callbacks) = self.callbacks.try_borrow_mut() else {
            return;
        };
        loop {
            let next = self.queued.borrow_mut().pop_front();
            let Some(next) = next else {
                break;
            };
            callbacks.notify(&next);
        }
    }
}

impl<S: HistoryStorage> HistoryStorage for HistoryStorageQueryMonitor<S> {
    fn query(&self, range: TimeRange, sampling_period: SamplingPeriod) -> HistoryQueryResult {
        let result = self.storage.query(range, sampling_period);
        self.record(QueryDescriptor::new(range, sampling_period));
        result
    }

    fn natural_sampling_period(&self) -> SamplingPeriod {
        self.storage.natural_sampling_period()
    }

    fn is_down_sampling_enabled(&self) -> bool {
        self.storage.is_down_sampling_enabled()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::history::storage::InMemoryHistoryStorage;
    use proptest::prelude::*;

    const P: SamplingPeriod = SamplingPeriod::EveryHundredMillis;

    fn recording_monitor() -> (
        HistoryStorageQueryMonitor<InMemoryHistoryStorage>,
        Rc<RefCell<Vec<QueryDescriptor>>>,
    ) {
        let mut monitor = HistoryStorageQueryMonitor::new(InMemoryHistoryStorage::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        {
            let seen = seen.clone();
            monitor.on_query_for_new_descriptor(move |descriptor| seen.borrow_mut().push(*descriptor));
        }
        (monitor, seen)
    }

    #[test]
    fn repeated_query_notifies_once() {
        let (monitor, seen) = recording_monitor();
        let range = TimeRange::new(0.0, 1_000.0);
        monitor.query(range, P);
        monitor.query(range, P);
        assert_eq!(*seen.borrow(), vec![QueryDescriptor::new(range, P)]);
    }

    #[test]
    fn clearing_known_descriptors_renotifies() {
        let (mut monitor, seen) = recording_monitor();
        let range = TimeRange::new(0.0, 1_000.0);
        monitor.query(range, P);
        monitor.clear_known_descriptors();
        monitor.query(range, P);
        assert_eq!(seen.borrow().len(), 2);
    }

    #[test]
    fn different_period_is_a_new_descriptor() {
        let (monitor, seen) = recording_monitor();
        let range = TimeRange::new(0.0, 1_000.0);
        monitor.query(range, P);
        monitor.query(range, SamplingPeriod::EverySecond);
        assert_eq!(seen.borrow().len(), 2);
        assert_eq!(monitor.known_descriptor_count(), 2);
    }

    #[test]
    fn callbacks_fire_in_registration_order() {
        let mut monitor = HistoryStorageQueryMonitor::new(InMemoryHistoryStorage::new());
        let order = Rc::new(RefCell::new(Vec::new()));
        for id in 0..3 {
            let order = order.clone();
            monitor.on_query_for_new_descriptor(move |_| order.borrow_mut().push(id));
        }
        monitor.query(TimeRange::new(0.0, 1.0), P);
        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn descriptor_serializes_flat() {
        let descriptor = QueryDescriptor::new(TimeRange::new(1.0, 2.0), SamplingPeriod::EverySecond);
        let json = serde_json::to_value(descriptor).unwrap();
        assert_eq!(json["start"], 1.0);
        assert_eq!(json["end"], 2.0);
        assert_eq!(json["samplingPeriod"], "EverySecond");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_one_notification_per_distinct_descriptor(
            queries in prop::collection::vec((0u8..4, 0u8..3), 1..40),
        ) {
            let (monitor, seen) = recording_monitor();
            let mut distinct = FxHashSet::default();
            for (start, period) in queries {
                let range = TimeRange::new(start as f64 * 1_000.0, start as f64 * 1_000.0 + 500.0);
                let period = SamplingPeriod::ALL[period as usize];
                distinct.insert(QueryDescriptor::new(range, period));
                monitor.query(range, period);
            }
            prop_assert_eq!(seen.borrow().len(), distinct.len());
        }
    }
}
