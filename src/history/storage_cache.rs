//! Write-side buffering in front of the storage.
//!
//! Scheduled chunks are merged per sampling period and committed in one
//! store per period when the cache is flushed by the frame loop.

use std::collections::BTreeMap;

use crate::error::HistoryError;
use crate::history::chunk::HistoryChunk;
use crate::history::sampling::SamplingPeriod;
use crate::history::storage::InMemoryHistoryStorage;

const LOG_TARGET: &str = "meistercharts::history::cache";

/// Flush cadence of a [`HistoryStorageCache`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HistoryStorageCacheConfig {
    /// Minimum time (ms) between two flushes.
    pub flush_interval: f64,
    /// Flush early once this many samples are pending.
    pub max_pending_samples: usize,
}

impl Default for HistoryStorageCacheConfig {
    fn default() -> Self {
        Self {
            flush_interval: 100.0,
            max_pending_samples: 10_000,
        }
    }
}

/// Chunks scheduled for one period, in arrival order.
#[derive(Debug, Clone, Default)]
struct PendingChunks {
    chunks: Vec<HistoryChunk>,
    samples: usize,
}

/// Coalesces scheduled chunks until the next flush.
#[derive(Debug, Clone, Default)]
pub struct HistoryStorageCache {
    config: HistoryStorageCacheConfig,
    pending: BTreeMap<SamplingPeriod, PendingChunks>,
    pending_samples: usize,
    last_flush: Option<f64>,
}

impl HistoryStorageCache {
    /// Create an empty cache.
    pub fn new(config: HistoryStorageCacheConfig) -> Self {
        Self {
            config,
            pending: BTreeMap::new(),
            pending_samples: 0,
            last_flush: None,
        }
    }

    /// Access the flush configuration.
    pub fn config(&self) -> &HistoryStorageCacheConfig {
        &self.config
    }

    /// Buffer a chunk for the period.
    ///
    /// Chunks for the same period are merged on flush; later chunks replace
    /// samples with an identical timestamp.
    pub fn schedule_for_store(&mut self, chunk: HistoryChunk, sampling_period: SamplingPeriod) {
        let pending = self.pending.entry(sampling_period).or_default();
        if let Some(previous) = pending.chunks.last()
            && previous.configuration() != chunk.configuration()
        {
            tracing::warn!(
                target: LOG_TARGET,
                ?sampling_period,
                dropped = pending.samples,
                "configuration changed while samples were pending"
            );
            self.pending_samples -= pending.samples;
            pending.chunks.clear();
            pending.samples = 0;
        }
        pending.samples += chunk.timestamp_count();
        self.pending_samples += chunk.timestamp_count();
        pending.chunks.push(chunk);
    }

    /// Number of buffered samples across all periods, duplicates included.
    pub fn pending_sample_count(&self) -> usize {
        self.pending_samples
    }

    /// Check if nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Check whether a flush is due at `now` (ms).
    pub fn is_flush_due(&self, now: f64) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        if self.pending_sample_count() >= self.config.max_pending_samples {
            return true;
        }
        self.last_flush
            .is_none_or(|last| now - last >= self.config.flush_interval)
    }

    /// Flush if due. Returns the number of samples committed.
    pub fn tick(&mut self, now: f64, storage: &mut InMemoryHistoryStorage) -> Result<usize, HistoryError> {
        if !self.is_flush_due(now) {
            return Ok(0);
        }
        self.last_flush = Some(now);
        self.flush(storage)
    }

    /// Commit every buffered chunk. Returns the number of samples committed.
    ///
    /// All buffered chunks are attempted; the first failure is reported.
    pub fn flush(&mut self, storage: &mut InMemoryHistoryStorage) -> Result<usize, HistoryError> {
        let pending = std::mem::take(&mut self.pending);
        self.pending_samples = 0;
        let mut committed = 0;
        let mut failure = None;
        for (sampling_period, pending) in pending {
            let Some(chunk) = HistoryChunk::merge_all(pending.chunks) else {
                continue;
            };
            match storage.store(&chunk, sampling_period) {
                Ok(()) => committed += chunk.timestamp_count(),
                Err(error) => {
                    tracing::warn!(target: LOG_TARGET, ?sampling_period, %error, "failed to store chunk");
                    failure.get_or_insert(error);
                }
            }
        }
        if committed > 0 {
            tracing::trace!(target: LOG_TARGET, committed, "flushed history cache");
        }
        match failure {
            Some(error) => Err(error),
            None => Ok(committed),
        }
    }

    /// Discard buffered chunks without storing them.
    pub fn clear(&mut self) {
        let dropped = self.pending_samples;
        self.pending.clear();
        self.pending_samples = 0;
        if dropped > 0 {
            tracing::debug!(target: LOG_TARGET, dropped, "discarded pending samples");
        }
    }
}
