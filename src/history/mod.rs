//! Time-series history: chunks, storage, downsampling and query monitoring.
//!
//! Samples flow from [`HistoryStorageCache`] into [`InMemoryHistoryStorage`],
//! which keeps one partition per [`SamplingPeriod`] and aggregates fine data
//! into coarser periods between frames. Readers go through
//! [`HistoryStorageQueryMonitor`] so new query shapes can be reported.

mod chunk;
mod configuration;
mod downsampling;
mod enums;
mod gap;
mod monitor;
mod sampling;
mod storage;
mod storage_cache;

pub use chunk::{HistoryChunk, HistoryChunkBuilder, HistorySample, RecordingType};
pub use configuration::{
    DataSeriesId, DecimalDataSeries, DecimalDataSeriesIndex, EnumDataSeries, EnumDataSeriesIndex,
    HistoryConfiguration, HistoryConfigurationBuilder, HistoryEnum, HistoryEnumOption,
};
pub use downsampling::{aggregate, slot_of, slot_timestamp};
pub use enums::{DiscreteEntryAggregationMode, HistoryEnumOrdinal, HistoryEnumSet};
pub use gap::GapCalculator;
pub use monitor::{HistoryStorageQueryMonitor, QueryDescriptor};
pub use sampling::{DownSamplingMode, SAMPLES_PER_BUCKET, SamplingPeriod};
pub use storage::{
    DEFAULT_DOWN_SAMPLING_BUDGET, DEFAULT_GUARANTEED_HISTORY_LENGTH, HistoryQueryResult,
    HistoryStorage, HistoryUpdateInfo, InMemoryHistoryStorage,
};
pub use storage_cache::{HistoryStorageCache, HistoryStorageCacheConfig};
