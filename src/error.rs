//! Error types.
//!
//! Empty sample batches are not errors; they are dropped before they reach
//! any of these paths.

use thiserror::Error;

/// Errors raised while building or storing history chunks.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HistoryError {
    /// A sample carried a different number of values than the configuration
    /// declares.
    #[error("expected {expected} {kind} values but got {actual}")]
    SeriesCountMismatch {
        /// Series kind ("decimal" or "enum").
        kind: &'static str,
        /// Count declared by the configuration.
        expected: usize,
        /// Count that was provided.
        actual: usize,
    },
    /// Timestamps within a chunk must be strictly increasing.
    #[error("timestamp {timestamp} is not after previous timestamp {previous}")]
    NonMonotonicTimestamp {
        /// Previous timestamp.
        previous: f64,
        /// Offending timestamp.
        timestamp: f64,
    },
    /// Timestamp is NaN or infinite.
    #[error("timestamp {0} is not finite")]
    NonFiniteTimestamp(f64),
    /// The chunk belongs to a different configuration than the stored history.
    /// The history has to be cleared before storing data for a new configuration.
    #[error("history configuration changed without clearing the history")]
    ConfigurationMismatch,
    /// Enum ordinals are limited to `0..32`.
    #[error("enum ordinal {0} is out of range")]
    InvalidEnumOrdinal(u8),
}

/// Errors raised by tile index arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TileIndexError {
    /// Incremented past the maximum main index.
    #[error("main index is already at its maximum")]
    Overflow,
    /// Decremented past the minimum main index.
    #[error("main index is already at its minimum")]
    Underflow,
}

/// Lookups for HUD data that indicate a configuration bug.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// No threshold value exists for the index.
    #[error("no threshold found for {index} (series {series})")]
    MissingThreshold {
        /// Series (key) the lookup was made for.
        series: String,
        /// HUD element index.
        index: usize,
    },
    /// No label exists for the index.
    #[error("no label found for {index}")]
    MissingLabel {
        /// HUD element index.
        index: usize,
    },
}

/// Errors raised by the layer painting pipeline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LayerError {
    /// `paint` was called without a `calculate` in the same frame.
    #[error("paint called before calculate in frame {frame}")]
    NotCalculated {
        /// Frame that attempted to paint.
        frame: u64,
    },
    /// A provider lookup failed.
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// Errors surfaced by the chart facade.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ChartError {
    /// History ingestion failed.
    #[error(transparent)]
    History(#[from] HistoryError),
    /// Painting failed.
    #[error(transparent)]
    Layer(#[from] LayerError),
}
