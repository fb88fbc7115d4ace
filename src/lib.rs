//! meistercharts-history keeps time-series history for live charts.
//! Samples are buffered, stored per sampling period, downsampled between
//! frames and painted through a per-frame calculate/paint layer pipeline.

#![forbid(unsafe_code)]

pub mod axis;
pub mod cache;
pub mod chart;
pub mod error;
pub mod geom;
pub mod history;
pub mod layer;
pub mod observable;
pub mod render;
pub mod settings;
pub mod style;
pub mod threshold;
pub mod tile;
pub mod time;
pub mod timer;

pub use axis::{AxisFormatter, AxisScale, DomainValues, Side, ValueAxis, ValueRange};
pub use cache::BoundedCache;
pub use chart::{ChartEvent, ChartState, Sample, TimeLineChart};
pub use error::{ChartError, HistoryError, LayerError, LookupError, TileIndexError};
pub use geom::{Coordinates, Direction, Rect, Size};
pub use history::{
    DownSamplingMode, GapCalculator, HistoryChunk, HistoryConfiguration, HistoryStorage,
    HistoryStorageCache, HistoryStorageQueryMonitor, InMemoryHistoryStorage, QueryDescriptor,
    SamplingPeriod,
};
pub use layer::{
    DirectionalLinesLayer, HistoryLineLayer, HudElementIndex, Layer, LayerPaintingContext, Layers,
    PaintingVariables, ValueAxisHudLayer,
};
pub use observable::{ObservableProperty, SubscriptionHandle};
pub use render::{Color, LineStyle, RenderCommand, RenderList};
pub use settings::{ConfigurationAssistant, HistorySettings};
pub use style::Theme;
pub use threshold::{LayerAddResult, ThresholdsSupport};
pub use tile::{MainIndex, TileIdentifier, TileIndex, Zoom};
pub use time::TimeRange;
pub use timer::TimerSupport;
