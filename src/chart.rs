//! Time line chart: ingestion, history maintenance, painting and
//! notifications, driven by [`TimeLineChart::tick`].

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::axis::{MonospaceTextMeasurer, ValueAxis};
use crate::error::ChartError;
use crate::geom::{Coordinates, Rect, Size};
use crate::history::{
    DecimalDataSeriesIndex, DownSamplingMode, HistoryChunk, HistoryConfiguration, HistoryEnumSet, HistoryStorage,
    HistoryStorageCache, HistoryStorageCacheConfig, HistoryStorageQueryMonitor, HistoryUpdateInfo,
    InMemoryHistoryStorage, QueryDescriptor, SamplingPeriod,
};
use crate::layer::{ChartCalculator, HistoryLineLayer, LayerPaintingContext, Layers, SharedLayer};
use crate::observable::{ObservableProperty, SubscriptionHandle, Subscribers};
use crate::render::RenderList;
use crate::settings::{ConfigurationAssistant, HistorySettings};
use crate::style::Theme;
use crate::tile::{ChartId, HistoryTileInvalidator, TileCache, TileIdentifier, TileIndex, Zoom};
use crate::time::TimeRange;
use crate::timer::TimerSupport;

const LOG_TARGET: &str = "meistercharts::chart";
const SAMPLES_TARGET: &str = "meistercharts::chart::samples";

/// Only one visible time range notification is sent per window (ms).
pub const VISIBLE_TIME_RANGE_CHANGED_WINDOW: f64 = 250.0;

/// One sample row as delivered by the embedding application.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    /// Timestamp (ms).
    pub timestamp: f64,
    /// One value per decimal series.
    pub decimal_values: Vec<f64>,
    /// One set per enum series.
    #[serde(default)]
    pub enum_values: Vec<HistoryEnumSet>,
}

/// Notifications for listeners outside the chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "detail", rename_all = "kebab-case")]
pub enum ChartEvent {
    /// The history was queried with a descriptor not seen since the last
    /// history clear.
    HistoryQueryUpdate(QueryDescriptor),
    /// The visible time range changed. Throttled.
    VisibleTimeRangeChanged(TimeRange),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum ChartTask {
    NotifyVisibleTimeRange,
}

type SharedTimer = Rc<RefCell<TimerSupport<ChartTask, ChartTask>>>;

/// Geometry and time state of the chart.
///
/// Every change to these properties schedules a throttled visible time range
/// notification.
#[derive(Debug)]
pub struct ChartState {
    /// Translation of the content in window pixels.
    pub window_translation: ObservableProperty<Coordinates>,
    /// Size of the window.
    pub window_size: ObservableProperty<Size>,
    /// Size of the content area.
    pub content_area_size: ObservableProperty<Size>,
    /// Zoom factors.
    pub zoom: ObservableProperty<Zoom>,
    /// Time range shown by the content area at default zoom and translation.
    pub content_area_time_range: ObservableProperty<TimeRange>,
}

impl ChartState {
    fn new(window_size: Size, content_area_time_range: TimeRange) -> Self {
        Self {
            window_translation: ObservableProperty::new(Coordinates::ORIGIN),
            window_size: ObservableProperty::new(window_size),
            content_area_size: ObservableProperty::new(window_size),
            zoom: ObservableProperty::new(Zoom::DEFAULT),
            content_area_time_range: ObservableProperty::new(content_area_time_range),
        }
    }

    /// Time range currently visible in the content area.
    pub fn visible_time_range(&self) -> TimeRange {
        let base = *self.content_area_time_range.get();
        let width = self.content_area_size.get().width;
        let span = base.span() / self.zoom.get().scale_x;
        if !(width > 0.0) || !span.is_finite() {
            return base;
        }
        let start = base.start - self.window_translation.get().x / width * span;
        TimeRange::new(start, start + span)
    }

    fn chart_calculator(&self) -> ChartCalculator {
        ChartCalculator {
            window_size: *self.window_size.get(),
            content_area: Rect::new(Coordinates::ORIGIN, *self.content_area_size.get()),
            visible_time_range: self.visible_time_range(),
        }
    }

    fn schedule_notifications(&mut self, timer: &SharedTimer) {
        fn schedule<T: 'static>(timer: &SharedTimer) -> impl FnMut(&T) + 'static {
            let timer = Rc::clone(timer);
            move |_: &T| {
                timer.borrow_mut().throttle_last(
                    VISIBLE_TIME_RANGE_CHANGED_WINDOW,
                    ChartTask::NotifyVisibleTimeRange,
                    ChartTask::NotifyVisibleTimeRange,
                );
            }
        }
        self.window_translation.consume(schedule(timer));
        self.window_size.consume(schedule(timer));
        self.content_area_size.consume(schedule(timer));
        self.zoom.consume(schedule(timer));
        self.content_area_time_range.consume(schedule(timer));
    }
}

/// A chart showing history data over time.
///
/// The embedding application feeds samples, calls [`tick`](Self::tick) once
/// per frame and receives [`ChartEvent`]s through [`on_event`](Self::on_event).
pub struct TimeLineChart {
    chart_id: ChartId,
    frame: u64,
    history_configuration: Option<Arc<HistoryConfiguration>>,
    monitor: HistoryStorageQueryMonitor<InMemoryHistoryStorage>,
    storage_cache: HistoryStorageCache,
    assistant: ConfigurationAssistant,
    tiles: TileCache<RenderList>,
    tile_invalidator: HistoryTileInvalidator,
    history_updates: Rc<RefCell<Vec<HistoryUpdateInfo>>>,
    timer: SharedTimer,
    state: ChartState,
    previous_visible_time_range: TimeRange,
    events: Rc<RefCell<Subscribers<ChartEvent>>>,
    layers: Layers,
    history_lines: Vec<Rc<RefCell<HistoryLineLayer>>>,
    theme: Theme,
    text_measurer: MonospaceTextMeasurer,
    rendered: RenderList,
}

impl TimeLineChart {
    /// Create a chart with an empty history at a natural period of 100 ms.
    /// Downsampling starts in its default mode.
    pub fn new(chart_id: ChartId, window_size: Size, content_area_time_range: TimeRange) -> Self {
        let assistant = ConfigurationAssistant::with_sampling_period(SamplingPeriod::EveryHundredMillis);
        let mut storage = InMemoryHistoryStorage::new();
        let guaranteed_history_length = storage.guaranteed_history_length();
        assistant.apply_to_storage(&mut storage, guaranteed_history_length);
        match DownSamplingMode::default() {
            DownSamplingMode::Automatic => storage.schedule_down_sampling(),
            DownSamplingMode::None => storage.stop_down_sampling(),
        }

        let history_updates: Rc<RefCell<Vec<HistoryUpdateInfo>>> = Rc::default();
        {
            let history_updates = Rc::clone(&history_updates);
            storage.on_stored(move |update| history_updates.borrow_mut().push(*update));
        }

        let events: Rc<RefCell<Subscribers<ChartEvent>>> = Rc::default();
        let mut monitor = HistoryStorageQueryMonitor::new(storage);
        {
            let events = Rc::clone(&events);
            monitor.on_query_for_new_descriptor(move |descriptor| {
                events.borrow_mut().notify(&ChartEvent::HistoryQueryUpdate(*descriptor));
            });
        }

        let timer: SharedTimer = Rc::new(RefCell::new(TimerSupport::new(0.0)));
        let mut state = ChartState::new(window_size, content_area_time_range);
        state.schedule_notifications(&timer);

        Self {
            chart_id,
            frame: 0,
            history_configuration: None,
            monitor,
            storage_cache: HistoryStorageCache::new(HistoryStorageCacheConfig::default()),
            assistant,
            tiles: TileCache::new(),
            tile_invalidator: HistoryTileInvalidator,
            history_updates,
            timer,
            state,
            previous_visible_time_range: TimeRange::new(0.0, 0.0),
            events,
            layers: Layers::new(),
            history_lines: Vec::new(),
            theme: Theme::default(),
            text_measurer: MonospaceTextMeasurer::default(),
            rendered: RenderList::new(),
        }
    }

    /// Identity used for tiles of this chart.
    pub fn chart_id(&self) -> ChartId {
        self.chart_id
    }

    /// Geometry and time state.
    pub fn state(&self) -> &ChartState {
        &self.state
    }

    /// Modify geometry and time state.
    pub fn state_mut(&mut self) -> &mut ChartState {
        &mut self.state
    }

    /// The monitored history.
    pub fn history(&self) -> &HistoryStorageQueryMonitor<InMemoryHistoryStorage> {
        &self.monitor
    }

    /// The layers painted every tick.
    pub fn layers_mut(&mut self) -> &mut Layers {
        &mut self.layers
    }

    /// The theme passed to the layers.
    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    /// Commands painted by the last tick.
    pub fn rendered(&self) -> &RenderList {
        &self.rendered
    }

    /// Register a listener for chart events.
    pub fn on_event(&mut self, callback: impl FnMut(&ChartEvent) + 'static) -> SubscriptionHandle {
        self.events.borrow_mut().subscribe(callback)
    }

    /// Remove an event listener.
    pub fn unsubscribe(&mut self, handle: SubscriptionHandle) -> bool {
        self.events.borrow_mut().unsubscribe(handle)
    }

    /// The active history configuration.
    pub fn history_configuration(&self) -> Option<&Arc<HistoryConfiguration>> {
        self.history_configuration.as_ref()
    }

    /// Replace the history configuration. A different configuration clears
    /// the history.
    pub fn set_history_configuration(&mut self, configuration: Arc<HistoryConfiguration>) {
        if let Some(current) = &self.history_configuration
            && (Arc::ptr_eq(current, &configuration) || **current == *configuration)
        {
            return;
        }
        tracing::debug!(
            target: LOG_TARGET,
            decimal_series = configuration.decimal_count(),
            enum_series = configuration.enum_count(),
            "history configuration changed"
        );
        self.history_configuration = Some(configuration);
        self.clear_history();
    }

    /// Apply history settings.
    pub fn apply_history_settings(&mut self, settings: &HistorySettings) {
        tracing::debug!(target: LOG_TARGET, ?settings, "applying history settings");
        settings.apply(&mut self.assistant, self.monitor.storage_mut());
        for line in &self.history_lines {
            line.borrow_mut().set_gap_calculator(self.assistant.gap_calculator());
        }
    }

    /// Add a line painting a decimal series, using the configured gap factor.
    pub fn add_history_line(
        &mut self,
        series: DecimalDataSeriesIndex,
        value_axis: Rc<ValueAxis>,
    ) -> Rc<RefCell<HistoryLineLayer>> {
        let mut line = HistoryLineLayer::new(series, value_axis);
        line.set_gap_calculator(self.assistant.gap_calculator());
        let line = Rc::new(RefCell::new(line));
        let layer: SharedLayer = line.clone();
        self.layers.add_layer(layer);
        self.history_lines.push(Rc::clone(&line));
        line
    }

    /// Add one sample at the natural sampling period.
    pub fn add_sample(&mut self, sample: &Sample) -> Result<(), ChartError> {
        let sampling_period = self.monitor.natural_sampling_period();
        self.schedule(std::slice::from_ref(sample), sampling_period)
    }

    /// Add samples at the natural sampling period. Empty input is ignored.
    pub fn add_samples(&mut self, samples: &[Sample]) -> Result<(), ChartError> {
        if samples.is_empty() {
            return Ok(());
        }
        tracing::debug!(target: SAMPLES_TARGET, count = samples.len(), "add samples");
        let sampling_period = self.monitor.natural_sampling_period();
        self.schedule(samples, sampling_period)
    }

    /// Add samples at the period matching their spacing (ms). Empty input is
    /// ignored.
    pub fn add_samples_directly(&mut self, samples: &[Sample], duration_between_samples: f64) -> Result<(), ChartError> {
        if samples.is_empty() {
            return Ok(());
        }
        let sampling_period = SamplingPeriod::with_max_distance(duration_between_samples);
        tracing::debug!(
            target: SAMPLES_TARGET,
            count = samples.len(),
            duration_between_samples,
            ?sampling_period,
            "add samples directly"
        );
        self.schedule(samples, sampling_period)
    }

    fn schedule(&mut self, samples: &[Sample], sampling_period: SamplingPeriod) -> Result<(), ChartError> {
        let Some(configuration) = &self.history_configuration else {
            tracing::warn!(target: SAMPLES_TARGET, "dropping samples: no history configuration");
            return Ok(());
        };
        let mut builder = HistoryChunk::builder(Arc::clone(configuration));
        for sample in samples {
            if let Err(error) = builder.add(sample.timestamp, &sample.decimal_values, &sample.enum_values) {
                tracing::warn!(target: SAMPLES_TARGET, %error, count = samples.len(), "dropping malformed samples");
                return Ok(());
            }
        }
        if let Some(chunk) = builder.build() {
            self.storage_cache.schedule_for_store(chunk, sampling_period);
        }
        Ok(())
    }

    /// Remove every sample, pending or stored, and forget known query
    /// descriptors and tiles.
    pub fn clear_history(&mut self) {
        tracing::debug!(target: LOG_TARGET, "clear history");
        self.storage_cache.clear();
        self.monitor.storage_mut().clear();
        self.monitor.clear_known_descriptors();
        self.history_updates.borrow_mut().clear();
        self.tiles.clear();
    }

    /// Cached tile for an index at the current zoom, painted by `create` on a
    /// miss. Queries made by `create` are monitored.
    pub fn tile(
        &mut self,
        tile_index: TileIndex,
        time_range: TimeRange,
        create: impl FnOnce(&TileIdentifier, &dyn HistoryStorage) -> RenderList,
    ) -> &RenderList {
        let identifier = TileIdentifier::new(self.chart_id, tile_index, *self.state.zoom.get());
        let history: &dyn HistoryStorage = &self.monitor;
        self.tiles
            .get_or_create(identifier, time_range, |identifier| create(identifier, history))
    }

    /// Number of cached tiles.
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Run one frame at `now` (ms).
    ///
    /// Fires due timers, commits buffered samples, maintains the history,
    /// drops outdated tiles and paints every visible layer.
    pub fn tick(&mut self, now: f64) -> Result<(), ChartError> {
        let due = self.timer.borrow_mut().tick(now);
        for task in due {
            match task {
                ChartTask::NotifyVisibleTimeRange => self.notify_visible_time_range_changed_if_necessary(),
            }
        }

        let flushed = self.storage_cache.tick(now, self.monitor.storage_mut());
        self.monitor.storage_mut().perform_maintenance();
        let updates = std::mem::take(&mut *self.history_updates.borrow_mut());
        for update in &updates {
            self.tile_invalidator.invalidate(&mut self.tiles, update);
        }
        flushed?;

        self.frame += 1;
        let chart = self.state.chart_calculator();
        let mut context = LayerPaintingContext {
            frame: self.frame,
            now,
            theme: &self.theme,
            text_measurer: &self.text_measurer,
            chart: &chart,
            history: &self.monitor,
            render: RenderList::new(),
        };
        self.layers.paint(&mut context)?;
        self.rendered = context.render;
        Ok(())
    }

    fn notify_visible_time_range_changed_if_necessary(&mut self) {
        let current = self.state.visible_time_range();
        if current == self.previous_visible_time_range {
            return;
        }
        self.previous_visible_time_range = current;
        tracing::trace!(target: LOG_TARGET, start = current.start, end = current.end, "visible time range changed");
        self.events
            .borrow_mut()
            .notify(&ChartEvent::VisibleTimeRangeChanged(current));
    }
}

impl std::fmt::Debug for TimeLineChart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimeLineChart")
            .field("chart_id", &self.chart_id)
            .field("frame", &self.frame)
            .field("state", &self.state)
            .field("layers", &self.layers)
            .field("tiles", &self.tiles.len())
            .finish_non_exhaustive()
    }
}
