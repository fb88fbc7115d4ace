//! Layer painting pipeline.
//!
//! Every frame each visible layer first runs `calculate`, which fills its
//! painting variables from the providers, and then `paint`, which renders
//! from those caches only. Painting without a calculation in the same frame
//! is rejected with [`LayerError::NotCalculated`].

mod cache;
mod history_line;
mod hud;
mod lines;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

pub use cache::{BoundsLayoutCache, CoordinatesCache, ObjectsCache, ZIndexSortingCache};
pub use history_line::HistoryLineLayer;
pub use hud::{HudConfiguration, ValueAxisHudLayer, ValueAxisHudPaintingVariables};
pub use lines::{DirectionalLinesLayer, LineDirection};

use serde::{Deserialize, Serialize};

use crate::axis::TextMeasurer;
use crate::error::{LayerError, LookupError};
use crate::geom::{Coordinates, Rect, Size};
use crate::history::HistoryStorage;
use crate::render::RenderList;
use crate::style::Theme;
use crate::time::TimeRange;

/// Dense index of an element painted by a HUD or lines layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct HudElementIndex(pub usize);

impl HudElementIndex {
    /// No element.
    pub const NONE: Self = Self(usize::MAX);

    /// Check whether this is [`Self::NONE`].
    pub fn is_none(self) -> bool {
        self == Self::NONE
    }
}

impl fmt::Display for HudElementIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            f.write_str("none")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Geometry of the chart for the current frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChartCalculator {
    /// Size of the whole window.
    pub window_size: Size,
    /// Area where data is painted, in window coordinates.
    pub content_area: Rect,
    /// Time range covered by the content area width.
    pub visible_time_range: TimeRange,
}

impl ChartCalculator {
    /// Window x of a timestamp.
    pub fn time_to_window_x(&self, timestamp: f64) -> f64 {
        let relative = self.visible_time_range.time_to_relative(timestamp);
        self.content_area.left() + relative * self.content_area.size.width
    }

    /// Timestamp at a window x.
    pub fn window_x_to_time(&self, x: f64) -> f64 {
        let relative = (x - self.content_area.left()) / self.content_area.size.width;
        self.visible_time_range.relative_to_time(relative)
    }

    /// Milliseconds covered by one pixel of the content area.
    pub fn millis_per_pixel(&self) -> f64 {
        self.visible_time_range.span() / self.content_area.size.width
    }
}

/// Everything a layer may use while calculating and painting a frame.
pub struct LayerPaintingContext<'a> {
    /// Frame counter; increases by one every frame.
    pub frame: u64,
    /// Frame time (ms).
    pub now: f64,
    /// Theme of the chart.
    pub theme: &'a Theme,
    /// Text measurement backend.
    pub text_measurer: &'a dyn TextMeasurer,
    /// Frame geometry.
    pub chart: &'a ChartCalculator,
    /// History to read samples from.
    pub history: &'a dyn HistoryStorage,
    /// Commands painted so far in this frame.
    pub render: RenderList,
}

impl fmt::Debug for LayerPaintingContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerPaintingContext")
            .field("frame", &self.frame)
            .field("now", &self.now)
            .field("chart", &self.chart)
            .field("commands", &self.render.len())
            .finish()
    }
}

/// A unit of painting.
pub trait Layer {
    /// Fill the painting variables for the frame.
    fn calculate(&mut self, context: &LayerPaintingContext<'_>) -> Result<(), LayerError>;

    /// Paint from the painting variables of the same frame.
    fn paint(&mut self, context: &mut LayerPaintingContext<'_>) -> Result<(), LayerError>;
}

/// State filled by `calculate` and consumed by `paint`.
pub trait PaintingVariables {
    /// Frame of the last calculation, if any.
    fn calculated_frame(&self) -> Option<u64>;

    /// Fail unless calculated in `frame`.
    fn ensure_calculated(&self, frame: u64) -> Result<(), LayerError> {
        if self.calculated_frame() == Some(frame) {
            Ok(())
        } else {
            Err(LayerError::NotCalculated { frame })
        }
    }
}

/// Window anchor locations of elements.
pub trait CoordinatesProvider {
    /// Number of elements.
    fn size(&self, context: &LayerPaintingContext<'_>) -> usize;

    /// Anchor of an element. Non-finite coordinates mean "do not paint".
    fn coordinates_at(
        &self,
        index: HudElementIndex,
        context: &LayerPaintingContext<'_>,
    ) -> Result<Coordinates, LookupError>;
}

/// Text lines of elements.
pub trait LabelsProvider {
    /// Lines of an element, top to bottom.
    fn labels_at(
        &self,
        index: HudElementIndex,
        context: &LayerPaintingContext<'_>,
    ) -> Result<Rc<[String]>, LookupError>;
}

/// A layer shared between its owner and the layer list.
pub type SharedLayer = Rc<RefCell<dyn Layer>>;

/// Condition evaluated each frame to decide whether a layer is painted.
pub type VisibleCondition = Rc<dyn Fn() -> bool>;

struct LayerEntry {
    layer: SharedLayer,
    visible: Option<VisibleCondition>,
}

/// Ordered list of layers painted every frame.
#[derive(Default)]
pub struct Layers {
    entries: Vec<LayerEntry>,
}

impl Layers {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a layer that is always visible.
    pub fn add_layer(&mut self, layer: SharedLayer) {
        self.entries.push(LayerEntry { layer, visible: None });
    }

    /// Append a layer that is only painted while the condition holds.
    pub fn add_layer_visible_if(&mut self, layer: SharedLayer, visible: VisibleCondition) {
        self.entries.push(LayerEntry {
            layer,
            visible: Some(visible),
        });
    }

    /// Number of layers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if there are no layers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Remove every layer.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Calculate every visible layer, then paint them in order.
    pub fn paint(&self, context: &mut LayerPaintingContext<'_>) -> Result<(), LayerError> {
        let visible: Vec<&SharedLayer> = self
            .entries
            .iter()
            .filter(|entry| entry.visible.as_ref().is_none_or(|condition| condition()))
            .map(|entry| &entry.layer)
            .collect();
        for layer in &visible {
            layer.borrow_mut().calculate(context)?;
        }
        for layer in &visible {
            layer.borrow_mut().paint(context)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Layers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layers")
            .field("len", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::axis::MonospaceTextMeasurer;
    use crate::history::InMemoryHistoryStorage;

    pub(crate) struct Fixture {
        pub(crate) theme: Theme,
        pub(crate) measurer: MonospaceTextMeasurer,
        pub(crate) chart: ChartCalculator,
        pub(crate) history: InMemoryHistoryStorage,
    }

    impl Fixture {
        pub(crate) fn new() -> Self {
            Self {
                theme: Theme::new(),
                measurer: MonospaceTextMeasurer::default(),
                chart: ChartCalculator {
                    window_size: Size::new(500.0, 300.0),
                    content_area: Rect::new(Coordinates::new(50.0, 0.0), Size::new(400.0, 200.0)),
                    visible_time_range: TimeRange::new(0.0, 4_000.0),
                },
                history: InMemoryHistoryStorage::new(),
            }
        }

        pub(crate) fn context(&self, frame: u64) -> LayerPaintingContext<'_> {
            LayerPaintingContext {
                frame,
                now: frame as f64 * 16.0,
                theme: &self.theme,
                text_measurer: &self.measurer,
                chart: &self.chart,
                history: &self.history,
                render: RenderList::new(),
            }
        }
    }

    struct CountingLayer {
        calculated: Rc<Cell<usize>>,
        painted: Rc<Cell<usize>>,
    }

    impl Layer for CountingLayer {
        fn calculate(&mut self, _context: &LayerPaintingContext<'_>) -> Result<(), LayerError> {
            self.calculated.set(self.calculated.get() + 1);
            Ok(())
        }

        fn paint(&mut self, _context: &mut LayerPaintingContext<'_>) -> Result<(), LayerError> {
            assert_eq!(self.calculated.get(), self.painted.get() + 1);
            self.painted.set(self.painted.get() + 1);
            Ok(())
        }
    }

    #[test]
    fn hidden_layers_are_skipped() {
        let fixture = Fixture::new();
        let calculated = Rc::new(Cell::new(0));
        let painted = Rc::new(Cell::new(0));
        let visible = Rc::new(Cell::new(false));

        let mut layers = Layers::new();
        let layer: SharedLayer = Rc::new(RefCell::new(CountingLayer {
            calculated: calculated.clone(),
            painted: painted.clone(),
        }));
        {
            let visible = visible.clone();
            layers.add_layer_visible_if(layer, Rc::new(move || visible.get()));
        }

        layers.paint(&mut fixture.context(1)).unwrap();
        assert_eq!(painted.get(), 0);

        visible.set(true);
        layers.paint(&mut fixture.context(2)).unwrap();
        assert_eq!((calculated.get(), painted.get()), (1, 1));
    }

    #[test]
    fn chart_calculator_maps_time() {
        let fixture = Fixture::new();
        assert_eq!(fixture.chart.time_to_window_x(2_000.0), 250.0);
        assert_eq!(fixture.chart.window_x_to_time(450.0), 4_000.0);
        assert_eq!(fixture.chart.millis_per_pixel(), 10.0);
    }

    #[test]
    fn none_index_displays() {
        assert_eq!(HudElementIndex::NONE.to_string(), "none");
        assert_eq!(HudElementIndex(3).to_string(), "3");
    }
}
