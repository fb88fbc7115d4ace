//! Value axis model, scaling, formatting and text measurement.

use std::rc::Rc;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::LookupError;
use crate::geom::{Coordinates, Direction, Rect};
use crate::layer::{
    CoordinatesProvider, HudElementIndex, LabelsProvider, LayerPaintingContext, ValueAxisHudLayer,
};

/// Axis scale type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AxisScale {
    /// Linear scaling.
    #[default]
    Linear,
    /// Base-10 logarithmic scaling.
    Log10,
}

impl AxisScale {
    /// Map a value into axis space.
    pub fn map_value(self, value: f64) -> Option<f64> {
        if !value.is_finite() {
            return None;
        }
        match self {
            Self::Linear => Some(value),
            Self::Log10 => {
                if value <= 0.0 {
                    None
                } else {
                    Some(value.log10())
                }
            }
        }
    }

    /// Invert a value from axis space back into data space.
    pub fn invert_value(self, value: f64) -> Option<f64> {
        if !value.is_finite() {
            return None;
        }
        match self {
            Self::Linear => Some(value),
            Self::Log10 => Some(10_f64.powf(value)),
        }
    }
}

/// Domain interval shown by an axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ValueRange {
    /// Smallest shown value.
    pub min: f64,
    /// Largest shown value.
    pub max: f64,
    /// Scaling between the bounds.
    pub scale: AxisScale,
}

impl ValueRange {
    /// Linear range.
    pub fn linear(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            scale: AxisScale::Linear,
        }
    }

    /// Logarithmic range.
    pub fn log10(min: f64, max: f64) -> Self {
        Self {
            min,
            max,
            scale: AxisScale::Log10,
        }
    }

    /// Position of the value within the range, 0.0 at `min` and 1.0 at
    /// `max`. NaN if the value cannot be mapped.
    pub fn to_domain_relative(&self, value: f64) -> f64 {
        let mapped = (
            self.scale.map_value(value),
            self.scale.map_value(self.min),
            self.scale.map_value(self.max),
        );
        match mapped {
            (Some(value), Some(min), Some(max)) if max != min => (value - min) / (max - min),
            _ => f64::NAN,
        }
    }

    /// Value at a relative position within the range.
    pub fn from_domain_relative(&self, relative: f64) -> f64 {
        let (Some(min), Some(max)) = (self.scale.map_value(self.min), self.scale.map_value(self.max)) else {
            return f64::NAN;
        };
        self.scale
            .invert_value(min + relative * (max - min))
            .unwrap_or(f64::NAN)
    }
}

/// Formatter for tick and HUD labels.
#[derive(Clone, Default)]
pub enum AxisFormatter {
    /// Default numeric formatter.
    #[default]
    Default,
    /// Fixed number of fraction digits.
    Decimals(usize),
    /// Custom formatter callback.
    Custom(Arc<dyn Fn(f64) -> String + Send + Sync>),
}

impl AxisFormatter {
    /// Format a value for display.
    pub fn format(&self, value: f64) -> String {
        match self {
            Self::Default => format!("{value}"),
            Self::Decimals(digits) => format!("{value:.digits$}"),
            Self::Custom(formatter) => formatter(value),
        }
    }
}

impl std::fmt::Debug for AxisFormatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => write!(f, "AxisFormatter::Default"),
            Self::Decimals(digits) => write!(f, "AxisFormatter::Decimals({digits})"),
            Self::Custom(_) => write!(f, "AxisFormatter::Custom(..)"),
        }
    }
}

/// Orientation of an axis line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    /// Values grow upwards.
    Vertical,
    /// Values grow to the right.
    Horizontal,
}

/// Side of the content area an axis is placed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Side {
    /// Left of the content area.
    #[default]
    Left,
    /// Right of the content area.
    Right,
    /// Above the content area.
    Top,
    /// Below the content area.
    Bottom,
}

impl Side {
    /// Orientation of an axis on this side.
    pub fn orientation(self) -> Orientation {
        match self {
            Self::Left | Self::Right => Orientation::Vertical,
            Self::Top | Self::Bottom => Orientation::Horizontal,
        }
    }
}

/// Whether ticks point into the content area or away from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Vicinity {
    /// Towards the content area.
    Inside,
    /// Away from the content area.
    #[default]
    Outside,
}

/// Where values of an axis are painted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaintRange {
    /// Everywhere in the window.
    Continuous,
    /// Only within the content area.
    #[default]
    ContentArea,
}

/// A value axis along one side of the content area.
#[derive(Debug, Clone)]
pub struct ValueAxis {
    side: Side,
    tick_orientation: Vicinity,
    paint_range: PaintRange,
    value_range: ValueRange,
    formatter: AxisFormatter,
    size: f64,
    axis_line_width: f64,
}

impl ValueAxis {
    /// Create an axis on the given side.
    pub fn new(side: Side, value_range: ValueRange) -> Self {
        Self {
            side,
            tick_orientation: Vicinity::default(),
            paint_range: PaintRange::default(),
            value_range,
            formatter: AxisFormatter::default(),
            size: 80.0,
            axis_line_width: 1.0,
        }
    }

    /// Set the tick orientation.
    pub fn with_tick_orientation(mut self, tick_orientation: Vicinity) -> Self {
        self.tick_orientation = tick_orientation;
        self
    }

    /// Set the paint range.
    pub fn with_paint_range(mut self, paint_range: PaintRange) -> Self {
        self.paint_range = paint_range;
        self
    }

    /// Set the formatter.
    pub fn with_formatter(mut self, formatter: AxisFormatter) -> Self {
        self.formatter = formatter;
        self
    }

    /// Side of the axis.
    pub fn side(&self) -> Side {
        self.side
    }

    /// Orientation of the axis line.
    pub fn orientation(&self) -> Orientation {
        self.side.orientation()
    }

    /// Shown value range.
    pub fn value_range(&self) -> &ValueRange {
        &self.value_range
    }

    /// Format a value the way ticks are formatted.
    pub fn format(&self, value: f64) -> String {
        self.formatter.format(value)
    }

    /// Window location of the axis line (x for vertical, y for horizontal axes).
    pub fn axis_line_location(&self, content_area: Rect) -> f64 {
        match self.side {
            Side::Left => content_area.left(),
            Side::Right => content_area.right(),
            Side::Top => content_area.top(),
            Side::Bottom => content_area.bottom(),
        }
    }

    /// Window location of a domain value along the axis.
    ///
    /// NaN if the value cannot be mapped or lies outside the content area
    /// while painting is restricted to it.
    pub fn domain_to_window(&self, value: f64, content_area: Rect) -> f64 {
        let relative = self.value_range.to_domain_relative(value);
        if !relative.is_finite() {
            return f64::NAN;
        }
        if self.paint_range == PaintRange::ContentArea && !(0.0..=1.0).contains(&relative) {
            return f64::NAN;
        }
        match self.orientation() {
            Orientation::Vertical => content_area.bottom() - relative * content_area.size.height,
            Orientation::Horizontal => content_area.left() + relative * content_area.size.width,
        }
    }

    /// Window location of the HUD anchor for a domain value.
    pub fn hud_anchor(&self, value: f64, content_area: Rect) -> Coordinates {
        let along = self.domain_to_window(value, content_area);
        let line = self.axis_line_location(content_area);
        match self.orientation() {
            Orientation::Vertical => Coordinates::new(line, along),
            Orientation::Horizontal => Coordinates::new(along, line),
        }
    }

    /// Direction in which HUD boxes find their anchor.
    pub fn hud_anchor_direction(&self) -> Direction {
        match (self.side, self.tick_orientation) {
            (Side::Left, Vicinity::Inside) | (Side::Right, Vicinity::Outside) => Direction::CenterLeft,
            (Side::Left, Vicinity::Outside) | (Side::Right, Vicinity::Inside) => Direction::CenterRight,
            (Side::Top, Vicinity::Inside) | (Side::Bottom, Vicinity::Outside) => Direction::TopCenter,
            (Side::Top, Vicinity::Outside) | (Side::Bottom, Vicinity::Inside) => Direction::BottomCenter,
        }
    }

    /// Widest text a HUD box may hold. Unlimited for horizontal axes.
    pub fn hud_max_width(&self, arrow_head_length: f64, box_padding: f64) -> f64 {
        match self.orientation() {
            Orientation::Vertical => {
                (self.size - self.axis_line_width - arrow_head_length - 2.0 * box_padding).max(0.0)
            }
            Orientation::Horizontal => f64::INFINITY,
        }
    }

    /// Create a HUD layer showing the domain values on this axis.
    pub fn hud_layer(self: &Rc<Self>, domain_values: Rc<dyn DomainValues>) -> ValueAxisHudLayer {
        let locations = AxisHudLocations {
            axis: Rc::clone(self),
            values: Rc::clone(&domain_values),
        };
        let labels = AxisHudLabels {
            axis: Rc::clone(self),
            values: domain_values,
        };
        let mut layer = ValueAxisHudLayer::new(Box::new(locations), Box::new(labels));
        let configuration = layer.configuration_mut();
        configuration.anchor_direction = self.hud_anchor_direction();
        configuration.max_width = self.hud_max_width(configuration.arrow_head_length, 4.0);
        layer
    }
}

/// Domain values shown by a HUD layer, indexed by [`HudElementIndex`].
pub trait DomainValues {
    /// Number of values.
    fn size(&self) -> usize;

    /// Value at an index.
    fn value_at(&self, index: HudElementIndex) -> Result<f64, LookupError>;
}

impl DomainValues for Vec<f64> {
    fn size(&self) -> usize {
        self.len()
    }

    fn value_at(&self, index: HudElementIndex) -> Result<f64, LookupError> {
        self.get(index.0).copied().ok_or(LookupError::MissingThreshold {
            series: String::new(),
            index: index.0,
        })
    }
}

struct AxisHudLocations {
    axis: Rc<ValueAxis>,
    values: Rc<dyn DomainValues>,
}

impl CoordinatesProvider for AxisHudLocations {
    fn size(&self, _context: &LayerPaintingContext<'_>) -> usize {
        self.values.size()
    }

    fn coordinates_at(
        &self,
        index: HudElementIndex,
        context: &LayerPaintingContext<'_>,
    ) -> Result<Coordinates, LookupError> {
        let value = self.values.value_at(index)?;
        Ok(self.axis.hud_anchor(value, context.chart.content_area))
    }
}

struct AxisHudLabels {
    axis: Rc<ValueAxis>,
    values: Rc<dyn DomainValues>,
}

impl LabelsProvider for AxisHudLabels {
    fn labels_at(
        &self,
        index: HudElementIndex,
        _context: &LayerPaintingContext<'_>,
    ) -> Result<Rc<[String]>, LookupError> {
        let value = self.values.value_at(index)?;
        Ok(Rc::from(vec![self.axis.format(value)]))
    }
}

/// Measures text for layout.
pub trait TextMeasurer {
    /// Width and height of a single line.
    fn measure(&self, text: &str, size: f64) -> (f64, f64);

    /// Width and height of stacked lines.
    fn measure_lines(&self, lines: &[String], size: f64) -> (f64, f64) {
        lines.iter().fold((0.0_f64, 0.0_f64), |(width, height), line| {
            let (w, h) = self.measure(line, size);
            (width.max(w), height + h)
        })
    }
}

/// Measurer assuming every character has the same advance.
///
/// Used when no font backend is available, e.g. headless rendering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonospaceTextMeasurer {
    /// Character advance relative to the font size.
    pub advance: f64,
    /// Line height relative to the font size.
    pub line_height: f64,
}

impl Default for MonospaceTextMeasurer {
    fn default() -> Self {
        Self {
            advance: 0.6,
            line_height: 1.2,
        }
    }
}

impl TextMeasurer for MonospaceTextMeasurer {
    fn measure(&self, text: &str, size: f64) -> (f64, f64) {
        let width = text.chars().count() as f64 * size * self.advance;
        (width, size * self.line_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Size;

    fn content_area() -> Rect {
        Rect::new(Coordinates::new(50.0, 10.0), Size::new(400.0, 200.0))
    }

    #[test]
    fn log_scale_rejects_non_positive() {
        let scale = AxisScale::Log10;
        assert!(scale.map_value(0.0).is_none());
        assert!(scale.map_value(-1.0).is_none());
        assert!(scale.map_value(1.0).is_some());
    }

    #[test]
    fn log_range_roundtrip() {
        let range = ValueRange::log10(1.0, 10_000.0);
        let relative = range.to_domain_relative(100.0);
        assert!((relative - 0.5).abs() < 1e-12);
        assert!((range.from_domain_relative(relative) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn vertical_axis_maps_upwards() {
        let axis = ValueAxis::new(Side::Left, ValueRange::linear(0.0, 100.0));
        assert_eq!(axis.domain_to_window(0.0, content_area()), 210.0);
        assert_eq!(axis.domain_to_window(100.0, content_area()), 10.0);
        assert_eq!(axis.hud_anchor(50.0, content_area()), Coordinates::new(50.0, 110.0));
    }

    #[test]
    fn values_outside_content_area_are_not_painted() {
        let axis = ValueAxis::new(Side::Right, ValueRange::linear(0.0, 100.0));
        assert!(axis.domain_to_window(150.0, content_area()).is_nan());
        let continuous = axis.with_paint_range(PaintRange::Continuous);
        assert_eq!(continuous.domain_to_window(150.0, content_area()), -90.0);
    }

    #[test]
    fn anchor_direction_follows_side_and_ticks() {
        let left = ValueAxis::new(Side::Left, ValueRange::linear(0.0, 1.0));
        assert_eq!(left.hud_anchor_direction(), Direction::CenterRight);
        let inside = left.with_tick_orientation(Vicinity::Inside);
        assert_eq!(inside.hud_anchor_direction(), Direction::CenterLeft);
        let bottom = ValueAxis::new(Side::Bottom, ValueRange::linear(0.0, 1.0));
        assert_eq!(bottom.hud_anchor_direction(), Direction::TopCenter);
    }

    #[test]
    fn formatter_variants() {
        assert_eq!(AxisFormatter::Decimals(2).format(1.0 / 3.0), "0.33");
        let custom = AxisFormatter::Custom(Arc::new(|value| format!("{value} bar")));
        assert_eq!(custom.format(2.0), "2 bar");
        let axis = ValueAxis::new(Side::Left, ValueRange::linear(0.0, 1.0)).with_formatter(custom);
        assert_eq!(axis.format(1.5), "1.5 bar");
    }

    #[test]
    fn monospace_measures_lines() {
        let measurer = MonospaceTextMeasurer::default();
        let (width, height) = measurer.measure_lines(&["ab".to_owned(), "abcd".to_owned()], 10.0);
        assert!((width - 24.0).abs() < 1e-9);
        assert!((height - 24.0).abs() < 1e-9);
    }
}
