//! Lines across the content area at the anchors of a HUD layer.

use std::cell::RefCell;
use std::rc::Rc;

use crate::axis::{Orientation, ValueAxis};
use crate::error::LayerError;
use crate::geom::Coordinates;
use crate::layer::cache::CoordinatesCache;
use crate::layer::{HudElementIndex, Layer, LayerPaintingContext, PaintingVariables, ValueAxisHudLayer};
use crate::render::{LineStyle, RenderCommand, clip_segment};

/// Direction of the painted lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LineDirection {
    /// Lines from the left to the right edge of the content area.
    Horizontal,
    /// Lines from the top to the bottom edge of the content area.
    Vertical,
}

impl LineDirection {
    /// Lines perpendicular to an axis of the given orientation.
    pub fn across(orientation: Orientation) -> Self {
        match orientation {
            Orientation::Vertical => Self::Horizontal,
            Orientation::Horizontal => Self::Vertical,
        }
    }
}

/// Lines through the anchors of a [`ValueAxisHudLayer`].
///
/// The HUD layer must be calculated earlier in the same frame; the lines
/// reuse its coordinates and highlight its active element.
pub struct DirectionalLinesLayer {
    hud: Rc<RefCell<ValueAxisHudLayer>>,
    direction: LineDirection,
    calculated_frame: Option<u64>,
    coordinates: CoordinatesCache,
    active: HudElementIndex,
    line_style: Option<LineStyle>,
}

impl DirectionalLinesLayer {
    /// Create a layer painting lines in `direction`.
    pub fn new(hud: Rc<RefCell<ValueAxisHudLayer>>, direction: LineDirection) -> Self {
        Self {
            hud,
            direction,
            calculated_frame: None,
            coordinates: CoordinatesCache::default(),
            active: HudElementIndex::NONE,
            line_style: None,
        }
    }

    /// Create the lines matching a HUD layer on a value axis.
    pub fn create_for_value_axis_and_hud(axis: &ValueAxis, hud: Rc<RefCell<ValueAxisHudLayer>>) -> Self {
        Self::new(hud, LineDirection::across(axis.orientation()))
    }

    /// Direction of the lines.
    pub fn direction(&self) -> LineDirection {
        self.direction
    }

    /// Style of inactive lines. `None` uses the theme.
    pub fn set_line_style(&mut self, line_style: Option<LineStyle>) {
        self.line_style = line_style;
    }

    /// Style override of inactive lines.
    pub fn line_style(&self) -> Option<&LineStyle> {
        self.line_style.as_ref()
    }
}

impl PaintingVariables for DirectionalLinesLayer {
    fn calculated_frame(&self) -> Option<u64> {
        self.calculated_frame
    }
}

impl Layer for DirectionalLinesLayer {
    fn calculate(&mut self, context: &LayerPaintingContext<'_>) -> Result<(), LayerError> {
        self.calculated_frame = None;
        let hud = self.hud.borrow();
        let variables = hud.painting_variables();
        variables.ensure_calculated(context.frame)?;

        let size = variables.coordinates.len();
        self.coordinates.prepare(size);
        for index in (0..size).map(HudElementIndex) {
            self.coordinates.set(index, variables.coordinates.get(index));
        }
        self.active = hud.configuration().active_hud_element_index();
        drop(hud);

        self.calculated_frame = Some(context.frame);
        Ok(())
    }

    fn paint(&mut self, context: &mut LayerPaintingContext<'_>) -> Result<(), LayerError> {
        self.ensure_calculated(context.frame)?;
        let area = context.chart.content_area;

        for index in (0..self.coordinates.len()).map(HudElementIndex) {
            let anchor = self.coordinates.get(index);
            let (start, end) = match self.direction {
                LineDirection::Horizontal => (
                    Coordinates::new(area.left(), anchor.y),
                    Coordinates::new(area.right(), anchor.y),
                ),
                LineDirection::Vertical => (
                    Coordinates::new(anchor.x, area.top()),
                    Coordinates::new(anchor.x, area.bottom()),
                ),
            };
            if !start.is_finite() || !end.is_finite() {
                continue;
            }
            let Some((start, end)) = clip_segment(start, end, area) else {
                continue;
            };
            let style = match self.line_style {
                Some(style) if index != self.active => style,
                _ => *context.theme.threshold_line(index == self.active),
            };
            context.render.push(RenderCommand::Line { start, end, style });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::{Side, ValueRange};
    use crate::layer::{Layers, SharedLayer};

    fn axis() -> Rc<ValueAxis> {
        Rc::new(ValueAxis::new(Side::Left, ValueRange::linear(0.0, 100.0)))
    }

    fn painted_lines(context: &LayerPaintingContext<'_>) -> Vec<(Coordinates, Coordinates, bool)> {
        let active = *context.theme.threshold_line(true);
        context
            .render
            .commands()
            .iter()
            .filter_map(|command| match command {
                RenderCommand::Line { start, end, style } => Some((*start, *end, *style == active)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn lines_follow_hud_anchors() {
        let fixture = crate::layer::tests::Fixture::new();
        let axis = axis();
        let hud = Rc::new(RefCell::new(axis.hud_layer(Rc::new(vec![25.0, 150.0, 50.0]))));
        hud.borrow_mut()
            .configuration_mut()
            .set_active_hud_element_index(HudElementIndex(2), || {});
        let lines = Rc::new(RefCell::new(DirectionalLinesLayer::create_for_value_axis_and_hud(
            &axis,
            hud.clone(),
        )));
        assert_eq!(lines.borrow().direction(), LineDirection::Horizontal);

        let mut layers = Layers::new();
        let hud_layer: SharedLayer = hud;
        let lines_layer: SharedLayer = lines;
        layers.add_layer(hud_layer);
        layers.add_layer(lines_layer);

        let mut context = fixture.context(1);
        layers.paint(&mut context).unwrap();

        // 150 lies outside the axis range and is not painted.
        assert_eq!(
            painted_lines(&context),
            vec![
                (Coordinates::new(50.0, 150.0), Coordinates::new(450.0, 150.0), false),
                (Coordinates::new(50.0, 100.0), Coordinates::new(450.0, 100.0), true),
            ]
        );
    }

    #[test]
    fn line_style_override_spares_active_line() {
        let fixture = crate::layer::tests::Fixture::new();
        let axis = axis();
        let hud = Rc::new(RefCell::new(axis.hud_layer(Rc::new(vec![25.0, 50.0]))));
        hud.borrow_mut()
            .configuration_mut()
            .set_active_hud_element_index(HudElementIndex(1), || {});
        let mut lines = DirectionalLinesLayer::create_for_value_axis_and_hud(&axis, hud.clone());
        let custom = LineStyle {
            color: crate::render::Color::rgb8(0xff, 0x00, 0x00),
            width: 3.0,
            dashes: Some((4.0, 2.0)),
        };
        lines.set_line_style(Some(custom));
        assert_eq!(lines.line_style(), Some(&custom));

        let mut context = fixture.context(1);
        hud.borrow_mut().calculate(&context).unwrap();
        lines.calculate(&context).unwrap();
        lines.paint(&mut context).unwrap();

        let styles: Vec<LineStyle> = context
            .render
            .commands()
            .iter()
            .filter_map(|command| match command {
                RenderCommand::Line { style, .. } => Some(*style),
                _ => None,
            })
            .collect();
        assert_eq!(styles, vec![custom, *fixture.theme.threshold_line(true)]);
    }

    #[test]
    fn calculate_requires_hud_of_same_frame() {
        let fixture = crate::layer::tests::Fixture::new();
        let axis = axis();
        let hud = Rc::new(RefCell::new(axis.hud_layer(Rc::new(vec![25.0]))));
        let mut lines = DirectionalLinesLayer::create_for_value_axis_and_hud(&axis, hud.clone());

        let context = fixture.context(1);
        assert_eq!(lines.calculate(&context), Err(LayerError::NotCalculated { frame: 1 }));

        hud.borrow_mut().calculate(&context).unwrap();
        assert_eq!(lines.calculate(&context), Ok(()));
        assert_eq!(
            lines.calculate(&fixture.context(2)),
            Err(LayerError::NotCalculated { frame: 2 })
        );
    }
}
