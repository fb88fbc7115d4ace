//! HUD boxes anchored at a value axis.

use std::rc::Rc;

use crate::error::LayerError;
use crate::geom::{Coordinates, Direction, Rect, Size};
use crate::layer::cache::{BoundsLayoutCache, CoordinatesCache, ObjectsCache, ZIndexSortingCache};
use crate::layer::{
    CoordinatesProvider, HudElementIndex, LabelsProvider, Layer, LayerPaintingContext, PaintingVariables,
};
use crate::render::RenderCommand;

/// Z value of elements without an explicit order.
const Z_AUTO: f64 = 0.0;

/// Z value of the element shown on top.
const Z_TOP: f64 = 1.0;

type ZOrder = Box<dyn Fn(HudElementIndex) -> f64>;

/// Configuration of a [`ValueAxisHudLayer`].
pub struct HudConfiguration {
    /// Anchor location of each element. Non-finite locations are skipped.
    pub locations: Box<dyn CoordinatesProvider>,
    /// Text lines of each element.
    pub labels: Box<dyn LabelsProvider>,
    /// Z value of each element; higher values are painted later.
    pub z_order: ZOrder,
    /// Direction in which the boxes find their anchor.
    pub anchor_direction: Direction,
    /// Length of the arrow head, also the gap between anchor and box.
    pub arrow_head_length: f64,
    /// Width of the arrow head.
    pub arrow_head_width: f64,
    /// Widest text a box may hold.
    pub max_width: f64,
    active_hud_element_index: HudElementIndex,
}

impl HudConfiguration {
    /// Create a configuration with default styling.
    pub fn new(locations: Box<dyn CoordinatesProvider>, labels: Box<dyn LabelsProvider>) -> Self {
        Self {
            locations,
            labels,
            z_order: Box::new(|_| Z_AUTO),
            anchor_direction: Direction::CenterLeft,
            arrow_head_length: 10.0,
            arrow_head_width: 10.0,
            max_width: f64::INFINITY,
            active_hud_element_index: HudElementIndex::NONE,
        }
    }

    /// Paint every element at the same level, in index order.
    pub fn reset_z_order(&mut self) {
        self.z_order = Box::new(|_| Z_AUTO);
    }

    /// Paint the element on top of all others. [`HudElementIndex::NONE`]
    /// resets the order.
    pub fn z_order_show_index_on_top(&mut self, top: HudElementIndex) {
        if top.is_none() {
            self.reset_z_order();
            return;
        }
        self.z_order = Box::new(move |index| if index == top { Z_TOP } else { Z_AUTO });
    }

    /// The active element, if any.
    pub fn active_hud_element_index(&self) -> HudElementIndex {
        self.active_hud_element_index
    }

    /// Change the active element. Calls `on_change` only if it differs.
    pub fn set_active_hud_element_index(&mut self, index: HudElementIndex, on_change: impl FnOnce()) {
        if self.active_hud_element_index == index {
            return;
        }
        self.active_hud_element_index = index;
        on_change();
    }
}

/// Painting variables of a [`ValueAxisHudLayer`].
#[derive(Debug, Clone)]
pub struct ValueAxisHudPaintingVariables {
    calculated_frame: Option<u64>,
    /// Anchor per element.
    pub coordinates: CoordinatesCache,
    /// Text lines per element.
    pub labels: ObjectsCache<Rc<[String]>>,
    /// Painting order.
    pub z_order: ZIndexSortingCache,
    /// Painted box per element. Filled in `paint`, not in `calculate`.
    pub bounding_boxes: BoundsLayoutCache,
}

impl Default for ValueAxisHudPaintingVariables {
    fn default() -> Self {
        Self {
            calculated_frame: None,
            coordinates: CoordinatesCache::default(),
            labels: ObjectsCache::new(Rc::from(Vec::new())),
            z_order: ZIndexSortingCache::default(),
            bounding_boxes: BoundsLayoutCache::default(),
        }
    }
}

impl ValueAxisHudPaintingVariables {
    fn calculate(&mut self, configuration: &HudConfiguration, context: &LayerPaintingContext<'_>) -> Result<(), LayerError> {
        self.calculated_frame = None;
        let size = configuration.locations.size(context);

        self.coordinates.prepare(size);
        self.labels.prepare(size);
        self.z_order.prepare(size);
        self.bounding_boxes.prepare(size);

        for index in (0..size).map(HudElementIndex) {
            self.coordinates
                .set(index, configuration.locations.coordinates_at(index, context)?);
            self.labels.set(index, configuration.labels.labels_at(index, context)?);
            self.z_order.set(index, (configuration.z_order)(index));
        }
        self.z_order.sort_by_z_index();
        self.calculated_frame = Some(context.frame);
        Ok(())
    }
}

impl PaintingVariables for ValueAxisHudPaintingVariables {
    fn calculated_frame(&self) -> Option<u64> {
        self.calculated_frame
    }
}

/// Boxes with labels pointing at locations along a value axis, e.g. the
/// threshold values of a data series.
pub struct ValueAxisHudLayer {
    configuration: HudConfiguration,
    painting_variables: ValueAxisHudPaintingVariables,
}

impl ValueAxisHudLayer {
    /// Create a layer from its providers.
    pub fn new(locations: Box<dyn CoordinatesProvider>, labels: Box<dyn LabelsProvider>) -> Self {
        Self {
            configuration: HudConfiguration::new(locations, labels),
            painting_variables: ValueAxisHudPaintingVariables::default(),
        }
    }

    /// Access the configuration.
    pub fn configuration(&self) -> &HudConfiguration {
        &self.configuration
    }

    /// Modify the configuration.
    pub fn configuration_mut(&mut self) -> &mut HudConfiguration {
        &mut self.configuration
    }

    /// Access the painting variables.
    ///
    /// Only meaningful after `calculate` ran for the current frame; the
    /// bounding boxes additionally require `paint`.
    pub fn painting_variables(&self) -> &ValueAxisHudPaintingVariables {
        &self.painting_variables
    }

    /// The topmost painted element containing the location.
    pub fn hud_element_at(&self, location: Coordinates) -> Option<HudElementIndex> {
        let variables = &self.painting_variables;
        variables.z_order.iter().rev().find(|index| {
            variables
                .bounding_boxes
                .get(*index)
                .is_some_and(|bounds| bounds.contains(location))
        })
    }
}

impl Layer for ValueAxisHudLayer {
    fn calculate(&mut self, context: &LayerPaintingContext<'_>) -> Result<(), LayerError> {
        self.painting_variables.calculate(&self.configuration, context)
    }

    fn paint(&mut self, context: &mut LayerPaintingContext<'_>) -> Result<(), LayerError> {
        self.painting_variables.ensure_calculated(context.frame)?;

        let configuration = &self.configuration;
        let variables = &mut self.painting_variables;
        let text_style = context.theme.hud_text;

        let order: Vec<HudElementIndex> = variables.z_order.iter().collect();
        for index in order {
            let anchor = variables.coordinates.get(index);
            if !anchor.is_finite() {
                continue;
            }
            let active = index == configuration.active_hud_element_index;
            let box_style = *context.theme.hud_box(active);
            let lines = variables.labels.get(index).clone();

            let (text_width, text_height) = context.text_measurer.measure_lines(&lines, text_style.size);
            let size = Size::new(
                text_width.min(configuration.max_width) + 2.0 * box_style.padding,
                text_height + 2.0 * box_style.padding,
            );
            let bounds = Rect::anchored(anchor, configuration.anchor_direction, configuration.arrow_head_length, size);

            context.render.push(RenderCommand::TextBox {
                bounds,
                lines: lines.to_vec(),
                box_style,
                text_style,
            });
            context.render.push(RenderCommand::ArrowHead {
                anchor,
                direction: configuration.anchor_direction,
                length: configuration.arrow_head_length,
                width: configuration.arrow_head_width,
                fill: box_style.border.unwrap_or(box_style.fill),
            });
            variables.bounding_boxes.set(index, bounds);
        }
        Ok(())
    }
}
