//! Rendering primitives and clipping helpers.
//!
//! Layers do not draw directly. They push backend-agnostic commands into a
//! [`RenderList`] that the embedding canvas replays.

use crate::geom::{Coordinates, Direction, Rect};

/// RGBA color in linear space.
///
/// All components are expected to be in the 0.0..=1.0 range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    /// Red channel.
    pub r: f32,
    /// Green channel.
    pub g: f32,
    /// Blue channel.
    pub b: f32,
    /// Alpha channel.
    pub a: f32,
}

impl Color {
    /// Create a new color.
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from 8-bit channels.
    pub const fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0)
    }

    /// Opaque black.
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    /// Opaque white.
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    /// Fully transparent.
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);
}

/// Line stroke styling.
///
/// The width is expressed in logical pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    /// Stroke color.
    pub color: Color,
    /// Stroke width in pixels.
    pub width: f64,
    /// Dash pattern (on, off) in pixels, solid if `None`.
    pub dashes: Option<(f64, f64)>,
}

impl Default for LineStyle {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            width: 1.0,
            dashes: None,
        }
    }
}

/// Styling of a text box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoxStyle {
    /// Fill color.
    pub fill: Color,
    /// Border color, no border if `None`.
    pub border: Option<Color>,
    /// Border width.
    pub border_width: f64,
    /// Padding between border and text on every side.
    pub padding: f64,
    /// Corner radius.
    pub radius: f64,
}

impl Default for BoxStyle {
    fn default() -> Self {
        Self {
            fill: Color::WHITE,
            border: Some(Color::BLACK),
            border_width: 1.0,
            padding: 4.0,
            radius: 2.0,
        }
    }
}

/// Text styling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    /// Text color.
    pub color: Color,
    /// Font size in pixels.
    pub size: f64,
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            size: 12.0,
        }
    }
}

/// Render command list.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    /// Start clipping to a rectangle.
    ClipRect(Rect),
    /// End clipping.
    ClipEnd,
    /// Draw a single line.
    Line {
        /// Line start.
        start: Coordinates,
        /// Line end.
        end: Coordinates,
        /// Stroke style.
        style: LineStyle,
    },
    /// Draw a connected line through the points.
    Polyline {
        /// Points to connect.
        points: Vec<Coordinates>,
        /// Stroke style.
        style: LineStyle,
    },
    /// Draw a box with text lines inside.
    TextBox {
        /// Box bounds.
        bounds: Rect,
        /// Text lines, top to bottom.
        lines: Vec<String>,
        /// Box styling.
        box_style: BoxStyle,
        /// Text styling.
        text_style: TextStyle,
    },
    /// Draw a filled arrow head pointing at the anchor.
    ArrowHead {
        /// Tip of the arrow.
        anchor: Coordinates,
        /// Where the anchor lies, seen from the box.
        direction: Direction,
        /// Arrow length.
        length: f64,
        /// Arrow width.
        width: f64,
        /// Fill color.
        fill: Color,
    },
}

/// Aggregated render commands.
#[derive(Debug, Default, Clone)]
pub struct RenderList {
    commands: Vec<RenderCommand>,
}

impl RenderList {
    /// Create an empty render list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a render command.
    pub fn push(&mut self, command: RenderCommand) {
        self.commands.push(command);
    }

    /// Access all render commands.
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Number of commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Check if no command was pushed.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Remove every command, keeping the allocation.
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

/// Build clipped polylines from consecutive points.
///
/// Non-finite points and clipped-away parts break the line; each returned
/// run is drawn as its own polyline.
pub fn build_clipped_polylines(points: &[Coordinates], clip: Rect, out: &mut Vec<Vec<Coordinates>>) {
    out.clear();
    let mut current: Vec<Coordinates> = Vec::new();
    for window in points.windows(2) {
        let (start, end) = (window[0], window[1]);
        let clipped = if start.is_finite() && end.is_finite() {
            clip_segment(start, end, clip)
        } else {
            None
        };
        match clipped {
            Some((clipped_start, clipped_end)) => {
                if current.last() != Some(&clipped_start) {
                    flush_run(&mut current, out);
                    current.push(clipped_start);
                }
                current.push(clipped_end);
            }
            None => flush_run(&mut current, out),
        }
    }
    flush_run(&mut current, out);
}

fn flush_run(current: &mut Vec<Coordinates>, out: &mut Vec<Vec<Coordinates>>) {
    if current.len() >= 2 {
        out.push(std::mem::take(current));
    } else {
        current.clear();
    }
}

/// Clip a segment to a rectangle (Cohen-Sutherland).
pub fn clip_segment(mut start: Coordinates, mut end: Coordinates, rect: Rect) -> Option<(Coordinates, Coordinates)> {
    const LEFT: u8 = 1;
    const RIGHT: u8 = 2;
    const TOP: u8 = 4;
    const BOTTOM: u8 = 8;

    let region = |point: Coordinates| -> u8 {
        let mut code = 0;
        if point.x < rect.left() {
            code |= LEFT;
        } else if point.x > rect.right() {
            code |= RIGHT;
        }
        if point.y < rect.top() {
            code |= TOP;
        } else if point.y > rect.bottom() {
            code |= BOTTOM;
        }
        code
    };

    let mut out_start = region(start);
    let mut out_end = region(end);

    loop {
        if (out_start | out_end) == 0 {
            return Some((start, end));
        }
        if (out_start & out_end) != 0 {
            return None;
        }

        let out_code = if out_start != 0 { out_start } else { out_end };
        let (mut x, mut y) = (0.0_f64, 0.0_f64);

        if (out_code & TOP) != 0 {
            x = start.x + (end.x - start.x) * (rect.top() - start.y) / (end.y - start.y);
            y = rect.top();
        } else if (out_code & BOTTOM) != 0 {
            x = start.x + (end.x - start.x) * (rect.bottom() - start.y) / (end.y - start.y);
            y = rect.bottom();
        } else if (out_code & RIGHT) != 0 {
            y = start.y + (end.y - start.y) * (rect.right() - start.x) / (end.x - start.x);
            x = rect.right();
        } else if (out_code & LEFT) != 0 {
            y = start.y + (end.y - start.y) * (rect.left() - start.x) / (end.x - start.x);
            x = rect.left();
        }

        let new_point = Coordinates::new(x, y);
        if out_code == out_start {
            start = new_point;
            out_start = region(start);
        } else {
            end = new_point;
            out_end = region(end);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Size;

    fn rect() -> Rect {
        Rect::new(Coordinates::ORIGIN, Size::new(10.0, 10.0))
    }

    #[test]
    fn clip_segment_inside() {
        let start = Coordinates::new(2.0, 2.0);
        let end = Coordinates::new(8.0, 8.0);
        let clipped = clip_segment(start, end, rect()).expect("segment should clip");
        assert_eq!(clipped, (start, end));
    }

    #[test]
    fn clip_segment_crossing() {
        let clipped = clip_segment(Coordinates::new(-5.0, 5.0), Coordinates::new(15.0, 5.0), rect()).unwrap();
        assert_eq!(clipped, (Coordinates::new(0.0, 5.0), Coordinates::new(10.0, 5.0)));
        assert!(clip_segment(Coordinates::new(-5.0, -5.0), Coordinates::new(-1.0, 20.0), rect()).is_none());
    }

    #[test]
    fn polylines_break_at_non_finite_points() {
        let points = [
            Coordinates::new(1.0, 1.0),
            Coordinates::new(2.0, 2.0),
            Coordinates::new(f64::NAN, 3.0),
            Coordinates::new(4.0, 4.0),
            Coordinates::new(5.0, 5.0),
            Coordinates::new(6.0, 6.0),
        ];
        let mut out = Vec::new();
        build_clipped_polylines(&points, rect(), &mut out);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].len(), 3);
    }
}
