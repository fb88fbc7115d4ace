//! Geometric primitives in window pixel space.

use serde::{Deserialize, Serialize};

/// A location in window pixels. Non-finite components mean "not painted".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position, growing downwards.
    pub y: f64,
}

impl Coordinates {
    /// Origin.
    pub const ORIGIN: Self = Self::new(0.0, 0.0);

    /// Create new coordinates.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Check whether both components are finite.
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Width and height in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    /// Width.
    pub width: f64,
    /// Height.
    pub height: f64,
}

impl Size {
    /// Zero size.
    pub const ZERO: Self = Self::new(0.0, 0.0);

    /// Create a new size.
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Where the anchor of a box is found, seen from the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Direction {
    /// Anchor at the middle of the left edge.
    #[default]
    CenterLeft,
    /// Anchor at the middle of the right edge.
    CenterRight,
    /// Anchor at the middle of the top edge.
    TopCenter,
    /// Anchor at the middle of the bottom edge.
    BottomCenter,
}

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    /// Top-left corner.
    pub origin: Coordinates,
    /// Extent.
    pub size: Size,
}

impl Rect {
    /// Create a rectangle from its top-left corner and size.
    pub const fn new(origin: Coordinates, size: Size) -> Self {
        Self { origin, size }
    }

    /// Create a rectangle from two corners, in any order.
    pub fn from_corners(a: Coordinates, b: Coordinates) -> Self {
        let min = Coordinates::new(a.x.min(b.x), a.y.min(b.y));
        let max = Coordinates::new(a.x.max(b.x), a.y.max(b.y));
        Self::new(min, Size::new(max.x - min.x, max.y - min.y))
    }

    /// Place a box of `size` so that the anchor lies in `direction`,
    /// `gap` pixels away from the box edge.
    pub fn anchored(anchor: Coordinates, direction: Direction, gap: f64, size: Size) -> Self {
        let origin = match direction {
            Direction::CenterLeft => Coordinates::new(anchor.x + gap, anchor.y - size.height / 2.0),
            Direction::CenterRight => Coordinates::new(anchor.x - gap - size.width, anchor.y - size.height / 2.0),
            Direction::TopCenter => Coordinates::new(anchor.x - size.width / 2.0, anchor.y + gap),
            Direction::BottomCenter => Coordinates::new(anchor.x - size.width / 2.0, anchor.y - gap - size.height),
        };
        Self::new(origin, size)
    }

    /// Left edge.
    pub fn left(&self) -> f64 {
        self.origin.x
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.origin.x + self.size.width
    }

    /// Top edge.
    pub fn top(&self) -> f64 {
        self.origin.y
    }

    /// Bottom edge.
    pub fn bottom(&self) -> f64 {
        self.origin.y + self.size.height
    }

    /// Check whether the location lies within the rectangle, edges included.
    pub fn contains(&self, location: Coordinates) -> bool {
        location.x >= self.left()
            && location.x <= self.right()
            && location.y >= self.top()
            && location.y <= self.bottom()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anchored_boxes_keep_the_gap() {
        let size = Size::new(40.0, 20.0);
        let anchor = Coordinates::new(100.0, 50.0);
        let left = Rect::anchored(anchor, Direction::CenterLeft, 10.0, size);
        assert_eq!(left.origin, Coordinates::new(110.0, 40.0));
        let right = Rect::anchored(anchor, Direction::CenterRight, 10.0, size);
        assert_eq!(right.right(), 90.0);
        let below = Rect::anchored(anchor, Direction::TopCenter, 10.0, size);
        assert_eq!(below.top(), 60.0);
    }

    #[test]
    fn contains_includes_edges() {
        let rect = Rect::from_corners(Coordinates::new(10.0, 10.0), Coordinates::new(0.0, 0.0));
        assert!(rect.contains(Coordinates::new(10.0, 0.0)));
        assert!(!rect.contains(Coordinates::new(10.1, 0.0)));
    }
}
