//! Tile addressing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TileIndexError;

/// Number of sub indices per main index.
pub const SUB_INDEX_FACTOR: i32 = 8192;

/// Coarse tile coordinate along one axis.
///
/// Stepping past [`MainIndex::MIN`] or [`MainIndex::MAX`] is an error; the
/// value never wraps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct MainIndex(pub i32);

impl MainIndex {
    /// Origin.
    pub const ZERO: Self = Self(0);
    /// Smallest representable index.
    pub const MIN: Self = Self(i32::MIN);
    /// Largest representable index.
    pub const MAX: Self = Self(i32::MAX);

    /// The next index.
    pub fn increment(self) -> Result<Self, TileIndexError> {
        self.0.checked_add(1).map(Self).ok_or(TileIndexError::Overflow)
    }

    /// The previous index.
    pub fn decrement(self) -> Result<Self, TileIndexError> {
        self.0.checked_sub(1).map(Self).ok_or(TileIndexError::Underflow)
    }

    /// Check if this is the smallest index.
    pub fn at_min(self) -> bool {
        self == Self::MIN
    }

    /// Check if this is the largest index.
    pub fn at_max(self) -> bool {
        self == Self::MAX
    }

    /// Main index part of an exact (main * factor + sub) index.
    pub fn calculate_main_tile_index_part(index: f64) -> i32 {
        (index / f64::from(SUB_INDEX_FACTOR)).floor() as i32
    }
}

impl fmt::Display for MainIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fine tile coordinate within a main index, `0..SUB_INDEX_FACTOR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct SubIndex(pub i32);

/// Two-dimensional tile address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TileIndex {
    /// Main index along x.
    pub main_x: MainIndex,
    /// Sub index along x.
    pub sub_x: SubIndex,
    /// Main index along y.
    pub main_y: MainIndex,
    /// Sub index along y.
    pub sub_y: SubIndex,
}

impl TileIndex {
    /// Create an index from raw parts.
    pub const fn new(main_x: i32, sub_x: i32, main_y: i32, sub_y: i32) -> Self {
        Self {
            main_x: MainIndex(main_x),
            sub_x: SubIndex(sub_x),
            main_y: MainIndex(main_y),
            sub_y: SubIndex(sub_y),
        }
    }

    /// Create an index from exact (main * factor + sub) values.
    pub fn from_exact(x: f64, y: f64) -> Self {
        let (main_x, sub_x) = split_exact(x);
        let (main_y, sub_y) = split_exact(y);
        Self::new(main_x, sub_x, main_y, sub_y)
    }

    /// Exact x index (main * factor + sub).
    pub fn x_as_exact(&self) -> f64 {
        f64::from(self.main_x.0) * f64::from(SUB_INDEX_FACTOR) + f64::from(self.sub_x.0)
    }

    /// Exact y index (main * factor + sub).
    pub fn y_as_exact(&self) -> f64 {
        f64::from(self.main_y.0) * f64::from(SUB_INDEX_FACTOR) + f64::from(self.sub_y.0)
    }
}

fn split_exact(index: f64) -> (i32, i32) {
    let main = MainIndex::calculate_main_tile_index_part(index);
    let sub = index.floor() - f64::from(main) * f64::from(SUB_INDEX_FACTOR);
    (main, sub as i32)
}

/// Zoom factors of a chart.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Zoom {
    /// Horizontal zoom.
    pub scale_x: f64,
    /// Vertical zoom.
    pub scale_y: f64,
}

impl Zoom {
    /// No zoom.
    pub const DEFAULT: Self = Self::new(1.0, 1.0);

    /// Create a zoom.
    pub const fn new(scale_x: f64, scale_y: f64) -> Self {
        Self { scale_x, scale_y }
    }

    /// Clamp both factors to a lower bound.
    pub fn with_min(self, min_x: f64, min_y: f64) -> Self {
        Self::new(self.scale_x.max(min_x), self.scale_y.max(min_y))
    }
}

impl Default for Zoom {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Identity of a chart instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ChartId(pub u32);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stepping_past_bounds_is_an_error() {
        assert!(MainIndex::MAX.at_max());
        assert!(MainIndex::MIN.at_min());
        assert!(!MainIndex(0).at_min());
        assert_eq!(MainIndex::MAX.increment(), Err(TileIndexError::Overflow));
        assert_eq!(MainIndex::MIN.decrement(), Err(TileIndexError::Underflow));
        assert_eq!(MainIndex(4).increment(), Ok(MainIndex(5)));
        assert_eq!(MainIndex(-4).decrement(), Ok(MainIndex(-5)));
    }

    #[test]
    fn exact_index_round_trips() {
        let index = TileIndex::from_exact(f64::from(SUB_INDEX_FACTOR) * 2.0 + 5.0, -1.0);
        assert_eq!(index, TileIndex::new(2, 5, -1, SUB_INDEX_FACTOR - 1));
        assert_eq!(index.x_as_exact(), f64::from(SUB_INDEX_FACTOR) * 2.0 + 5.0);
        assert_eq!(index.y_as_exact(), -1.0);
    }

    #[test]
    fn main_part_floors() {
        assert_eq!(MainIndex::calculate_main_tile_index_part(-0.5), -1);
        assert_eq!(MainIndex::calculate_main_tile_index_part(f64::from(SUB_INDEX_FACTOR)), 1);
    }

    #[test]
    fn zoom_min_clamps() {
        assert_eq!(Zoom::new(0.1, 2.0).with_min(0.5, 0.5), Zoom::new(0.5, 2.0));
    }
}
