//! Per-element caches filled during `calculate` and read during `paint`.
//!
//! Every cache is re-prepared each frame to the current element count. Reads
//! before the first `prepare` return the defaults.

use crate::geom::{Coordinates, Rect};
use crate::layer::HudElementIndex;

/// Window coordinates per element. Unset entries are NaN.
#[derive(Debug, Clone, Default)]
pub struct CoordinatesCache {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl CoordinatesCache {
    /// Resize to `size` entries, all NaN.
    pub fn prepare(&mut self, size: usize) {
        self.xs.clear();
        self.xs.resize(size, f64::NAN);
        self.ys.clear();
        self.ys.resize(size, f64::NAN);
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.xs.len()
    }

    /// Check if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Store the coordinates of an element.
    pub fn set(&mut self, index: HudElementIndex, coordinates: Coordinates) {
        if let (Some(x), Some(y)) = (self.xs.get_mut(index.0), self.ys.get_mut(index.0)) {
            *x = coordinates.x;
            *y = coordinates.y;
        }
    }

    /// Coordinates of an element, NaN if unknown.
    pub fn get(&self, index: HudElementIndex) -> Coordinates {
        Coordinates::new(
            self.xs.get(index.0).copied().unwrap_or(f64::NAN),
            self.ys.get(index.0).copied().unwrap_or(f64::NAN),
        )
    }
}

/// Arbitrary values per element.
#[derive(Debug, Clone)]
pub struct ObjectsCache<T: Clone> {
    default: T,
    values: Vec<T>,
}

impl<T: Clone> ObjectsCache<T> {
    /// Create a cache returning `default` for unset entries.
    pub fn new(default: T) -> Self {
        Self {
            default,
            values: Vec::new(),
        }
    }

    /// Resize to `size` entries, all set to the default.
    pub fn prepare(&mut self, size: usize) {
        self.values.clear();
        self.values.resize(size, self.default.clone());
    }

    /// Store the value of an element.
    pub fn set(&mut self, index: HudElementIndex, value: T) {
        if let Some(slot) = self.values.get_mut(index.0) {
            *slot = value;
        }
    }

    /// Value of an element.
    pub fn get(&self, index: HudElementIndex) -> &T {
        self.values.get(index.0).unwrap_or(&self.default)
    }
}

/// Painted bounds per element, used for hit testing.
#[derive(Debug, Clone, Default)]
pub struct BoundsLayoutCache {
    bounds: Vec<Option<Rect>>,
}

impl BoundsLayoutCache {
    /// Resize to `size` entries, all unknown.
    pub fn prepare(&mut self, size: usize) {
        self.bounds.clear();
        self.bounds.resize(size, None);
    }

    /// Store the painted bounds of an element.
    pub fn set(&mut self, index: HudElementIndex, bounds: Rect) {
        if let Some(slot) = self.bounds.get_mut(index.0) {
            *slot = Some(bounds);
        }
    }

    /// Painted bounds of an element, `None` if it was not painted.
    pub fn get(&self, index: HudElementIndex) -> Option<Rect> {
        self.bounds.get(index.0).copied().flatten()
    }
}

/// Painting order of elements, sorted by z value.
#[derive(Debug, Clone, Default)]
pub struct ZIndexSortingCache {
    entries: Vec<(HudElementIndex, f64)>,
}

impl ZIndexSortingCache {
    /// Resize to `size` entries in index order, all with z value 0.
    pub fn prepare(&mut self, size: usize) {
        self.entries.clear();
        self.entries
            .extend((0..size).map(|index| (HudElementIndex(index), 0.0)));
    }

    /// Set the z value of the element at `index`. Only valid before sorting.
    pub fn set(&mut self, index: HudElementIndex, z: f64) {
        if let Some(entry) = self.entries.get_mut(index.0) {
            *entry = (index, z);
        }
    }

    /// Sort by z value, lowest first. Equal values keep index order.
    pub fn sort_by_z_index(&mut self) {
        self.entries.sort_by(|a, b| a.1.total_cmp(&b.1));
    }

    /// Element indices in painting order.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = HudElementIndex> + '_ {
        self.entries.iter().map(|(index, _)| *index)
    }
}
