//! Rendered tile cache and history-driven invalidation.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::history::HistoryUpdateInfo;
use crate::tile::identifier::TileIdentifier;
use crate::time::TimeRange;

const LOG_TARGET: &str = "meistercharts::tile";

#[derive(Debug, Clone)]
struct CachedTile<T> {
    time_range: TimeRange,
    content: T,
}

/// Tiles keyed by identity, each tagged with the time range it shows.
#[derive(Debug, Clone)]
pub struct TileCache<T> {
    tiles: FxHashMap<TileIdentifier, CachedTile<T>>,
}

impl<T> TileCache<T> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            tiles: FxHashMap::default(),
        }
    }

    /// Return the cached tile, creating it on a miss.
    pub fn get_or_create(
        &mut self,
        identifier: TileIdentifier,
        time_range: TimeRange,
        create: impl FnOnce(&TileIdentifier) -> T,
    ) -> &T {
        &self
            .tiles
            .entry(identifier)
            .or_insert_with(|| CachedTile {
                time_range,
                content: create(&identifier),
            })
            .content
    }

    /// Cached tile content, if any.
    pub fn get(&self, identifier: &TileIdentifier) -> Option<&T> {
        self.tiles.get(identifier).map(|tile| &tile.content)
    }

    /// Number of cached tiles.
    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    /// Check if no tile is cached.
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Drop every tile.
    pub fn clear(&mut self) {
        self.tiles.clear();
    }

    /// Drop a single tile.
    pub fn invalidate(&mut self, identifier: &TileIdentifier) -> bool {
        self.tiles.remove(identifier).is_some()
    }

    /// Drop every tile of the given columns. Returns the number removed.
    pub fn invalidate_columns(&mut self, x_hashes: &FxHashSet<u64>) -> usize {
        let before = self.tiles.len();
        self.tiles
            .retain(|identifier, _| !x_hashes.contains(&identifier.x_data_hash()));
        before - self.tiles.len()
    }

    fn columns_intersecting(&self, time_range: &TimeRange) -> FxHashSet<u64> {
        self.tiles
            .iter()
            .filter(|(_, tile)| tile.time_range.intersects(time_range))
            .map(|(identifier, _)| identifier.x_data_hash())
            .collect()
    }
}

impl<T> Default for TileCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Drops cached tiles whose data changed in the history.
///
/// History updates affect whole columns, so every tile sharing the x hash of
/// an affected tile is dropped.
#[derive(Debug, Clone, Copy, Default)]
pub struct HistoryTileInvalidator;

impl HistoryTileInvalidator {
    /// Apply one update. Returns the number of tiles removed.
    pub fn invalidate<T>(&self, cache: &mut TileCache<T>, update: &HistoryUpdateInfo) -> usize {
        let columns = cache.columns_intersecting(&update.time_range);
        if columns.is_empty() {
            return 0;
        }
        let removed = cache.invalidate_columns(&columns);
        tracing::trace!(
            target: LOG_TARGET,
            sampling_period = ?update.sampling_period,
            columns = columns.len(),
            removed,
            "invalidated tiles"
        );
        removed
    }
}
