//! Tile identity and hashing.

use std::hash::{Hash, Hasher};

use rustc_hash::FxHasher;
use serde::Serialize;

use crate::tile::index::{ChartId, TileIndex, Zoom};

/// Identity of a rendered tile: chart, address and zoom.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TileIdentifier {
    /// Owning chart.
    pub chart_id: ChartId,
    /// Tile address.
    pub tile_index: TileIndex,
    /// Zoom the tile was rendered for.
    pub zoom: Zoom,
}

impl TileIdentifier {
    /// Create an identifier.
    pub fn new(chart_id: ChartId, tile_index: TileIndex, zoom: Zoom) -> Self {
        Self {
            chart_id,
            tile_index,
            zoom,
        }
    }

    /// Hash of the horizontal part of the identity.
    ///
    /// Covers chart, x indices and x zoom only, so all tiles of one column
    /// share a value. Identifiers that differ in exactly one of these fields
    /// always hash differently.
    pub fn x_data_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.chart_id.hash(&mut hasher);
        self.tile_index.main_x.hash(&mut hasher);
        self.tile_index.sub_x.hash(&mut hasher);
        self.zoom.scale_x.to_bits().hash(&mut hasher);
        hasher.finish()
    }
}

impl PartialEq for TileIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.chart_id == other.chart_id
            && self.tile_index == other.tile_index
            && self.zoom.scale_x.to_bits() == other.zoom.scale_x.to_bits()
            && self.zoom.scale_y.to_bits() == other.zoom.scale_y.to_bits()
    }
}

impl Eq for TileIdentifier {}

impl Hash for TileIdentifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.chart_id.hash(state);
        self.tile_index.hash(state);
        self.zoom.scale_x.to_bits().hash(state);
        self.zoom.scale_y.to_bits().hash(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rustc_hash::FxHashSet;

    fn identifier(main_x: i32, sub_x: i32) -> TileIdentifier {
        TileIdentifier::new(ChartId(17), TileIndex::new(main_x, sub_x, 3, 4), Zoom::new(1.0, 1.0))
    }

    #[test]
    fn x_hash_separates_columns() {
        let hashes = [
            identifier(1, 2).x_data_hash(),
            identifier(1, 3).x_data_hash(),
            identifier(2, 3).x_data_hash(),
            identifier(2, 2).x_data_hash(),
        ];
        let distinct: FxHashSet<u64> = hashes.iter().copied().collect();
        assert_eq!(distinct.len(), hashes.len());
    }

    #[test]
    fn x_hash_ignores_y() {
        let a = TileIdentifier::new(ChartId(1), TileIndex::new(5, 6, 0, 0), Zoom::new(2.0, 1.0));
        let b = TileIdentifier::new(ChartId(1), TileIndex::new(5, 6, 9, 9), Zoom::new(2.0, 3.0));
        assert_eq!(a.x_data_hash(), b.x_data_hash());
        assert_ne!(a, b);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn prop_x_hash_differs_for_different_columns(
            main_x in -10_000i32..10_000,
            sub_x in 0i32..8192,
            delta in 1i32..1_000,
            step_main in any::<bool>(),
        ) {
            let (other_main_x, other_sub_x) = if step_main {
                (main_x + delta, sub_x)
            } else {
                (main_x, (sub_x + delta) % 8192)
            };
            prop_assert_ne!(
                identifier(main_x, sub_x).x_data_hash(),
                identifier(other_main_x, other_sub_x).x_data_hash()
            );
        }
    }
}
