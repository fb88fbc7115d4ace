//! Tile addressing, identity and caching.
//!
//! Tiles are rendering units of the content area. Their identity is used as
//! cache key; the x-scoped hash lets history updates invalidate whole columns
//! without touching the rest of the grid.

mod cache;
mod identifier;
mod index;

pub use cache::{HistoryTileInvalidator, TileCache};
pub use identifier::TileIdentifier;
pub use index::{ChartId, MainIndex, SUB_INDEX_FACTOR, SubIndex, TileIndex, Zoom};
