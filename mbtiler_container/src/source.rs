use anyhow::Result;
use mbtiler_core::{Metadata, Tile};
use std::collections::BTreeSet;

/// Anything tiles can be read from level by level.
///
/// Implemented by [`TileStore`](crate::TileStore) and [`DirectoryTreeSource`](crate::DirectoryTreeSource).
pub trait TileSource {
	/// Used in log messages and errors.
	fn name(&self) -> &str;

	/// The levels that hold at least one tile, computed on every call.
	fn zoom_levels(&self) -> Result<BTreeSet<u8>>;

	/// Every tile of one level, ordered by column and then XYZ row.
	fn tiles_at_level(&self, level: u8) -> Result<Vec<Tile>>;

	fn metadata(&self) -> Result<Metadata>;

	/// The extension every tile of this source shares, if the source declares one.
	fn extension_hint(&self) -> Option<&str>;
}
