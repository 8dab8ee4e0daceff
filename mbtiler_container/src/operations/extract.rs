use crate::{DirectoryTreeSink, SinkOptions, SinkReport, TileSink, TileStore};
use anyhow::Result;
use mbtiler_core::{Metadata, PathPattern, progress::*};
use mbtiler_derive::context;
use std::path::Path;

/// Writes every tile of `store` below `root`, named by `pattern`. Returns the number of tiles.
///
/// Payloads are written unchanged; the file extension comes from the archive's `format` or, when
/// that is missing, from the payload itself.
#[context("extracting '{}' to '{}'", store.file_name(), root.display())]
pub fn extract_tiles(
	store: &TileStore,
	root: &Path,
	pattern: &PathPattern,
	progress: &mut dyn ProgressSink,
) -> Result<u64> {
	let mut sink = DirectoryTreeSink::new(root, pattern.clone(), SinkOptions::default())?;
	let mut counter = ProgressCounter::new("extracting tiles", Some(store.tile_count()?), progress);
	for tile in store.iter_tiles() {
		let tile = tile?;
		sink.write_blob(&tile.coord(), &tile.data, &tile.extension)?;
		counter.inc(1);
	}
	counter.finish();

	let levels = store.zoom_levels()?.into_iter().collect::<Vec<_>>();
	sink.finish(&SinkReport {
		levels: &levels,
		metadata: &Metadata::new(),
	})
}
