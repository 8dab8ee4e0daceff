//! Fixture builders for tests of this and dependent crates (feature `test`).

use crate::TileStore;
use anyhow::Result;
use mbtiler_core::{Metadata, TileCoord};
use mbtiler_image::{encode_png, new_solid};
use std::{fs, path::Path};

/// Edge length of fixture tiles.
pub const TEST_TILE_SIZE: u32 = 8;

/// A color derived from the coordinate, so tiles of a fixture can be told apart.
pub fn test_color(coord: &TileCoord) -> [u8; 4] {
	[
		coord.level.wrapping_mul(20),
		(coord.x as u8).wrapping_mul(40).wrapping_add(10),
		(coord.y as u8).wrapping_mul(60).wrapping_add(20),
		255,
	]
}

/// A PNG tile filled with [`test_color`].
pub fn test_tile(coord: &TileCoord) -> Vec<u8> {
	encode_png(&new_solid(TEST_TILE_SIZE, TEST_TILE_SIZE, test_color(coord))).unwrap()
}

/// Every coordinate of one level.
pub fn full_level(level: u8) -> Vec<TileCoord> {
	let size = 1u32 << level;
	(0..size)
		.flat_map(|x| (0..size).map(move |y| TileCoord { level, x, y }))
		.collect()
}

pub fn test_metadata() -> Metadata {
	Metadata::from([
		(String::from("format"), String::from("png")),
		(String::from("name"), String::from("test")),
	])
}

/// Creates an archive holding one [`test_tile`] per coordinate plus [`test_metadata`], and reopens it.
pub fn make_test_store(path: &Path, coords: &[TileCoord]) -> Result<TileStore> {
	let store = TileStore::create(path)?;
	let mut batch = store.begin_batch()?;
	for coord in coords {
		batch.insert(coord, &test_tile(coord))?;
	}
	batch.commit()?;
	store.set_metadata(&test_metadata(), true)?;
	drop(store);
	TileStore::open(path)
}

/// Writes one [`test_tile`] per coordinate to `root/{z}/{x}/{y}.png`.
pub fn make_test_directory(root: &Path, coords: &[TileCoord]) -> Result<()> {
	for coord in coords {
		let path = root.join(format!("{}/{}/{}.png", coord.level, coord.x, coord.y));
		fs::create_dir_all(path.parent().unwrap_or(root))?;
		fs::write(path, test_tile(coord))?;
	}
	Ok(())
}
