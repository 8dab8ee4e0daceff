use super::TileMap;
use anyhow::Result;
use mbtiler_core::{MBTilesError, error_kind};
use mbtiler_image::{RasterImage, RasterImageOperation, mosaic_2x2};
use std::collections::BTreeMap;

/// Builds the level above `children`.
///
/// Children are grouped by `(x / 2, y / 2)`. A parent whose block misses a child, or whose
/// children differ in size, is skipped and counted in the returned number.
pub fn downsample(children: &TileMap) -> Result<(TileMap, u64)> {
	let mut blocks: BTreeMap<(u32, u32), [Option<&RasterImage>; 4]> = BTreeMap::new();
	for (&(x, y), image) in children {
		let quadrant = ((y % 2) * 2 + (x % 2)) as usize;
		blocks.entry((x / 2, y / 2)).or_default()[quadrant] = Some(image);
	}

	let mut parents = TileMap::new();
	let mut skipped = 0;
	for ((x, y), block) in blocks {
		let [Some(nw), Some(ne), Some(sw), Some(se)] = block else {
			log::debug!("skipping parent ({x}, {y}): incomplete block");
			skipped += 1;
			continue;
		};
		let mosaic = match mosaic_2x2([nw, ne, sw, se]) {
			Ok(mosaic) => mosaic,
			Err(err) if matches!(error_kind(&err), Some(MBTilesError::InconsistentTileSize(_))) => {
				log::warn!("skipping parent ({x}, {y}): {err:#}");
				skipped += 1;
				continue;
			}
			Err(err) => return Err(err),
		};
		let (width, height) = nw.dimensions();
		parents.insert((x, y), mosaic.get_resized(width, height)?);
	}
	Ok((parents, skipped))
}

/// Builds the level below `parents`: every tile is doubled and cut into its four children.
pub fn upsample(parents: &TileMap) -> Result<TileMap> {
	let mut children = TileMap::new();
	for (&(x, y), image) in parents {
		let (width, height) = image.dimensions();
		let quadrants = image.get_resized(width * 2, height * 2)?.split_quadrants()?;
		for (index, quadrant) in (0u32..).zip(quadrants) {
			children.insert((x * 2 + index % 2, y * 2 + index / 2), quadrant);
		}
	}
	Ok(children)
}
