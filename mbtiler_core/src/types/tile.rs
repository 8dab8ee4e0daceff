use crate::{MBTilesError, TileCoord, TileFormat};
use anyhow::Result;

/// One stored tile: its address in both row conventions plus the opaque payload.
#[derive(Clone, PartialEq, Eq)]
pub struct Tile {
	pub zoom: u8,
	pub x: u32,
	pub tms_row: u32,
	pub xyz_row: u32,
	pub data: Vec<u8>,
	/// From the archive's `format` metadata if present, otherwise sniffed from `data`.
	pub extension: String,
}

impl Tile {
	/// Builds a tile from the row layout of the `tiles` table.
	pub fn from_tms(zoom: u8, x: u32, tms_row: u32, data: Vec<u8>, extension: Option<&str>) -> Result<Tile> {
		let coord = TileCoord::from_tms(zoom, x, tms_row)?;
		let extension = match extension {
			Some(ext) => ext.to_string(),
			None => TileFormat::sniff(&data).extension().to_string(),
		};
		Ok(Tile {
			zoom,
			x,
			tms_row,
			xyz_row: coord.y,
			data,
			extension,
		})
	}

	pub fn coord(&self) -> TileCoord {
		TileCoord {
			level: self.zoom,
			x: self.x,
			y: self.xyz_row,
		}
	}

	pub fn format(&self) -> TileFormat {
		TileFormat::from_extension(&self.extension)
	}

	pub fn ensure_not_empty(&self) -> Result<()> {
		if self.data.is_empty() {
			return Err(MBTilesError::decode(format!("tile {} has no data", self.coord())).into());
		}
		Ok(())
	}
}

impl std::fmt::Debug for Tile {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Tile")
			.field("coord", &self.coord())
			.field("tms_row", &self.tms_row)
			.field("bytes", &self.data.len())
			.field("extension", &self.extension)
			.finish()
	}
}
