//! Tile addressing in XYZ and TMS row conventions.
//!
//! MBTiles stores rows in TMS order (row 0 at the south) while every public API of this
//! workspace speaks XYZ (row 0 at the north). The conversion `(2^zoom - 1) - row` is its own
//! inverse, so [`tms_to_xyz`] and [`xyz_to_tms`] share one implementation and differ only in name.
//!
//! ```
//! use mbtiler_core::{TileCoord, tms_to_xyz, xyz_to_tms};
//!
//! assert_eq!(tms_to_xyz(0, 3).unwrap(), 7);
//! assert_eq!(xyz_to_tms(tms_to_xyz(5, 10).unwrap(), 10).unwrap(), 5);
//!
//! let coord = TileCoord::new(10, 3, 2).unwrap();
//! assert_eq!(coord.parent().unwrap(), TileCoord::new(9, 1, 1).unwrap());
//! ```

use crate::{MBTilesError, TileBounds, tile_bounds};
use anyhow::{Result, bail, ensure};
use std::fmt::{self, Debug, Display};

/// Zoom levels from here on can not be represented in a 64 bit shift.
pub const MAX_SHIFT_LEVEL: u8 = 63;

/// Highest zoom level whose indices fit into `u32`.
pub const MAX_LEVEL: u8 = 31;

fn flip_row(row: u32, zoom: u8) -> Result<u32> {
	if zoom >= MAX_SHIFT_LEVEL {
		bail!(MBTilesError::overflow(format!("zoom level {zoom} must be < {MAX_SHIFT_LEVEL}")));
	}
	let max = (1u64 << zoom) - 1;
	let row = u64::from(row);
	if row > max {
		bail!(MBTilesError::overflow(format!("row {row} exceeds {max} at zoom level {zoom}")));
	}
	u32::try_from(max - row)
		.map_err(|_| MBTilesError::overflow(format!("flipped row {} does not fit into 32 bits", max - row)).into())
}

/// Converts a stored TMS row into an XYZ row.
pub fn tms_to_xyz(row: u32, zoom: u8) -> Result<u32> {
	flip_row(row, zoom)
}

/// Converts an XYZ row into the TMS row used by the `tiles` table.
pub fn xyz_to_tms(row: u32, zoom: u8) -> Result<u32> {
	flip_row(row, zoom)
}

/// Converts a zoom level read from a database into `u8`, rejecting anything outside `0..63`.
pub fn checked_level(value: i64) -> Result<u8> {
	if !(0..i64::from(MAX_SHIFT_LEVEL)).contains(&value) {
		bail!(MBTilesError::overflow(format!("unsupported zoom level {value}")));
	}
	Ok(value as u8)
}

/// Converts a column or row read from a database into `u32`.
pub fn checked_index(value: i64, name: &str) -> Result<u32> {
	u32::try_from(value).map_err(|_| MBTilesError::overflow(format!("{name} {value} is out of range")).into())
}

/// A tile address with an XYZ row.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
	pub level: u8,
	pub x: u32,
	pub y: u32,
}

impl TileCoord {
	/// Creates a coordinate and checks that `x` and `y` lie inside the grid of `level`.
	pub fn new(level: u8, x: u32, y: u32) -> Result<TileCoord> {
		if level > MAX_LEVEL {
			bail!(MBTilesError::overflow(format!("level ({level}) must be <= {MAX_LEVEL}")));
		}
		let max = 1u64 << level;
		ensure!(u64::from(x) < max, MBTilesError::overflow(format!("x ({x}) out of bounds for level {level}")));
		ensure!(u64::from(y) < max, MBTilesError::overflow(format!("y ({y}) out of bounds for level {level}")));
		Ok(TileCoord { level, x, y })
	}

	/// Builds a coordinate from a stored TMS row.
	pub fn from_tms(level: u8, x: u32, tms_row: u32) -> Result<TileCoord> {
		TileCoord::new(level, x, tms_to_xyz(tms_row, level)?)
	}

	pub fn tms_row(&self) -> u32 {
		// new() guarantees y < 2^level <= 2^31
		((1u64 << self.level) - 1 - u64::from(self.y)) as u32
	}

	/// The tile one level up that covers this one, `None` at level 0.
	pub fn parent(&self) -> Option<TileCoord> {
		(self.level > 0).then(|| TileCoord {
			level: self.level - 1,
			x: self.x / 2,
			y: self.y / 2,
		})
	}

	/// Position of this tile inside its parent: 0 = NW, 1 = NE, 2 = SW, 3 = SE.
	pub fn quadrant(&self) -> usize {
		((self.y % 2) * 2 + (self.x % 2)) as usize
	}

	/// The four tiles one level down, ordered like [`quadrant`](Self::quadrant).
	pub fn children(&self) -> Result<[TileCoord; 4]> {
		let level = self.level + 1;
		let (x, y) = (self.x * 2, self.y * 2);
		Ok([
			TileCoord::new(level, x, y)?,
			TileCoord::new(level, x + 1, y)?,
			TileCoord::new(level, x, y + 1)?,
			TileCoord::new(level, x + 1, y + 1)?,
		])
	}

	pub fn bounds(&self) -> TileBounds {
		tile_bounds(self.level, self.x, self.y)
	}
}

impl Debug for TileCoord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "TileCoord({}, [{}, {}])", self.level, self.x, self.y)
	}
}

impl Display for TileCoord {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}/{}", self.level, self.x, self.y)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::error_kind;
	use rstest::rstest;

	#[rstest]
	#[case::top_left(0, 0, 0)]
	#[case::bottom(0, 3, 7)]
	#[case::middle(5, 10, 1018)]
	#[case::deep(20, 20, 1048555)]
	fn flips_rows(#[case] row: u32, #[case] zoom: u8, #[case] expected: u32) {
		assert_eq!(tms_to_xyz(row, zoom).unwrap(), expected);
		assert_eq!(xyz_to_tms(expected, zoom).unwrap(), row);
	}

	#[test]
	fn round_trip_over_whole_levels() {
		for zoom in 0..=8u8 {
			for row in 0..(1u32 << zoom) {
				assert_eq!(tms_to_xyz(xyz_to_tms(row, zoom).unwrap(), zoom).unwrap(), row);
			}
		}
	}

	#[rstest]
	#[case::zoom_too_high(0, 63)]
	#[case::row_outside(8, 3)]
	#[case::too_wide(0, 40)]
	fn overflow(#[case] row: u32, #[case] zoom: u8) {
		let err = tms_to_xyz(row, zoom).unwrap_err();
		assert!(matches!(error_kind(&err), Some(MBTilesError::CoordinateOverflow(_))), "{err}");
	}

	#[test]
	fn deep_level_at_the_edge_still_fits() {
		assert_eq!(tms_to_xyz(0, 32).unwrap(), u32::MAX);
	}

	#[rstest]
	#[case(-1, false)]
	#[case(0, true)]
	#[case(62, true)]
	#[case(63, false)]
	fn checks_levels(#[case] value: i64, #[case] ok: bool) {
		assert_eq!(checked_level(value).is_ok(), ok);
	}

	#[test]
	fn new_validates_grid() {
		assert!(TileCoord::new(2, 3, 3).is_ok());
		assert!(TileCoord::new(2, 4, 0).is_err());
		assert!(TileCoord::new(32, 0, 0).is_err());
	}

	#[test]
	fn tms_conversion() {
		let coord = TileCoord::from_tms(3, 1, 0).unwrap();
		assert_eq!(coord.y, 7);
		assert_eq!(coord.tms_row(), 0);
	}

	#[test]
	fn family() {
		let coord = TileCoord::new(10, 5, 6).unwrap();
		assert_eq!(coord.quadrant(), 1);
		let parent = coord.parent().unwrap();
		assert_eq!(parent, TileCoord::new(9, 2, 3).unwrap());
		let children = parent.children().unwrap();
		assert_eq!(children[coord.quadrant()], coord);
		for (index, child) in children.iter().enumerate() {
			assert_eq!(child.quadrant(), index);
			assert_eq!(child.parent().unwrap(), parent);
		}
		assert!(TileCoord::new(0, 0, 0).unwrap().parent().is_none());
	}

	#[test]
	fn formatting() {
		let coord = TileCoord::new(4, 3, 2).unwrap();
		assert_eq!(coord.to_string(), "4/3/2");
		assert_eq!(format!("{coord:?}"), "TileCoord(4, [3, 2])");
	}
}
