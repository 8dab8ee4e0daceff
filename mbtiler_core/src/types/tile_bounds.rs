//! Geographic extent of a tile under the Web-Mercator projection.

use std::f64::consts::PI;

/// Latitude/longitude extent of one tile, in degrees.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TileBounds {
	pub lat_min: f64,
	pub lat_max: f64,
	pub lon_min: f64,
	pub lon_max: f64,
}

impl TileBounds {
	/// `[lon_min, lat_min, lon_max, lat_max]`, the order used by the MBTiles `bounds` metadata.
	pub fn as_array(&self) -> [f64; 4] {
		[self.lon_min, self.lat_min, self.lon_max, self.lat_max]
	}

	/// Smallest extent covering both.
	pub fn union(&self, other: &TileBounds) -> TileBounds {
		TileBounds {
			lat_min: self.lat_min.min(other.lat_min),
			lat_max: self.lat_max.max(other.lat_max),
			lon_min: self.lon_min.min(other.lon_min),
			lon_max: self.lon_max.max(other.lon_max),
		}
	}

	pub fn center(&self) -> (f64, f64) {
		((self.lon_min + self.lon_max) / 2.0, (self.lat_min + self.lat_max) / 2.0)
	}
}

/// Longitude of the western edge of column `x`.
pub fn tile_x_to_lon(x: u64, zoom: u8) -> f64 {
	x as f64 / 2f64.powi(i32::from(zoom)) * 360.0 - 180.0
}

/// Latitude of the northern edge of XYZ row `y`.
pub fn tile_y_to_lat(y: u64, zoom: u8) -> f64 {
	let n = PI * (1.0 - 2.0 * y as f64 / 2f64.powi(i32::from(zoom)));
	n.sinh().atan().to_degrees()
}

/// Bounds of tile `(zoom, x, y)` with `y` as XYZ row.
pub fn tile_bounds(zoom: u8, x: u32, y: u32) -> TileBounds {
	let (x, y) = (u64::from(x), u64::from(y));
	TileBounds {
		lat_min: tile_y_to_lat(y + 1, zoom),
		lat_max: tile_y_to_lat(y, zoom),
		lon_min: tile_x_to_lon(x, zoom),
		lon_max: tile_x_to_lon(x + 1, zoom),
	}
}
