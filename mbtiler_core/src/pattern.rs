//! Path templates for writing tiles into directory trees.
//!
//! A template is parsed once with [`PathPattern::parse`] and then expanded per tile:
//!
//! - `{z}`, `{x}`, `{y}`: zoom, column and XYZ row
//! - `{a}`, `{o}`: latitude of the tile's top edge and longitude of its left edge, 6 decimals
//! - `{ZZ}`, `{XXX}`, …: the value zero padded to the token length, cut to that many leading digits
//! - `{AA}`, `{OOO}`, …: the same for the integer part of `|lat|` and `|lon|`
//! - `{ext}`: the tile's extension
//!
//! ```
//! use mbtiler_core::{PathPattern, TileCoord};
//!
//! let pattern = PathPattern::parse("{z}/{x}/{y}.{ext}").unwrap();
//! let coord = TileCoord::new(5, 3, 10).unwrap();
//! assert_eq!(pattern.format(&coord, "png"), "5/3/10.png");
//! ```

use crate::{MBTilesError, TileCoord, tile_x_to_lon, tile_y_to_lat};
use anyhow::Result;
use std::path::{Path, PathBuf};

pub const DEFAULT_PATTERN: &str = "{z}/{x}/{y}.{ext}";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Field {
	Zoom,
	Column,
	Row,
	Latitude,
	Longitude,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Segment {
	Literal(String),
	Value(Field),
	/// `{ZZ}` style placeholder: first `usize` digits of the zero padded value.
	Digits(Field, usize),
	Extension,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathPattern {
	source: String,
	segments: Vec<Segment>,
}

impl PathPattern {
	pub fn parse(pattern: &str) -> Result<PathPattern> {
		let invalid = |reason: String| MBTilesError::InvalidPattern {
			pattern: pattern.to_string(),
			reason,
		};

		let mut segments = Vec::new();
		let mut literal = String::new();
		let mut rest = pattern;

		while let Some(open) = rest.find('{') {
			literal.push_str(&rest[..open]);
			let after = &rest[open + 1..];
			let Some(close) = after.find('}') else {
				return Err(invalid(format!("unclosed placeholder '{after}'")).into());
			};
			let token = &after[..close];
			let segment = parse_token(token).ok_or_else(|| {
				if token.is_empty() {
					invalid(String::from("empty placeholder '{}'"))
				} else {
					invalid(format!("unknown placeholder '{{{token}}}'"))
				}
			})?;
			if !literal.is_empty() {
				segments.push(Segment::Literal(std::mem::take(&mut literal)));
			}
			segments.push(segment);
			rest = &after[close + 1..];
		}
		literal.push_str(rest);
		if !literal.is_empty() {
			segments.push(Segment::Literal(literal));
		}

		Ok(PathPattern {
			source: pattern.to_string(),
			segments,
		})
	}

	pub fn as_str(&self) -> &str {
		&self.source
	}

	pub fn has_extension_placeholder(&self) -> bool {
		self.segments.contains(&Segment::Extension)
	}

	/// Expands the template for one tile into a relative path.
	pub fn format(&self, coord: &TileCoord, extension: &str) -> String {
		let value = |field: Field| -> f64 {
			match field {
				Field::Zoom => f64::from(coord.level),
				Field::Column => f64::from(coord.x),
				Field::Row => f64::from(coord.y),
				Field::Latitude => tile_y_to_lat(u64::from(coord.y), coord.level),
				Field::Longitude => tile_x_to_lon(u64::from(coord.x), coord.level),
			}
		};

		let mut result = String::with_capacity(self.source.len() + 16);
		for segment in &self.segments {
			match segment {
				Segment::Literal(text) => result.push_str(text),
				Segment::Value(Field::Zoom) => result.push_str(&coord.level.to_string()),
				Segment::Value(Field::Column) => result.push_str(&coord.x.to_string()),
				Segment::Value(Field::Row) => result.push_str(&coord.y.to_string()),
				Segment::Value(field) => result.push_str(&format!("{:.6}", value(*field))),
				Segment::Digits(field, count) => {
					result.push_str(&leading_digits(value(*field).abs().floor() as u64, *count));
				}
				Segment::Extension => result.push_str(extension),
			}
		}
		result
	}

	/// Expands the template below `root` and appends `.extension` when the file name has none.
	pub fn resolve(&self, root: &Path, coord: &TileCoord, extension: &str) -> PathBuf {
		let mut path = root.join(self.format(coord, extension));
		if path.extension().is_none() && !extension.is_empty() {
			path.set_extension(extension);
		}
		path
	}
}

impl Default for PathPattern {
	fn default() -> Self {
		PathPattern {
			source: DEFAULT_PATTERN.to_string(),
			segments: vec![
				Segment::Value(Field::Zoom),
				Segment::Literal(String::from("/")),
				Segment::Value(Field::Column),
				Segment::Literal(String::from("/")),
				Segment::Value(Field::Row),
				Segment::Literal(String::from(".")),
				Segment::Extension,
			],
		}
	}
}

fn parse_token(token: &str) -> Option<Segment> {
	let segment = match token {
		"z" => Segment::Value(Field::Zoom),
		"x" => Segment::Value(Field::Column),
		"y" => Segment::Value(Field::Row),
		"a" => Segment::Value(Field::Latitude),
		"o" => Segment::Value(Field::Longitude),
		"ext" => Segment::Extension,
		_ => {
			let first = token.chars().next()?;
			if !token.chars().all(|c| c == first) {
				return None;
			}
			let field = match first {
				'Z' => Field::Zoom,
				'X' => Field::Column,
				'Y' => Field::Row,
				'A' => Field::Latitude,
				'O' => Field::Longitude,
				_ => return None,
			};
			Segment::Digits(field, token.len())
		}
	};
	Some(segment)
}

/// Zero pads `value` to `count` digits and keeps the first `count` of them.
fn leading_digits(value: u64, count: usize) -> String {
	let mut digits = format!("{value:0count$}");
	digits.truncate(count);
	digits
}
