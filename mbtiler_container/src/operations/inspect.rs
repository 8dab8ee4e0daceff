use crate::{LevelRange, TileStore};
use anyhow::{Result, ensure};
use mbtiler_core::{MAX_LEVEL, MBTilesError, tms_to_xyz};
use mbtiler_derive::context;
use std::io::Write;

/// Archives whose highest level fills less than this share of its rectangle are unhealthy.
pub const HEALTH_THRESHOLD: f64 = 0.25;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MissingReportOptions {
	/// Write XYZ rows instead of the stored TMS rows.
	pub xyz: bool,
	/// Write the four children one level deeper instead of the missing tile itself.
	pub upper_zoom: bool,
}

/// Holes of one level inside the rectangle spanned by its tiles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelGaps {
	pub range: LevelRange,
	/// `(column, TMS row)` of every absent tile, column major.
	pub missing: Vec<(u32, u32)>,
}

impl LevelGaps {
	/// The `/z/x/y` lines for this level.
	pub fn lines(&self, options: &MissingReportOptions) -> Result<Vec<String>> {
		let level = self.range.level;
		let mut lines = Vec::new();
		for &(x, row) in &self.missing {
			if !options.upper_zoom {
				let y = if options.xyz { tms_to_xyz(row, level)? } else { row };
				lines.push(format!("/{level}/{x}/{y}"));
				continue;
			}
			ensure!(
				level < MAX_LEVEL,
				MBTilesError::overflow(format!("level {level} has no children"))
			);
			let child_level = level + 1;
			for dx in 0..2 {
				for dy in 0..2 {
					let (cx, crow) = (2 * x + dx, 2 * row + dy);
					let cy = if options.xyz { tms_to_xyz(crow, child_level)? } else { crow };
					lines.push(format!("/{child_level}/{cx}/{cy}"));
				}
			}
		}
		Ok(lines)
	}
}

/// Finds, per level, the tiles missing from the rectangle between the level's extreme columns and rows.
#[context("looking for missing tiles in '{}'", store.file_name())]
pub fn find_gaps(store: &TileStore) -> Result<Vec<LevelGaps>> {
	let mut gaps = Vec::new();
	for range in store.level_ranges()? {
		let present = store.tile_positions(range.level)?;
		let mut missing = Vec::new();
		for x in range.x_min..=range.x_max {
			for row in range.row_min..=range.row_max {
				if !present.contains(&(x, row)) {
					missing.push((x, row));
				}
			}
		}
		log::debug!(
			"level {}: {} of {} tiles present, {} missing",
			range.level,
			range.count,
			range.area(),
			missing.len()
		);
		gaps.push(LevelGaps { range, missing });
	}
	Ok(gaps)
}

/// Writes one `/z/x/y` line per missing tile to `out` and returns the number of lines.
pub fn write_missing_report(store: &TileStore, out: &mut dyn Write, options: &MissingReportOptions) -> Result<u64> {
	let mut written = 0;
	for level in find_gaps(store)? {
		for line in level.lines(options)? {
			writeln!(out, "{line}")?;
			written += 1;
		}
	}
	out.flush()?;
	Ok(written)
}

/// Fill ratio of the highest level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HealthReport {
	pub level: u8,
	pub tiles: u64,
	/// Size of the rectangle spanned by the level's tiles.
	pub expected: u64,
	pub ratio: f64,
}

impl HealthReport {
	pub fn is_healthy(&self, threshold: f64) -> bool {
		self.ratio >= threshold
	}
}

/// Measures how densely the highest level is filled. `None` for an archive without tiles.
#[context("checking health of '{}'", store.file_name())]
pub fn check_health(store: &TileStore) -> Result<Option<HealthReport>> {
	let Some(range) = store.level_ranges()?.pop() else {
		return Ok(None);
	};
	let expected = range.area();
	Ok(Some(HealthReport {
		level: range.level,
		tiles: range.count,
		expected,
		ratio: range.count as f64 / expected as f64,
	}))
}
