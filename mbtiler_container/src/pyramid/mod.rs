//! Zoom level synthesis.
//!
//! Missing levels are derived from their neighbours:
//! - **downsampling** joins four children with [`mosaic_2x2`](mbtiler_image::mosaic_2x2) and shrinks
//!   the result back to tile size
//! - **upsampling** doubles a tile and cuts it into the four children one level down
//!
//! Levels below the lowest existing level are downsampled, levels above the highest are upsampled,
//! and gaps in between are filled from the finer side.

mod resample;
pub use resample::*;

mod synthesizer;
pub use synthesizer::*;

use itertools::Itertools;
use mbtiler_image::RasterImage;
use std::collections::{BTreeMap, BTreeSet};

/// The decoded tiles of one level keyed by `(x, y)` with XYZ rows.
pub type TileMap = BTreeMap<(u32, u32), RasterImage>;

/// Which requested levels are copied and which are generated.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LevelPlan {
	/// Requested levels without duplicates, in order of first mention.
	pub requested: Vec<u8>,
	/// Requested levels that exist, ascending.
	pub copy_levels: Vec<u8>,
	/// Requested levels that must be synthesized, ascending.
	pub generate_levels: Vec<u8>,
}

impl LevelPlan {
	pub fn new(available: &BTreeSet<u8>, requested: &[u8]) -> LevelPlan {
		let requested = requested.iter().copied().unique().collect_vec();
		let (mut copy_levels, mut generate_levels): (Vec<u8>, Vec<u8>) =
			requested.iter().partition(|level| available.contains(*level));
		copy_levels.sort_unstable();
		generate_levels.sort_unstable();
		LevelPlan {
			requested,
			copy_levels,
			generate_levels,
		}
	}

	/// Generated levels above the highest existing one.
	pub fn levels_above(&self, available: &BTreeSet<u8>) -> Vec<u8> {
		match available.last() {
			Some(max) => self.generate_levels.iter().copied().filter(|level| level > max).collect(),
			None => self.generate_levels.clone(),
		}
	}
}

/// Counters of one synthesis run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SynthesisReport {
	pub copied: u64,
	pub generated: u64,
	/// Parent tiles that were not produced because a child was missing or had a different size.
	pub skipped_blocks: u64,
}
