use super::{LevelPlan, SynthesisReport, TileMap, downsample, upsample};
use crate::{TileSink, TileSource};
use anyhow::{Context, Result, bail};
use mbtiler_core::{MBTilesError, MAX_LEVEL, TileCoord, progress::*};
use mbtiler_derive::context;
use mbtiler_image::{RasterImageOperation, decode};
use std::collections::{BTreeSet, HashMap};

/// Derives requested zoom levels of a [`TileSource`] and pushes them into a [`TileSink`].
///
/// Materialized levels are memoized, so a level needed by several others is decoded or computed
/// once. The cache lives until the end of [`run`](PyramidSynthesizer::run).
pub struct PyramidSynthesizer<'a> {
	source: &'a dyn TileSource,
	available: BTreeSet<u8>,
	grayscale: bool,
	cache: HashMap<u8, TileMap>,
	skipped_blocks: u64,
}

impl<'a> PyramidSynthesizer<'a> {
	/// Reads the existing levels of `source`. With `grayscale`, every generated level is converted.
	pub fn new(source: &'a dyn TileSource, grayscale: bool) -> Result<PyramidSynthesizer<'a>> {
		let available = source.zoom_levels()?;
		log::debug!("{} has zoom levels {available:?}", source.name());
		Ok(PyramidSynthesizer {
			source,
			available,
			grayscale,
			cache: HashMap::new(),
			skipped_blocks: 0,
		})
	}

	pub fn available(&self) -> &BTreeSet<u8> {
		&self.available
	}

	pub fn plan(&self, requested: &[u8]) -> LevelPlan {
		LevelPlan::new(&self.available, requested)
	}

	/// Returns the tiles of `level`, loading or deriving them on first use.
	pub fn ensure_level(&mut self, level: u8) -> Result<&TileMap> {
		if !self.cache.contains_key(&level) {
			let tiles = self.materialize(level)?;
			log::debug!("level {level} holds {} tiles", tiles.len());
			self.cache.insert(level, tiles);
		}
		Ok(&self.cache[&level])
	}

	fn materialize(&mut self, level: u8) -> Result<TileMap> {
		let (Some(&min), Some(&max)) = (self.available.first(), self.available.last()) else {
			bail!(MBTilesError::UnresolvableZoomLevel(level));
		};
		if level > MAX_LEVEL {
			bail!(MBTilesError::UnresolvableZoomLevel(level));
		}

		if self.available.contains(&level) {
			return self.load(level);
		}

		let finer = level + 1;
		let mut tiles = if level < min || finer <= max || self.cache.contains_key(&finer) {
			log::debug!("downsampling level {finer} into level {level}");
			self.ensure_level(finer)?;
			let (tiles, skipped) = downsample(&self.cache[&finer])?;
			if skipped > 0 {
				log::warn!("level {level}: skipped {skipped} tiles with incomplete or inconsistent children");
			}
			self.skipped_blocks += skipped;
			tiles
		} else {
			if level == 0 {
				bail!(MBTilesError::UnresolvableZoomLevel(level));
			}
			log::debug!("upsampling level {} into level {level}", level - 1);
			self.ensure_level(level - 1)?;
			upsample(&self.cache[&(level - 1)])?
		};

		if self.grayscale {
			for image in tiles.values_mut() {
				image.to_grayscale();
			}
		}
		Ok(tiles)
	}

	#[context("loading level {level} from '{}'", self.source.name())]
	fn load(&self, level: u8) -> Result<TileMap> {
		let mut tiles = TileMap::new();
		for tile in self.source.tiles_at_level(level)? {
			let image = decode(&tile.data).with_context(|| format!("decoding tile {}", tile.coord()))?;
			tiles.insert((tile.x, tile.xyz_row), image);
		}
		Ok(tiles)
	}

	/// Copies the existing requested levels, generates the others and writes both into `sink`.
	///
	/// Existing tiles pass through as raw bytes; the sink decides whether to re-encode them.
	/// The sink is not finished here.
	pub fn run(
		&mut self,
		requested: &[u8],
		sink: &mut dyn TileSink,
		progress: &mut dyn ProgressSink,
	) -> Result<SynthesisReport> {
		let plan = self.plan(requested);
		if let Some(max) = self.available.last() {
			for level in plan.levels_above(&self.available) {
				log::warn!("zoom level {level} lies above the highest existing level {max} and will be upsampled");
			}
		}
		log::debug!("copying levels {:?}, generating levels {:?}", plan.copy_levels, plan.generate_levels);

		self.skipped_blocks = 0;
		let result = self.emit(&plan, sink, progress);
		self.cache.clear();
		result
	}

	fn emit(
		&mut self,
		plan: &LevelPlan,
		sink: &mut dyn TileSink,
		progress: &mut dyn ProgressSink,
	) -> Result<SynthesisReport> {
		let mut report = SynthesisReport::default();
		let mut counter = ProgressCounter::new("writing tiles", None, progress);

		for &level in &plan.copy_levels {
			for tile in self.source.tiles_at_level(level)? {
				sink.write_blob(&tile.coord(), &tile.data, &tile.extension)?;
				report.copied += 1;
				counter.inc(1);
			}
		}

		for &level in &plan.generate_levels {
			for (&(x, y), image) in self.ensure_level(level)? {
				sink.write_image(&TileCoord::new(level, x, y)?, image)?;
				report.generated += 1;
				counter.inc(1);
			}
		}

		counter.finish();
		report.skipped_blocks = self.skipped_blocks;
		Ok(report)
	}
}
