use crate::{
	DirectoryTreeSink, LevelPlan, MBTilesSink, PyramidSynthesizer, SinkOptions, SinkReport, TileSink, TileSource,
	TileStore,
};
use anyhow::{Result, bail};
use mbtiler_core::{MBTilesError, PathPattern, TileFormat, ZoomLevelSpec, progress::ProgressSink};
use mbtiler_derive::context;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConvertOptions {
	/// Which levels the output holds. The empty spec means one level below the lowest existing one.
	pub levels: ZoomLevelSpec,
	pub grayscale: bool,
	/// Re-encode every tile into this format.
	pub format: Option<TileFormat>,
	/// File names inside a directory output.
	pub pattern: PathPattern,
}

/// Where `convert` writes to.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConvertTarget {
	MBTiles(PathBuf),
	Directory(PathBuf),
}

impl ConvertTarget {
	/// A directory if `path` is one or has no extension, an archive if it ends in `.mbtiles`.
	pub fn from_path(path: &Path) -> Result<ConvertTarget> {
		if path.is_dir() || path.extension().is_none() {
			return Ok(ConvertTarget::Directory(path.to_path_buf()));
		}
		match path.extension().and_then(|ext| ext.to_str()) {
			Some(ext) if ext.eq_ignore_ascii_case("mbtiles") => Ok(ConvertTarget::MBTiles(path.to_path_buf())),
			_ => bail!("output '{}' must be a directory or end in .mbtiles", path.display()),
		}
	}

	pub fn path(&self) -> &Path {
		match self {
			ConvertTarget::MBTiles(path) | ConvertTarget::Directory(path) => path,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConvertReport {
	pub plan: LevelPlan,
	pub copied: u64,
	pub generated: u64,
	pub skipped_blocks: u64,
	/// Tiles that ended up in the target.
	pub written: u64,
}

/// Resolves the requested levels of `source`, synthesizes the missing ones and writes all of
/// them into `target`.
///
/// An existing archive at the target path is replaced. Levels are written in ascending order,
/// existing levels first.
#[context("converting '{}' to '{}'", source.name(), target.path().display())]
pub fn convert(
	source: &dyn TileSource,
	target: &ConvertTarget,
	options: &ConvertOptions,
	progress: &mut dyn ProgressSink,
) -> Result<ConvertReport> {
	let mut synthesizer = PyramidSynthesizer::new(source, options.grayscale)?;
	if synthesizer.available().is_empty() {
		bail!(MBTilesError::NoTiles(source.name().to_string()));
	}
	let levels = options.levels.resolve(synthesizer.available())?;
	let plan = synthesizer.plan(&levels);
	log::debug!("resolved '{}' to levels {levels:?}", options.levels);

	let sink_options = SinkOptions {
		grayscale: options.grayscale,
		format: options.format,
	};
	let mut sink: Box<dyn TileSink> = match target {
		ConvertTarget::MBTiles(path) => {
			let fallback = source
				.extension_hint()
				.map_or(TileFormat::Png, TileFormat::from_extension);
			Box::new(MBTilesSink::new(TileStore::create(path)?, sink_options)?.with_fallback_format(fallback))
		}
		ConvertTarget::Directory(root) => Box::new(DirectoryTreeSink::new(root, options.pattern.clone(), sink_options)?),
	};

	let synthesis = synthesizer.run(&levels, sink.as_mut(), progress)?;
	let metadata = source.metadata()?;
	let written = sink.finish(&SinkReport {
		levels: &levels,
		metadata: &metadata,
	})?;

	Ok(ConvertReport {
		plan,
		copied: synthesis.copied,
		generated: synthesis.generated,
		skipped_blocks: synthesis.skipped_blocks,
		written,
	})
}
