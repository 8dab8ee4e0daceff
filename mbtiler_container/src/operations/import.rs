use crate::{DirectoryTreeSource, TileSource, TileStore};
use anyhow::{Result, bail, ensure};
use itertools::Itertools;
use mbtiler_core::{MBTilesError, Metadata, TileBounds, progress::*};
use mbtiler_derive::context;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportOptions {
	/// Import only this level. It must be one of the levels found in the tree.
	pub level: Option<u8>,
	/// Stored as `description` and used as the file name prefix.
	pub description: String,
	/// Add to an existing archive instead of replacing it. Tiles at the same address are replaced.
	pub augment: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ImportReport {
	pub path: PathBuf,
	pub tiles: u64,
	pub min_zoom: u8,
	pub max_zoom: u8,
	/// Extent of the highest imported level.
	pub bounds: TileBounds,
	pub format: String,
}

/// `{description}_{N|S}{lat}{E|W}{lon}_z{min}[-{max}].mbtiles`, named after the rounded down center.
pub fn default_file_name(description: &str, bounds: &TileBounds, min_zoom: u8, max_zoom: u8) -> String {
	let (lon, lat) = bounds.center();
	let (lon, lat) = (lon.floor() as i32, lat.floor() as i32);
	let ns = if lat >= 0 { 'N' } else { 'S' };
	let ew = if lon >= 0 { 'E' } else { 'W' };
	let zoom = if min_zoom == max_zoom {
		format!("{max_zoom:02}")
	} else {
		format!("{min_zoom:02}-{max_zoom:02}")
	};
	format!(
		"{description}_{ns}{:03}{ew}{:03}_z{zoom}.mbtiles",
		lat.unsigned_abs(),
		lon.unsigned_abs()
	)
}

/// Loads a `{z}/{x}/{y}.{ext}` tree into an MBTiles archive.
///
/// Without `output` the archive is named by [`default_file_name`] in the working directory. A new
/// archive gets the usual baselayer metadata; an augmented one only gains the keys it lacks.
#[context("importing '{}'", source.root().display())]
pub fn import_tree(
	source: &DirectoryTreeSource,
	output: Option<&Path>,
	options: &ImportOptions,
	progress: &mut dyn ProgressSink,
) -> Result<ImportReport> {
	let available = source.zoom_levels()?;
	let (Some(&first), Some(&last)) = (available.first(), available.last()) else {
		bail!(MBTilesError::NoTiles(source.name().to_string()));
	};
	let (min_zoom, max_zoom) = match options.level {
		Some(level) => {
			ensure!(
				available.contains(&level),
				"zoom level {level} is not in the found range {first}..={last}"
			);
			(level, level)
		}
		None => (first, last),
	};
	let levels = available.range(min_zoom..=max_zoom).copied().collect_vec();

	let top = source.entries(max_zoom)?;
	let bounds = top
		.iter()
		.map(|entry| entry.coord.bounds())
		.reduce(|a, b| a.union(&b))
		.ok_or_else(|| MBTilesError::NoTiles(source.name().to_string()))?;
	log::debug!("levels {min_zoom}..={max_zoom}, bounds {:?}", bounds.as_array());

	let path = output.map_or_else(
		|| PathBuf::from(default_file_name(&options.description, &bounds, min_zoom, max_zoom)),
		Path::to_path_buf,
	);
	let store = if options.augment && path.exists() {
		log::info!("adding tiles to the existing archive {path:?}");
		TileStore::open_or_create(&path)?
	} else {
		if options.augment {
			log::info!("{path:?} does not exist, creating a new archive");
		}
		TileStore::create(&path)?
	};
	store.set_bulk_load_pragmas()?;

	let mut entries = Vec::with_capacity(levels.len());
	for &level in &levels {
		entries.push(if level == max_zoom { top.clone() } else { source.entries(level)? });
	}
	let total = entries.iter().map(|level| level.len() as u64).sum();

	let mut extensions = Vec::new();
	let mut batch = store.begin_batch()?;
	let mut counter = ProgressCounter::new("importing tiles", Some(total), progress);
	for entry in entries.iter().flatten() {
		let tile = source.read(entry)?;
		batch.insert(&entry.coord, &tile.data)?;
		extensions.push(tile.extension);
		counter.inc(1);
	}
	counter.finish();
	let tiles = batch.commit()?;

	let format = dominant_extension(&extensions);
	let metadata = import_metadata(&options.description, &format, &bounds, min_zoom, max_zoom);
	if store.metadata_keys()?.is_empty() {
		store.set_metadata(&metadata, true)?;
	} else {
		let existing = store.metadata()?;
		let missing: Metadata = metadata.into_iter().filter(|(key, _)| !existing.contains_key(key)).collect();
		store.set_metadata(&missing, false)?;
	}
	store.vacuum()?;

	Ok(ImportReport {
		path,
		tiles,
		min_zoom,
		max_zoom,
		bounds,
		format,
	})
}

/// The most frequent extension; ties go to the alphabetically last one.
fn dominant_extension(extensions: &[String]) -> String {
	let counts = extensions.iter().sorted().dedup_with_count().collect_vec();
	if counts.len() > 1 {
		let summary = counts.iter().map(|(n, ext)| format!("{n} {ext}")).join(", ");
		log::warn!("the tree mixes tile formats ({summary})");
	}
	counts
		.into_iter()
		.max_by_key(|(n, _)| *n)
		.map_or_else(|| String::from("png"), |(_, ext)| ext.clone())
}

fn import_metadata(description: &str, format: &str, bounds: &TileBounds, min_zoom: u8, max_zoom: u8) -> Metadata {
	let [lon_min, lat_min, lon_max, lat_max] = bounds.as_array();
	let (lon, lat) = bounds.center();
	Metadata::from([
		(String::from("name"), String::from("Tiles")),
		(String::from("type"), String::from("baselayer")),
		(String::from("version"), String::from("1.3")),
		(String::from("description"), description.to_string()),
		(String::from("format"), format.to_string()),
		(
			String::from("bounds"),
			format!("{lon_min:.7},{lat_min:.7},{lon_max:.7},{lat_max:.7}"),
		),
		(String::from("center"), format!("{lon:.7},{lat:.7},{min_zoom}")),
		(String::from("minzoom"), min_zoom.to_string()),
		(String::from("maxzoom"), max_zoom.to_string()),
	])
}
