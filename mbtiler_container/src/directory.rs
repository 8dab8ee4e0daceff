//! Read a directory tree of loose tiles as if it were an archive.
//!
//! The layout is the one written by `extract` and by tile downloaders:
//! ```text
//! <root>/<z>/<x>/<y>.<ext>
//! ```
//! Rows are XYZ rows unless [`with_tms_rows`](DirectoryTreeSource::with_tms_rows) says otherwise.
//! Directories and files whose names are not integers are ignored, so a tree may contain other
//! files next to the tiles.

use crate::TileSource;
use anyhow::{Result, ensure};
use mbtiler_core::*;
use mbtiler_derive::context;
use std::{
	collections::BTreeSet,
	fs,
	path::{Path, PathBuf},
};

#[derive(Debug)]
pub struct DirectoryTreeSource {
	root: PathBuf,
	name: String,
	tms_rows: bool,
	format_hint: Option<String>,
}

/// A tile file found in the tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryEntry {
	pub coord: TileCoord,
	pub path: PathBuf,
	/// Normalized file extension, `None` for files without one.
	pub extension: Option<String>,
}

impl DirectoryTreeSource {
	#[context("opening tile directory '{}'", root.display())]
	pub fn open(root: &Path) -> Result<DirectoryTreeSource> {
		ensure!(
			root.is_dir(),
			MBTilesError::Open {
				path: root.to_path_buf(),
				reason: String::from("not a directory"),
			}
		);
		let format_hint = first_tile_format(root)?;
		log::trace!("{} uses format hint {format_hint:?}", root.display());
		Ok(DirectoryTreeSource {
			root: root.to_path_buf(),
			name: root.display().to_string(),
			tms_rows: false,
			format_hint,
		})
	}

	/// Treats the `<y>` file names as TMS rows.
	pub fn with_tms_rows(mut self, tms_rows: bool) -> Self {
		self.tms_rows = tms_rows;
		self
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// All tile files of one level, ordered by coordinate.
	#[context("listing level {level} in '{}'", self.name)]
	pub fn entries(&self, level: u8) -> Result<Vec<DirectoryEntry>> {
		let mut entries = Vec::new();
		for (x, column_dir) in numbered_children(&self.root.join(level.to_string()), true)? {
			for (y, path) in numbered_children(&column_dir, false)? {
				let coord = if self.tms_rows {
					TileCoord::from_tms(level, x, y)?
				} else {
					TileCoord::new(level, x, y)?
				};
				let extension = path
					.extension()
					.and_then(|ext| ext.to_str())
					.and_then(normalize_extension);
				entries.push(DirectoryEntry { coord, path, extension });
			}
		}
		entries.sort_by_key(|entry| entry.coord);
		Ok(entries)
	}

	/// Reads the file behind `entry`.
	pub fn read(&self, entry: &DirectoryEntry) -> Result<Tile> {
		let data = fs::read(&entry.path).map_err(MBTilesError::io(&entry.path))?;
		Tile::from_tms(
			entry.coord.level,
			entry.coord.x,
			entry.coord.tms_row(),
			data,
			entry.extension.as_deref(),
		)
	}
}

/// The format of the first tile file in `<z>/<x>/<y>` order, by extension or else by content.
fn first_tile_format(root: &Path) -> Result<Option<String>> {
	for (_, level_dir) in numbered_children(root, true)? {
		for (_, column_dir) in numbered_children(&level_dir, true)? {
			let Some((_, path)) = numbered_children(&column_dir, false)?.into_iter().next() else {
				continue;
			};
			let declared = path
				.extension()
				.and_then(|ext| ext.to_str())
				.map(TileFormat::from_extension)
				.filter(TileFormat::is_image);
			let format = match declared {
				Some(format) => format,
				None => TileFormat::sniff(&fs::read(&path).map_err(MBTilesError::io(&path))?),
			};
			return Ok(format.is_image().then(|| format.extension().to_string()));
		}
	}
	Ok(None)
}

/// Children of `dir` whose name (without extension for files) is an integer, ordered by number.
fn numbered_children(dir: &Path, directories: bool) -> Result<Vec<(u32, PathBuf)>> {
	if !dir.is_dir() {
		return Ok(Vec::new());
	}
	let mut children = Vec::new();
	for entry in fs::read_dir(dir).map_err(MBTilesError::io(dir))? {
		let path = entry.map_err(MBTilesError::io(dir))?.path();
		if path.is_dir() != directories {
			continue;
		}
		let name = if directories { path.file_name() } else { path.file_stem() };
		let Some(number) = name.and_then(|n| n.to_str()).and_then(|n| n.parse::<u32>().ok()) else {
			log::trace!("ignoring {path:?}");
			continue;
		};
		children.push((number, path));
	}
	children.sort();
	Ok(children)
}

impl TileSource for DirectoryTreeSource {
	fn name(&self) -> &str {
		&self.name
	}

	/// Level directories that contain at least one tile file.
	#[context("listing zoom levels in '{}'", self.name)]
	fn zoom_levels(&self) -> Result<BTreeSet<u8>> {
		let mut levels = BTreeSet::new();
		for (level, _) in numbered_children(&self.root, true)? {
			let Ok(level) = u8::try_from(level) else {
				log::warn!("ignoring level directory {level} in '{}'", self.name);
				continue;
			};
			if level > MAX_LEVEL {
				log::warn!("ignoring level directory {level} in '{}'", self.name);
				continue;
			}
			if !self.entries(level)?.is_empty() {
				levels.insert(level);
			}
		}
		Ok(levels)
	}

	#[context("reading level {level} from '{}'", self.name)]
	fn tiles_at_level(&self, level: u8) -> Result<Vec<Tile>> {
		self.entries(level)?.iter().map(|entry| self.read(entry)).collect()
	}

	fn metadata(&self) -> Result<Metadata> {
		Ok(Metadata::new())
	}

	fn extension_hint(&self) -> Option<&str> {
		self.format_hint.as_deref()
	}
}
