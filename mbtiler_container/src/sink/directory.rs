use super::{SinkOptions, SinkReport, TileSink, decode_tile};
use anyhow::Result;
use mbtiler_core::{MBTilesError, PathPattern, TileCoord, TileFormat};
use mbtiler_derive::context;
use mbtiler_image::{RasterImage, save};
use std::{
	fs,
	path::{Path, PathBuf},
};

/// Writes tiles as loose files below a root directory.
///
/// File paths come from a [`PathPattern`]; missing parent directories are created on the way.
/// A failing write aborts the operation, files written before stay in place.
pub struct DirectoryTreeSink {
	root: PathBuf,
	pattern: PathPattern,
	options: SinkOptions,
	written: u64,
}

impl DirectoryTreeSink {
	#[context("preparing output directory '{}'", root.display())]
	pub fn new(root: &Path, pattern: PathPattern, options: SinkOptions) -> Result<DirectoryTreeSink> {
		fs::create_dir_all(root).map_err(MBTilesError::io(root))?;
		Ok(DirectoryTreeSink {
			root: root.to_path_buf(),
			pattern,
			options,
			written: 0,
		})
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn written(&self) -> u64 {
		self.written
	}

	fn write_file(&mut self, path: &Path, data: &[u8]) -> Result<()> {
		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent).map_err(MBTilesError::io(parent))?;
		}
		fs::write(path, data).map_err(MBTilesError::io(path))?;
		self.written += 1;
		Ok(())
	}

	fn save_image(&mut self, path: &Path, image: &RasterImage) -> Result<()> {
		save(path, image)?;
		self.written += 1;
		Ok(())
	}
}

impl TileSink for DirectoryTreeSink {
	#[context("writing tile {coord} below '{}'", self.root.display())]
	fn write_blob(&mut self, coord: &TileCoord, data: &[u8], extension: &str) -> Result<()> {
		if let Some(format) = self.options.format {
			let image = decode_tile(data, self.options.grayscale)?;
			let path = self.pattern.resolve(&self.root, coord, format.extension());
			return self.save_image(&path, &image);
		}

		if self.options.grayscale {
			let image = decode_tile(data, true)?;
			let extension = match TileFormat::from_extension(extension) {
				TileFormat::Png | TileFormat::Jpeg => extension,
				_ => TileFormat::Png.extension(),
			};
			let path = self.pattern.resolve(&self.root, coord, extension);
			return self.save_image(&path, &image);
		}

		let path = self.pattern.resolve(&self.root, coord, extension);
		self.write_file(&path, data)
	}

	#[context("writing generated tile {coord} below '{}'", self.root.display())]
	fn write_image(&mut self, coord: &TileCoord, image: &RasterImage) -> Result<()> {
		let format = self.options.format.unwrap_or(TileFormat::Png);
		let path = self.pattern.resolve(&self.root, coord, format.extension());
		self.save_image(&path, image)
	}

	fn finish(&mut self, _report: &SinkReport) -> Result<u64> {
		log::debug!("wrote {} tiles below {:?}", self.written, self.root);
		Ok(self.written)
	}
}
