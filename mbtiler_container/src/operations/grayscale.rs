use anyhow::Result;
use mbtiler_core::{MBTilesError, TileFormat, progress::*};
use mbtiler_derive::context;
use mbtiler_image::{RasterImageOperation, decode, save};
use std::{
	fs,
	path::{Path, PathBuf},
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GrayscaleReport {
	pub converted: u64,
	/// Image files that could not be read or decoded.
	pub failed: u64,
}

/// Converts every PNG and JPEG file below `input` to grayscale and writes it to the same relative
/// path below `output`.
///
/// Other files are ignored. A file that fails to decode is logged and counted, the rest of the tree
/// is still converted.
#[context("converting '{}' to grayscale in '{}'", input.display(), output.display())]
pub fn grayscale_tree(input: &Path, output: &Path, progress: &mut dyn ProgressSink) -> Result<GrayscaleReport> {
	let mut files = Vec::new();
	collect_images(input, &mut files)?;
	files.sort();
	log::debug!("found {} images below {input:?}", files.len());

	let mut report = GrayscaleReport::default();
	let mut counter = ProgressCounter::new("converting images", Some(files.len() as u64), progress);
	for file in files {
		let relative = file.strip_prefix(input).unwrap_or(&file);
		match convert_file(&file, &output.join(relative)) {
			Ok(()) => report.converted += 1,
			Err(err) => {
				log::warn!("skipping {file:?}: {err:#}");
				report.failed += 1;
			}
		}
		counter.inc(1);
	}
	counter.finish();
	Ok(report)
}

fn convert_file(input: &Path, output: &Path) -> Result<()> {
	let bytes = fs::read(input).map_err(MBTilesError::io(input))?;
	let mut image = decode(&bytes)?;
	image.to_grayscale();
	save(output, &image)?;
	Ok(())
}

fn collect_images(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
	for entry in fs::read_dir(dir).map_err(MBTilesError::io(dir))? {
		let path = entry.map_err(MBTilesError::io(dir))?.path();
		if path.is_dir() {
			collect_images(&path, files)?;
		} else if is_raster_file(&path) {
			files.push(path);
		}
	}
	Ok(())
}

fn is_raster_file(path: &Path) -> bool {
	let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
	matches!(TileFormat::from_extension(extension), TileFormat::Png | TileFormat::Jpeg)
}
