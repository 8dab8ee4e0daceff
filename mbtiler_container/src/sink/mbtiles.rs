use super::{SinkOptions, SinkReport, TileSink, decode_tile};
use crate::{TileBatch, TileStore};
use anyhow::{Context, Result, anyhow};
use mbtiler_core::{TileCoord, TileFormat};
use mbtiler_derive::context;
use mbtiler_image::{RasterImage, encode};
use std::borrow::Cow;

/// Writes tiles into an MBTiles archive inside one transaction.
///
/// Nothing becomes visible before [`finish`](TileSink::finish) commits. If the sink is dropped
/// before, or any insert fails, every tile written so far is rolled back.
pub struct MBTilesSink {
	batch: Option<TileBatch>,
	store: TileStore,
	options: SinkOptions,
	fallback_format: TileFormat,
}

impl MBTilesSink {
	/// Adds the schema to `store` where missing and opens the transaction.
	pub fn new(store: TileStore, options: SinkOptions) -> Result<MBTilesSink> {
		store.ensure_schema().context("preparing MBTiles output")?;
		let batch = store.begin_batch().context("preparing MBTiles output")?;
		Ok(MBTilesSink {
			batch: Some(batch),
			store,
			options,
			fallback_format: TileFormat::Png,
		})
	}

	/// Encoding for generated tiles when neither grayscale nor a format was requested.
	///
	/// Defaults to PNG; set it to the source's format to keep the archive uniform.
	pub fn with_fallback_format(mut self, format: TileFormat) -> Self {
		if format.is_image() {
			self.fallback_format = format;
		}
		self
	}

	pub fn store(&self) -> &TileStore {
		&self.store
	}

	fn reencodes(&self) -> bool {
		self.options.grayscale || self.options.format.is_some()
	}

	fn target_format(&self) -> TileFormat {
		match (self.options.format, self.options.grayscale) {
			(Some(format), _) => format,
			(None, true) => TileFormat::Png,
			(None, false) => self.fallback_format,
		}
	}

	fn insert(&mut self, coord: &TileCoord, data: &[u8]) -> Result<()> {
		self.batch
			.as_mut()
			.ok_or_else(|| anyhow!("the MBTiles output is already finished"))?
			.insert(coord, data)
	}
}

impl TileSink for MBTilesSink {
	#[context("writing tile {coord} to '{}'", self.store.file_name())]
	fn write_blob(&mut self, coord: &TileCoord, data: &[u8], _extension: &str) -> Result<()> {
		let data = if self.reencodes() {
			let image = decode_tile(data, self.options.grayscale)?;
			Cow::Owned(encode(&image, self.target_format())?)
		} else {
			Cow::Borrowed(data)
		};
		self.insert(coord, &data)
	}

	#[context("writing generated tile {coord} to '{}'", self.store.file_name())]
	fn write_image(&mut self, coord: &TileCoord, image: &RasterImage) -> Result<()> {
		let data = encode(image, self.target_format())?;
		self.insert(coord, &data)
	}

	/// Commits the tiles, then copies the source metadata with updated `minzoom` and `maxzoom`.
	/// `format` is only rewritten when every tile was re-encoded.
	#[context("finishing '{}'", self.store.file_name())]
	fn finish(&mut self, report: &SinkReport) -> Result<u64> {
		let batch = self
			.batch
			.take()
			.ok_or_else(|| anyhow!("the MBTiles output is already finished"))?;
		let written = batch.commit()?;
		log::debug!("committed {written} tiles to {}", self.store.file_name());

		let mut metadata = report.metadata.clone();
		if let (Some(min), Some(max)) = (report.levels.iter().min(), report.levels.iter().max()) {
			metadata.insert(String::from("minzoom"), min.to_string());
			metadata.insert(String::from("maxzoom"), max.to_string());
		}
		if self.reencodes() {
			metadata.insert(String::from("format"), self.target_format().extension().to_string());
		}
		self.store.set_metadata(&metadata, true)?;
		Ok(written)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{test_metadata, test_tile};
	use assert_fs::TempDir;
	use mbtiler_core::{Metadata, error_kind};
	use mbtiler_image::{decode, new_solid};
	use pretty_assertions::assert_eq;
	use std::path::Path;

	fn coord(level: u8, x: u32, y: u32) -> TileCoord {
		TileCoord::new(level, x, y).unwrap()
	}

	fn sink(path: &Path, options: SinkOptions) -> MBTilesSink {
		MBTilesSink::new(TileStore::create(path).unwrap(), options).unwrap()
	}

	#[test]
	fn copies_and_generates() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("out.mbtiles");
		let mut sink = sink(&path, SinkOptions::default());

		let c = coord(1, 0, 0);
		sink.write_blob(&c, &test_tile(&c), "png").unwrap();
		sink.write_image(&coord(2, 3, 0), &new_solid(8, 8, [5, 6, 7, 255])).unwrap();
		let report = SinkReport {
			levels: &[2, 1],
			metadata: &test_metadata(),
		};
		assert_eq!(sink.finish(&report).unwrap(), 2);
		drop(sink);

		let store = TileStore::open(&path).unwrap();
		assert_eq!(store.read_tile(1, 0, 0).unwrap().unwrap().data, test_tile(&c));
		let generated = store.read_tile(2, 3, 0).unwrap().unwrap();
		assert_eq!(decode(&generated.data).unwrap().get_pixel(0, 0).0, [5, 6, 7, 255]);

		let metadata = store.metadata().unwrap();
		assert_eq!(metadata["minzoom"], "1");
		assert_eq!(metadata["maxzoom"], "2");
		assert_eq!(metadata["format"], "png");
		assert_eq!(metadata["name"], "test");
	}

	#[test]
	fn nothing_is_visible_before_finish() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("out.mbtiles");
		let mut sink = sink(&path, SinkOptions::default());
		sink.write_blob(&coord(0, 0, 0), b"tile", "bin").unwrap();
		drop(sink);
		assert_eq!(TileStore::open(&path).unwrap().tile_count().unwrap(), 0);
	}

	#[test]
	fn failing_tile_rolls_back() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("out.mbtiles");
		let options = SinkOptions {
			grayscale: true,
			format: None,
		};
		let mut sink = sink(&path, options);
		let c = coord(0, 0, 0);
		sink.write_blob(&c, &test_tile(&c), "png").unwrap();
		let err = sink.write_blob(&coord(1, 0, 0), b"not an image", "png").unwrap_err();
		assert!(error_kind(&err).is_some());
		drop(sink);
		assert_eq!(TileStore::open(&path).unwrap().tile_count().unwrap(), 0);
	}

	#[test]
	fn grayscale_switches_format_to_png() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("out.mbtiles");
		let options = SinkOptions {
			grayscale: true,
			format: None,
		};
		let mut sink = sink(&path, options).with_fallback_format(TileFormat::Jpeg);
		let c = coord(0, 0, 0);
		sink.write_blob(&c, &test_tile(&c), "png").unwrap();
		let mut metadata = test_metadata();
		metadata.insert(String::from("format"), String::from("jpg"));
		let report = SinkReport {
			levels: &[0],
			metadata: &metadata,
		};
		sink.finish(&report).unwrap();

		let store = sink.store();
		assert_eq!(store.metadata_value("format").unwrap().as_deref(), Some("png"));
		let image = decode(&store.read_tile(0, 0, 0).unwrap().unwrap().data).unwrap();
		let [r, g, b, _] = image.get_pixel(0, 0).0;
		assert!(r == g && g == b);
	}

	#[test]
	fn fallback_format_applies_to_generated_tiles() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("out.mbtiles");
		let mut sink = sink(&path, SinkOptions::default()).with_fallback_format(TileFormat::Jpeg);
		sink.write_image(&coord(0, 0, 0), &new_solid(8, 8, [1, 1, 1, 255])).unwrap();
		sink.finish(&SinkReport {
			levels: &[0],
			metadata: &Metadata::new(),
		})
		.unwrap();

		let store = sink.store();
		let tile = store.read_tile(0, 0, 0).unwrap().unwrap();
		assert_eq!(TileFormat::sniff(&tile.data), TileFormat::Jpeg);
		assert_eq!(tile.extension, "jpg");
		assert_eq!(store.metadata_value("format").unwrap(), None);
	}

	#[test]
	fn finishing_twice_fails() {
		let dir = TempDir::new().unwrap();
		let mut sink = sink(&dir.path().join("out.mbtiles"), SinkOptions::default());
		let report = SinkReport {
			levels: &[],
			metadata: &Metadata::new(),
		};
		assert_eq!(sink.finish(&report).unwrap(), 0);
		assert!(sink.finish(&report).is_err());
		assert!(sink.write_image(&coord(0, 0, 0), &new_solid(1, 1, [0; 4])).is_err());
	}
}
