//! Destinations for tiles produced by `extract` and `convert`.
//!
//! Both sinks receive two kinds of tiles:
//! - existing tiles as raw bytes ([`TileSink::write_blob`]), which are stored unchanged unless a
//!   grayscale conversion or an output format forces a re-encode
//! - generated tiles as images ([`TileSink::write_image`]), which are always encoded

mod directory;
pub use directory::*;

mod mbtiles;
pub use mbtiles::*;

use anyhow::Result;
use mbtiler_core::{Metadata, TileCoord, TileFormat};
use mbtiler_image::{RasterImage, RasterImageOperation, decode};

/// How sinks treat tile payloads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SinkOptions {
	/// Convert existing tiles to gray as well. Generated tiles arrive already converted.
	pub grayscale: bool,
	/// Re-encode every tile into this format.
	pub format: Option<TileFormat>,
}

/// What the producer knows when it closes a sink.
#[derive(Clone, Copy, Debug)]
pub struct SinkReport<'a> {
	/// The levels that were written.
	pub levels: &'a [u8],
	/// Metadata of the source.
	pub metadata: &'a Metadata,
}

pub trait TileSink {
	/// Stores an existing tile.
	fn write_blob(&mut self, coord: &TileCoord, data: &[u8], extension: &str) -> Result<()>;

	/// Stores a generated tile.
	fn write_image(&mut self, coord: &TileCoord, image: &RasterImage) -> Result<()>;

	/// Completes the output and returns the number of tiles written.
	fn finish(&mut self, report: &SinkReport) -> Result<u64>;
}

fn decode_tile(data: &[u8], grayscale: bool) -> Result<RasterImage> {
	let mut image = decode(data)?;
	if grayscale {
		image.to_grayscale();
	}
	Ok(image)
}
