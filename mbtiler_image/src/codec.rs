//! Conversion between compressed tile payloads and [`RasterImage`]s.
//!
//! Decoding always produces RGBA, whatever the channel layout of the source. Encoding goes
//! through the `image` crate's encoders:
//!
//! - PNG keeps the alpha channel
//! - JPEG drops it and uses [`JPEG_QUALITY`]
//! - WebP is written lossless
//!
//! All failures are raised as [`MBTilesError::Decode`] or [`MBTilesError::Encode`].

use crate::RasterImage;
use anyhow::{Result, bail};
use image::{
	DynamicImage, ExtendedColorType, ImageEncoder,
	codecs::{jpeg::JpegEncoder, png::PngEncoder, webp::WebPEncoder},
};
use mbtiler_core::{MBTilesError, TileFormat};
use mbtiler_derive::context;
use std::{
	fs,
	path::{Path, PathBuf},
};

/// Quality used for every JPEG this crate writes.
pub const JPEG_QUALITY: u8 = 90;

/// Decodes PNG, JPEG or WebP bytes into RGBA.
#[context("decoding image ({} bytes)", bytes.len())]
pub fn decode(bytes: &[u8]) -> Result<RasterImage> {
	if bytes.is_empty() {
		bail!(MBTilesError::decode("empty payload"));
	}
	let image = image::load_from_memory(bytes).map_err(MBTilesError::decode)?;
	Ok(image.into_rgba8())
}

#[context("encoding {}x{} image as PNG", image.width(), image.height())]
pub fn encode_png(image: &RasterImage) -> Result<Vec<u8>> {
	let mut buffer = Vec::new();
	PngEncoder::new(&mut buffer)
		.write_image(image.as_raw(), image.width(), image.height(), ExtendedColorType::Rgba8)
		.map_err(MBTilesError::encode)?;
	Ok(buffer)
}

/// Encodes as JPEG. The alpha channel is dropped.
#[context("encoding {}x{} image as JPEG (q={quality})", image.width(), image.height())]
pub fn encode_jpeg(image: &RasterImage, quality: u8) -> Result<Vec<u8>> {
	if !(1..=100).contains(&quality) {
		bail!(MBTilesError::encode(format!("JPEG quality must be in 1..=100, got {quality}")));
	}
	let rgb = DynamicImage::ImageRgba8(image.clone()).into_rgb8();
	let mut buffer = Vec::new();
	JpegEncoder::new_with_quality(&mut buffer, quality)
		.write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
		.map_err(MBTilesError::encode)?;
	Ok(buffer)
}

#[context("encoding {}x{} image as lossless WebP", image.width(), image.height())]
fn encode_webp(image: &RasterImage) -> Result<Vec<u8>> {
	let mut buffer = Vec::new();
	WebPEncoder::new_lossless(&mut buffer)
		.write_image(image.as_raw(), image.width(), image.height(), ExtendedColorType::Rgba8)
		.map_err(MBTilesError::encode)?;
	Ok(buffer)
}

/// Encodes with the codec of `format`. `TileFormat::Unknown` has no codec and fails.
pub fn encode(image: &RasterImage, format: TileFormat) -> Result<Vec<u8>> {
	match format {
		TileFormat::Png => encode_png(image),
		TileFormat::Jpeg => encode_jpeg(image, JPEG_QUALITY),
		TileFormat::WebP => encode_webp(image),
		TileFormat::Unknown => bail!(MBTilesError::encode("no image codec for binary tiles")),
	}
}

/// Writes `image` to `path`, choosing the codec by extension.
///
/// `png` and `jpg`/`jpeg` are honoured. Any other or missing extension is written as PNG with the
/// extension replaced by `.png`. Parent directories are created. Returns the path actually written.
#[context("saving image to '{}'", path.display())]
pub fn save(path: &Path, image: &RasterImage) -> Result<PathBuf> {
	let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
	let (bytes, target) = match TileFormat::from_extension(extension) {
		TileFormat::Jpeg => (encode_jpeg(image, JPEG_QUALITY)?, path.to_path_buf()),
		TileFormat::Png => (encode_png(image)?, path.to_path_buf()),
		_ => (encode_png(image)?, path.with_extension("png")),
	};
	if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
		fs::create_dir_all(parent).map_err(MBTilesError::io(parent))?;
	}
	fs::write(&target, bytes).map_err(MBTilesError::io(&target))?;
	log::trace!("saved {}x{} image to {target:?}", image.width(), image.height());
	Ok(target)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{new_solid, new_test_rgba};
	use assert_fs::TempDir;
	use image::Rgba;
	use mbtiler_core::error_kind;
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	#[test]
	fn png_round_trip_is_lossless() {
		let image = new_test_rgba(64, 32);
		let bytes = encode_png(&image).unwrap();
		assert_eq!(TileFormat::sniff(&bytes), TileFormat::Png);
		assert_eq!(decode(&bytes).unwrap(), image);
	}

	#[test]
	fn jpeg_drops_alpha() {
		let image = new_solid(16, 16, [200, 100, 50, 10]);
		let bytes = encode_jpeg(&image, JPEG_QUALITY).unwrap();
		assert_eq!(TileFormat::sniff(&bytes), TileFormat::Jpeg);
		let decoded = decode(&bytes).unwrap();
		assert_eq!(decoded.dimensions(), (16, 16));
		let Rgba([r, g, b, a]) = *decoded.get_pixel(8, 8);
		assert_eq!(a, 255);
		assert!(r.abs_diff(200) <= 3 && g.abs_diff(100) <= 3 && b.abs_diff(50) <= 3);
	}

	#[test]
	fn webp_is_lossless() {
		let image = new_test_rgba(8, 8);
		let bytes = encode(&image, TileFormat::WebP).unwrap();
		assert_eq!(TileFormat::sniff(&bytes), TileFormat::WebP);
		assert_eq!(decode(&bytes).unwrap(), image);
	}

	#[test]
	fn grey_sources_become_rgba() {
		let grey = image::GrayImage::from_pixel(4, 4, image::Luma([77]));
		let mut bytes = Vec::new();
		PngEncoder::new(&mut bytes)
			.write_image(grey.as_raw(), 4, 4, ExtendedColorType::L8)
			.unwrap();
		let decoded = decode(&bytes).unwrap();
		assert_eq!(decoded.as_raw().len(), 4 * 4 * 4);
		assert_eq!(*decoded.get_pixel(0, 0), Rgba([77, 77, 77, 255]));
	}

	#[rstest]
	#[case::empty(&[])]
	#[case::garbage(b"definitely not an image")]
	#[case::truncated_png(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0])]
	fn decode_errors(#[case] bytes: &[u8]) {
		let err = decode(bytes).unwrap_err();
		assert!(matches!(error_kind(&err), Some(MBTilesError::Decode(_))), "{err:?}");
	}

	#[rstest]
	#[case(0)]
	#[case(101)]
	#[case(255)]
	fn jpeg_quality_bounds(#[case] quality: u8) {
		let err = encode_jpeg(&new_solid(2, 2, [0, 0, 0, 255]), quality).unwrap_err();
		assert!(matches!(error_kind(&err), Some(MBTilesError::Encode(_))));
	}

	#[rstest]
	#[case(1)]
	#[case(100)]
	fn jpeg_quality_extremes_encode(#[case] quality: u8) {
		let data = encode_jpeg(&new_solid(2, 2, [10, 20, 30, 255]), quality).unwrap();
		assert_eq!(TileFormat::sniff(&data), TileFormat::Jpeg);
	}

	#[test]
	fn binary_has_no_codec() {
		assert!(encode(&new_solid(1, 1, [0; 4]), TileFormat::Unknown).is_err());
	}

	#[rstest]
	#[case::png("a/b/tile.png", "a/b/tile.png", TileFormat::Png)]
	#[case::jpg("tile.jpg", "tile.jpg", TileFormat::Jpeg)]
	#[case::jpeg("tile.JPEG", "tile.JPEG", TileFormat::Jpeg)]
	#[case::other("x/tile.bin", "x/tile.png", TileFormat::Png)]
	#[case::none("x/tile", "x/tile.png", TileFormat::Png)]
	fn save_picks_codec(#[case] name: &str, #[case] written: &str, #[case] format: TileFormat) {
		let dir = TempDir::new().unwrap();
		let path = save(&dir.path().join(name), &new_solid(4, 4, [10, 20, 30, 255])).unwrap();
		assert_eq!(path, dir.path().join(written));
		assert_eq!(TileFormat::sniff(&fs::read(&path).unwrap()), format);
	}
}
