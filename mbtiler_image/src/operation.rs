//! Pixel operations used by pyramid synthesis.
//!
//! - [`RasterImageOperation::to_grayscale`]: in place luma conversion, alpha untouched
//! - [`RasterImageOperation::get_resized`]: bilinear resampling through `fast_image_resize`
//! - [`RasterImageOperation::split_quadrants`]: cuts an image into its four quarters
//! - [`mosaic_2x2`]: the inverse of `split_quadrants`
//!
//! Quadrants are always indexed `0 = NW, 1 = NE, 2 = SW, 3 = SE`, the same order as
//! `TileCoord::quadrant`.

use crate::RasterImage;
use anyhow::{Result, ensure};
use fast_image_resize::{FilterType, ResizeAlg, ResizeOptions, Resizer};
use image::{ColorType, DynamicImage, GenericImage, imageops};
use mbtiler_core::MBTilesError;
use mbtiler_derive::context;

pub trait RasterImageOperation {
	/// Replaces R, G and B with `trunc(0.299 R + 0.587 G + 0.114 B)`.
	fn to_grayscale(&mut self);

	/// Resamples to `width × height` with a bilinear filter.
	fn get_resized(&self, width: u32, height: u32) -> Result<RasterImage>;

	/// Cuts the image into four equally sized quarters.
	fn split_quadrants(&self) -> Result<[RasterImage; 4]>;

	/// Fails with `InconsistentTileSize` unless both images have the same dimensions.
	fn ensure_same_size(&self, other: &RasterImage) -> Result<()>;
}

impl RasterImageOperation for RasterImage {
	fn to_grayscale(&mut self) {
		for pixel in self.pixels_mut() {
			let [r, g, b, _] = pixel.0;
			let gray = (0.299 * f64::from(r) + 0.587 * f64::from(g) + 0.114 * f64::from(b)) as u8;
			pixel.0[0] = gray;
			pixel.0[1] = gray;
			pixel.0[2] = gray;
		}
	}

	#[context("resizing {}x{} image to {width}x{height}", self.width(), self.height())]
	fn get_resized(&self, width: u32, height: u32) -> Result<RasterImage> {
		ensure!(width > 0 && height > 0, "target size must not be empty");
		ensure!(self.width() > 0 && self.height() > 0, "source image is empty");

		let source = DynamicImage::ImageRgba8(self.clone());
		let mut target = DynamicImage::new(width, height, ColorType::Rgba8);
		Resizer::new().resize(
			&source,
			&mut target,
			&ResizeOptions::default().resize_alg(ResizeAlg::Convolution(FilterType::Bilinear)),
		)?;
		Ok(target.into_rgba8())
	}

	#[context("splitting {}x{} image into quadrants", self.width(), self.height())]
	fn split_quadrants(&self) -> Result<[RasterImage; 4]> {
		let (width, height) = self.dimensions();
		ensure!(
			width % 2 == 0 && height % 2 == 0,
			MBTilesError::InconsistentTileSize(format!("{width}x{height} can not be split into equal quadrants"))
		);
		let (w, h) = (width / 2, height / 2);
		let quadrant = |index: u32| imageops::crop_imm(self, (index % 2) * w, (index / 2) * h, w, h).to_image();
		Ok([quadrant(0), quadrant(1), quadrant(2), quadrant(3)])
	}

	fn ensure_same_size(&self, other: &RasterImage) -> Result<()> {
		ensure!(
			self.dimensions() == other.dimensions(),
			MBTilesError::InconsistentTileSize(format!(
				"{}x{} vs {}x{}",
				self.width(),
				self.height(),
				other.width(),
				other.height()
			))
		);
		Ok(())
	}
}

/// Places four equally sized children on a canvas twice as wide and high.
///
/// Child `i` lands at `((i % 2) * w, (i / 2) * h)`.
pub fn mosaic_2x2(children: [&RasterImage; 4]) -> Result<RasterImage> {
	let (w, h) = children[0].dimensions();
	for child in &children[1..] {
		children[0].ensure_same_size(child)?;
	}

	let mut canvas = RasterImage::new(w * 2, h * 2);
	for (index, child) in (0u32..).zip(children) {
		canvas.copy_from(child, (index % 2) * w, (index / 2) * h)?;
	}
	Ok(canvas)
}
