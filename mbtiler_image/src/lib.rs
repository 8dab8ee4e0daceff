//! Raster tile images for the mbtiler crates.
//!
//! Every image is an [`RasterImage`], an 8 bit RGBA buffer whose length is always
//! `width * height * 4`. The crate provides:
//!
//! - [`codec`]: decoding compressed tiles, encoding PNG/JPEG/WebP and saving to files
//! - [`RasterImageOperation`]: grayscale, resizing and quadrant splitting
//! - [`mosaic_2x2`]: joining four equally sized tiles into one canvas

pub mod codec;
mod operation;
pub use operation::*;

#[cfg(any(test, feature = "test"))]
pub use test::*;

/// RGBA image with 8 bits per channel.
pub type RasterImage = image::RgbaImage;

pub use codec::{JPEG_QUALITY, decode, encode, encode_jpeg, encode_png, save};
