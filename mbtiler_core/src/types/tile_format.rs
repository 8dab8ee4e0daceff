//! The closed set of tile payload formats and the byte sniffer that produces it.
//!
//! A payload is classified once, by [`TileFormat::sniff`] or from the archive's `format`
//! metadata, and everything downstream matches on the enum instead of comparing strings.
//!
//! ```
//! use mbtiler_core::TileFormat;
//!
//! let png = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
//! assert_eq!(TileFormat::sniff(&png), TileFormat::Png);
//! assert_eq!(TileFormat::sniff(b"hello"), TileFormat::Unknown);
//! assert_eq!(TileFormat::from_extension(" .JPEG"), TileFormat::Jpeg);
//! assert_eq!(TileFormat::Jpeg.extension(), "jpg");
//! ```

use std::fmt::{self, Display};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TileFormat {
	Png,
	Jpeg,
	WebP,
	Unknown,
}

impl TileFormat {
	/// Classifies a payload by its magic number.
	pub fn sniff(bytes: &[u8]) -> TileFormat {
		if bytes.len() >= 8 && bytes.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
			TileFormat::Png
		} else if bytes.len() >= 8 && bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
			TileFormat::Jpeg
		} else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
			TileFormat::WebP
		} else {
			TileFormat::Unknown
		}
	}

	/// Maps an extension or `format` metadata value onto a format. Anything unrecognised is `Unknown`.
	pub fn from_extension(value: &str) -> TileFormat {
		match normalize_extension(value).as_deref() {
			Some("png") => TileFormat::Png,
			Some("jpg") => TileFormat::Jpeg,
			Some("webp") => TileFormat::WebP,
			_ => TileFormat::Unknown,
		}
	}

	/// Canonical file extension without the dot.
	pub fn extension(&self) -> &'static str {
		match self {
			TileFormat::Png => "png",
			TileFormat::Jpeg => "jpg",
			TileFormat::WebP => "webp",
			TileFormat::Unknown => "bin",
		}
	}

	pub fn mime_type(&self) -> &'static str {
		match self {
			TileFormat::Png => "image/png",
			TileFormat::Jpeg => "image/jpeg",
			TileFormat::WebP => "image/webp",
			TileFormat::Unknown => "application/octet-stream",
		}
	}

	pub fn is_image(&self) -> bool {
		!matches!(self, TileFormat::Unknown)
	}
}

impl Display for TileFormat {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.extension())
	}
}

/// Normalises an extension token: trimmed, leading dot removed, lower case, `jpeg` becomes `jpg`.
///
/// Returns `None` for tokens that are empty after trimming.
pub fn normalize_extension(value: &str) -> Option<String> {
	let value = value.trim();
	let value = value.strip_prefix('.').unwrap_or(value).to_lowercase();
	match value.as_str() {
		"" => None,
		"jpeg" => Some(String::from("jpg")),
		_ => Some(value),
	}
}
