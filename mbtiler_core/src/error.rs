//! Error kinds raised by the mbtiler crates.
//!
//! All public functions return `anyhow::Result`. Structural failures are raised as an
//! [`MBTilesError`] so callers can classify them with `err.downcast_ref::<MBTilesError>()`,
//! no matter how many context layers were added on the way up.

use std::{fmt::Display, io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MBTilesError {
	/// The archive could not be opened: missing file, not a database or no `tiles` table.
	#[error("cannot open MBTiles '{path}': {reason}")]
	Open { path: PathBuf, reason: String },

	/// A statement failed, including failures in the middle of an iteration.
	#[error("query failed: {0}")]
	Query(String),

	#[error("cannot decode image: {0}")]
	Decode(String),

	#[error("cannot encode image: {0}")]
	Encode(String),

	#[error("inconsistent tile sizes: {0}")]
	InconsistentTileSize(String),

	/// No neighbouring level exists to derive the level from.
	#[error("zoom level {0} can not be derived from any neighbouring level")]
	UnresolvableZoomLevel(u8),

	#[error("invalid pattern '{pattern}': {reason}")]
	InvalidPattern { pattern: String, reason: String },

	#[error("coordinate overflow: {0}")]
	CoordinateOverflow(String),

	#[error("metadata key '{0}' already exists")]
	KeyExists(String),

	#[error("invalid zoom level token '{token}': {reason}")]
	InvalidLevelSpec { token: String, reason: String },

	#[error("archive '{0}' contains no tiles")]
	NoTiles(String),

	#[error("i/o error at '{path}': {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
}

impl MBTilesError {
	pub fn query(err: impl Display) -> Self {
		MBTilesError::Query(err.to_string())
	}

	pub fn decode(err: impl Display) -> Self {
		MBTilesError::Decode(err.to_string())
	}

	pub fn encode(err: impl Display) -> Self {
		MBTilesError::Encode(err.to_string())
	}

	pub fn overflow(err: impl Display) -> Self {
		MBTilesError::CoordinateOverflow(err.to_string())
	}

	/// Returns a closure mapping an `io::Error` to [`MBTilesError::Io`] for the given path.
	pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(io::Error) -> Self {
		let path = path.into();
		move |source| MBTilesError::Io { path, source }
	}
}

/// Finds the first [`MBTilesError`] in the chain of an `anyhow::Error`.
pub fn error_kind(err: &anyhow::Error) -> Option<&MBTilesError> {
	err.chain().find_map(|e| e.downcast_ref::<MBTilesError>())
}
