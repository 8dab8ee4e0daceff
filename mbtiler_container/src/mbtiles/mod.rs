//! The MBTiles container.
//!
//! An archive is a SQLite database with two tables:
//!
//! ```sql
//! CREATE TABLE tiles (zoom_level INTEGER, tile_column INTEGER, tile_row INTEGER, tile_data BLOB);
//! CREATE UNIQUE INDEX tile_index ON tiles (zoom_level, tile_column, tile_row);
//! CREATE TABLE metadata (name TEXT PRIMARY KEY, value TEXT);
//! ```
//!
//! `tile_row` is stored in TMS order (`2^z - 1 - y`), everything above the SQL layer uses XYZ rows.

mod batch;
pub use batch::*;

mod iterator;
pub use iterator::*;

mod store;
pub use store::*;

use anyhow::Result;
use mbtiler_core::MBTilesError;
use std::fmt::Display;

/// Maps SQLite and pool failures to [`MBTilesError::Query`].
pub(crate) trait QueryResultExt<T> {
	fn or_query(self) -> Result<T>;
}

impl<T, E: Display> QueryResultExt<T> for std::result::Result<T, E> {
	fn or_query(self) -> Result<T> {
		self.map_err(|err| MBTilesError::query(err).into())
	}
}
