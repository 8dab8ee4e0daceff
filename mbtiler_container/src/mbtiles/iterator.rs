//! Lazy iteration over every tile of an archive.
//!
//! Tiles are fetched in batches with keyset pagination on the unique index
//! `(zoom_level, tile_column, tile_row)`. Between two batches the iterator holds no connection, so
//! the store stays usable while an iteration is paused.

use super::{QueryResultExt, TileStore};
use anyhow::Result;
use mbtiler_core::{Tile, checked_index, checked_level};
use r2d2_sqlite::rusqlite::{ToSql, params};
use std::collections::VecDeque;

const BATCH_SIZE: i64 = 256;

struct Row {
	zoom: i64,
	column: i64,
	row: i64,
	data: Vec<u8>,
}

impl Row {
	fn key(&self) -> (i64, i64, i64) {
		(self.zoom, self.column, self.row)
	}

	fn into_tile(self, extension: Option<&str>) -> Result<Tile> {
		Tile::from_tms(
			checked_level(self.zoom)?,
			checked_index(self.column, "tile_column")?,
			checked_index(self.row, "tile_row")?,
			self.data,
			extension,
		)
	}
}

/// Yields `Result<Tile>`; the first error is also the last item.
pub struct TileIterator<'a> {
	store: &'a TileStore,
	buffer: VecDeque<Row>,
	cursor: Option<(i64, i64, i64)>,
	exhausted: bool,
	failed: bool,
}

impl<'a> TileIterator<'a> {
	pub(crate) fn new(store: &'a TileStore) -> TileIterator<'a> {
		TileIterator {
			store,
			buffer: VecDeque::new(),
			cursor: None,
			exhausted: false,
			failed: false,
		}
	}

	fn fetch(&mut self) -> Result<()> {
		let conn = self.store.connection()?;
		let rows = match self.cursor {
			None => query(
				&conn,
				"SELECT zoom_level, tile_column, tile_row, tile_data FROM tiles ORDER BY zoom_level, tile_column, tile_row LIMIT ?1",
				params![BATCH_SIZE],
			)?,
			Some((zoom, column, row)) => query(
				&conn,
				"SELECT zoom_level, tile_column, tile_row, tile_data FROM tiles WHERE (zoom_level, tile_column, tile_row) > (?1, ?2, ?3) ORDER BY zoom_level, tile_column, tile_row LIMIT ?4",
				params![zoom, column, row, BATCH_SIZE],
			)?,
		};

		if (rows.len() as i64) < BATCH_SIZE {
			self.exhausted = true;
		}
		if let Some(last) = rows.last() {
			self.cursor = Some(last.key());
		}
		self.buffer.extend(rows);
		Ok(())
	}
}

fn query(conn: &super::store::Connection, sql: &str, args: &[&dyn ToSql]) -> Result<Vec<Row>> {
	log::trace!("SQL: {sql}");
	let mut stmt = conn.prepare_cached(sql).or_query()?;
	let rows = stmt
		.query_map(args, |row| {
			Ok(Row {
				zoom: row.get(0)?,
				column: row.get(1)?,
				row: row.get(2)?,
				data: row.get::<_, Option<Vec<u8>>>(3)?.unwrap_or_default(),
			})
		})
		.or_query()?
		.collect::<Result<Vec<_>, _>>()
		.or_query()?;
	Ok(rows)
}

impl Iterator for TileIterator<'_> {
	type Item = Result<Tile>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.failed {
			return None;
		}
		if self.buffer.is_empty() && !self.exhausted {
			if let Err(err) = self.fetch() {
				self.failed = true;
				return Some(Err(err));
			}
		}
		let tile = self.buffer.pop_front()?.into_tile(self.store.extension());
		if tile.is_err() {
			self.failed = true;
		}
		Some(tile)
	}
}
