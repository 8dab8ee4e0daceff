use super::{QueryResultExt, store::Connection};
use anyhow::Result;
use mbtiler_core::TileCoord;
use r2d2_sqlite::rusqlite::params;

/// An open `BEGIN IMMEDIATE` transaction for writing tiles.
///
/// The batch owns the archive's connection until [`commit`](TileBatch::commit). Dropping it without
/// committing rolls every insert back.
pub struct TileBatch {
	conn: Connection,
	open: bool,
	written: u64,
}

impl TileBatch {
	pub(crate) fn begin(conn: Connection) -> Result<TileBatch> {
		log::trace!("SQL: BEGIN IMMEDIATE");
		conn.execute_batch("BEGIN IMMEDIATE").or_query()?;
		Ok(TileBatch {
			conn,
			open: true,
			written: 0,
		})
	}

	/// Inserts a tile, replacing whatever is stored at the same address.
	pub fn insert(&mut self, coord: &TileCoord, data: &[u8]) -> Result<()> {
		let mut stmt = self
			.conn
			.prepare_cached("INSERT OR REPLACE INTO tiles (zoom_level, tile_column, tile_row, tile_data) VALUES (?1, ?2, ?3, ?4)")
			.or_query()?;
		stmt.execute(params![coord.level, coord.x, coord.tms_row(), data])
			.or_query()?;
		self.written += 1;
		Ok(())
	}

	pub fn written(&self) -> u64 {
		self.written
	}

	/// Makes all inserts visible and returns their number.
	pub fn commit(mut self) -> Result<u64> {
		log::trace!("SQL: COMMIT");
		self.conn.execute_batch("COMMIT").or_query()?;
		self.open = false;
		Ok(self.written)
	}
}

impl Drop for TileBatch {
	fn drop(&mut self) {
		if self.open {
			log::debug!("rolling back {} uncommitted tiles", self.written);
			if let Err(err) = self.conn.execute_batch("ROLLBACK") {
				log::warn!("rollback failed: {err}");
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use crate::{TileStore, full_level, make_test_store};
	use assert_fs::TempDir;
	use mbtiler_core::TileCoord;

	#[test]
	fn commit_makes_tiles_visible() {
		let dir = TempDir::new().unwrap();
		let store = TileStore::create(&dir.path().join("a.mbtiles")).unwrap();
		let mut batch = store.begin_batch().unwrap();
		for coord in full_level(1) {
			batch.insert(&coord, b"tile").unwrap();
		}
		assert_eq!(batch.written(), 4);
		assert_eq!(batch.commit().unwrap(), 4);
		assert_eq!(store.tile_count().unwrap(), 4);
	}

	#[test]
	fn dropping_rolls_back() {
		let dir = TempDir::new().unwrap();
		let store = make_test_store(&dir.path().join("a.mbtiles"), &full_level(0)).unwrap();
		let mut batch = store.begin_batch().unwrap();
		batch.insert(&TileCoord::new(1, 1, 1).unwrap(), b"tile").unwrap();
		drop(batch);
		assert_eq!(store.tile_count().unwrap(), 1);
	}

	#[test]
	fn insert_replaces() {
		let dir = TempDir::new().unwrap();
		let store = make_test_store(&dir.path().join("a.mbtiles"), &full_level(0)).unwrap();
		let mut batch = store.begin_batch().unwrap();
		batch.insert(&TileCoord::new(0, 0, 0).unwrap(), b"new").unwrap();
		batch.commit().unwrap();
		assert_eq!(store.tile_count().unwrap(), 1);
		assert_eq!(store.read_tile(0, 0, 0).unwrap().unwrap().data, b"new");
	}
}
