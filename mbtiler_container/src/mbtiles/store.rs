//! Open, query and update one MBTiles archive.
//!
//! A [`TileStore`] owns a connection pool of size one, so there is exactly one SQLite connection per
//! archive and never more than one statement in flight. Methods take the connection for the duration
//! of one statement (or one transaction) and give it back before returning.
//!
//! ## Usage
//! ```rust,no_run
//! use mbtiler_container::TileStore;
//! use std::path::Path;
//!
//! let store = TileStore::open(Path::new("world.mbtiles")).unwrap();
//! for tile in store.iter_tiles() {
//! 	let tile = tile.unwrap();
//! 	println!("{} ({} bytes)", tile.coord(), tile.data.len());
//! }
//! ```

use super::{QueryResultExt, TileBatch, TileIterator};
use crate::TileSource;
use anyhow::{Result, bail};
use mbtiler_core::*;
use mbtiler_derive::context;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::{
	SqliteConnectionManager,
	rusqlite::{OptionalExtension, TransactionBehavior, params},
};
use std::{
	collections::BTreeSet,
	fs,
	path::{Path, PathBuf},
	time::Duration,
};

pub(crate) type Connection = PooledConnection<SqliteConnectionManager>;

const TILES_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS tiles (zoom_level INTEGER, tile_column INTEGER, tile_row INTEGER, tile_data BLOB);
CREATE UNIQUE INDEX IF NOT EXISTS tile_index ON tiles (zoom_level, tile_column, tile_row);";

const METADATA_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS metadata (name TEXT PRIMARY KEY, value TEXT);";

/// Waiting longer than this for the single connection means somebody forgot to give it back.
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TileStore {
	name: String,
	path: PathBuf,
	pool: Pool<SqliteConnectionManager>,
	extension: Option<String>,
	format_hint: Option<String>,
}

/// Archive statistics as served by a tile viewer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreSummary {
	pub tile_count: u64,
	pub min_zoom: Option<u8>,
	pub max_zoom: Option<u8>,
	pub file_name: String,
	pub file_path: PathBuf,
}

/// Extent of one zoom level. Rows are TMS rows, as stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelRange {
	pub level: u8,
	pub x_min: u32,
	pub x_max: u32,
	pub row_min: u32,
	pub row_max: u32,
	pub count: u64,
}

impl LevelRange {
	/// Number of tiles in the rectangle spanned by the extremes.
	pub fn area(&self) -> u64 {
		u64::from(self.x_max - self.x_min + 1) * u64::from(self.row_max - self.row_min + 1)
	}
}

impl TileStore {
	/// Opens an existing archive. The file must exist and contain a `tiles` table.
	#[context("opening MBTiles '{}'", path.display())]
	pub fn open(path: &Path) -> Result<TileStore> {
		log::debug!("open {path:?}");
		let open_error = |reason: String| MBTilesError::Open {
			path: path.to_path_buf(),
			reason,
		};

		if !path.is_file() {
			bail!(open_error(String::from("file does not exist")));
		}

		let mut store = TileStore::connect(path).map_err(|err| open_error(format!("{err:#}")))?;
		match store.has_table("tiles") {
			Ok(true) => {}
			Ok(false) => bail!(open_error(String::from("the database has no 'tiles' table"))),
			Err(err) => bail!(open_error(format!("{err:#}"))),
		}

		store.extension = store.metadata_value("format")?.as_deref().and_then(normalize_extension);
		store.format_hint = match &store.extension {
			Some(extension) => Some(extension.clone()),
			None => store.sniff_first_tile()?,
		};
		log::trace!("{} uses extension {:?}, hint {:?}", store.name, store.extension, store.format_hint);
		Ok(store)
	}

	/// Creates an empty archive, replacing any existing file.
	#[context("creating MBTiles '{}'", path.display())]
	pub fn create(path: &Path) -> Result<TileStore> {
		log::debug!("create {path:?}");
		if path.exists() {
			fs::remove_file(path).map_err(MBTilesError::io(path))?;
		}
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(MBTilesError::io(parent))?;
		}
		let store = TileStore::connect(path)?;
		store.ensure_schema()?;
		Ok(store)
	}

	/// Opens `path` and adds missing tables, or creates a new archive if there is no file yet.
	pub fn open_or_create(path: &Path) -> Result<TileStore> {
		if path.exists() {
			let store = TileStore::open(path)?;
			store.ensure_schema()?;
			Ok(store)
		} else {
			TileStore::create(path)
		}
	}

	fn connect(path: &Path) -> Result<TileStore> {
		let manager = SqliteConnectionManager::file(path);
		let pool = Pool::builder()
			.max_size(1)
			.connection_timeout(CONNECTION_TIMEOUT)
			.build(manager)?;
		Ok(TileStore {
			name: path
				.file_name()
				.map_or_else(|| path.display().to_string(), |name| name.to_string_lossy().into_owned()),
			path: path.to_path_buf(),
			pool,
			extension: None,
			format_hint: None,
		})
	}

	/// The image format of the lowest stored tile, for archives that do not declare one.
	fn sniff_first_tile(&self) -> Result<Option<String>> {
		let conn = self.connection()?;
		let data = conn
			.query_row(
				"SELECT tile_data FROM tiles ORDER BY zoom_level, tile_column, tile_row LIMIT 1",
				[],
				|row| row.get::<_, Option<Vec<u8>>>(0),
			)
			.optional()
			.or_query()?
			.flatten();
		let format = data.map_or(TileFormat::Unknown, |data| TileFormat::sniff(&data));
		Ok(format.is_image().then(|| format.extension().to_string()))
	}

	/// Takes the archive's only connection. It must be dropped before the next call on this store.
	pub(crate) fn connection(&self) -> Result<Connection> {
		self.pool.get().or_query()
	}

	/// Creates the `tiles` table, its unique index and the `metadata` table where missing.
	#[context("creating schema in '{}'", self.name)]
	pub fn ensure_schema(&self) -> Result<()> {
		log::trace!("SQL: {TILES_SCHEMA} {METADATA_SCHEMA}");
		let conn = self.connection()?;
		conn.execute_batch(TILES_SCHEMA).or_query()?;
		conn.execute_batch(METADATA_SCHEMA).or_query()?;
		Ok(())
	}

	fn has_table(&self, table: &str) -> Result<bool> {
		let conn = self.connection()?;
		conn.query_row(
			"SELECT COUNT(*) FROM sqlite_master WHERE type IN ('table', 'view') AND name = ?1",
			[table],
			|row| row.get::<_, i64>(0),
		)
		.map(|count| count > 0)
		.or_query()
	}

	/// The file name, used in messages.
	pub fn file_name(&self) -> &str {
		&self.name
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// The normalized `format` metadata as read when the archive was opened.
	pub fn extension(&self) -> Option<&str> {
		self.extension.as_deref()
	}

	/// The declared format, or the sniffed format of the first tile if none is declared.
	pub fn format_hint(&self) -> Option<&str> {
		self.format_hint.as_deref()
	}

	/// All metadata entries ordered by key. An archive without a metadata table has none.
	#[context("reading metadata of '{}'", self.name)]
	pub fn metadata(&self) -> Result<Metadata> {
		if !self.has_table("metadata")? {
			return Ok(Metadata::new());
		}
		let sql = "SELECT name, value FROM metadata ORDER BY name";
		log::trace!("SQL: {sql}");
		let conn = self.connection()?;
		let mut stmt = conn.prepare(sql).or_query()?;
		let entries = stmt
			.query_map([], |row| {
				Ok((row.get::<_, String>(0)?, row.get::<_, Option<String>>(1)?.unwrap_or_default()))
			})
			.or_query()?
			.collect::<Result<Metadata, _>>()
			.or_query()?;
		Ok(entries)
	}

	pub fn metadata_keys(&self) -> Result<Vec<String>> {
		Ok(self.metadata()?.into_keys().collect())
	}

	/// The value stored for `key`. A `NULL` value reads as an empty string.
	#[context("reading metadata key '{key}' of '{}'", self.name)]
	pub fn metadata_value(&self, key: &str) -> Result<Option<String>> {
		if !self.has_table("metadata")? {
			return Ok(None);
		}
		let conn = self.connection()?;
		let value = conn
			.query_row("SELECT value FROM metadata WHERE name = ?1", [key], |row| {
				row.get::<_, Option<String>>(0)
			})
			.optional()
			.or_query()?;
		Ok(value.map(Option::unwrap_or_default))
	}

	/// Writes all `entries` in one `BEGIN IMMEDIATE` transaction.
	///
	/// Without `overwrite` a single existing key fails the whole call with [`MBTilesError::KeyExists`]
	/// and nothing is written. The metadata table is created if it is missing.
	#[context("writing {} metadata entries to '{}'", entries.len(), self.name)]
	pub fn set_metadata(&self, entries: &Metadata, overwrite: bool) -> Result<()> {
		if entries.is_empty() {
			return Ok(());
		}
		let mut conn = self.connection()?;
		let transaction = conn.transaction_with_behavior(TransactionBehavior::Immediate).or_query()?;
		transaction.execute_batch(METADATA_SCHEMA).or_query()?;
		for (name, value) in entries {
			let exists = transaction
				.query_row("SELECT COUNT(*) FROM metadata WHERE name = ?1", [name], |row| {
					row.get::<_, i64>(0)
				})
				.or_query()?
				> 0;
			if exists {
				if !overwrite {
					bail!(MBTilesError::KeyExists(name.clone()));
				}
				transaction
					.execute("DELETE FROM metadata WHERE name = ?1", [name])
					.or_query()?;
			}
			transaction
				.execute("INSERT INTO metadata (name, value) VALUES (?1, ?2)", params![name, value])
				.or_query()?;
		}
		transaction.commit().or_query()?;
		Ok(())
	}

	#[context("reading zoom levels of '{}'", self.name)]
	pub fn zoom_levels(&self) -> Result<BTreeSet<u8>> {
		let sql = "SELECT DISTINCT zoom_level FROM tiles ORDER BY zoom_level";
		log::trace!("SQL: {sql}");
		let conn = self.connection()?;
		let mut stmt = conn.prepare(sql).or_query()?;
		let levels = stmt
			.query_map([], |row| row.get::<_, i64>(0))
			.or_query()?
			.collect::<Result<Vec<_>, _>>()
			.or_query()?;
		levels.into_iter().map(checked_level).collect()
	}

	/// Iterates over every tile, ordered by level, column and TMS row.
	///
	/// The iterator is lazy and keeps no connection between its batches. Calling this again starts over.
	pub fn iter_tiles(&self) -> TileIterator<'_> {
		TileIterator::new(self)
	}

	/// Looks up one tile by its XYZ address.
	#[context("reading tile {zoom}/{x}/{y} from '{}'", self.name)]
	pub fn read_tile(&self, zoom: u8, x: u32, y: u32) -> Result<Option<Tile>> {
		let tms_row = xyz_to_tms(y, zoom)?;
		let conn = self.connection()?;
		let data = conn
			.query_row(
				"SELECT tile_data FROM tiles WHERE zoom_level = ?1 AND tile_column = ?2 AND tile_row = ?3",
				params![zoom, x, tms_row],
				|row| row.get::<_, Option<Vec<u8>>>(0),
			)
			.optional()
			.or_query()?;
		drop(conn);
		data.map(|data| Tile::from_tms(zoom, x, tms_row, data.unwrap_or_default(), self.extension()))
			.transpose()
	}

	/// Every tile of one level, ordered by column and XYZ row.
	#[context("reading level {level} from '{}'", self.name)]
	pub fn tiles_at_level(&self, level: u8) -> Result<Vec<Tile>> {
		let sql = "SELECT tile_column, tile_row, tile_data FROM tiles WHERE zoom_level = ?1 ORDER BY tile_column, tile_row DESC";
		log::trace!("SQL: {sql}");
		let conn = self.connection()?;
		let mut stmt = conn.prepare(sql).or_query()?;
		let rows = stmt
			.query_map([level], |row| {
				Ok((
					row.get::<_, i64>(0)?,
					row.get::<_, i64>(1)?,
					row.get::<_, Option<Vec<u8>>>(2)?.unwrap_or_default(),
				))
			})
			.or_query()?
			.collect::<Result<Vec<_>, _>>()
			.or_query()?;

		rows.into_iter()
			.map(|(column, row, data)| {
				Tile::from_tms(
					level,
					checked_index(column, "tile_column")?,
					checked_index(row, "tile_row")?,
					data,
					self.extension(),
				)
			})
			.collect()
	}

	/// The stored `(column, TMS row)` pairs of one level.
	#[context("reading positions of level {level} from '{}'", self.name)]
	pub fn tile_positions(&self, level: u8) -> Result<BTreeSet<(u32, u32)>> {
		let conn = self.connection()?;
		let mut stmt = conn
			.prepare("SELECT tile_column, tile_row FROM tiles WHERE zoom_level = ?1")
			.or_query()?;
		let rows = stmt
			.query_map([level], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?)))
			.or_query()?
			.collect::<Result<Vec<_>, _>>()
			.or_query()?;
		rows.into_iter()
			.map(|(column, row)| Ok((checked_index(column, "tile_column")?, checked_index(row, "tile_row")?)))
			.collect()
	}

	pub fn tile_count(&self) -> Result<u64> {
		let conn = self.connection()?;
		let count = conn
			.query_row("SELECT COUNT(*) FROM tiles", [], |row| row.get::<_, i64>(0))
			.or_query()?;
		Ok(count.max(0) as u64)
	}

	#[context("summarizing '{}'", self.name)]
	pub fn summary(&self) -> Result<StoreSummary> {
		let levels = self.zoom_levels()?;
		Ok(StoreSummary {
			tile_count: self.tile_count()?,
			min_zoom: levels.first().copied(),
			max_zoom: levels.last().copied(),
			file_name: self.name.clone(),
			file_path: self.path.clone(),
		})
	}

	/// Column and row extremes per level, ordered by level.
	#[context("computing level ranges of '{}'", self.name)]
	pub fn level_ranges(&self) -> Result<Vec<LevelRange>> {
		let sql = "SELECT zoom_level, MIN(tile_column), MAX(tile_column), MIN(tile_row), MAX(tile_row), COUNT(*) FROM tiles GROUP BY zoom_level ORDER BY zoom_level";
		log::trace!("SQL: {sql}");
		let conn = self.connection()?;
		let mut stmt = conn.prepare(sql).or_query()?;
		let rows = stmt
			.query_map([], |row| {
				Ok([
					row.get::<_, i64>(0)?,
					row.get::<_, i64>(1)?,
					row.get::<_, i64>(2)?,
					row.get::<_, i64>(3)?,
					row.get::<_, i64>(4)?,
					row.get::<_, i64>(5)?,
				])
			})
			.or_query()?
			.collect::<Result<Vec<_>, _>>()
			.or_query()?;

		rows.into_iter()
			.map(|[level, x_min, x_max, row_min, row_max, count]| {
				Ok(LevelRange {
					level: checked_level(level)?,
					x_min: checked_index(x_min, "tile_column")?,
					x_max: checked_index(x_max, "tile_column")?,
					row_min: checked_index(row_min, "tile_row")?,
					row_max: checked_index(row_max, "tile_row")?,
					count: count.max(0) as u64,
				})
			})
			.collect()
	}

	/// Starts a write transaction holding the archive's connection until it is committed or dropped.
	pub fn begin_batch(&self) -> Result<TileBatch> {
		TileBatch::begin(self.connection()?)
	}

	/// Removes one tile, returns whether it existed.
	#[context("deleting tile {coord} from '{}'", self.name)]
	pub fn delete_tile(&self, coord: &TileCoord) -> Result<bool> {
		let conn = self.connection()?;
		let deleted = conn
			.execute(
				"DELETE FROM tiles WHERE zoom_level = ?1 AND tile_column = ?2 AND tile_row = ?3",
				params![coord.level, coord.x, coord.tms_row()],
			)
			.or_query()?;
		Ok(deleted > 0)
	}

	/// Trades durability for speed while bulk loading.
	pub fn set_bulk_load_pragmas(&self) -> Result<()> {
		let conn = self.connection()?;
		conn.pragma_update_and_check(None, "journal_mode", "MEMORY", |row| row.get::<_, String>(0))
			.or_query()?;
		conn.pragma_update(None, "synchronous", "OFF").or_query()?;
		Ok(())
	}

	#[context("vacuuming '{}'", self.name)]
	pub fn vacuum(&self) -> Result<()> {
		log::debug!("vacuum {}", self.name);
		self.connection()?.execute_batch("VACUUM").or_query()
	}
}

impl TileSource for TileStore {
	fn name(&self) -> &str {
		&self.name
	}

	fn zoom_levels(&self) -> Result<BTreeSet<u8>> {
		TileStore::zoom_levels(self)
	}

	fn tiles_at_level(&self, level: u8) -> Result<Vec<Tile>> {
		TileStore::tiles_at_level(self, level)
	}

	fn metadata(&self) -> Result<Metadata> {
		TileStore::metadata(self)
	}

	fn extension_hint(&self) -> Option<&str> {
		self.format_hint()
	}
}

impl std::fmt::Debug for TileStore {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("TileStore")
			.field("path", &self.path)
			.field("extension", &self.extension)
			.field("format_hint", &self.format_hint)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{full_level, make_test_store, test_metadata, test_tile};
	use assert_fs::TempDir;
	use mbtiler_image::{encode_jpeg, new_solid};
	use pretty_assertions::assert_eq;
	use rstest::rstest;

	fn coord(level: u8, x: u32, y: u32) -> TileCoord {
		TileCoord::new(level, x, y).unwrap()
	}

	fn kind(err: &anyhow::Error) -> &MBTilesError {
		error_kind(err).unwrap()
	}

	#[test]
	fn open_missing_file() {
		let dir = TempDir::new().unwrap();
		let err = TileStore::open(&dir.path().join("missing.mbtiles")).unwrap_err();
		assert!(matches!(kind(&err), MBTilesError::Open { .. }));
	}

	#[test]
	fn open_rejects_other_files() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("text.mbtiles");
		fs::write(&path, "this is not a database, it is just some text that is long enough").unwrap();
		let err = TileStore::open(&path).unwrap_err();
		assert!(matches!(kind(&err), MBTilesError::Open { .. }));
	}

	#[test]
	fn open_requires_tiles_table() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("empty.mbtiles");
		let store = TileStore::create(&path).unwrap();
		store.connection().unwrap().execute_batch("DROP TABLE tiles").unwrap();
		drop(store);
		let err = TileStore::open(&path).unwrap_err();
		assert!(err.to_string().contains("empty.mbtiles"));
		assert!(matches!(kind(&err), MBTilesError::Open { reason, .. } if reason.contains("no 'tiles' table")));
	}

	#[test]
	fn levels_counts_and_summary() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("world.mbtiles");
		let mut coords = full_level(1);
		coords.push(coord(3, 5, 2));
		let store = make_test_store(&path, &coords).unwrap();

		assert_eq!(store.zoom_levels().unwrap(), BTreeSet::from([1, 3]));
		assert_eq!(store.tile_count().unwrap(), 5);
		assert_eq!(
			store.summary().unwrap(),
			StoreSummary {
				tile_count: 5,
				min_zoom: Some(1),
				max_zoom: Some(3),
				file_name: String::from("world.mbtiles"),
				file_path: path.clone(),
			}
		);
	}

	#[test]
	fn rows_are_flipped_at_the_sql_boundary() {
		let dir = TempDir::new().unwrap();
		let store = make_test_store(&dir.path().join("a.mbtiles"), &[coord(2, 1, 0)]).unwrap();

		let row: i64 = store
			.connection()
			.unwrap()
			.query_row("SELECT tile_row FROM tiles", [], |row| row.get(0))
			.unwrap();
		assert_eq!(row, 3);

		let tile = store.read_tile(2, 1, 0).unwrap().unwrap();
		assert_eq!((tile.zoom, tile.x, tile.tms_row, tile.xyz_row), (2, 1, 3, 0));
		assert_eq!(tile.extension, "png");
		assert!(store.read_tile(2, 1, 3).unwrap().is_none());
	}

	#[test]
	fn read_tile_rejects_rows_outside_the_grid() {
		let dir = TempDir::new().unwrap();
		let store = make_test_store(&dir.path().join("a.mbtiles"), &[coord(0, 0, 0)]).unwrap();
		let err = store.read_tile(1, 0, 2).unwrap_err();
		assert!(matches!(kind(&err), MBTilesError::CoordinateOverflow(_)));
	}

	#[test]
	fn tiles_at_level_are_ordered_by_xyz() {
		let dir = TempDir::new().unwrap();
		let store = make_test_store(&dir.path().join("a.mbtiles"), &full_level(1)).unwrap();
		let coords = store
			.tiles_at_level(1)
			.unwrap()
			.iter()
			.map(|tile| (tile.x, tile.xyz_row))
			.collect::<Vec<_>>();
		assert_eq!(coords, vec![(0, 0), (0, 1), (1, 0), (1, 1)]);
		assert!(store.tiles_at_level(7).unwrap().is_empty());
	}

	#[test]
	fn level_ranges_use_stored_rows() {
		let dir = TempDir::new().unwrap();
		let coords = [coord(3, 2, 1), coord(3, 4, 5), coord(3, 3, 3), coord(4, 0, 0)];
		let store = make_test_store(&dir.path().join("a.mbtiles"), &coords).unwrap();
		let ranges = store.level_ranges().unwrap();
		assert_eq!(
			ranges[0],
			LevelRange {
				level: 3,
				x_min: 2,
				x_max: 4,
				row_min: 2,
				row_max: 6,
				count: 3
			}
		);
		assert_eq!(ranges[0].area(), 15);
		assert_eq!(ranges[1].area(), 1);
		assert_eq!(store.tile_positions(3).unwrap(), BTreeSet::from([(2, 6), (3, 4), (4, 2)]));
	}

	#[test]
	fn metadata_is_sorted() {
		let dir = TempDir::new().unwrap();
		let store = make_test_store(&dir.path().join("a.mbtiles"), &[coord(0, 0, 0)]).unwrap();
		assert_eq!(store.metadata().unwrap(), test_metadata());
		assert_eq!(store.metadata_keys().unwrap(), vec!["format", "name"]);
		assert_eq!(store.metadata_value("name").unwrap().as_deref(), Some("test"));
		assert_eq!(store.metadata_value("nope").unwrap(), None);
	}

	#[test]
	fn non_overwriting_write_keeps_the_old_value() {
		let dir = TempDir::new().unwrap();
		let store = make_test_store(&dir.path().join("a.mbtiles"), &[coord(0, 0, 0)]).unwrap();

		let first = Metadata::from([(String::from("attribution"), String::from("first"))]);
		store.set_metadata(&first, false).unwrap();

		let second = Metadata::from([
			(String::from("aaa"), String::from("new")),
			(String::from("attribution"), String::from("second")),
		]);
		let err = store.set_metadata(&second, false).unwrap_err();
		assert!(matches!(kind(&err), MBTilesError::KeyExists(key) if key == "attribution"));

		assert_eq!(store.metadata_value("attribution").unwrap().as_deref(), Some("first"));
		assert_eq!(store.metadata_value("aaa").unwrap(), None);
	}

	#[test]
	fn overwriting_write_upserts() {
		let dir = TempDir::new().unwrap();
		let store = make_test_store(&dir.path().join("a.mbtiles"), &[coord(0, 0, 0)]).unwrap();
		let entries = Metadata::from([
			(String::from("name"), String::from("renamed")),
			(String::from("version"), String::from("1.3")),
		]);
		store.set_metadata(&entries, true).unwrap();
		let metadata = store.metadata().unwrap();
		assert_eq!(metadata["name"], "renamed");
		assert_eq!(metadata["version"], "1.3");
		assert_eq!(metadata.len(), 3);
	}

	#[test]
	fn metadata_table_is_created_on_demand() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("a.mbtiles");
		let store = TileStore::create(&path).unwrap();
		store.connection().unwrap().execute_batch("DROP TABLE metadata").unwrap();

		assert!(store.metadata().unwrap().is_empty());
		store.set_metadata(&Metadata::new(), false).unwrap();
		assert!(!store.has_table("metadata").unwrap());

		store
			.set_metadata(&Metadata::from([(String::from("k"), String::from("v"))]), false)
			.unwrap();
		assert_eq!(store.metadata_keys().unwrap(), vec!["k"]);
	}

	#[rstest]
	#[case::declared(Some(" .JPEG "), "jpg")]
	#[case::webp(Some("webp"), "webp")]
	#[case::sniffed(None, "png")]
	fn format_metadata_wins_over_sniffing(#[case] format: Option<&str>, #[case] expected: &str) {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("a.mbtiles");
		let store = make_test_store(&path, &[coord(0, 0, 0)]).unwrap();
		match format {
			Some(format) => store
				.set_metadata(&Metadata::from([(String::from("format"), format.to_string())]), true)
				.unwrap(),
			None => {
				store.connection().unwrap().execute_batch("DELETE FROM metadata").unwrap();
			}
		}
		drop(store);

		let store = TileStore::open(&path).unwrap();
		let tile = store.read_tile(0, 0, 0).unwrap().unwrap();
		assert_eq!(tile.extension, expected);
		assert_eq!(store.extension().is_some(), format.is_some());
		assert_eq!(store.extension_hint(), Some(expected));
	}

	#[test]
	fn undeclared_format_is_sniffed_from_the_first_tile() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("a.mbtiles");
		let store = TileStore::create(&path).unwrap();
		let mut batch = store.begin_batch().unwrap();
		let jpeg = encode_jpeg(&new_solid(8, 8, [90, 20, 30, 255]), 90).unwrap();
		batch.insert(&coord(1, 0, 0), &jpeg).unwrap();
		batch.insert(&coord(1, 1, 0), &test_tile(&coord(1, 1, 0))).unwrap();
		batch.commit().unwrap();
		drop(store);

		let store = TileStore::open(&path).unwrap();
		assert_eq!(store.extension(), None);
		assert_eq!(store.extension_hint(), Some("jpg"));

		let empty = TileStore::create(&dir.path().join("empty.mbtiles")).unwrap();
		drop(empty);
		assert_eq!(TileStore::open(&dir.path().join("empty.mbtiles")).unwrap().extension_hint(), None);
	}

	#[test]
	fn delete_and_vacuum() {
		let dir = TempDir::new().unwrap();
		let store = make_test_store(&dir.path().join("a.mbtiles"), &full_level(1)).unwrap();
		assert!(store.delete_tile(&coord(1, 0, 0)).unwrap());
		assert!(!store.delete_tile(&coord(1, 0, 0)).unwrap());
		store.vacuum().unwrap();
		assert_eq!(store.tile_count().unwrap(), 3);
	}

	#[test]
	fn create_replaces_existing_files() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("a.mbtiles");
		make_test_store(&path, &full_level(2)).unwrap();
		let store = TileStore::create(&path).unwrap();
		assert_eq!(store.tile_count().unwrap(), 0);
		assert!(store.zoom_levels().unwrap().is_empty());
	}

	#[test]
	fn open_or_create_keeps_tiles() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("sub").join("a.mbtiles");
		let store = TileStore::open_or_create(&path).unwrap();
		assert_eq!(store.tile_count().unwrap(), 0);
		drop(store);

		make_test_store(&path, &full_level(1)).unwrap();
		let store = TileStore::open_or_create(&path).unwrap();
		assert_eq!(store.tile_count().unwrap(), 4);
	}

	#[test]
	fn bulk_load_pragmas_apply() {
		let dir = TempDir::new().unwrap();
		let store = TileStore::create(&dir.path().join("a.mbtiles")).unwrap();
		store.set_bulk_load_pragmas().unwrap();
		let mode: String = store
			.connection()
			.unwrap()
			.query_row("PRAGMA journal_mode", [], |row| row.get(0))
			.unwrap();
		assert_eq!(mode.to_lowercase(), "memory");
	}
}
