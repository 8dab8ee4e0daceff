//! Reading, synthesizing and writing MBTiles archives.
//!
//! - [`TileStore`]: one MBTiles file behind a single SQLite connection
//! - [`DirectoryTreeSource`]: a `{z}/{x}/{y}.{ext}` tree read like an archive
//! - [`PyramidSynthesizer`]: derives missing zoom levels from existing ones
//! - [`TileSink`]: where tiles end up, either a directory tree or a new archive
//! - [`operations`]: the workflows behind the command line tool
//!
//! Every address that leaves this crate uses XYZ rows. TMS rows only exist in SQL statements.

mod source;
pub use source::*;

mod directory;
pub use directory::*;

pub mod mbtiles;
pub use mbtiles::*;

pub mod operations;
pub use operations::*;

pub mod pyramid;
pub use pyramid::*;

pub mod sink;
pub use sink::*;

#[cfg(any(test, feature = "test"))]
mod testing;
#[cfg(any(test, feature = "test"))]
pub use testing::*;
