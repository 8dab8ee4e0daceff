//! Shared building blocks of the mbtiler crates.
//!
//! - [`MBTilesError`]: the error kinds every crate raises through `anyhow`
//! - [`types`]: tile coordinates and bounds, the closed [`TileFormat`] enum, [`Tile`] and zoom level specs
//! - [`pattern`]: the path template language used when writing tiles into directory trees
//! - [`progress`]: the progress reporting interface injected into long running loops

mod error;
pub use error::*;

pub mod pattern;
pub mod progress;
pub mod types;

pub use pattern::PathPattern;
pub use types::*;
