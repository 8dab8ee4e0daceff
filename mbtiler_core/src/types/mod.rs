//! Value types shared across the workspace.

mod tile;
pub use tile::*;

mod tile_bounds;
pub use tile_bounds::*;

mod tile_coord;
pub use tile_coord::*;

mod tile_format;
pub use tile_format::*;

mod zoom_levels;
pub use zoom_levels::*;

/// Archive metadata ordered by key.
pub type Metadata = std::collections::BTreeMap<String, String>;
