pub mod convert;
pub mod extract;
pub mod grayscale;
pub mod health;
pub mod import;
pub mod metadata;
pub mod missing;
pub mod probe;
