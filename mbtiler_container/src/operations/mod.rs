//! The workflows behind the `mbtiler` subcommands.
//!
//! Each operation takes explicit inputs and options, reports progress through a
//! [`ProgressSink`](mbtiler_core::progress::ProgressSink) and returns a small report value; printing
//! is left to the caller.

mod convert;
pub use convert::*;

mod extract;
pub use extract::*;

mod grayscale;
pub use grayscale::*;

mod import;
pub use import::*;

mod inspect;
pub use inspect::*;
