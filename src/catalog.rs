//! The emulated disc table.
//!
//! Built once from the music folder at startup and read-only afterwards.

mod model;
mod probe;

pub use model::*;
