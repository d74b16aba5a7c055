//! Configuration loader and schema types.
//!
//! Settings are read once at startup and stay immutable afterwards; the
//! device core only ever sees the resolved values.

mod load;
mod schema;

pub use schema::*;
