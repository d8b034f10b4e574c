//! Deterministic JSON serialization for session files.
//!
//! Keeps the on-disk format stable between writes:
//! - Sorting object keys alphabetically (via `BTreeMap`)
//! - Using 2-space indentation
//! - Adding trailing newline

mod json;

pub use json::*;
