//! Key-value storage adapters.
//!
//! [`FileKeyValueStore`] keeps one JSON file per backend origin so switching
//! backends never mixes credentials.

mod file_store;

pub use file_store::FileKeyValueStore;
