//! City Portal Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer, plus configuration loading and
//! tracing setup for front ends.

pub mod adapters;
pub mod persistence;
pub mod serialization;
pub mod settings;
pub mod telemetry;

pub use adapters::ReqwestHttpClient;
pub use persistence::FileKeyValueStore;
pub use serialization::{SerializationError, from_json_bytes, to_json_stable_bytes};
pub use settings::{ClientConfig, ConfigError};
pub use telemetry::init_tracing;
