//! Durable key-value storage port

use std::sync::Arc;

use async_trait::async_trait;

/// Errors raised by a storage backend.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StorageError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[source] Arc<std::io::Error>),

    /// The backing data could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The backend refused the operation.
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(Arc::new(err))
    }
}

/// String key-value storage that survives process restarts.
///
/// Values are scoped to one backend origin by the adapter.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Reads a value.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be read.
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Writes a value.
    ///
    /// # Errors
    /// Returns an error if the value cannot be persisted.
    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes a value. Removing a missing key is not an error.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be written.
    async fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// Writes several values. Adapters that can persist them in one write
    /// should override this.
    ///
    /// # Errors
    /// Returns the first write error.
    async fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        for (key, value) in entries {
            self.set(key, value).await?;
        }
        Ok(())
    }

    /// Removes several values.
    ///
    /// # Errors
    /// Returns the first removal error.
    async fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        for key in keys {
            self.remove(key).await?;
        }
        Ok(())
    }
}
