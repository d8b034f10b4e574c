//! File-backed key-value store.
//!
//! Entries live in one JSON file per backend origin:
//! ```json
//! {
//!   "entries": {
//!     "jwt_token": "eyJhbGciOi...",
//!     "jwt_token_type": "Bearer",
//!     "user_data": "{\"id\":7,...}"
//!   },
//!   "schema_version": 1
//! }
//! ```
//! Writes go to a temporary file that is renamed over the original, so a
//! crash never leaves a half-written file behind.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use cityportal_application::ports::{KeyValueStore, StorageError};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::serialization::{from_json_bytes, to_json_stable_bytes};

const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Default, Serialize, Deserialize)]
struct SessionFile {
    schema_version: u32,
    entries: BTreeMap<String, String>,
}

/// Stores entries in a JSON file.
#[derive(Debug)]
pub struct FileKeyValueStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileKeyValueStore {
    /// Creates a store backed by the file at `path`. The file and its parent
    /// directories are created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Creates the store for `origin` inside `dir`.
    ///
    /// `http://localhost:8080` maps to `session-http_localhost_8080.json`.
    #[must_use]
    pub fn for_origin(dir: &Path, origin: &str) -> Self {
        Self::new(dir.join(Self::file_name(origin)))
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file_name(origin: &str) -> String {
        let mut name = String::from("session-");
        let mut last_was_separator = false;
        for c in origin.chars() {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                name.push(c);
                last_was_separator = false;
            } else if !last_was_separator {
                name.push('_');
                last_was_separator = true;
            }
        }
        name.push_str(".json");
        name
    }

    async fn read_entries(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BTreeMap::new()),
            Err(e) => return Err(StorageError::from(e)),
        };
        let file: SessionFile =
            from_json_bytes(&bytes).map_err(|e| StorageError::Serialization(e.to_string()))?;
        if file.schema_version != SCHEMA_VERSION {
            return Err(StorageError::Serialization(format!(
                "unsupported schema version {}",
                file.schema_version
            )));
        }
        Ok(file.entries)
    }

    async fn write_entries(&self, entries: BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }
        let file = SessionFile {
            schema_version: SCHEMA_VERSION,
            entries,
        };
        let bytes =
            to_json_stable_bytes(&file).map_err(|e| StorageError::Serialization(e.to_string()))?;
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, bytes).await?;
        fs::rename(&tmp, &self.path).await?;
        debug!(path = %self.path.display(), "session file written");
        Ok(())
    }

    /// Reads the stored entries, treating an unreadable file as empty.
    async fn read_recovering(&self) -> Result<BTreeMap<String, String>, StorageError> {
        match self.read_entries().await {
            Err(StorageError::Serialization(reason)) => {
                warn!(path = %self.path.display(), %reason, "discarding corrupt session file");
                Ok(BTreeMap::new())
            }
            other => other,
        }
    }

    async fn remove_file(&self) -> Result<(), StorageError> {
        match fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "session file removed");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StorageError::from(e)),
        }
    }

    /// Applies `change` to the stored entries and persists the result.
    ///
    /// An unreadable file is replaced rather than failing every later write,
    /// and a store left empty has no file at all.
    async fn update(
        &self,
        change: impl FnOnce(&mut BTreeMap<String, String>) + Send,
    ) -> Result<(), StorageError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_recovering().await?;
        let before = entries.clone();
        change(&mut entries);
        if entries.is_empty() {
            return self.remove_file().await;
        }
        if entries == before {
            return Ok(());
        }
        self.write_entries(entries).await
    }
}

#[async_trait]
impl KeyValueStore for FileKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_entries().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.set_many(&[(key, value)]).await
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.remove_many(&[key]).await
    }

    async fn set_many(&self, entries: &[(&str, &str)]) -> Result<(), StorageError> {
        self.update(|stored| {
            for (key, value) in entries {
                stored.insert((*key).to_string(), (*value).to_string());
            }
        })
        .await
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        self.update(|stored| {
            for key in keys {
                stored.remove(*key);
            }
        })
        .await
    }
}
