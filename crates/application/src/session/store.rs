//! Durable persistence of the credential record.
//!
//! The record is kept as three string entries in a [`KeyValueStore`]:
//! the token, its scheme and the JSON-serialized [`UserProfile`].

use std::sync::Arc;

use cityportal_domain::{AccessToken, CredentialRecord, DEFAULT_TOKEN_SCHEME, UserProfile};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::ApplicationResult;
use crate::ports::{KeyValueStore, StorageError};

/// Storage key of the access token.
pub const TOKEN_KEY: &str = "jwt_token";
/// Storage key of the token scheme.
pub const TOKEN_TYPE_KEY: &str = "jwt_token_type";
/// Storage key of the serialized user profile.
pub const USER_KEY: &str = "user_data";

const ALL_KEYS: [&str; 3] = [TOKEN_KEY, TOKEN_TYPE_KEY, USER_KEY];

/// Owner of the persisted credential record.
pub struct SessionStore {
    storage: Arc<dyn KeyValueStore>,
    /// Serializes writers so a conditional clear cannot interleave with a save.
    writes: Mutex<()>,
}

impl SessionStore {
    /// Creates a store over the given storage backend.
    #[must_use]
    pub fn new(storage: Arc<dyn KeyValueStore>) -> Self {
        Self {
            storage,
            writes: Mutex::new(()),
        }
    }

    /// Persists a credential record.
    ///
    /// # Errors
    ///
    /// Returns the storage error if any entry cannot be written.
    pub async fn save(&self, record: &CredentialRecord) -> ApplicationResult<()> {
        let user = serde_json::to_string(&record.user)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let _writes = self.writes.lock().await;
        self.storage
            .set_many(&[
                (TOKEN_KEY, record.token.value()),
                (TOKEN_TYPE_KEY, record.token.scheme()),
                (USER_KEY, &user),
            ])
            .await?;
        debug!(user_id = record.user.id, "credential saved");
        Ok(())
    }

    /// Returns the saved record, or `None` if nothing usable is stored.
    ///
    /// Unreadable, malformed or partial entries are reported as `None`.
    pub async fn load(&self) -> Option<CredentialRecord> {
        match self.read_record().await {
            Ok(record) => record,
            Err(reason) => {
                warn!(%reason, "ignoring unreadable stored credential");
                None
            }
        }
    }

    /// Removes every persisted entry. Clearing an empty store is a no-op.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the entries cannot be removed.
    pub async fn clear(&self) -> ApplicationResult<()> {
        let _writes = self.writes.lock().await;
        self.storage.remove_many(&ALL_KEYS).await?;
        debug!("credential cleared");
        Ok(())
    }

    /// Clears the store only if it still holds the credential that produced
    /// `sent` as its header value. Returns true if a credential was removed.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the entries cannot be removed.
    pub async fn clear_if_current(&self, sent: Option<&str>) -> ApplicationResult<bool> {
        let _writes = self.writes.lock().await;
        let Some(current) = self.authorization_header_value().await else {
            return Ok(false);
        };
        if sent != Some(current.as_str()) {
            debug!("credential changed since the request was sent, keeping it");
            return Ok(false);
        }
        self.storage.remove_many(&ALL_KEYS).await?;
        debug!("credential cleared");
        Ok(true)
    }

    /// Returns `"<scheme> <token>"` for the stored credential, if any.
    pub async fn authorization_header_value(&self) -> Option<String> {
        self.load()
            .await
            .map(|record| record.authorization_header_value())
    }

    async fn read_record(&self) -> Result<Option<CredentialRecord>, String> {
        let token = self.read(TOKEN_KEY).await?;
        let scheme = self.read(TOKEN_TYPE_KEY).await?;
        let user = self.read(USER_KEY).await?;

        let (token, user) = match (token, user) {
            (None, None) => return Ok(None),
            (Some(token), Some(user)) => (token, user),
            (Some(_), None) => return Err("token stored without user data".to_string()),
            (None, Some(_)) => return Err("user data stored without a token".to_string()),
        };

        let scheme = scheme
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_TOKEN_SCHEME.to_string());
        let token = AccessToken::new(token, scheme).map_err(|e| e.to_string())?;
        let user: UserProfile =
            serde_json::from_str(&user).map_err(|e| format!("malformed user data: {e}"))?;

        Ok(Some(CredentialRecord::new(token, user)))
    }

    async fn read(&self, key: &str) -> Result<Option<String>, String> {
        self.storage
            .get(key)
            .await
            .map_err(|e| format!("cannot read {key}: {e}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::error::ApplicationError;
    use crate::testing::MemoryStorage;
    use cityportal_domain::Role;
    use pretty_assertions::assert_eq;

    fn record() -> CredentialRecord {
        CredentialRecord::new(
            AccessToken::new("abc", "Bearer").unwrap(),
            UserProfile {
                id: 7,
                username: "alice".to_string(),
                name: "Alice".to_string(),
                email: "a@x.com".to_string(),
                role: Role::Admin,
            },
        )
    }

    fn store_over(storage: &Arc<MemoryStorage>) -> SessionStore {
        SessionStore::new(Arc::clone(storage) as Arc<dyn KeyValueStore>)
    }

    #[tokio::test]
    async fn test_save_then_load_round_trips() {
        let storage = MemoryStorage::new();
        let store = store_over(&storage);

        store.save(&record()).await.unwrap();

        assert_eq!(store.load().await, Some(record()));
        assert_eq!(storage.raw(TOKEN_KEY).as_deref(), Some("abc"));
        assert_eq!(storage.raw(TOKEN_TYPE_KEY).as_deref(), Some("Bearer"));
        let user: serde_json::Value =
            serde_json::from_str(&storage.raw(USER_KEY).unwrap()).unwrap();
        assert_eq!(user["role"], "admin");
    }

    #[tokio::test]
    async fn test_load_empty_store_is_absent() {
        let store = store_over(&MemoryStorage::new());
        assert_eq!(store.load().await, None);
        assert_eq!(store.authorization_header_value().await, None);
    }

    #[tokio::test]
    async fn test_malformed_entries_load_as_absent() {
        let cases: &[&[(&str, &str)]] = &[
            &[(TOKEN_KEY, "abc")],
            &[(USER_KEY, r#"{"id":7}"#)],
            &[(TOKEN_KEY, "abc"), (USER_KEY, "not json")],
            &[(TOKEN_KEY, "abc"), (USER_KEY, r#"{"id":7,"username":"a"}"#)],
            &[(TOKEN_KEY, "abc"), (USER_KEY, "null")],
            &[(TOKEN_KEY, ""), (USER_KEY, r#"{"id":7,"username":"a","name":"A","email":"e","role":"user"}"#)],
            &[(TOKEN_KEY, "abc"), (USER_KEY, r#"{"id":7,"username":"a","name":"A","email":"e","role":"root"}"#)],
            &[(TOKEN_KEY, "abc"), (USER_KEY, r#"{"id":"seven","username":"a","name":"A","email":"e","role":"user"}"#)],
        ];

        for entries in cases {
            let storage = MemoryStorage::new();
            for (key, value) in *entries {
                storage.insert_raw(key, value);
            }
            let store = store_over(&storage);
            assert_eq!(store.load().await, None, "entries: {entries:?}");
            assert_eq!(store.authorization_header_value().await, None);
        }
    }

    #[tokio::test]
    async fn test_missing_scheme_defaults_to_bearer() {
        for scheme in [None, Some("")] {
            let storage = MemoryStorage::new();
            storage.insert_raw(TOKEN_KEY, "abc");
            if let Some(scheme) = scheme {
                storage.insert_raw(TOKEN_TYPE_KEY, scheme);
            }
            storage.insert_raw(
                USER_KEY,
                r#"{"id":7,"username":"alice","name":"Alice","email":"a@x.com","role":"user"}"#,
            );
            let store = store_over(&storage);

            assert_eq!(
                store.authorization_header_value().await.as_deref(),
                Some("Bearer abc")
            );
        }
    }

    #[tokio::test]
    async fn test_clear_removes_everything_and_is_idempotent() {
        let storage = MemoryStorage::new();
        let store = store_over(&storage);
        store.save(&record()).await.unwrap();

        store.clear().await.unwrap();
        store.clear().await.unwrap();

        assert!(storage.is_empty());
        assert_eq!(store.load().await, None);
        assert_eq!(store.authorization_header_value().await, None);
    }

    #[tokio::test]
    async fn test_write_failure_propagates() {
        let storage = MemoryStorage::new();
        storage.set_fail_writes(true);
        let store = store_over(&storage);

        let err = store.save(&record()).await.unwrap_err();
        assert!(matches!(err, ApplicationError::Storage(_)));
        assert!(storage.is_empty());
    }

    #[tokio::test]
    async fn test_header_value() {
        let store = store_over(&MemoryStorage::new());
        store.save(&record()).await.unwrap();
        assert_eq!(
            store.authorization_header_value().await.as_deref(),
            Some("Bearer abc")
        );
    }

    #[tokio::test]
    async fn test_clear_if_current_keeps_newer_credential() {
        let storage = MemoryStorage::new();
        let store = store_over(&storage);
        store.save(&record()).await.unwrap();

        assert!(!store.clear_if_current(Some("Bearer stale")).await.unwrap());
        assert!(store.load().await.is_some());

        assert!(store.clear_if_current(Some("Bearer abc")).await.unwrap());
        assert!(store.load().await.is_none());

        assert!(!store.clear_if_current(Some("Bearer abc")).await.unwrap());
        assert_eq!(storage.clears(), 1);
    }
}
