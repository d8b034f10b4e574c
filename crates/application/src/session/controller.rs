//! The session state machine.
//!
//! `Initializing → {Authenticated(user) | Anonymous}`. Every transition that
//! changes who is signed in runs under one lock and advances the credential
//! epoch, so a login that completes after a later logout is discarded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use cityportal_domain::{
    CredentialRecord, LoginRequest, MyScrapbookEntries, NewScrapbookEntry, PortalResource,
    PublicScrapbookEntries, RegisterRequest, SessionSnapshot, SessionState, UserProfile,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::SessionStore;
use super::observer::{Observers, Subscription};
use crate::cache::QueryCache;
use crate::error::{ApplicationError, ApplicationResult};
use crate::gateway::{ApiGateway, Fetched, UnauthorizedPolicy};

/// The single authority on who is signed in.
pub struct SessionController {
    store: Arc<SessionStore>,
    gateway: Arc<ApiGateway>,
    cache: Arc<QueryCache>,
    snapshot: RwLock<SessionSnapshot>,
    epoch: AtomicU64,
    transitions: Mutex<()>,
    observers: Arc<Observers>,
}

impl SessionController {
    /// Creates a controller in the `Initializing` state.
    ///
    /// Call [`SessionController::restore`] to read the persisted credential.
    #[must_use]
    pub fn new(
        store: Arc<SessionStore>,
        gateway: Arc<ApiGateway>,
        cache: Arc<QueryCache>,
    ) -> Self {
        Self {
            store,
            gateway,
            cache,
            snapshot: RwLock::new(SessionSnapshot::default()),
            epoch: AtomicU64::new(0),
            transitions: Mutex::new(()),
            observers: Arc::new(Observers::default()),
        }
    }

    /// Current state and last error.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.snapshot().state
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn user(&self) -> Option<UserProfile> {
        self.snapshot().user().cloned()
    }

    /// Current credential epoch.
    #[must_use]
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// The query cache owned by this controller.
    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// The gateway used for session calls.
    #[must_use]
    pub fn gateway(&self) -> &ApiGateway {
        &self.gateway
    }

    /// Reads the persisted credential and leaves `Initializing`.
    ///
    /// Calling it again once resolved returns the current snapshot unchanged.
    pub async fn restore(&self) -> SessionSnapshot {
        let _transition = self.transitions.lock().await;
        if !self.snapshot().is_loading() {
            return self.snapshot();
        }
        let state = match self.store.load().await {
            Some(record) => {
                info!(user_id = record.user.id, role = %record.role(), "restored session");
                SessionState::Authenticated(record.user)
            }
            None => {
                debug!("no stored session");
                SessionState::Anonymous
            }
        };
        self.publish(|snapshot| snapshot.state = state)
    }

    /// Signs in and persists the issued credential.
    ///
    /// # Errors
    ///
    /// Returns the gateway or storage error, which is also recorded in the
    /// snapshot, and [`ApplicationError::Superseded`] if a logout or another
    /// login happened while the call was in flight.
    pub async fn login(&self, username: &str, password: &str) -> ApplicationResult<UserProfile> {
        let issued = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        let credentials = LoginRequest::new(username, password);
        let outcome = match self.gateway.login(&credentials).await {
            Ok(response) => CredentialRecord::from_login_response(response).map_err(Into::into),
            Err(err) => Err(err),
        };

        let _transition = self.transitions.lock().await;
        if self.epoch() != issued {
            debug!(issued, current = self.epoch(), "discarding stale login");
            return Err(ApplicationError::Superseded);
        }

        let record = match outcome {
            Ok(record) => record,
            Err(err) => return Err(self.fail("login failed", err)),
        };
        if let Err(err) = self.store.save(&record).await {
            return Err(self.fail("could not persist credential", err));
        }

        self.cache.invalidate_all();
        info!(user_id = record.user.id, role = %record.role(), "signed in");
        let user = record.user;
        self.publish(|snapshot| {
            snapshot.state = SessionState::Authenticated(user.clone());
            snapshot.error = None;
        });
        Ok(user)
    }

    /// Creates an account. Never signs in.
    ///
    /// Returns the server's confirmation message, if it sent one.
    ///
    /// # Errors
    ///
    /// Returns the gateway error, which is also recorded in the snapshot.
    pub async fn register(&self, fields: &RegisterRequest) -> ApplicationResult<Option<String>> {
        match self.gateway.register(fields).await {
            Ok(message) => {
                info!(username = %fields.username, "registered account");
                self.publish(|snapshot| snapshot.error = None);
                Ok(message)
            }
            Err(err) => Err(self.fail("registration failed", err)),
        }
    }

    /// Signs out locally and drops every cached read.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the credential could not be removed; the
    /// state is left unchanged in that case.
    pub async fn logout(&self) -> ApplicationResult<()> {
        let _transition = self.transitions.lock().await;
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if let Err(err) = self.store.clear().await {
            return Err(self.fail("could not clear credential", err));
        }
        let dropped = self.cache.invalidate_all();
        info!(dropped, "signed out");
        self.publish(|snapshot| {
            snapshot.state = SessionState::Anonymous;
            snapshot.error = None;
        });
        Ok(())
    }

    /// Cached read of `path`.
    ///
    /// A backend 401 signs the session out before this returns.
    ///
    /// # Errors
    ///
    /// Returns the gateway error. Under [`UnauthorizedPolicy::Fail`] a backend
    /// 401 is [`ApplicationError::AuthorizationExpired`].
    pub async fn query(
        &self,
        path: &str,
        policy: UnauthorizedPolicy,
    ) -> ApplicationResult<Option<Value>> {
        self.cache
            .get_or_fetch(path, move || async move {
                match self.gateway.query_fetch(path, policy).await {
                    Ok(Fetched::Data(value)) => Ok(Some(value)),
                    Ok(Fetched::Unauthorized) => {
                        self.expire().await;
                        Ok(None)
                    }
                    Err(ApplicationError::AuthorizationExpired) => {
                        self.expire().await;
                        Err(ApplicationError::AuthorizationExpired)
                    }
                    Err(err) => Err(err),
                }
            })
            .await
    }

    /// Cached read of `path` decoded as `T`. A `null` body is `None`.
    ///
    /// # Errors
    ///
    /// As [`SessionController::query`], plus [`ApplicationError::Decode`]
    /// if the body does not match `T`.
    pub async fn query_as<T: DeserializeOwned>(
        &self,
        path: &str,
        policy: UnauthorizedPolicy,
    ) -> ApplicationResult<Option<T>> {
        self.query(path, policy)
            .await?
            .filter(|value| !value.is_null())
            .map(serde_json::from_value)
            .transpose()
            .map_err(|e| ApplicationError::Decode(e.to_string()))
    }

    /// Cached read of a portal resource from its well-known path.
    ///
    /// # Errors
    ///
    /// As [`SessionController::query_as`].
    pub async fn fetch_resource<R: PortalResource>(
        &self,
        policy: UnauthorizedPolicy,
    ) -> ApplicationResult<Option<R>> {
        self.query_as(R::PATH, policy).await
    }

    /// Saves a scrapbook entry and drops the cached scrapbook lists.
    ///
    /// # Errors
    ///
    /// Returns the gateway error; the cache is left untouched in that case.
    pub async fn create_scrapbook_entry(
        &self,
        entry: &NewScrapbookEntry,
    ) -> ApplicationResult<Option<String>> {
        let message = self.gateway.create_scrapbook_entry(entry).await?;
        info!(title = %entry.title, "created scrapbook entry");
        self.invalidate_scrapbook();
        Ok(message)
    }

    /// Deletes a scrapbook entry and drops the cached scrapbook lists.
    ///
    /// # Errors
    ///
    /// Returns the gateway error; the cache is left untouched in that case.
    pub async fn delete_scrapbook_entry(&self, id: i64) -> ApplicationResult<Option<String>> {
        let message = self.gateway.delete_scrapbook_entry(id).await?;
        info!(id, "deleted scrapbook entry");
        self.invalidate_scrapbook();
        Ok(message)
    }

    /// Registers `callback` for every state change.
    pub fn subscribe(
        &self,
        callback: impl Fn(&SessionSnapshot) + Send + Sync + 'static,
    ) -> Subscription {
        self.observers.subscribe(callback)
    }

    /// Returns the controller to its freshly constructed state.
    ///
    /// Clears the store, the cache and every observer, and puts the state back
    /// to `Initializing`.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the credential could not be removed.
    pub async fn reset(&self) -> ApplicationResult<()> {
        let _transition = self.transitions.lock().await;
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.store.clear().await?;
        self.cache.invalidate_all();
        self.observers.clear();
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) =
            SessionSnapshot::default();
        debug!("session reset");
        Ok(())
    }

    /// Forced logout after the backend rejected the credential.
    ///
    /// The gateway has already cleared the store. If it kept a newer
    /// credential instead, the session stays signed in.
    async fn expire(&self) {
        let _transition = self.transitions.lock().await;
        if !self.snapshot().state.is_authenticated() || self.store.load().await.is_some() {
            return;
        }
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.cache.invalidate_all();
        warn!("credential rejected by the backend, signed out");
        self.publish(|snapshot| {
            snapshot.state = SessionState::Anonymous;
            snapshot.error = Some(ApplicationError::AuthorizationExpired.user_message());
        });
    }

    fn invalidate_scrapbook(&self) {
        self.cache.invalidate(MyScrapbookEntries::PATH);
        self.cache.invalidate(PublicScrapbookEntries::PATH);
    }

    fn fail(&self, action: &str, err: ApplicationError) -> ApplicationError {
        warn!(error = %err, "{action}");
        let message = err.user_message();
        self.publish(|snapshot| snapshot.error = Some(message));
        err
    }

    fn publish(&self, update: impl FnOnce(&mut SessionSnapshot)) -> SessionSnapshot {
        let snapshot = {
            let mut current = self.snapshot.write().unwrap_or_else(PoisonError::into_inner);
            update(&mut current);
            current.clone()
        };
        self.observers.notify(&snapshot);
        snapshot
    }
}
