//! Composition root for the session core.

use std::sync::Arc;

use cityportal_domain::BackendScope;

use crate::cache::QueryCache;
use crate::error::ApplicationResult;
use crate::gateway::ApiGateway;
use crate::ports::{HttpClient, KeyValueStore};
use crate::session::{RequestAuthenticator, RouteGuard, SessionController, SessionStore};

/// Owns every session component. Construct one per process and pass it by
/// reference.
pub struct SessionContext {
    store: Arc<SessionStore>,
    gateway: Arc<ApiGateway>,
    cache: Arc<QueryCache>,
    session: SessionController,
}

impl SessionContext {
    /// Wires the components together. The session starts `Initializing`.
    #[must_use]
    pub fn new(
        scope: BackendScope,
        client: Arc<dyn HttpClient>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Self {
        let store = Arc::new(SessionStore::new(storage));
        let authenticator = RequestAuthenticator::new(scope, Arc::clone(&store));
        let gateway = Arc::new(ApiGateway::new(client, authenticator, Arc::clone(&store)));
        let cache = Arc::new(QueryCache::new());
        let session =
            SessionController::new(Arc::clone(&store), Arc::clone(&gateway), Arc::clone(&cache));
        Self {
            store,
            gateway,
            cache,
            session,
        }
    }

    /// Like [`SessionContext::new`], then restores the persisted session.
    pub async fn start(
        scope: BackendScope,
        client: Arc<dyn HttpClient>,
        storage: Arc<dyn KeyValueStore>,
    ) -> Self {
        let context = Self::new(scope, client, storage);
        context.session.restore().await;
        context
    }

    /// The session controller.
    #[must_use]
    pub const fn session(&self) -> &SessionController {
        &self.session
    }

    /// The credential store.
    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// The API gateway.
    #[must_use]
    pub fn gateway(&self) -> &ApiGateway {
        &self.gateway
    }

    /// The query cache.
    #[must_use]
    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    /// A route guard over the session.
    #[must_use]
    pub const fn guard(&self) -> RouteGuard<'_> {
        RouteGuard::new(&self.session)
    }

    /// Tears the session down to its initial state; used between test cases.
    ///
    /// # Errors
    ///
    /// Returns the storage error if the credential could not be removed.
    pub async fn reset(&self) -> ApplicationResult<()> {
        self.session.reset().await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::gateway::UnauthorizedPolicy;
    use crate::testing::{ALICE_LOGIN, MemoryStorage, StubHttpClient, scope};
    use cityportal_domain::{HttpMethod, SessionState};

    #[tokio::test]
    async fn test_start_restores_previous_session() {
        let http = StubHttpClient::new();
        http.respond(
            HttpMethod::Post,
            "http://portal.test/auth/login",
            200,
            ALICE_LOGIN,
        );
        let storage = MemoryStorage::new();

        let first = SessionContext::start(
            scope(),
            Arc::clone(&http) as Arc<dyn HttpClient>,
            Arc::clone(&storage) as Arc<dyn KeyValueStore>,
        )
        .await;
        first.session().login("alice", "secret").await.unwrap();
        drop(first);

        let second = SessionContext::start(
            scope(),
            Arc::clone(&http) as Arc<dyn HttpClient>,
            Arc::clone(&storage) as Arc<dyn KeyValueStore>,
        )
        .await;
        assert!(second.session().state().is_authenticated());
        assert_eq!(
            second.store().authorization_header_value().await.as_deref(),
            Some("Bearer abc")
        );
    }

    #[tokio::test]
    async fn test_reset_clears_everything() {
        let http = StubHttpClient::new();
        http.respond(
            HttpMethod::Get,
            "http://portal.test/api/services",
            200,
            "[]",
        );
        let storage = MemoryStorage::new();
        storage.insert_raw("jwt_token", "abc");
        let ctx = SessionContext::start(
            scope(),
            Arc::clone(&http) as Arc<dyn HttpClient>,
            Arc::clone(&storage) as Arc<dyn KeyValueStore>,
        )
        .await;
        ctx.session()
            .query("/api/services", UnauthorizedPolicy::Fail)
            .await
            .unwrap();

        ctx.reset().await.unwrap();

        assert!(ctx.cache().is_empty());
        assert!(storage.is_empty());
        assert_eq!(ctx.session().state(), SessionState::Initializing);
    }
}
