//! Credential injection for outgoing requests.

use std::sync::Arc;

use cityportal_domain::request::AUTHORIZATION;
use cityportal_domain::{BackendScope, HttpRequest};
use tracing::debug;
use url::Url;

use super::SessionStore;

/// Attaches the stored credential to authenticated-backend requests.
///
/// Requests outside the [`BackendScope`] allow-list are sent untouched, even
/// when a token is stored.
pub struct RequestAuthenticator {
    scope: BackendScope,
    store: Arc<SessionStore>,
}

impl RequestAuthenticator {
    /// Creates an authenticator for `scope` reading from `store`.
    #[must_use]
    pub const fn new(scope: BackendScope, store: Arc<SessionStore>) -> Self {
        Self { scope, store }
    }

    /// The backend scope in use.
    #[must_use]
    pub const fn scope(&self) -> &BackendScope {
        &self.scope
    }

    /// Returns true if `url` belongs to the authenticated backend.
    #[must_use]
    pub fn is_backend(&self, url: &Url) -> bool {
        self.scope.contains(url)
    }

    /// Adds the `Authorization` header when `request` targets the backend
    /// and a credential is stored.
    pub async fn authenticate(&self, mut request: HttpRequest) -> HttpRequest {
        if !self.is_backend(&request.url) {
            debug!(url = %request.url, "outside backend scope, sending without credentials");
            return request;
        }
        if let Some(value) = self.store.authorization_header_value().await {
            request.set_header(AUTHORIZATION, value);
        }
        request
    }
}
