//! API gateway: HTTP calls with uniform failure handling.

use std::sync::Arc;

use cityportal_domain::request::AUTHORIZATION;
use cityportal_domain::{
    HttpMethod, HttpRequest, HttpResponse, LoginRequest, LoginResponse, NewScrapbookEntry,
    RegisterRequest, SCRAPBOOK_PATH,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ApplicationError, ApplicationResult};
use crate::ports::HttpClient;
use crate::session::{RequestAuthenticator, SessionStore};

/// Path of the login endpoint.
pub const LOGIN_PATH: &str = "/auth/login";
/// Path of the registration endpoint.
pub const REGISTER_PATH: &str = "/auth/register";

/// What a read does when the backend answers 401.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnauthorizedPolicy {
    /// Resolve to "no data".
    Tolerate,
    /// Fail with [`ApplicationError::AuthorizationExpired`].
    #[default]
    Fail,
}

/// Result of a successful [`ApiGateway::query_fetch`].
#[derive(Debug, Clone, PartialEq)]
pub enum Fetched {
    /// The decoded JSON body; an empty body decodes as `null`.
    Data(Value),
    /// The backend answered 401 under [`UnauthorizedPolicy::Tolerate`].
    Unauthorized,
}

/// Issues requests against the backend.
pub struct ApiGateway {
    client: Arc<dyn HttpClient>,
    authenticator: RequestAuthenticator,
    store: Arc<SessionStore>,
}

impl ApiGateway {
    /// Creates a gateway.
    #[must_use]
    pub const fn new(
        client: Arc<dyn HttpClient>,
        authenticator: RequestAuthenticator,
        store: Arc<SessionStore>,
    ) -> Self {
        Self {
            client,
            authenticator,
            store,
        }
    }

    /// The authenticator used for outgoing requests.
    #[must_use]
    pub const fn authenticator(&self) -> &RequestAuthenticator {
        &self.authenticator
    }

    /// Sends a request and fails on any non-2xx status.
    ///
    /// `path` may be a backend path or an absolute URL.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::Network`] if no response arrived and
    /// [`ApplicationError::Request`] for a failure status.
    pub async fn request<B>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> ApplicationResult<HttpResponse>
    where
        B: Serialize + ?Sized + Sync,
    {
        let (_, response) = self.send(method, path, body).await?;
        ensure_success(response)
    }

    /// Read path used by the query cache.
    ///
    /// A 401 from the backend clears the session store before this returns,
    /// then resolves or fails according to `policy`. A 401 from any other
    /// origin is an ordinary request error.
    ///
    /// # Errors
    ///
    /// Returns [`ApplicationError::AuthorizationExpired`] for a backend 401
    /// under [`UnauthorizedPolicy::Fail`], and the usual request errors
    /// otherwise.
    pub async fn query_fetch(
        &self,
        path: &str,
        policy: UnauthorizedPolicy,
    ) -> ApplicationResult<Fetched> {
        let (request, response) = self.send::<()>(HttpMethod::Get, path, None).await?;

        if response.status.is_unauthorized() && self.authenticator.is_backend(&request.url) {
            let sent = request.header(AUTHORIZATION);
            if self.store.clear_if_current(sent).await? {
                warn!(url = %request.url, "backend rejected the credential, session cleared");
            }
            return match policy {
                UnauthorizedPolicy::Tolerate => Ok(Fetched::Unauthorized),
                UnauthorizedPolicy::Fail => Err(ApplicationError::AuthorizationExpired),
            };
        }

        let response = ensure_success(response)?;
        decode_json(&response).map(Fetched::Data)
    }

    /// Calls the login endpoint.
    ///
    /// # Errors
    ///
    /// Returns the request error for rejected credentials, or
    /// [`ApplicationError::Decode`] for an unexpected body.
    pub async fn login(&self, credentials: &LoginRequest) -> ApplicationResult<LoginResponse> {
        let response = self
            .request(HttpMethod::Post, LOGIN_PATH, Some(credentials))
            .await?;
        decode_json(&response)
    }

    /// Calls the registration endpoint.
    ///
    /// Any 2xx response counts as success. Returns the server's `message`
    /// field, or the body text, when one was sent.
    ///
    /// # Errors
    ///
    /// Returns the request error if the server rejected the registration.
    pub async fn register(&self, fields: &RegisterRequest) -> ApplicationResult<Option<String>> {
        self.submit(HttpMethod::Post, REGISTER_PATH, Some(fields)).await
    }

    /// Saves a new scrapbook entry for the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns the request error if the backend refused the entry.
    pub async fn create_scrapbook_entry(
        &self,
        entry: &NewScrapbookEntry,
    ) -> ApplicationResult<Option<String>> {
        self.submit(HttpMethod::Post, SCRAPBOOK_PATH, Some(entry)).await
    }

    /// Deletes one of the signed-in user's scrapbook entries.
    ///
    /// # Errors
    ///
    /// Returns the request error, e.g. 403 for another user's entry.
    pub async fn delete_scrapbook_entry(&self, id: i64) -> ApplicationResult<Option<String>> {
        self.submit::<()>(HttpMethod::Delete, &format!("{SCRAPBOOK_PATH}/{id}"), None)
            .await
    }

    /// Sends a write and returns the confirmation message, if any.
    async fn submit<B>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> ApplicationResult<Option<String>>
    where
        B: Serialize + ?Sized + Sync,
    {
        let response = self.request(method, path, body).await?;
        Ok(confirmation(&response))
    }

    async fn send<B>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<&B>,
    ) -> ApplicationResult<(HttpRequest, HttpResponse)>
    where
        B: Serialize + ?Sized + Sync,
    {
        let url = self.authenticator.scope().resolve(path)?;
        let mut request = HttpRequest::new(method, url);
        if let Some(body) = body {
            let bytes =
                serde_json::to_vec(body).map_err(|e| ApplicationError::Decode(e.to_string()))?;
            request = request.with_json_body(bytes);
        }
        let request = self.authenticator.authenticate(request).await;

        debug!(method = %request.method, url = %request.url, "sending request");
        let response = self.client.execute(&request).await?;
        debug!(status = response.status.as_u16(), url = %request.url, "received response");

        Ok((request, response))
    }
}

fn ensure_success(response: HttpResponse) -> ApplicationResult<HttpResponse> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(ApplicationError::Request {
            status_code: response.status.as_u16(),
            message: response.failure_message(),
        })
    }
}

/// The `message` field of a JSON body, else the trimmed body text.
fn confirmation(response: &HttpResponse) -> Option<String> {
    let text = response.text();
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    let message = serde_json::from_str::<Value>(text)
        .ok()
        .and_then(|body| body.get("message").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| text.to_string());
    Some(message)
}

fn decode_json<T: DeserializeOwned>(response: &HttpResponse) -> ApplicationResult<T> {
    let body: &[u8] = if response.body.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        &response.body
    };
    serde_json::from_slice(body).map_err(|e| ApplicationError::Decode(e.to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::ports::KeyValueStore;
    use crate::testing::{ALICE_LOGIN, MemoryStorage, StubHttpClient, scope};
    use cityportal_domain::CredentialRecord;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    struct Fixture {
        http: Arc<StubHttpClient>,
        storage: Arc<MemoryStorage>,
        store: Arc<SessionStore>,
        gateway: ApiGateway,
    }

    fn fixture() -> Fixture {
        let http = StubHttpClient::new();
        let storage = MemoryStorage::new();
        let store = Arc::new(SessionStore::new(
            Arc::clone(&storage) as Arc<dyn KeyValueStore>
        ));
        let gateway = ApiGateway::new(
            Arc::clone(&http) as Arc<dyn HttpClient>,
            RequestAuthenticator::new(scope(), Arc::clone(&store)),
            Arc::clone(&store),
        );
        Fixture {
            http,
            storage,
            store,
            gateway,
        }
    }

    async fn sign_in(store: &SessionStore) {
        let response: LoginResponse = serde_json::from_str(ALICE_LOGIN).unwrap();
        let record = CredentialRecord::from_login_response(response).unwrap();
        store.save(&record).await.unwrap();
    }

    #[tokio::test]
    async fn test_request_sends_json_body() {
        let f = fixture();
        f.http
            .respond(HttpMethod::Post, "http://portal.test/api/scrapbook", 201, "{}");

        f.gateway
            .request(
                HttpMethod::Post,
                "/api/scrapbook",
                Some(&json!({"title": "Lake", "content": "Sunset"})),
            )
            .await
            .unwrap();

        let sent = &f.http.requests()[0];
        assert_eq!(sent.header("content-type"), Some("application/json"));
        let body: Value = serde_json::from_slice(sent.body.as_ref().unwrap()).unwrap();
        assert_eq!(body["title"], "Lake");
    }

    #[tokio::test]
    async fn test_failure_message_from_body_or_status_text() {
        let f = fixture();
        f.http.respond(
            HttpMethod::Get,
            "http://portal.test/api/users",
            403,
            "Access is denied",
        );
        f.http
            .respond(HttpMethod::Get, "http://portal.test/api/traffic", 503, "");

        let err = f
            .gateway
            .request::<()>(HttpMethod::Get, "/api/users", None)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Request { status_code: 403, ref message } if message == "Access is denied"
        ));

        let err = f
            .gateway
            .request::<()>(HttpMethod::Get, "/api/traffic", None)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "503: Service Unavailable");
    }

    #[tokio::test]
    async fn test_transport_failure_is_network_error() {
        let f = fixture();
        let err = f
            .gateway
            .request::<()>(HttpMethod::Get, "/api/unrouted", None)
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::Network(_)));
    }

    #[tokio::test]
    async fn test_query_fetch_decodes_json() {
        let f = fixture();
        f.http.respond(
            HttpMethod::Get,
            "http://portal.test/api/city-stats",
            200,
            r#"{"airQuality":"56"}"#,
        );
        let fetched = f
            .gateway
            .query_fetch("/api/city-stats", UnauthorizedPolicy::Fail)
            .await
            .unwrap();
        assert_eq!(fetched, Fetched::Data(json!({"airQuality": "56"})));
    }

    #[tokio::test]
    async fn test_backend_401_clears_store_once_then_tolerates() {
        let f = fixture();
        sign_in(&f.store).await;
        f.http
            .respond(HttpMethod::Get, "http://portal.test/api/user", 401, "");

        let fetched = f
            .gateway
            .query_fetch("/api/user", UnauthorizedPolicy::Tolerate)
            .await
            .unwrap();

        assert_eq!(fetched, Fetched::Unauthorized);
        assert_eq!(f.storage.clears(), 1);
        assert!(f.store.load().await.is_none());
    }

    #[tokio::test]
    async fn test_backend_401_fails_with_expired_under_fail_policy() {
        let f = fixture();
        sign_in(&f.store).await;
        f.http
            .respond(HttpMethod::Get, "http://portal.test/api/activities", 401, "");

        let err = f
            .gateway
            .query_fetch("/api/activities", UnauthorizedPolicy::Fail)
            .await
            .unwrap_err();

        assert!(matches!(err, ApplicationError::AuthorizationExpired));
        assert!(f.store.load().await.is_none());
    }

    #[tokio::test]
    async fn test_third_party_401_does_not_clear_store() {
        let f = fixture();
        sign_in(&f.store).await;
        f.http.respond(
            HttpMethod::Get,
            "https://tiles.example.com/api/tile.png",
            401,
            "key required",
        );

        let err = f
            .gateway
            .query_fetch(
                "https://tiles.example.com/api/tile.png",
                UnauthorizedPolicy::Tolerate,
            )
            .await
            .unwrap_err();

        assert_eq!(err.status_code(), Some(401));
        assert_eq!(f.storage.clears(), 0);
        assert!(f.store.load().await.is_some());
        assert_eq!(f.http.requests()[0].header(AUTHORIZATION), None);
    }

    #[tokio::test]
    async fn test_login_decodes_jwt_response() {
        let f = fixture();
        f.http
            .respond(HttpMethod::Post, "http://portal.test/auth/login", 200, ALICE_LOGIN);

        let response = f
            .gateway
            .login(&LoginRequest::new("alice", "secret"))
            .await
            .unwrap();

        assert_eq!(response.token, "abc");
        let body: Value =
            serde_json::from_slice(f.http.requests()[0].body.as_ref().unwrap()).unwrap();
        assert_eq!(body, json!({"username": "alice", "password": "secret"}));
    }

    #[tokio::test]
    async fn test_register_is_permissive_about_body() {
        let f = fixture();
        f.http.respond(
            HttpMethod::Post,
            "http://portal.test/auth/register",
            200,
            r#"{"message":"User registered successfully!"}"#,
        );
        let fields = RegisterRequest::new("bob", "b@x.com", "pw", "Bob");
        assert_eq!(
            f.gateway.register(&fields).await.unwrap().as_deref(),
            Some("User registered successfully!")
        );

        f.http
            .respond(HttpMethod::Post, "http://portal.test/auth/register", 201, "");
        assert_eq!(f.gateway.register(&fields).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_scrapbook_writes_are_authenticated() {
        let f = fixture();
        sign_in(&f.store).await;
        f.http.respond(
            HttpMethod::Post,
            "http://portal.test/api/scrapbook",
            200,
            r#"{"message":"Entry created successfully!"}"#,
        );
        f.http.respond(
            HttpMethod::Delete,
            "http://portal.test/api/scrapbook/3",
            403,
            "Error: You don't have permission to delete this entry.",
        );

        let created = f
            .gateway
            .create_scrapbook_entry(&NewScrapbookEntry::new("Lake", "Sunset"))
            .await
            .unwrap();
        let err = f.gateway.delete_scrapbook_entry(3).await.unwrap_err();

        assert_eq!(created.as_deref(), Some("Entry created successfully!"));
        assert_eq!(err.status_code(), Some(403));
        let requests = f.http.requests();
        assert_eq!(requests[0].header("authorization"), Some("Bearer abc"));
        assert_eq!(requests[1].method, HttpMethod::Delete);
        assert_eq!(requests[1].header("authorization"), Some("Bearer abc"));
        assert_eq!(f.storage.clears(), 0);
    }
}
