//! In-memory port fakes shared by the unit tests of this crate.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use cityportal_domain::{BackendScope, HttpMethod, HttpRequest, HttpResponse};
use tokio::sync::Notify;

use crate::ports::{HttpClient, HttpClientError, KeyValueStore, StorageError};

pub fn scope() -> BackendScope {
    BackendScope::parse("http://portal.test", ["/api/", "/auth/"]).unwrap()
}

#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<BTreeMap<String, String>>,
    fail_writes: AtomicBool,
    clears: AtomicUsize,
}

impl MemoryStorage {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn insert_raw(&self, key: &str, value: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn raw(&self, key: &str) -> Option<String> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `remove_many` calls, i.e. credential clears.
    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }

    fn check_writable(&self) -> Result<(), StorageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(StorageError::Unavailable("quota exceeded".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStorage {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.raw(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        self.insert_raw(key, value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.check_writable()?;
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    async fn remove_many(&self, keys: &[&str]) -> Result<(), StorageError> {
        self.check_writable()?;
        self.clears.fetch_add(1, Ordering::SeqCst);
        let mut entries = self.entries.lock().unwrap();
        for key in keys {
            entries.remove(*key);
        }
        Ok(())
    }
}

#[derive(Clone)]
struct Route {
    status: u16,
    body: String,
    gate: Option<Arc<Notify>>,
}

/// Scripted HTTP transport keyed by method and absolute URL.
#[derive(Default)]
pub struct StubHttpClient {
    routes: Mutex<HashMap<(HttpMethod, String), Route>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl StubHttpClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn respond(&self, method: HttpMethod, url: &str, status: u16, body: &str) {
        self.routes.lock().unwrap().insert(
            (method, url.to_string()),
            Route {
                status,
                body: body.to_string(),
                gate: None,
            },
        );
    }

    /// Like `respond`, but the response is held until the returned gate is
    /// notified.
    pub fn respond_gated(
        &self,
        method: HttpMethod,
        url: &str,
        status: u16,
        body: &str,
    ) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.routes.lock().unwrap().insert(
            (method, url.to_string()),
            Route {
                status,
                body: body.to_string(),
                gate: Some(Arc::clone(&gate)),
            },
        );
        gate
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url.as_str() == url)
            .count()
    }
}

#[async_trait]
impl HttpClient for StubHttpClient {
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, HttpClientError> {
        self.requests.lock().unwrap().push(request.clone());
        let route = self
            .routes
            .lock()
            .unwrap()
            .get(&(request.method, request.url.to_string()))
            .cloned();
        let Some(route) = route else {
            return Err(HttpClientError::ConnectionFailed(format!(
                "no route for {} {}",
                request.method, request.url
            )));
        };
        if let Some(gate) = route.gate {
            gate.notified().await;
        }
        Ok(HttpResponse::new(route.status, route.body))
    }
}

pub const ALICE_LOGIN: &str = r#"{"token":"abc","type":"Bearer","id":7,"username":"alice","email":"a@x.com","name":"Alice","roles":["ROLE_USER"]}"#;

pub const ADMIN_LOGIN: &str = r#"{"token":"root-token","type":"Bearer","id":1,"username":"root","email":"root@x.com","name":"Root","roles":["ROLE_USER","ROLE_ADMIN"]}"#;
