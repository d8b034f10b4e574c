//! Query cache with request coalescing.
//!
//! Entries never go stale on their own and nothing is refreshed in the
//! background. The only way an entry leaves the cache is an explicit
//! [`QueryCache::invalidate`] or [`QueryCache::invalidate_all`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde_json::Value;
use tokio::sync::watch;
use tracing::debug;

use crate::error::ApplicationResult;

type Outcome = ApplicationResult<Option<Value>>;

#[derive(Debug)]
enum Slot {
    Ready(Option<Value>),
    InFlight {
        id: u64,
        outcome: watch::Receiver<Option<Outcome>>,
    },
}

enum Claim {
    Hit(Option<Value>),
    Join(watch::Receiver<Option<Outcome>>),
    Lead(u64, watch::Sender<Option<Outcome>>),
}

/// Read cache keyed by request path.
///
/// Concurrent reads of the same key share one fetch and all of them receive
/// its outcome, success or failure. Failed fetches are not cached. A fetch
/// that completes after its key was invalidated still answers its waiters but
/// is not stored.
#[derive(Debug, Default)]
pub struct QueryCache {
    slots: Mutex<HashMap<String, Slot>>,
    next_id: AtomicU64,
}

impl QueryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached value for `key`, running `fetch` if there is none.
    ///
    /// A caller that joins a fetch already in flight waits for it instead of
    /// running its own. If the caller driving that fetch is dropped, one of
    /// the waiters takes over.
    ///
    /// # Errors
    ///
    /// Returns the error of `fetch`; nothing is cached in that case.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F) -> ApplicationResult<Option<Value>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApplicationResult<Option<Value>>>,
    {
        loop {
            let mut outcome = match self.claim(key) {
                Claim::Hit(value) => {
                    debug!(key, "cache hit");
                    return Ok(value);
                }
                Claim::Lead(id, sender) => return self.lead(key, id, sender, fetch).await,
                Claim::Join(outcome) => outcome,
            };
            debug!(key, "joining fetch in flight");
            let shared = outcome
                .wait_for(Option::is_some)
                .await
                .ok()
                .and_then(|settled| settled.clone());
            if let Some(shared) = shared {
                return shared;
            }
            debug!(key, "fetch in flight was abandoned");
        }
    }

    /// Returns the cached value without fetching.
    ///
    /// The outer `Option` is `None` when nothing is cached for `key`.
    #[must_use]
    pub fn peek(&self, key: &str) -> Option<Option<Value>> {
        match self.lock().get(key) {
            Some(Slot::Ready(value)) => Some(value.clone()),
            _ => None,
        }
    }

    /// Drops the entry for `key`. Returns true if an entry existed.
    pub fn invalidate(&self, key: &str) -> bool {
        let removed = self.lock().remove(key).is_some();
        debug!(key, removed, "invalidated cache entry");
        removed
    }

    /// Drops every entry. Returns how many were dropped.
    pub fn invalidate_all(&self) -> usize {
        let mut slots = self.lock();
        let count = slots.len();
        slots.clear();
        debug!(count, "invalidated query cache");
        count
    }

    /// Number of keys with a cached value or a fetch in flight.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn claim(&self, key: &str) -> Claim {
        let mut slots = self.lock();
        match slots.get(key) {
            Some(Slot::Ready(value)) => Claim::Hit(value.clone()),
            Some(Slot::InFlight { outcome, .. }) => Claim::Join(outcome.clone()),
            None => {
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                let (sender, outcome) = watch::channel(None);
                slots.insert(key.to_string(), Slot::InFlight { id, outcome });
                Claim::Lead(id, sender)
            }
        }
    }

    async fn lead<F, Fut>(
        &self,
        key: &str,
        id: u64,
        sender: watch::Sender<Option<Outcome>>,
        fetch: F,
    ) -> Outcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Outcome>,
    {
        let mut lease = Lease {
            cache: self,
            key,
            id,
            settled: false,
        };
        let outcome = fetch().await;
        lease.settle(&outcome);
        sender.send_replace(Some(outcome.clone()));
        outcome
    }

    /// Replaces the in-flight slot `id` for `key`, if it is still current.
    fn finish(&self, key: &str, id: u64, value: Option<Option<Value>>) {
        let mut slots = self.lock();
        let current = matches!(
            slots.get(key),
            Some(Slot::InFlight { id: slot, .. }) if *slot == id
        );
        if !current {
            debug!(key, "fetch finished after invalidation, not stored");
            return;
        }
        match value {
            Some(value) => {
                slots.insert(key.to_string(), Slot::Ready(value));
            }
            None => {
                slots.remove(key);
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// The in-flight slot owned by the caller driving a fetch.
///
/// Dropped unsettled, it frees the slot so the next read starts over.
struct Lease<'a> {
    cache: &'a QueryCache,
    key: &'a str,
    id: u64,
    settled: bool,
}

impl Lease<'_> {
    fn settle(&mut self, outcome: &Outcome) {
        self.settled = true;
        let value = outcome.as_ref().ok().cloned();
        self.cache.finish(self.key, self.id, value);
    }
}

impl Drop for Lease<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.cache.finish(self.key, self.id, None);
        }
    }
}
