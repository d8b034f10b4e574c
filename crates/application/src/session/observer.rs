//! Change notification for session state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use cityportal_domain::SessionSnapshot;

type Callback = Arc<dyn Fn(&SessionSnapshot) + Send + Sync>;

/// Registered session observers.
#[derive(Default)]
pub(crate) struct Observers {
    next_id: AtomicU64,
    callbacks: Mutex<Vec<(u64, Callback)>>,
}

impl Observers {
    pub(crate) fn subscribe(
        self: &Arc<Self>,
        callback: impl Fn(&SessionSnapshot) + Send + Sync + 'static,
    ) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.lock().push((id, Arc::new(callback)));
        Subscription {
            id,
            observers: Some(Arc::downgrade(self)),
        }
    }

    /// Calls every observer with `snapshot`.
    ///
    /// The list is copied first so a callback may subscribe or unsubscribe.
    pub(crate) fn notify(&self, snapshot: &SessionSnapshot) {
        let callbacks: Vec<Callback> = self
            .lock()
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in callbacks {
            callback(snapshot);
        }
    }

    pub(crate) fn clear(&self) {
        self.lock().clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    fn remove(&self, id: u64) {
        self.lock().retain(|(existing, _)| *existing != id);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<(u64, Callback)>> {
        self.callbacks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle returned by [`SessionController::subscribe`].
///
/// The callback stays registered until the handle is dropped or
/// [`Subscription::unsubscribe`] is called.
///
/// [`SessionController::subscribe`]: super::SessionController::subscribe
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct Subscription {
    id: u64,
    observers: Option<Weak<Observers>>,
}

impl Subscription {
    /// Detaches the callback.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Keeps the callback registered for the life of the controller.
    pub fn detach(mut self) {
        self.observers = None;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(observers) = self.observers.take().and_then(|weak| weak.upgrade()) {
            observers.remove(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
