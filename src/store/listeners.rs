//! Change listeners for the local store.
//!
//! Listeners take no arguments; they are told that something changed and
//! re-read whatever they display.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tracing::debug;

use super::lock::mutex_lock;

const SOURCE: &str = "store::listeners";

type Listener = Arc<dyn Fn() + Send + Sync>;

struct Entry {
    id: u64,
    active: Arc<AtomicBool>,
    listener: Listener,
}

#[derive(Default)]
struct Registry {
    entries: Mutex<Vec<Entry>>,
    next_id: AtomicU64,
}

impl Registry {
    fn remove(&self, id: u64) {
        mutex_lock(&self.entries, SOURCE, "remove").retain(|entry| entry.id != id);
    }
}

/// Ordered set of listeners shared by every collection of a store.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    inner: Arc<Registry>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let active = Arc::new(AtomicBool::new(true));
        mutex_lock(&self.inner.entries, SOURCE, "subscribe").push(Entry {
            id,
            active: Arc::clone(&active),
            listener: Arc::new(listener),
        });
        debug!(listener_id = id, "listener subscribed");

        Subscription {
            id,
            active,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Invoke every active listener once, in registration order.
    ///
    /// The listener list is copied before the round starts, so listeners may
    /// subscribe or unsubscribe without deadlocking. A listener unsubscribed
    /// during the round is skipped if it has not run yet. Returns the number
    /// of listeners invoked.
    pub fn notify(&self) -> usize {
        let snapshot: Vec<(Arc<AtomicBool>, Listener)> =
            mutex_lock(&self.inner.entries, SOURCE, "notify")
                .iter()
                .map(|entry| (Arc::clone(&entry.active), Arc::clone(&entry.listener)))
                .collect();

        let mut invoked = 0;
        for (active, listener) in snapshot {
            if active.load(Ordering::Acquire) {
                listener();
                invoked += 1;
            }
        }
        invoked
    }

    pub fn len(&self) -> usize {
        mutex_lock(&self.inner.entries, SOURCE, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

/// Handle returned by `subscribe`. Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes the listener immediately"]
#[derive(Debug)]
pub struct Subscription {
    id: u64,
    active: Arc<AtomicBool>,
    registry: Weak<Registry>,
}

impl Subscription {
    /// Stop receiving notifications. Calling it more than once is a no-op.
    pub fn unsubscribe(&self) {
        if !self.active.swap(false, Ordering::AcqRel) {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self.id);
        }
        debug!(listener_id = self.id, "listener unsubscribed");
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}
