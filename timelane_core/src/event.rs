//! Subscriber registry with a reserved default handler.
//!
//! The watchdog's jank channel follows a suppression contract: with zero
//! subscribers a built-in default handler fires on every event; as soon as
//! one subscriber exists, only subscribers fire and the default is
//! suppressed. Unsubscribing the last handler restores the default.

use parking_lot::Mutex;
use std::sync::{Arc, Weak};

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct HubInner<T> {
    next_id: u64,
    subscribers: Vec<(u64, Handler<T>)>,
    default: Option<Handler<T>>,
}

/// Explicit handler list plus one reserved default.
pub struct EventHub<T> {
    inner: Arc<Mutex<HubInner<T>>>,
}

impl<T> Clone for EventHub<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T> EventHub<T> {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(HubInner {
                next_id: 0,
                subscribers: Vec::new(),
                default: None,
            })),
        }
    }

    /// Create a hub whose default handler fires whenever no subscriber is
    /// registered.
    pub fn with_default(handler: impl Fn(&T) + Send + Sync + 'static) -> Self {
        let hub = Self::new();
        hub.inner.lock().default = Some(Arc::new(handler));
        hub
    }

    /// Register a subscriber. While at least one subscriber exists the
    /// default handler is suppressed.
    pub fn subscribe(&self, handler: impl Fn(&T) + Send + Sync + 'static) -> Subscription<T> {
        let mut inner = self.inner.lock();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.push((id, Arc::new(handler)));
        Subscription {
            hub: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// Deliver a payload to every subscriber, or to the default handler if
    /// no subscriber is registered.
    pub fn emit(&self, payload: &T) {
        // Collect under the lock, call outside it, so a handler may touch
        // the hub without deadlocking.
        let handlers: Vec<Handler<T>> = {
            let inner = self.inner.lock();
            if inner.subscribers.is_empty() {
                inner.default.iter().cloned().collect()
            } else {
                inner.subscribers.iter().map(|(_, h)| h.clone()).collect()
            }
        };
        for handler in handlers {
            handler(payload);
        }
    }

    /// Drop every subscriber; the default handler takes over again.
    pub fn clear(&self) {
        self.inner.lock().subscribers.clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }
}

impl<T> Default for EventHub<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Handle returned by [`EventHub::subscribe`]; removing it recomputes which
/// set of handlers fires.
pub struct Subscription<T> {
    hub: Weak<Mutex<HubInner<T>>>,
    id: u64,
}

impl<T> Subscription<T> {
    /// Remove this subscriber from the hub.
    pub fn unsubscribe(self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.lock().subscribers.retain(|(id, _)| *id != self.id);
        }
    }
}
