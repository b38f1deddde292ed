//! Change notification
//!
//! Minimal observer list used by pages, shells and navigators to announce property changes
//! to the host. Callbacks run after the notifier's lock is released, so a callback may
//! subscribe, unsubscribe or read the source freely.

use parking_lot::Mutex;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Observable properties
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Property {
    View,
    Title,
    Icon,
    Result,
    Disposed,
    SelectedPage,
    CurrentPage,
    CanGoBack,
}

/// One change event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PropertyChanged {
    pub property: Property,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type Callback = Arc<dyn Fn(&PropertyChanged) + Send + Sync>;

#[derive(Default)]
pub struct Notifier {
    next_id: AtomicU64,
    subscribers: Mutex<Vec<(SubscriptionId, Callback)>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&PropertyChanged) + Send + Sync + 'static,
    {
        self.add(Arc::new(callback))
    }

    pub fn add(&self, callback: Callback) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.lock().push((id, callback));
        id
    }

    /// Returns whether the subscription existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = self.subscribers.lock();
        let before = subscribers.len();
        subscribers.retain(|(sid, _)| *sid != id);
        subscribers.len() != before
    }

    pub fn raise(&self, property: Property) {
        let snapshot: Vec<Callback> = self
            .subscribers
            .lock()
            .iter()
            .map(|(_, cb)| cb.clone())
            .collect();
        let event = PropertyChanged { property };
        for callback in snapshot {
            callback(&event);
        }
    }

    pub fn clear(&self) {
        self.subscribers.lock().clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.lock().len()
    }
}
