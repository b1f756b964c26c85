//! Ordered listener registry with snapshot dispatch.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use qse_core::events::ChannelEvent;
use qse_core::listener::{ChannelListener, ListenerId};

/// Insertion-ordered, duplicate-tolerant collection of channel listeners.
///
/// Dispatch takes a snapshot of the registration list and then iterates it
/// outside the lock, so a listener may add or remove listeners (including
/// itself) from within its own callback without corrupting the in-flight
/// cycle. A removal that completes before a dispatch cycle begins is
/// guaranteed to exclude that listener from the cycle; a removal racing an
/// in-progress cycle may still see one final event.
#[derive(Default)]
pub struct ListenerRegistry {
    entries: Mutex<Vec<(ListenerId, Arc<dyn ChannelListener>)>>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener at the end of the dispatch order.
    pub fn add(&self, listener: Arc<dyn ChannelListener>) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries
            .lock()
            .expect("listener registry lock poisoned")
            .push((id, listener));
        id
    }

    /// Remove the listener registered under `id`. Returns false when the id
    /// is unknown or was already removed.
    pub fn remove(&self, id: ListenerId) -> bool {
        let mut entries = self
            .entries
            .lock()
            .expect("listener registry lock poisoned");
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        entries.len() < before
    }

    /// Number of registered listeners.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .expect("listener registry lock poisoned")
            .len()
    }

    /// Whether no listeners are registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `event` to every registered listener, in registration order.
    pub fn notify(&self, event: &ChannelEvent) {
        let snapshot: Vec<(ListenerId, Arc<dyn ChannelListener>)> = self
            .entries
            .lock()
            .expect("listener registry lock poisoned")
            .clone();
        for (_, listener) in &snapshot {
            listener.on_event(event);
        }
    }
}
