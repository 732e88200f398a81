/// History listeners and the event bus that feeds them.
use std::sync::Arc;

use quest_pad_core::{Edit, ListenerSet};

/// Observer of the edit history.
///
/// Callbacks run synchronously on the thread that changed the underlying
/// controller, in registration order.
pub trait EditHistoryListener: Send + Sync {
    fn on_added(&self, edit: &Edit);
    fn on_synced(&self, edit: &Edit);
    fn on_deleted(&self, edit: &Edit);
    /// Something changed in bulk; throw away any cached view and call
    /// `get_all()` again.
    fn on_invalidated(&self);
}

/// One relayed change, as seen by history listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum HistoryEvent {
    Added(Edit),
    Synced(Edit),
    Deleted(Edit),
    Invalidated,
}

/// Delivers history events to the registered listeners.
#[derive(Debug, Default)]
pub(crate) struct HistoryBus {
    listeners: ListenerSet<dyn EditHistoryListener>,
}

impl HistoryBus {
    pub(crate) fn emit(&self, event: &HistoryEvent) {
        let snapshot = self.listeners.snapshot();
        tracing::debug!(
            "Relaying {} to {} history listeners",
            event_name(event),
            snapshot.len()
        );
        for listener in snapshot.iter() {
            match event {
                HistoryEvent::Added(edit) => listener.on_added(edit),
                HistoryEvent::Synced(edit) => listener.on_synced(edit),
                HistoryEvent::Deleted(edit) => listener.on_deleted(edit),
                HistoryEvent::Invalidated => listener.on_invalidated(),
            }
        }
    }

    pub(crate) fn add(&self, listener: Arc<dyn EditHistoryListener>) {
        self.listeners.add(listener);
    }

    pub(crate) fn remove(&self, listener: &Arc<dyn EditHistoryListener>) -> bool {
        self.listeners.remove(listener)
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }
}

fn event_name(event: &HistoryEvent) -> &'static str {
    match event {
        HistoryEvent::Added(_) => "added",
        HistoryEvent::Synced(_) => "synced",
        HistoryEvent::Deleted(_) => "deleted",
        HistoryEvent::Invalidated => "invalidated",
    }
}
