//! Mutation notifications. Views subscribe to the bus and re-fetch only when a
//! list actually changed, instead of watching a shared toggle.

use tokio::sync::broadcast;
use tracing::trace;

/// Events buffered per subscriber before the slowest one starts lagging.
const EVENT_CAPACITY: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEvent {
    Created { list_id: String },
    Updated { list_id: String },
    Deleted { list_id: String },
    EntryAdded { list_id: String, entry_id: String },
    EntryRemoved { list_id: String, entry_id: String },
}

impl ListEvent {
    /// The list the mutation touched.
    pub fn list_id(&self) -> &str {
        match self {
            ListEvent::Created { list_id }
            | ListEvent::Updated { list_id }
            | ListEvent::Deleted { list_id }
            | ListEvent::EntryAdded { list_id, .. }
            | ListEvent::EntryRemoved { list_id, .. } => list_id,
        }
    }
}

/// Broadcast of [`ListEvent`]s. Cloning the bus shares the channel; receivers
/// only see events published after they subscribed.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ListEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        let (tx, _) = broadcast::channel(EVENT_CAPACITY);
        Self { tx }
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ListEvent> {
        self.tx.subscribe()
    }

    /// Deliver `event` to every live subscriber. With nobody listening the
    /// event is simply dropped.
    pub fn publish(&self, event: ListEvent) {
        trace!(list_id = event.list_id(), ?event, "publishing list event");
        if self.tx.send(event).is_err() {
            trace!("no list event subscribers");
        }
    }
}
