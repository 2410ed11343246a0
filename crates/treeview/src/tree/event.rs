//! Notifications raised by the tree

use crate::tree::node::NodeId;

/// One discrete notification per meaningful transition
///
/// Node identities are the ones valid at the moment the event was raised;
/// a later structural mutation may renumber them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The initial load started
    LoadingStarted,
    /// The initial load failed; nothing was built
    LoadingFailed { error: String },
    /// The initial load completed
    Initialized { nodes: Vec<NodeId> },
    /// The full render-ordered sequence was handed to the renderer
    Rendered { nodes: Vec<NodeId> },
    /// A node was included in a full render pass
    NodeRendered(NodeId),
    NodeChecked(NodeId),
    NodeUnchecked(NodeId),
    NodeSelected(NodeId),
    NodeUnselected(NodeId),
    NodeExpanded(NodeId),
    NodeCollapsed(NodeId),
    NodeDisabled(NodeId),
    NodeEnabled(NodeId),
    /// A search finished with these matches, in render order
    SearchComplete { results: Vec<NodeId> },
    /// The search flags were cleared on these nodes
    SearchCleared { cleared: Vec<NodeId> },
}

/// Fan-out of events to every live subscriber
#[derive(Debug, Default)]
pub(crate) struct EventBus {
    subscribers: Vec<flume::Sender<Event>>,
}

impl EventBus {
    pub(crate) fn subscribe(&mut self) -> flume::Receiver<Event> {
        let (tx, rx) = flume::unbounded();
        self.subscribers.push(tx);
        rx
    }

    /// Deliver `event`, dropping subscribers whose receiver is gone
    pub(crate) fn emit(&mut self, event: Event) {
        log::trace!("event: {:?}", event);
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    pub(crate) fn has_subscribers(&self) -> bool {
        !self.subscribers.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_out_and_drop() {
        let mut bus = EventBus::default();
        let first = bus.subscribe();
        let second = bus.subscribe();

        bus.emit(Event::LoadingStarted);
        assert_eq!(first.try_recv().unwrap(), Event::LoadingStarted);
        assert_eq!(second.try_recv().unwrap(), Event::LoadingStarted);

        drop(second);
        bus.emit(Event::LoadingStarted);
        assert!(bus.has_subscribers());
        assert_eq!(first.try_iter().count(), 1);

        drop(first);
        bus.emit(Event::LoadingStarted);
        assert!(!bus.has_subscribers());
    }
}
