//! Event bus - typed change notifications for observers
//!
//! Subscribers are registered with a [`SubscriberScope`]: session-scoped
//! sinks (mission tracking, statistics) live until they unsubscribe, while
//! round-scoped sinks (presentation bound to one board) are dropped when
//! the round ends. Sinks only observe; nothing they do feeds back into the
//! core.

use std::fmt;

use triple_tray_types::CoreEvent;

/// Receiver of core events
pub trait EventSink {
    fn on_event(&mut self, event: &CoreEvent);
}

impl<F> EventSink for F
where
    F: FnMut(&CoreEvent),
{
    fn on_event(&mut self, event: &CoreEvent) {
        self(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubscriberScope {
    Session,
    Round,
}

struct Subscriber {
    id: SubscriberId,
    scope: SubscriberScope,
    sink: Box<dyn EventSink>,
}

#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Subscriber>,
    next_id: u32,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a sink; delivery follows registration order
    pub fn subscribe(&mut self, scope: SubscriberScope, sink: Box<dyn EventSink>) -> SubscriberId {
        let id = SubscriberId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.subscribers.push(Subscriber { id, scope, sink });
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriberId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|s| s.id != id);
        self.subscribers.len() != before
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    pub fn publish(&mut self, event: &CoreEvent) {
        for subscriber in &mut self.subscribers {
            subscriber.sink.on_event(event);
        }
    }

    /// Drop every round-scoped subscriber
    pub fn end_round(&mut self) {
        self.subscribers.retain(|s| s.scope != SubscriberScope::Round);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<CoreEvent>>>, Box<dyn EventSink>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink_log = Rc::clone(&log);
        let sink: Box<dyn EventSink> = Box::new(move |e: &CoreEvent| sink_log.borrow_mut().push(*e));
        (log, sink)
    }

    #[test]
    fn test_publish_reaches_all_subscribers() {
        let mut bus = EventBus::new();
        let (a, sink_a) = recorder();
        let (b, sink_b) = recorder();
        bus.subscribe(SubscriberScope::Session, sink_a);
        bus.subscribe(SubscriberScope::Round, sink_b);

        bus.publish(&CoreEvent::TrayFull);
        assert_eq!(a.borrow().as_slice(), &[CoreEvent::TrayFull]);
        assert_eq!(b.borrow().as_slice(), &[CoreEvent::TrayFull]);
    }

    #[test]
    fn test_end_round_drops_round_scope() {
        let mut bus = EventBus::new();
        let (session, sink_a) = recorder();
        let (round, sink_b) = recorder();
        bus.subscribe(SubscriberScope::Session, sink_a);
        bus.subscribe(SubscriberScope::Round, sink_b);

        bus.end_round();
        bus.publish(&CoreEvent::BoardChanged);
        assert_eq!(session.borrow().len(), 1);
        assert!(round.borrow().is_empty());
        assert_eq!(bus.len(), 1);
    }

    #[test]
    fn test_unsubscribe() {
        let mut bus = EventBus::new();
        let (log, sink) = recorder();
        let id = bus.subscribe(SubscriberScope::Session, sink);
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        bus.publish(&CoreEvent::TrayChanged);
        assert!(log.borrow().is_empty());
    }
}
