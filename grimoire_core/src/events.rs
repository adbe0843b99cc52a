//! Typed engine events and their dispatch.
//!
//! The engine broadcasts state transitions to any number of registered
//! listeners. Delivery is synchronous and in registration order, which
//! gives in-order delivery per event kind per spell for free under the
//! single-threaded host model.

use crate::types::{School, SpellId};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Events emitted on engine state transitions
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineEvent {
    /// XP was actually applied to a spell (zero-grants are silent)
    XpGained {
        spell: SpellId,
        source: String,
        amount: f64,
    },
    /// A spell's accumulated XP reached its required XP
    SpellMastered { school: School, spell: SpellId },
    /// The host granted a spell directly, bypassing the ledger
    EarlyGranted { spell: SpellId },
    /// A school's learning target was set or cleared
    TargetChanged {
        school: School,
        target: Option<SpellId>,
    },
    /// Progress crossed a configured milestone percent, ascending
    MilestoneReached { spell: SpellId, percent: u8 },
    /// A new XP source descriptor was created
    SourceRegistered { source: String },
}

/// Handle returned from [`Dispatcher::subscribe`], used to unsubscribe
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

type Listener = Box<dyn FnMut(&EngineEvent)>;

/// Observer registry for engine events
#[derive(Default)]
pub struct Dispatcher {
    listeners: Vec<(ListenerId, Listener)>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener; it receives every subsequent event
    pub fn subscribe<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(&EngineEvent) + 'static,
    {
        let id = ListenerId(Uuid::new_v4());
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns false if the id is not registered.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(lid, _)| *lid != id);
        self.listeners.len() != before
    }

    /// Deliver an event to every listener, in registration order
    pub fn emit(&mut self, event: EngineEvent) {
        tracing::debug!("Event: {:?}", event);
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_events_reach_all_listeners_in_order() {
        let mut dispatcher = Dispatcher::new();
        let seen: Rc<RefCell<Vec<(u8, EngineEvent)>>> = Rc::default();

        for tag in [1u8, 2] {
            let seen = Rc::clone(&seen);
            dispatcher.subscribe(move |event| {
                seen.borrow_mut().push((tag, event.clone()));
            });
        }

        dispatcher.emit(EngineEvent::SourceRegistered {
            source: "training".into(),
        });

        let seen = seen.borrow();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0, 1);
        assert_eq!(seen[1].0, 2);
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let mut dispatcher = Dispatcher::new();
        let count = Rc::new(RefCell::new(0));

        let id = {
            let count = Rc::clone(&count);
            dispatcher.subscribe(move |_| *count.borrow_mut() += 1)
        };

        dispatcher.emit(EngineEvent::EarlyGranted { spell: SpellId(1) });
        assert!(dispatcher.unsubscribe(id));
        assert!(!dispatcher.unsubscribe(id));
        dispatcher.emit(EngineEvent::EarlyGranted { spell: SpellId(1) });

        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_event_serializes_with_kind_tag() {
        let event = EngineEvent::MilestoneReached {
            spell: SpellId(0x12),
            percent: 50,
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("\"kind\":\"milestone_reached\""));
    }
}
