//! In-memory journal of every published message.
//!
//! Attached to every kind before any other consumer, so entries appear
//! in the order the bus delivered them (depth-first for nested publishes).

use crate::{
    bus::{MessageBus, MessageHandler, Shared},
    event::{EventKind, EventLogEntry, SimEvent},
    types::Tick,
};
use std::{cell::RefCell, rc::Rc};

/// Source recorded for messages published outside any tick step.
pub const EXTERNAL_SOURCE: &str = "external";

#[derive(Debug)]
pub struct EventJournal {
    tick:    Tick,
    source:  &'static str,
    entries: Vec<EventLogEntry>,
}

impl EventJournal {
    pub fn new() -> Self {
        Self { tick: 0, source: EXTERNAL_SOURCE, entries: Vec::new() }
    }

    pub fn attach(self, bus: &MessageBus) -> Shared<Self> {
        let journal = Rc::new(RefCell::new(self));
        for kind in EventKind::ALL {
            bus.attach(kind, &journal);
        }
        journal
    }

    pub fn set_tick(&mut self, tick: Tick) {
        self.tick = tick;
    }

    /// Attribute subsequent entries (nested publishes included) to `source`.
    pub fn set_source(&mut self, source: &'static str) {
        self.source = source;
    }

    pub fn entries(&self) -> &[EventLogEntry] {
        &self.entries
    }

    pub fn entries_for_tick(&self, tick: Tick) -> impl Iterator<Item = &EventLogEntry> {
        self.entries.iter().filter(move |e| e.tick == tick)
    }
}

impl MessageHandler for EventJournal {
    fn on_message(&mut self, event: &SimEvent) {
        let payload = match serde_json::to_string(event) {
            Ok(payload) => payload,
            Err(e) => {
                log::warn!("Journal could not serialize '{}': {e}", event.kind());
                return;
            }
        };
        self.entries.push(EventLogEntry {
            seq:        self.entries.len() as u64,
            tick:       self.tick,
            subsystem:  self.source.to_string(),
            event_type: event.kind().as_str().to_string(),
            payload,
        });
    }
}

impl Default for EventJournal {
    fn default() -> Self { Self::new() }
}
