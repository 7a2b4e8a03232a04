//! The message bus: synchronous, in-process publish/subscribe.
//!
//! RULES:
//!   - Handlers for a kind run in registration order, inside `publish`.
//!   - A publish from inside a handler completes fully (depth-first)
//!     before the outer publish moves on to its next handler.
//!   - The bus never inspects payloads. Handlers match the variants they
//!     understand and ignore everything else.
//!   - Breaking publish cycles is the caller's job. The depth guard only
//!     turns a runaway cycle into an error instead of a stack overflow.

use crate::{
    error::{SimError, SimResult},
    event::{EventKind, SimEvent},
};
use std::{
    cell::{Cell, RefCell},
    collections::HashMap,
    rc::Rc,
};

pub const DEFAULT_MAX_DISPATCH_DEPTH: usize = 32;

/// A registered callback.
pub type Handler = Rc<dyn Fn(&SimEvent, &MessageBus)>;

/// Shared, interior-mutable consumer state.
pub type Shared<T> = Rc<RefCell<T>>;

/// A stateful consumer that can be attached to the bus.
pub trait MessageHandler {
    /// Called once per matching publish. Variants the consumer does not
    /// understand must be ignored without effect.
    fn on_message(&mut self, event: &SimEvent);
}

/// Identifies a single registration. Duplicate registrations get distinct handles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle {
    pub kind: EventKind,
    id: u64,
}

struct Subscription {
    id:      u64,
    handler: Handler,
}

pub struct MessageBus {
    subscriptions: RefCell<HashMap<EventKind, Vec<Subscription>>>,
    next_id:       Cell<u64>,
    depth:         Cell<usize>,
    max_depth:     usize,
    /// First depth-guard trip seen during the current outermost publish.
    overflow:      Cell<Option<(EventKind, usize)>>,
}

impl MessageBus {
    pub fn new() -> Self {
        Self::with_max_depth(DEFAULT_MAX_DISPATCH_DEPTH)
    }

    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            subscriptions: RefCell::new(HashMap::new()),
            next_id:       Cell::new(0),
            depth:         Cell::new(0),
            max_depth:     max_depth.max(1),
            overflow:      Cell::new(None),
        }
    }

    /// Register `handler` for every future publish of `kind`.
    /// Registering the same handler twice makes it run twice.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F) -> SubscriptionHandle
    where
        F: Fn(&SimEvent, &MessageBus) + 'static,
    {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.subscriptions
            .borrow_mut()
            .entry(kind)
            .or_default()
            .push(Subscription { id, handler: Rc::new(handler) });
        SubscriptionHandle { kind, id }
    }

    /// Register a shared consumer for `kind`.
    ///
    /// The bus holds only a weak reference: once every strong handle to the
    /// consumer is dropped, its registrations become no-ops.
    pub fn attach<T>(&self, kind: EventKind, consumer: &Shared<T>) -> SubscriptionHandle
    where
        T: MessageHandler + 'static,
    {
        let weak = Rc::downgrade(consumer);
        self.subscribe(kind, move |event, _bus| {
            let Some(consumer) = weak.upgrade() else {
                return;
            };
            let borrowed = consumer.try_borrow_mut();
            match borrowed {
                Ok(mut consumer) => consumer.on_message(event),
                Err(_) => log::warn!(
                    "Consumer already borrowed; re-entrant '{}' delivery dropped",
                    event.kind()
                ),
            };
        })
    }

    /// Remove one registration. Returns false if it was already gone.
    /// A dispatch already in flight still reaches the removed handler.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        let mut subscriptions = self.subscriptions.borrow_mut();
        let Some(subs) = subscriptions.get_mut(&handle.kind) else {
            return false;
        };
        let before = subs.len();
        subs.retain(|s| s.id != handle.id);
        subs.len() != before
    }

    pub fn subscriber_count(&self, kind: EventKind) -> usize {
        self.subscriptions.borrow().get(&kind).map_or(0, Vec::len)
    }

    /// Deliver `event` to every handler of its kind, in registration order.
    /// Returns how many handlers ran. Zero subscribers is not an error.
    pub fn publish(&self, event: SimEvent) -> SimResult<usize> {
        let kind = event.kind();
        let depth = self.depth.get();

        if depth >= self.max_depth {
            log::warn!("Dispatch depth {} exceeded publishing '{kind}'", depth + 1);
            if self.overflow.get().is_none() {
                self.overflow.set(Some((kind, depth + 1)));
            }
            return Err(SimError::DispatchDepthExceeded { kind, depth: depth + 1 });
        }

        // Snapshot the handler list so handlers may subscribe, unsubscribe
        // or publish without holding a borrow across the call.
        let handlers: Vec<Handler> = self
            .subscriptions
            .borrow()
            .get(&kind)
            .map(|subs| subs.iter().map(|s| Rc::clone(&s.handler)).collect())
            .unwrap_or_default();

        log::trace!("publish '{kind}' depth={depth} handlers={}", handlers.len());

        if depth == 0 {
            self.overflow.set(None);
        }
        {
            let _guard = DepthGuard::enter(&self.depth);
            for handler in &handlers {
                handler(&event, self);
            }
        }

        if depth == 0 {
            if let Some((kind, depth)) = self.overflow.take() {
                return Err(SimError::DispatchDepthExceeded { kind, depth });
            }
        }
        Ok(handlers.len())
    }

    /// String-keyed ingress. Unknown kinds and payloads that do not decode
    /// into the kind's fixed shape are dropped without error.
    pub fn publish_raw(&self, kind: &str, payload: serde_json::Value) -> SimResult<usize> {
        let Some(kind) = EventKind::parse(kind) else {
            log::trace!("publish_raw: unknown kind '{kind}' ignored");
            return Ok(0);
        };
        match decode_payload(kind, payload) {
            Some(event) => self.publish(event),
            None => {
                log::trace!("publish_raw: payload for '{kind}' declined");
                Ok(0)
            }
        }
    }
}

impl Default for MessageBus {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_payload(kind: EventKind, payload: serde_json::Value) -> Option<SimEvent> {
    let mut fields = match payload {
        serde_json::Value::Object(map) => map,
        serde_json::Value::Null => serde_json::Map::new(),
        _ => return None,
    };
    if let Some(stray) = fields.keys().find(|k| !kind.payload_fields().contains(&k.as_str())) {
        log::trace!("'{kind}' payload has unexpected field '{stray}'");
        return None;
    }
    fields.insert("type".into(), serde_json::Value::from(kind.as_str()));
    serde_json::from_value::<SimEvent>(serde_json::Value::Object(fields))
        .ok()
        .filter(|event| event.kind() == kind)
}

/// Restores the dispatch depth even if a handler panics.
struct DepthGuard<'a> {
    depth: &'a Cell<usize>,
}

impl<'a> DepthGuard<'a> {
    fn enter(depth: &'a Cell<usize>) -> Self {
        depth.set(depth.get() + 1);
        Self { depth }
    }
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get() - 1);
    }
}
