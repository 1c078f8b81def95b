//! In-process named event bus.
//!
//! Handlers are stored per event name. Emitting clones the matching handler
//! handles out of the registry and releases the registry lock before calling
//! them, so a handler may listen, unlisten or emit other events. A handler
//! must not emit the event it is itself listening to.

use super::{BridgeError, Event};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use tracing::{debug, trace};
use uuid::Uuid;

/// Boxed event handler. Runs on the emitting thread.
type Handler = Box<dyn FnMut(&Event) + Send>;

/// Unique identifier for a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(Uuid);

impl ListenerId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

struct Listener {
    id: ListenerId,
    handler: Arc<Mutex<Handler>>,
}

#[derive(Default)]
struct Registry {
    listeners: HashMap<String, Vec<Listener>>,
}

impl Registry {
    fn remove(&mut self, id: ListenerId) -> bool {
        let mut removed = false;
        self.listeners.retain(|_, list| {
            let before = list.len();
            list.retain(|l| l.id != id);
            removed |= list.len() != before;
            !list.is_empty()
        });
        removed
    }
}

/// A cloneable handle to a shared event bus.
///
/// All clones see the same listeners.
#[derive(Clone, Default)]
pub struct EventBus {
    registry: Arc<Mutex<Registry>>,
}

impl EventBus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for events named `name`.
    ///
    /// The returned [`Subscription`] unregisters the handler when dropped.
    pub fn listen<F>(&self, name: &str, handler: F) -> Result<Subscription, BridgeError>
    where
        F: FnMut(&Event) + Send + 'static,
    {
        let id = ListenerId::new();
        let mut registry = self.registry.lock().map_err(|_| BridgeError::Poisoned)?;
        registry
            .listeners
            .entry(name.to_string())
            .or_default()
            .push(Listener {
                id,
                handler: Arc::new(Mutex::new(Box::new(handler))),
            });
        debug!(event = name, ?id, "listener registered");

        Ok(Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        })
    }

    /// Unregisters a listener by ID.
    ///
    /// Returns true if the listener was still registered.
    pub fn unlisten(&self, id: ListenerId) -> Result<bool, BridgeError> {
        let mut registry = self.registry.lock().map_err(|_| BridgeError::Poisoned)?;
        Ok(registry.remove(id))
    }

    /// Serializes `payload` and delivers it to every listener of `name`.
    ///
    /// Returns the number of handlers that received the event.
    pub fn emit<P: Serialize>(&self, name: &str, payload: P) -> Result<usize, BridgeError> {
        let payload = serde_json::to_value(payload).map_err(|source| BridgeError::Payload {
            event: name.to_string(),
            source,
        })?;
        self.emit_event(&Event::new(name, payload))
    }

    /// Delivers an already-built event.
    pub fn emit_event(&self, event: &Event) -> Result<usize, BridgeError> {
        let handlers: Vec<Arc<Mutex<Handler>>> = {
            let registry = self.registry.lock().map_err(|_| BridgeError::Poisoned)?;
            registry
                .listeners
                .get(&event.name)
                .map(|list| list.iter().map(|l| Arc::clone(&l.handler)).collect())
                .unwrap_or_default()
        };

        trace!(event = %event.name, handlers = handlers.len(), "emit");

        let mut delivered = 0;
        for handler in handlers {
            // A handler that panicked earlier is skipped rather than taking
            // the whole bus down with it.
            if let Ok(mut handler) = handler.lock() {
                handler(event);
                delivered += 1;
            }
        }
        Ok(delivered)
    }

    /// Number of listeners registered for `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        self.registry
            .lock()
            .map(|r| r.listeners.get(name).map_or(0, Vec::len))
            .unwrap_or(0)
    }

    /// Number of listeners registered across all names.
    pub fn total_listeners(&self) -> usize {
        self.registry
            .lock()
            .map(|r| r.listeners.values().map(Vec::len).sum())
            .unwrap_or(0)
    }
}

/// Keeps a listener registered for as long as it lives.
#[must_use = "dropping a Subscription immediately unregisters its handler"]
pub struct Subscription {
    id: ListenerId,
    registry: Weak<Mutex<Registry>>,
}

impl Subscription {
    /// Returns the listener ID behind this subscription.
    pub fn id(&self) -> ListenerId {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            if let Ok(mut registry) = registry.lock() {
                registry.remove(self.id);
            }
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::sync::mpsc;

    #[test]
    fn test_emit_reaches_listener() {
        let bus = EventBus::new();
        let (tx, rx) = mpsc::channel();
        let _sub = bus
            .listen("attack", move |evt| {
                tx.send(evt.clone()).unwrap();
            })
            .unwrap();

        assert_eq!(bus.emit("attack", "0.42").unwrap(), 1);
        let evt = rx.try_recv().unwrap();
        assert_eq!(evt.name, "attack");
        assert_eq!(evt.payload, json!("0.42"));
    }

    #[test]
    fn test_emit_only_matches_name() {
        let bus = EventBus::new();
        let (tx, rx) = mpsc::channel::<Event>();
        let _sub = bus
            .listen("decay", move |evt| {
                tx.send(evt.clone()).unwrap();
            })
            .unwrap();

        assert_eq!(bus.emit("attack", "1").unwrap(), 0);
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_unit_payload_is_null() {
        let bus = EventBus::new();
        let (tx, rx) = mpsc::channel();
        let _sub = bus
            .listen("ready", move |evt| {
                tx.send(evt.payload.clone()).unwrap();
            })
            .unwrap();

        bus.emit("ready", ()).unwrap();
        assert_eq!(rx.try_recv().unwrap(), Value::Null);
    }

    #[test]
    fn test_drop_subscription_unlistens() {
        let bus = EventBus::new();
        let sub = bus.listen("message", |_| {}).unwrap();
        let _other = bus.listen("ready", |_| {}).unwrap();
        assert_eq!(bus.listener_count("message"), 1);
        assert_eq!(bus.total_listeners(), 2);

        drop(sub);
        assert_eq!(bus.listener_count("message"), 0);
        assert_eq!(bus.total_listeners(), 1);
        assert_eq!(bus.emit("message", "hi").unwrap(), 0);
    }

    #[test]
    fn test_explicit_unlisten() {
        let bus = EventBus::new();
        let sub = bus.listen("message", |_| {}).unwrap();
        assert!(bus.unlisten(sub.id()).unwrap());
        assert!(!bus.unlisten(sub.id()).unwrap());
        // Dropping after an explicit unlisten is harmless.
        drop(sub);
        assert_eq!(bus.total_listeners(), 0);
    }

    #[test]
    fn test_subscription_outlives_bus() {
        let bus = EventBus::new();
        let sub = bus.listen("message", |_| {}).unwrap();
        drop(bus);
        drop(sub);
    }

    #[test]
    fn test_handler_can_emit_other_event() {
        let bus = EventBus::new();
        let (tx, rx) = mpsc::channel();
        let _ready = bus
            .listen("ready", move |evt| {
                tx.send(evt.payload.clone()).unwrap();
            })
            .unwrap();

        let inner = bus.clone();
        let _start = bus
            .listen("start-synth", move |_| {
                inner.emit("ready", true).unwrap();
            })
            .unwrap();

        bus.emit("start-synth", "start please").unwrap();
        assert_eq!(rx.try_recv().unwrap(), json!(true));
    }

    #[test]
    fn test_emit_from_other_thread() {
        let bus = EventBus::new();
        let (tx, rx) = mpsc::channel();
        let _sub = bus
            .listen("message", move |evt| {
                tx.send(evt.clone()).unwrap();
            })
            .unwrap();

        let remote = bus.clone();
        std::thread::spawn(move || {
            remote.emit("message", json!({ "note": 60 })).unwrap();
        })
        .join()
        .unwrap();

        assert_eq!(rx.try_recv().unwrap().payload, json!({ "note": 60 }));
    }
}
