//! Topic-based publish/subscribe channel shared by the UI panels
//!
//! Subscriptions live in an arena of slots. A [`SubscriptionId`] is an index into
//! that arena plus the generation the slot had when it was handed out, so a stale
//! id never removes a later subscriber that reused the slot.
//!
//! Delivery is synchronous and in subscription order. `emit` works from a snapshot
//! of the topic's subscribers taken when it starts: handlers added during an
//! emission miss it, and handlers removed during an emission are skipped for the
//! rest of it.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;

use thiserror::Error;

/// Callback invoked with the payload of every emission on its topic
pub type Handler<P> = Rc<dyn Fn(&P) -> anyhow::Result<()>>;

/// Handle returned by [`EventBus::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId {
    index: usize,
    generation: u64,
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.index, self.generation)
    }
}

/// A subscriber that returned an error or panicked during an emission
#[derive(Debug, Clone, Error)]
#[error("subscriber {subscription} on '{topic}' failed: {message}")]
pub struct HandlerFault {
    pub topic: String,
    pub subscription: SubscriptionId,
    pub message: String,
}

/// Outcome of a single [`EventBus::emit`] call
#[derive(Debug, Default)]
pub struct EmitReport {
    /// Handlers that were invoked, including the ones that failed
    pub delivered: usize,
    pub faults: Vec<HandlerFault>,
}

struct Slot<P> {
    generation: u64,
    topic: String,
    handler: Option<Handler<P>>,
}

struct Registry<P> {
    slots: Vec<Slot<P>>,
    free: Vec<usize>,
    topics: HashMap<String, Vec<SubscriptionId>>,
    next_generation: u64,
}

impl<P> Registry<P> {
    fn live_handler(&self, id: SubscriptionId) -> Option<Handler<P>> {
        self.slots
            .get(id.index)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.handler.clone())
    }
}

/// Publish/subscribe channel keyed by topic name
pub struct EventBus<P> {
    registry: RefCell<Registry<P>>,
}

impl<P> Default for EventBus<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> EventBus<P> {
    /// Create a bus with no subscribers
    pub fn new() -> Self {
        Self {
            registry: RefCell::new(Registry {
                slots: Vec::new(),
                free: Vec::new(),
                topics: HashMap::new(),
                next_generation: 0,
            }),
        }
    }

    /// Register `handler` for `topic`
    pub fn subscribe<F>(&self, topic: &str, handler: F) -> SubscriptionId
    where
        F: Fn(&P) -> anyhow::Result<()> + 'static,
    {
        let mut registry = self.registry.borrow_mut();
        let generation = registry.next_generation;
        registry.next_generation += 1;

        let slot = Slot {
            generation,
            topic: topic.to_string(),
            handler: Some(Rc::new(handler)),
        };
        let index = match registry.free.pop() {
            Some(index) => {
                registry.slots[index] = slot;
                index
            }
            None => {
                registry.slots.push(slot);
                registry.slots.len() - 1
            }
        };

        let id = SubscriptionId { index, generation };
        registry
            .topics
            .entry(topic.to_string())
            .or_default()
            .push(id);
        tracing::debug!("Subscribed {} to '{}'", id, topic);
        id
    }

    /// Remove a subscription. Unknown or already removed ids are ignored.
    ///
    /// Returns whether a live subscription was removed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut registry = self.registry.borrow_mut();
        let topic = match registry.slots.get_mut(id.index) {
            Some(slot) if slot.generation == id.generation && slot.handler.is_some() => {
                slot.handler = None;
                std::mem::take(&mut slot.topic)
            }
            _ => return false,
        };
        registry.free.push(id.index);

        if let Some(ids) = registry.topics.get_mut(&topic) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                registry.topics.remove(&topic);
            }
        }
        tracing::debug!("Unsubscribed {} from '{}'", id, topic);
        true
    }

    /// Deliver `payload` to every handler subscribed to `topic` when the call starts.
    ///
    /// A handler that fails does not stop delivery to the others; its fault is
    /// logged and collected in the returned report.
    pub fn emit(&self, topic: &str, payload: &P) -> EmitReport {
        let snapshot = match self.registry.borrow().topics.get(topic) {
            Some(ids) => ids.clone(),
            None => return EmitReport::default(),
        };

        let mut report = EmitReport::default();
        for id in snapshot {
            // Registry borrow must end before the handler runs; it may subscribe or unsubscribe.
            let Some(handler) = self.registry.borrow().live_handler(id) else {
                continue;
            };
            report.delivered += 1;

            let message = match panic::catch_unwind(AssertUnwindSafe(|| handler(payload))) {
                Ok(Ok(())) => continue,
                Ok(Err(err)) => format!("{err:#}"),
                Err(panic) => panic_message(panic.as_ref()),
            };
            let fault = HandlerFault {
                topic: topic.to_string(),
                subscription: id,
                message,
            };
            tracing::warn!("{}", fault);
            report.faults.push(fault);
        }
        report
    }

    /// Number of live subscriptions on `topic`
    #[cfg(test)]
    pub fn subscriber_count(&self, topic: &str) -> usize {
        self.registry
            .borrow()
            .topics
            .get(topic)
            .map_or(0, Vec::len)
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        format!("panicked: {msg}")
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        format!("panicked: {msg}")
    } else {
        "panicked".to_string()
    }
}
