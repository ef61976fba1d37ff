//! # Event bus.
//!
//! [`Bus`] fans events out to registered subscribers. Delivery is
//! synchronous and runs in the publisher's thread, so subscribers must not
//! call back into the branch or supervisor that published the event — the
//! same caller discipline as the supervisor tick callback.

use std::sync::Arc;

use parking_lot::RwLock;

use crate::events::Event;
use crate::subscribers::{StderrWriter, Subscribe};

/// Fan-out channel for runtime events.
///
/// Cloning a bus shares the subscriber list; publishing with no subscribers
/// is a no-op.
#[derive(Clone, Default)]
pub struct Bus {
    subscribers: Arc<RwLock<Vec<Arc<dyn Subscribe>>>>,
}

impl Bus {
    /// Creates an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a bus pre-wired with the built-in [`StderrWriter`].
    pub fn stderr() -> Self {
        let bus = Self::new();
        bus.attach(Arc::new(StderrWriter));
        bus
    }

    /// Registers a subscriber.
    pub fn attach(&self, subscriber: Arc<dyn Subscribe>) {
        self.subscribers.write().push(subscriber);
    }

    /// Delivers an event to every subscriber, in registration order.
    pub fn publish(&self, event: Event) {
        for subscriber in self.subscribers.read().iter() {
            subscriber.on_event(&event);
        }
    }
}
