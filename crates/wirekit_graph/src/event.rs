// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed observer channels.
//!
//! The layer exposes one [`Signal`] per event kind instead of ad-hoc bubbled
//! event objects. Everything is single-threaded: mutation happens inside UI
//! callbacks, so subscribers run synchronously during `emit` and must not
//! re-enter the graph.

use crate::wire::{TerminalRef, WireId};

/// Handle returned by [`Signal::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// An ordered list of subscribers for one event type.
pub struct Signal<T> {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Box<dyn FnMut(&T)>)>,
}

impl<T> Signal<T> {
    /// Create an empty signal
    pub fn new() -> Self {
        Self {
            next_id: 0,
            subscribers: Vec::new(),
        }
    }

    /// Register a subscriber; it stays registered until unsubscribed or the
    /// signal is dropped.
    pub fn subscribe(&mut self, f: impl FnMut(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, Box::new(f)));
        id
    }

    /// Remove a subscriber. Returns whether it was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    /// Deliver an event to every subscriber, in subscription order.
    pub fn emit(&mut self, payload: &T) {
        for (_, f) in &mut self.subscribers {
            f(payload);
        }
    }

    /// Number of registered subscribers
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

/// Payload for wire add/remove events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WireEvent {
    /// The wire concerned
    pub wire: WireId,
    /// Terminal 1
    pub src: TerminalRef,
    /// Terminal 2
    pub tgt: TerminalRef,
}

/// The layer's event channels.
#[derive(Debug, Default)]
pub struct LayerEvents {
    /// Fired after a wire is registered with both terminals
    pub wire_added: Signal<WireEvent>,
    /// Fired after a wire is detached from both terminals
    pub wire_removed: Signal<WireEvent>,
    /// Fired after any container add/remove or wiring load
    pub changed: Signal<()>,
}
