//! Session event subscription
//!
//! An explicit subscriber list replaces ad-hoc callback wiring: the
//! session owns an [`EventHub`], listeners subscribe for a receiver,
//! and events fan out in emission order. Subscribers that went away are
//! pruned on the next emit.

use tokio::sync::mpsc;

use crate::session::state::SessionState;

/// A state transition, carrying both endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateChange {
    /// State before the transition
    pub previous: SessionState,
    /// State after the transition
    pub current: SessionState,
}

/// Event raised by a client session.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// The session state changed
    StateChanged(StateChange),
    /// The video channel became ready (or not)
    VideoChannelStateChanged(bool),
}

/// Fan-out point for session events.
#[derive(Debug, Default)]
pub struct EventHub {
    subscribers: Vec<mpsc::UnboundedSender<SessionEvent>>,
}

impl EventHub {
    /// Creates an empty hub.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribes to all future events.
    pub fn subscribe(&mut self) -> mpsc::UnboundedReceiver<SessionEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.push(tx);
        rx
    }

    /// Delivers an event to every live subscriber, in subscription order.
    pub fn emit(&mut self, event: SessionEvent) {
        self.subscribers
            .retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Returns the number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}
