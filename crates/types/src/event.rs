//! Synchronous events with overridable default actions.
//!
//! Lifecycle events are delivered to subscribers in publish order, within the
//! publishing call. A subscriber may call [`Event::prevent_default`] to stop
//! the publisher's default action (setting internal query/results state,
//! committing a selection) from running. There is no global bus: each relay
//! is owned by the component that publishes through it.

use std::fmt;

/// A single in-flight event: the payload plus the prevent-default flag.
#[derive(Debug)]
pub struct Event<P> {
    payload: P,
    default_prevented: bool,
}

impl<P> Event<P> {
    /// Wrap a payload for dispatch.
    pub fn new(payload: P) -> Self {
        Self {
            payload,
            default_prevented: false,
        }
    }

    /// Borrow the payload.
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Stop the publisher's default action from running.
    pub fn prevent_default(&mut self) {
        self.default_prevented = true;
    }

    /// Whether a subscriber prevented the default action.
    pub fn is_default_prevented(&self) -> bool {
        self.default_prevented
    }

    /// Consume the event, yielding the payload.
    pub fn into_payload(self) -> P {
        self.payload
    }
}

type Listener<P> = Box<dyn FnMut(&mut Event<P>)>;

/// Ordered subscriber list for one event type.
///
/// Subscribers run synchronously, in subscription order, before the
/// publisher's default-handler closure.
pub struct Relay<P> {
    listeners: Vec<Listener<P>>,
}

impl<P> Default for Relay<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> Relay<P> {
    /// Create an empty relay.
    pub fn new() -> Self {
        Self { listeners: Vec::new() }
    }

    /// Append a subscriber. Subscribers registered earlier run earlier.
    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&mut Event<P>) + 'static,
    {
        self.listeners.push(Box::new(listener));
    }

    /// Number of registered subscribers.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Whether no subscribers are registered.
    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    /// Dispatch `payload` to every subscriber in order and return the event
    /// so the publisher can consult the prevent-default flag before running
    /// its default action.
    pub fn emit(&mut self, payload: P) -> Event<P> {
        let mut event = Event::new(payload);
        for listener in &mut self.listeners {
            listener(&mut event);
        }
        event
    }
}

impl<P> fmt::Debug for Relay<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Relay").field("listeners", &self.listeners.len()).finish()
    }
}
