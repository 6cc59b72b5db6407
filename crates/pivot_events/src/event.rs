//! # Event Model
//!
//! Events are plain structs posted by value. The bus wraps each one in an
//! [`Envelope`] for the duration of a single dispatch; the envelope carries the
//! cancellation state, so event types only declare *whether* they may be
//! canceled, never *how*.
//!
//! ```text
//! caller ──post(E)──> Envelope<E> ──&mut──> sub 1 ──&mut──> sub 2 ──> caller
//!                       │                                              │
//!                       └── canceled: bool (sticky) ───────────────────┘
//! ```

use std::ops::{Deref, DerefMut};

/// A message that can be posted through the [`EventBus`](crate::EventBus).
///
/// `CANCELLABLE` is fixed per type. Posting never allocates the event itself;
/// the envelope lives on the caller's stack.
pub trait Event: Send + 'static {
    /// Stable name used in diagnostics.
    const NAME: &'static str;

    /// Whether subscribers may cancel this event.
    const CANCELLABLE: bool = false;
}

/// An event in flight, plus its cancellation state.
///
/// Derefs to the event so subscribers read and write fields directly.
#[derive(Debug)]
pub struct Envelope<E: Event> {
    event: E,
    canceled: bool,
}

impl<E: Event> Envelope<E> {
    /// Wraps a fresh, non-canceled event.
    #[must_use]
    pub fn new(event: E) -> Self {
        Self {
            event,
            canceled: false,
        }
    }

    /// Requests cancellation.
    ///
    /// Returns `false` (and changes nothing) when the event type is not
    /// cancellable.
    pub fn cancel(&mut self) -> bool {
        if !E::CANCELLABLE {
            tracing::warn!(event = E::NAME, "cancel() on a non-cancellable event ignored");
            return false;
        }
        self.canceled = true;
        true
    }

    /// Whether any subscriber canceled this occurrence.
    #[must_use]
    pub fn is_canceled(&self) -> bool {
        self.canceled
    }

    /// Clears a cancellation set by an earlier subscriber.
    ///
    /// This defeats another subscriber's intent, so every use is logged.
    pub fn force_uncancel(&mut self, reason: &str) {
        if self.canceled {
            tracing::warn!(event = E::NAME, reason, "cancellation overridden");
            self.canceled = false;
        }
    }

    /// Shared view of the event.
    #[must_use]
    pub fn event(&self) -> &E {
        &self.event
    }

    /// Mutable view of the event.
    pub fn event_mut(&mut self) -> &mut E {
        &mut self.event
    }

    /// Unwraps the (possibly mutated) event.
    #[must_use]
    pub fn into_inner(self) -> E {
        self.event
    }
}

impl<E: Event> Deref for Envelope<E> {
    type Target = E;

    fn deref(&self) -> &E {
        &self.event
    }
}

impl<E: Event> DerefMut for Envelope<E> {
    fn deref_mut(&mut self) -> &mut E {
        &mut self.event
    }
}
