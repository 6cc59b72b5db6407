//! # Event Bus
//!
//! Synchronous broadcast: `post` returns only after every eligible subscriber
//! has run, in registration order, on the caller's thread.
//!
//! ## Snapshot Dispatch
//!
//! ```text
//! registry: TypeId ──> Arc<Vec<Subscription>>      (copy-on-write)
//!
//! post(E):
//!   1. read lock, clone the Arc for TypeId::of::<E>(), unlock
//!   2. walk the snapshot with a local cursor
//!   3. skip subscribers whose owner is disabled (unless always-listen)
//!   4. run each under catch_unwind
//! ```
//!
//! No lock is held while a subscriber runs, so a subscriber may post, subscribe
//! or unsubscribe freely. Changes made during a dispatch take effect at the
//! NEXT post of that type: the in-flight snapshot is immutable and each nested
//! post gets its own cursor.

use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::{EventError, EventResult};
use crate::event::{Envelope, Event};
use crate::fault::{panic_message, FaultReport, FaultSink};
use crate::module::{ModuleHandle, ModuleId, Toggle};

/// Identifier returned by every subscribe call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Who registered a subscription.
#[derive(Clone, Debug)]
pub enum Owner {
    /// Core component. Always enabled.
    System(&'static str),
    /// A feature module, filtered by its enabled flag.
    Module(ModuleHandle),
}

impl Owner {
    fn name(&self) -> &str {
        match self {
            Self::System(name) => name,
            Self::Module(handle) => handle.name(),
        }
    }

    fn module_id(&self) -> Option<ModuleId> {
        match self {
            Self::System(_) => None,
            Self::Module(handle) => Some(handle.id()),
        }
    }

    fn is_enabled(&self) -> bool {
        match self {
            Self::System(_) => true,
            Self::Module(handle) => handle.is_enabled(),
        }
    }
}

type Handler<E> = dyn Fn(&mut Envelope<E>) + Send + Sync;

#[derive(Clone)]
struct Subscription {
    id: SubscriptionId,
    owner: Owner,
    always_listen: bool,
    /// `Arc<Handler<E>>`, erased.
    handler: Arc<dyn Any + Send + Sync>,
}

impl Subscription {
    fn is_eligible(&self) -> bool {
        self.always_listen || self.owner.is_enabled()
    }
}

/// Registry of subscribers keyed by event type.
pub struct EventBus {
    subscribers: RwLock<HashMap<TypeId, Arc<Vec<Subscription>>>>,
    next_id: AtomicU64,
    faults: FaultSink,
}

impl EventBus {
    /// Creates a bus with the default fault sink.
    #[must_use]
    pub fn new() -> Self {
        Self::with_fault_sink(FaultSink::default())
    }

    /// Creates a bus reporting faults to `faults`.
    #[must_use]
    pub fn with_fault_sink(faults: FaultSink) -> Self {
        Self {
            subscribers: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            faults,
        }
    }

    /// The fault sink subscriber panics are reported to.
    #[must_use]
    pub fn faults(&self) -> &FaultSink {
        &self.faults
    }

    /// Subscribes on behalf of a module. The handler only runs while the
    /// module is enabled.
    pub fn subscribe<E, F>(&self, owner: &ModuleHandle, handler: F) -> SubscriptionId
    where
        E: Event,
        F: Fn(&mut Envelope<E>) + Send + Sync + 'static,
    {
        self.insert(Owner::Module(owner.clone()), false, handler)
    }

    /// Subscribes on behalf of a module, ignoring its enabled flag.
    pub fn subscribe_always<E, F>(&self, owner: &ModuleHandle, handler: F) -> SubscriptionId
    where
        E: Event,
        F: Fn(&mut Envelope<E>) + Send + Sync + 'static,
    {
        self.insert(Owner::Module(owner.clone()), true, handler)
    }

    /// Subscribes a core component.
    pub fn subscribe_system<E, F>(&self, name: &'static str, handler: F) -> SubscriptionId
    where
        E: Event,
        F: Fn(&mut Envelope<E>) + Send + Sync + 'static,
    {
        self.insert(Owner::System(name), true, handler)
    }

    fn insert<E, F>(&self, owner: Owner, always_listen: bool, handler: F) -> SubscriptionId
    where
        E: Event,
        F: Fn(&mut Envelope<E>) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let handler: Arc<Handler<E>> = Arc::new(handler);

        tracing::trace!(event = E::NAME, subscription = %id, owner = owner.name(), "subscribe");

        let subscription = Subscription {
            id,
            owner,
            always_listen,
            handler: Arc::new(handler),
        };

        let mut map = self.subscribers.write();
        let list = map.entry(TypeId::of::<E>()).or_default();
        // Clones the list only if a dispatch currently holds the old snapshot.
        Arc::make_mut(list).push(subscription);
        id
    }

    /// Removes one subscription.
    ///
    /// # Errors
    ///
    /// [`EventError::UnknownSubscription`] if the id is not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> EventResult<()> {
        let mut map = self.subscribers.write();
        for list in map.values_mut() {
            if let Some(index) = list.iter().position(|s| s.id == id) {
                Arc::make_mut(list).remove(index);
                return Ok(());
            }
        }
        Err(EventError::UnknownSubscription(id))
    }

    /// Removes every subscription owned by `owner`. Returns how many were
    /// removed.
    pub fn unsubscribe_owner(&self, owner: &ModuleHandle) -> usize {
        let target = Some(owner.id());
        let mut removed = 0;
        let mut map = self.subscribers.write();
        for list in map.values_mut() {
            if list.iter().any(|s| s.owner.module_id() == target) {
                let list = Arc::make_mut(list);
                let before = list.len();
                list.retain(|s| s.owner.module_id() != target);
                removed += before - list.len();
            }
        }
        removed
    }

    /// Number of subscriptions registered for `E`, eligible or not.
    #[must_use]
    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.subscribers
            .read()
            .get(&TypeId::of::<E>())
            .map_or(0, |list| list.len())
    }

    /// Delivers `event` to every eligible subscriber, in registration order.
    ///
    /// Returns the envelope after all subscribers ran: the event (possibly
    /// mutated) and its final cancellation state. A subscriber that panics is
    /// reported to the fault sink; its partial mutations remain, and the next
    /// subscriber still runs.
    pub fn post<E: Event>(&self, event: E) -> Envelope<E> {
        let mut envelope = Envelope::new(event);
        self.dispatch(&mut envelope);
        envelope
    }

    /// Posts `event` and runs `action` with the result only if no subscriber
    /// canceled it.
    pub fn post_checked<E, R>(&self, event: E, action: impl FnOnce(&mut E) -> R) -> (Envelope<E>, Option<R>)
    where
        E: Event,
    {
        let mut envelope = self.post(event);
        if envelope.is_canceled() {
            return (envelope, None);
        }
        let result = action(envelope.event_mut());
        (envelope, Some(result))
    }

    /// Delivers an existing envelope. Cancellation already set is kept.
    pub fn dispatch<E: Event>(&self, envelope: &mut Envelope<E>) {
        let snapshot = {
            let map = self.subscribers.read();
            match map.get(&TypeId::of::<E>()) {
                Some(list) => Arc::clone(list),
                None => return,
            }
        };

        for subscription in snapshot.iter() {
            if !subscription.is_eligible() {
                continue;
            }

            let Some(handler) = subscription.handler.downcast_ref::<Arc<Handler<E>>>() else {
                // Keyed by TypeId::of::<E>(), so this cannot happen.
                continue;
            };

            let outcome = catch_unwind(AssertUnwindSafe(|| (**handler)(envelope)));

            if let Err(payload) = outcome {
                self.faults.report(FaultReport {
                    event: E::NAME,
                    subscription: subscription.id,
                    owner: subscription.owner.name().to_string(),
                    message: panic_message(payload.as_ref()),
                });
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let map = self.subscribers.read();
        f.debug_struct("EventBus")
            .field("event_types", &map.len())
            .field("subscriptions", &map.values().map(|l| l.len()).sum::<usize>())
            .finish()
    }
}
