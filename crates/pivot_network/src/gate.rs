//! # Packet Gate
//!
//! The host adapter calls [`PacketGate::send`] from its send hook and
//! [`PacketGate::receive`] from its receive hook, passing the host's own
//! default action as a closure. The gate decides whether that action runs.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use pivot_events::EventBus;

use crate::envelope::{
    Direction, PacketEnvelope, PacketReceivePost, PacketReceivePre, PacketSendPost, PacketSendPre,
};

/// Whether the host's default action ran.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Delivery {
    /// Sent, or handled.
    Delivered,
    /// A Pre subscriber canceled it.
    Suppressed,
}

impl Delivery {
    /// True for [`Delivery::Delivered`].
    #[must_use]
    pub fn is_delivered(self) -> bool {
        self == Self::Delivered
    }
}

/// Lifetime counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GateStats {
    /// Messages transmitted.
    pub sent: u64,
    /// Outbound messages suppressed.
    pub suppressed_outbound: u64,
    /// Inbound messages handled.
    pub received: u64,
    /// Inbound messages dropped.
    pub suppressed_inbound: u64,
}

#[derive(Default)]
struct Counters {
    sent: AtomicU64,
    suppressed_outbound: AtomicU64,
    received: AtomicU64,
    suppressed_inbound: AtomicU64,
}

/// Interception gate for messages of type `M`.
pub struct PacketGate<M> {
    bus: Arc<EventBus>,
    sequence: AtomicU64,
    counters: Counters,
    _message: PhantomData<fn(M)>,
}

impl<M: Send + 'static> PacketGate<M> {
    /// Creates a gate posting on `bus`.
    #[must_use]
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            bus,
            sequence: AtomicU64::new(0),
            counters: Counters::default(),
            _message: PhantomData,
        }
    }

    /// The bus packet events are posted on.
    #[must_use]
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    fn envelope(&self, direction: Direction, message: M) -> PacketEnvelope<M> {
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        PacketEnvelope::new(direction, sequence, message)
    }

    /// Outbound hook: Send.Pre, then `transmit` unless canceled, then
    /// Send.Post.
    ///
    /// `transmit` receives the message as rewritten by Send.Pre subscribers.
    pub fn send(&self, message: M, transmit: impl FnOnce(&M)) -> Delivery {
        let pre = self.bus.post(PacketSendPre {
            packet: self.envelope(Direction::Outbound, message),
        });
        if pre.is_canceled() {
            self.counters.suppressed_outbound.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(sequence = pre.packet.sequence, "outbound message suppressed");
            return Delivery::Suppressed;
        }

        let PacketSendPre { packet } = pre.into_inner();
        transmit(&packet.message);
        self.counters.sent.fetch_add(1, Ordering::Relaxed);

        let _ = self.bus.post(PacketSendPost { packet });
        Delivery::Delivered
    }

    /// Inbound hook: Receive.Pre, then `handle` unless canceled, then
    /// Receive.Post.
    pub fn receive(&self, message: M, handle: impl FnOnce(&M)) -> Delivery {
        let pre = self.bus.post(PacketReceivePre {
            packet: self.envelope(Direction::Inbound, message),
        });
        if pre.is_canceled() {
            self.counters.suppressed_inbound.fetch_add(1, Ordering::Relaxed);
            tracing::trace!(sequence = pre.packet.sequence, "inbound message dropped");
            return Delivery::Suppressed;
        }

        let PacketReceivePre { packet } = pre.into_inner();
        handle(&packet.message);
        self.counters.received.fetch_add(1, Ordering::Relaxed);

        let _ = self.bus.post(PacketReceivePost { packet });
        Delivery::Delivered
    }

    /// Lifetime counters.
    #[must_use]
    pub fn stats(&self) -> GateStats {
        GateStats {
            sent: self.counters.sent.load(Ordering::Relaxed),
            suppressed_outbound: self.counters.suppressed_outbound.load(Ordering::Relaxed),
            received: self.counters.received.load(Ordering::Relaxed),
            suppressed_inbound: self.counters.suppressed_inbound.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use pivot_events::ModuleRegistry;

    #[derive(Clone, Debug, PartialEq)]
    enum Msg {
        Chat(String),
        Ping(u32),
    }

    fn gate() -> PacketGate<Msg> {
        PacketGate::new(Arc::new(EventBus::new()))
    }

    #[test]
    fn send_without_subscribers_transmits_unchanged() {
        let gate = gate();
        let mut wire = Vec::new();

        let delivery = gate.send(Msg::Ping(1), |m| wire.push(m.clone()));

        assert_eq!(delivery, Delivery::Delivered);
        assert_eq!(wire, vec![Msg::Ping(1)]);
        assert_eq!(gate.stats().sent, 1);
    }

    #[test]
    fn canceled_send_is_suppressed_and_has_no_post() {
        let gate = gate();
        let posts = Arc::new(Mutex::new(0));

        gate.bus().subscribe_system::<PacketSendPre<Msg>, _>("filter", |e| {
            if matches!(e.message(), Msg::Chat(_)) {
                e.cancel();
            }
        });
        let p = Arc::clone(&posts);
        gate.bus()
            .subscribe_system::<PacketSendPost<Msg>, _>("count", move |_| *p.lock() += 1);

        let mut wire = Vec::new();
        assert_eq!(gate.send(Msg::Chat("hi".into()), |m| wire.push(m.clone())), Delivery::Suppressed);
        assert_eq!(gate.send(Msg::Ping(2), |m| wire.push(m.clone())), Delivery::Delivered);

        assert_eq!(wire, vec![Msg::Ping(2)]);
        assert_eq!(*posts.lock(), 1);
        assert_eq!(gate.stats().suppressed_outbound, 1);
    }

    #[test]
    fn faulty_send_subscriber_does_not_block_the_send() {
        let gate = gate();
        let registry = ModuleRegistry::new();
        let broken = registry.register("Broken").unwrap();
        broken.enable();
        let after = Arc::new(Mutex::new(0));
        let posted = Arc::new(Mutex::new(Vec::new()));

        gate.bus()
            .subscribe::<PacketSendPre<Msg>, _>(&broken, |_| panic!("subscriber defect"));
        let a = Arc::clone(&after);
        gate.bus()
            .subscribe_system::<PacketSendPre<Msg>, _>("after", move |_| *a.lock() += 1);
        let p = Arc::clone(&posted);
        gate.bus().subscribe_system::<PacketSendPost<Msg>, _>("post", move |e| {
            p.lock().push(e.packet.sequence);
        });

        let mut wire = Vec::new();
        let delivery = gate.send(Msg::Ping(9), |m| wire.push(m.clone()));

        assert_eq!(delivery, Delivery::Delivered);
        assert_eq!(wire, vec![Msg::Ping(9)]);
        assert_eq!(*after.lock(), 1);
        assert_eq!(posted.lock().len(), 1);

        let faults = gate.bus().faults().drain();
        assert_eq!(faults.len(), 1);
        assert_eq!(faults[0].event, "Packet.Send.Pre");
    }

    #[test]
    fn send_pre_may_rewrite_the_message() {
        let gate = gate();
        gate.bus().subscribe_system::<PacketSendPre<Msg>, _>("rewrite", |e| {
            if let Msg::Ping(n) = e.message_mut() {
                *n += 100;
            }
        });

        let mut wire = Vec::new();
        gate.send(Msg::Ping(1), |m| wire.push(m.clone()));
        assert_eq!(wire, vec![Msg::Ping(101)]);
    }

    #[test]
    fn canceled_receive_is_not_handled() {
        let gate = gate();
        gate.bus().subscribe_system::<PacketReceivePre<Msg>, _>("drop-pings", |e| {
            if matches!(e.message(), Msg::Ping(_)) {
                e.cancel();
            }
        });

        let mut handled = Vec::new();
        assert_eq!(gate.receive(Msg::Ping(3), |m| handled.push(m.clone())), Delivery::Suppressed);
        assert_eq!(
            gate.receive(Msg::Chat("welcome".into()), |m| handled.push(m.clone())),
            Delivery::Delivered
        );

        assert_eq!(handled, vec![Msg::Chat("welcome".into())]);
        assert_eq!(
            gate.stats(),
            GateStats {
                sent: 0,
                suppressed_outbound: 0,
                received: 1,
                suppressed_inbound: 1,
            }
        );
    }

    #[test]
    fn post_events_cannot_be_canceled() {
        let gate = gate();
        let refused = Arc::new(Mutex::new(false));
        let r = Arc::clone(&refused);
        gate.bus().subscribe_system::<PacketReceivePost<Msg>, _>("late", move |e| {
            *r.lock() = !e.cancel();
        });

        assert!(gate.receive(Msg::Ping(0), |_| {}).is_delivered());
        assert!(*refused.lock());
    }

    #[test]
    fn envelopes_carry_direction_and_sequence() {
        let gate = gate();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let s = Arc::clone(&seen);
        gate.bus().subscribe_system::<PacketSendPost<Msg>, _>("seen-out", move |e| {
            s.lock().push((e.packet.direction, e.packet.sequence));
        });
        let s = Arc::clone(&seen);
        gate.bus().subscribe_system::<PacketReceivePost<Msg>, _>("seen-in", move |e| {
            s.lock().push((e.packet.direction, e.packet.sequence));
        });

        gate.send(Msg::Ping(0), |_| {});
        gate.receive(Msg::Ping(0), |_| {});

        assert_eq!(
            *seen.lock(),
            vec![(Direction::Outbound, 0), (Direction::Inbound, 1)]
        );
    }

    #[test]
    fn identical_sends_get_identical_outcomes() {
        let gate = gate();
        gate.bus().subscribe_system::<PacketSendPre<Msg>, _>("bump", |e| {
            if let Msg::Ping(n) = e.message_mut() {
                *n += 1;
            }
        });
        gate.bus().subscribe_system::<PacketSendPre<Msg>, _>("censor", |e| {
            if matches!(e.message(), Msg::Chat(_)) {
                e.cancel();
            }
        });

        let mut wire = Vec::new();
        let pings = [
            gate.send(Msg::Ping(4), |m| wire.push(m.clone())),
            gate.send(Msg::Ping(4), |m| wire.push(m.clone())),
        ];
        let chats = [
            gate.send(Msg::Chat("x".into()), |m| wire.push(m.clone())),
            gate.send(Msg::Chat("x".into()), |m| wire.push(m.clone())),
        ];

        assert_eq!(pings, [Delivery::Delivered; 2]);
        assert_eq!(chats, [Delivery::Suppressed; 2]);
        assert_eq!(wire, vec![Msg::Ping(5), Msg::Ping(5)]);
    }
}
