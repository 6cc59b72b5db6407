//! # Packet Envelopes and Events
//!
//! The gate is generic over the host's message type `M`; the four event types
//! are therefore generic too, and each `M` gets its own subscriber lists.

use std::fmt;

use pivot_events::Event;

/// Which way a message travels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Client to peer.
    Outbound,
    /// Peer to client.
    Inbound,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Outbound => "outbound",
            Direction::Inbound => "inbound",
        })
    }
}

/// A message observed at the network boundary.
#[derive(Clone, Debug, PartialEq)]
pub struct PacketEnvelope<M> {
    /// Travel direction.
    pub direction: Direction,
    /// Per-gate sequence number, in observation order.
    pub sequence: u64,
    /// The host's message.
    pub message: M,
}

impl<M> PacketEnvelope<M> {
    /// Wraps a message.
    #[must_use]
    pub fn new(direction: Direction, sequence: u64, message: M) -> Self {
        Self {
            direction,
            sequence,
            message,
        }
    }
}

macro_rules! packet_event {
    ($(#[$doc:meta])* $name:ident, $label:literal, $cancellable:literal) => {
        $(#[$doc])*
        #[derive(Clone, Debug, PartialEq)]
        pub struct $name<M> {
            /// The message and its metadata.
            pub packet: PacketEnvelope<M>,
        }

        impl<M> $name<M> {
            /// The message.
            #[must_use]
            pub fn message(&self) -> &M {
                &self.packet.message
            }

            /// The message, mutably.
            pub fn message_mut(&mut self) -> &mut M {
                &mut self.packet.message
            }
        }

        impl<M: Send + 'static> Event for $name<M> {
            const NAME: &'static str = $label;
            const CANCELLABLE: bool = $cancellable;
        }
    };
}

packet_event!(
    /// Before transmission. Cancel to suppress the send.
    PacketSendPre, "Packet.Send.Pre", true
);
packet_event!(
    /// After transmission.
    PacketSendPost, "Packet.Send.Post", false
);
packet_event!(
    /// Before the host handles an inbound message. Cancel to drop it.
    PacketReceivePre, "Packet.Receive.Pre", true
);
packet_event!(
    /// After the host handled an inbound message.
    PacketReceivePost, "Packet.Receive.Post", false
);
