//! # PIVOT Packet Interception Gate
//!
//! Every message crossing the host's network boundary is bracketed by events:
//!
//! ```text
//! outbound:  Send.Pre ──(not canceled)──> transmit ──> Send.Post
//! inbound:   Receive.Pre ──(not canceled)──> handle ──> Receive.Post
//! ```
//!
//! Pre events may cancel and may rewrite the message. Post events are
//! informational. The [`MovementReporter`] builds outbound movement messages
//! from host state with the arbitrated rotation already written in, so Send
//! subscribers only ever observe final values.

#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod envelope;
pub mod gate;
pub mod reporter;

pub use envelope::{
    Direction, PacketEnvelope, PacketReceivePost, PacketReceivePre, PacketSendPost, PacketSendPre,
};
pub use gate::{Delivery, GateStats, PacketGate};
pub use reporter::{
    MovementMessage, MovementPost, MovementPre, MovementReport, MovementReporter, MovementSnapshot,
    DEFAULT_POSITION_RESEND_INTERVAL,
};
