//! # Movement Reporter
//!
//! Once per tick the host would populate a movement message from the
//! player's raw state. The reporter does that instead, writing in the
//! arbitrated network rotation first:
//!
//! ```text
//! host snapshot ──(rotation := network view)──> Movement.Pre (may cancel / edit)
//!     │
//!     ├─ sprint / sneak changed?  ──> gate.send
//!     ├─ pick Full | Position | Look | GroundOnly | nothing ──> gate.send
//!     │
//! on_rotation_sent() ──> Movement.Post
//! ```
//!
//! "Last sent" bookkeeping only advances when the gate delivered the
//! message, so a suppressed update is retried on the next tick.

use std::sync::Arc;

use parking_lot::Mutex;

use pivot_events::{Event, EventBus};
use pivot_rotation::RotationManager;
use pivot_shared::{Rotation, Vec3, TICKS_PER_SECOND};

use crate::gate::{Delivery, PacketGate};

/// Ticks without a position update after which position is resent anyway.
pub const DEFAULT_POSITION_RESEND_INTERVAL: u32 = TICKS_PER_SECOND;

/// The player's state as a movement message sees it.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MovementSnapshot {
    /// Feet position.
    pub position: Vec3,
    /// Reported rotation.
    pub rotation: Rotation,
    /// Standing on a block.
    pub on_ground: bool,
    /// Pressed against a wall.
    pub horizontal_collision: bool,
    /// Sprinting.
    pub sprinting: bool,
    /// Sneaking.
    pub sneaking: bool,
}

/// Outbound player state messages. The host converts these into its own
/// message type through `From`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MovementMessage {
    /// Position and look changed.
    Full {
        /// Position.
        position: Vec3,
        /// Rotation.
        rotation: Rotation,
        /// Ground flag.
        on_ground: bool,
        /// Collision flag.
        horizontal_collision: bool,
    },
    /// Position changed (or the resend interval elapsed).
    Position {
        /// Position.
        position: Vec3,
        /// Ground flag.
        on_ground: bool,
        /// Collision flag.
        horizontal_collision: bool,
    },
    /// Look changed.
    Look {
        /// Rotation.
        rotation: Rotation,
        /// Ground flag.
        on_ground: bool,
        /// Collision flag.
        horizontal_collision: bool,
    },
    /// Only the ground or collision flags changed.
    GroundOnly {
        /// Ground flag.
        on_ground: bool,
        /// Collision flag.
        horizontal_collision: bool,
    },
    /// Sprint state toggled.
    Sprint(bool),
    /// Sneak state toggled.
    Sneak(bool),
}

/// Posted before a movement update is built. Cancel to skip this tick's
/// update; edit the snapshot to change what is reported.
#[derive(Clone, Debug, PartialEq)]
pub struct MovementPre {
    /// What is about to be reported.
    pub snapshot: MovementSnapshot,
}

impl Event for MovementPre {
    const NAME: &'static str = "Movement.Pre";
    const CANCELLABLE: bool = true;
}

/// Posted after the update, whether or not anything was sent.
#[derive(Clone, Debug, PartialEq)]
pub struct MovementPost {
    /// What happened.
    pub report: MovementReport,
}

impl Event for MovementPost {
    const NAME: &'static str = "Movement.Post";
}

/// Outcome of one [`MovementReporter::report`] call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MovementReport {
    /// Movement.Pre was canceled.
    pub canceled: bool,
    /// Messages the gate delivered, in send order.
    pub delivered: Vec<MovementMessage>,
    /// Messages a Send.Pre subscriber suppressed.
    pub suppressed: Vec<MovementMessage>,
    /// Rotation the host camera must be set to (Lock mode).
    pub lock_rotation: Option<Rotation>,
}

#[derive(Clone, Copy, Debug, Default)]
struct LastSent {
    position: Vec3,
    rotation: Rotation,
    on_ground: bool,
    horizontal_collision: bool,
    sprinting: bool,
    sneaking: bool,
    ticks_since_position: u32,
}

/// Builds and sends the per-tick movement messages.
pub struct MovementReporter {
    bus: Arc<EventBus>,
    rotation: Arc<RotationManager>,
    resend_interval: u32,
    last: Mutex<LastSent>,
}

impl MovementReporter {
    /// Creates a reporter.
    #[must_use]
    pub fn new(bus: Arc<EventBus>, rotation: Arc<RotationManager>, resend_interval: u32) -> Self {
        Self {
            bus,
            rotation,
            resend_interval: resend_interval.max(1),
            last: Mutex::new(LastSent::default()),
        }
    }

    /// Forgets what was last sent (new connection).
    pub fn reset(&self) {
        *self.last.lock() = LastSent::default();
    }

    /// Reports `host` state for this tick through `gate`.
    pub fn report<M>(&self, gate: &PacketGate<M>, host: MovementSnapshot, mut transmit: impl FnMut(&M)) -> MovementReport
    where
        M: From<MovementMessage> + Send + 'static,
    {
        let mut snapshot = host;
        if let Some(network) = self.rotation.network_rotation() {
            snapshot.rotation = network;
        }

        let pre = self.bus.post(MovementPre { snapshot });
        let mut report = MovementReport {
            canceled: pre.is_canceled(),
            ..MovementReport::default()
        };

        if !report.canceled {
            let snapshot = pre.into_inner().snapshot;
            let mut last = *self.last.lock();
            let mut send = |message: MovementMessage| {
                let delivery = gate.send(M::from(message), &mut transmit);
                match delivery {
                    Delivery::Delivered => report.delivered.push(message),
                    Delivery::Suppressed => report.suppressed.push(message),
                }
                delivery.is_delivered()
            };

            if snapshot.sprinting != last.sprinting && send(MovementMessage::Sprint(snapshot.sprinting)) {
                last.sprinting = snapshot.sprinting;
            }
            if snapshot.sneaking != last.sneaking && send(MovementMessage::Sneak(snapshot.sneaking)) {
                last.sneaking = snapshot.sneaking;
            }

            last.ticks_since_position += 1;
            let update_position = snapshot.position.differs_from(last.position)
                || last.ticks_since_position >= self.resend_interval;
            let update_rotation = snapshot.rotation != last.rotation;

            if let Some(message) = choose_message(&snapshot, &last, update_position, update_rotation) {
                if send(message) {
                    if update_position {
                        last.position = snapshot.position;
                        last.ticks_since_position = 0;
                    }
                    if update_rotation {
                        last.rotation = snapshot.rotation;
                    }
                    last.on_ground = snapshot.on_ground;
                    last.horizontal_collision = snapshot.horizontal_collision;
                }
            }

            *self.last.lock() = last;
        }

        report.lock_rotation = self.rotation.on_rotation_sent();
        self.bus.post(MovementPost { report }).into_inner().report
    }
}

fn choose_message(
    snapshot: &MovementSnapshot,
    last: &LastSent,
    update_position: bool,
    update_rotation: bool,
) -> Option<MovementMessage> {
    let on_ground = snapshot.on_ground;
    let horizontal_collision = snapshot.horizontal_collision;

    if update_position && update_rotation {
        Some(MovementMessage::Full {
            position: snapshot.position,
            rotation: snapshot.rotation,
            on_ground,
            horizontal_collision,
        })
    } else if update_position {
        Some(MovementMessage::Position {
            position: snapshot.position,
            on_ground,
            horizontal_collision,
        })
    } else if update_rotation {
        Some(MovementMessage::Look {
            rotation: snapshot.rotation,
            on_ground,
            horizontal_collision,
        })
    } else if on_ground != last.on_ground || horizontal_collision != last.horizontal_collision {
        Some(MovementMessage::GroundOnly {
            on_ground,
            horizontal_collision,
        })
    } else {
        None
    }
}
