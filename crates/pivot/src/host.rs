//! # Host Adapter Interface
//!
//! The host client is instrumented through exactly one adapter. The adapter
//! implements [`ClientHost`]; the [`ClientDriver`](crate::ClientDriver) calls
//! its steps from inside the right phase brackets.
//!
//! ```text
//! PIVOT defines:          The adapter implements:
//! ┌───────────────────┐   ┌──────────────────────┐
//! │ trait ClientHost  │ ←─│ impl ClientHost      │
//! │ trait HostMessage │ ←─│ impl HostMessage     │
//! └───────────────────┘   └──────────────────────┘
//! ```

use pivot_network::{MovementMessage, MovementSnapshot};
use pivot_shared::{Rotation, Vec3};

/// The host's network message type.
pub trait HostMessage: From<MovementMessage> + Send + 'static {
    /// The rotation a peer-issued position/rotation correction forces on the
    /// player, if this message is one.
    fn rotation_correction(&self) -> Option<Rotation> {
        None
    }
}

/// Which internal path the host took for its input step this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TickPath {
    /// Input is handled before the world renderer ticks.
    #[default]
    InputFirst,
    /// The input step is bypassed entirely.
    InputSkipped,
    /// The input step runs, but only after the world renderer ticked.
    InputDeferred,
}

/// The host steps PIVOT brackets, plus the player state it reads.
pub trait ClientHost {
    /// Network message type.
    type Message: HostMessage;

    /// Drains and handles pending network traffic.
    fn network_tick(&mut self);

    /// Applies this tick's user input.
    fn handle_input(&mut self);

    /// Ticks the world renderer.
    fn world_render_tick(&mut self);

    /// Ticks the sound engine.
    fn sound_tick(&mut self);

    /// Updates the controlled character.
    fn player_tick(&mut self);

    /// Draws one frame.
    fn render_frame(&mut self, partial_tick: f64);

    /// The player's own rotation, before any override.
    fn player_rotation(&self) -> Rotation;

    /// Writes the camera rotation (Lock mode write-back).
    fn set_player_rotation(&mut self, rotation: Rotation);

    /// The player's state as a movement message would report it.
    fn player_state(&self) -> MovementSnapshot;

    /// Puts a message on the wire.
    fn transmit(&mut self, message: &Self::Message);

    /// The host's own handling of an inbound message.
    fn handle_message(&mut self, message: &Self::Message);
}

// ============================================================================
// MOCK IMPLEMENTATION (For Testing)
// ============================================================================

/// Messages exchanged by [`MockHost`].
#[derive(Clone, Debug, PartialEq)]
pub enum MockMessage {
    /// Outbound movement.
    Movement(MovementMessage),
    /// Free text, either direction.
    Chat(String),
    /// Inbound teleport that also sets the player's rotation.
    Correction(Rotation),
}

impl From<MovementMessage> for MockMessage {
    fn from(message: MovementMessage) -> Self {
        Self::Movement(message)
    }
}

impl HostMessage for MockMessage {
    fn rotation_correction(&self) -> Option<Rotation> {
        match self {
            Self::Correction(rotation) => Some(*rotation),
            _ => None,
        }
    }
}

/// A host step recorded by [`MockHost`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum HostCall {
    /// `network_tick`.
    Network,
    /// `handle_input`.
    Input,
    /// `world_render_tick`.
    WorldRender,
    /// `sound_tick`.
    Sound,
    /// `player_tick`.
    Player,
    /// `render_frame`.
    Render(f64),
}

/// Recording host for tests.
#[derive(Debug, Default)]
pub struct MockHost {
    /// Steps in call order.
    pub calls: Vec<HostCall>,
    /// Messages transmitted.
    pub sent: Vec<MockMessage>,
    /// Inbound messages the host handled.
    pub handled: Vec<MockMessage>,
    /// The player's own rotation.
    pub rotation: Rotation,
    /// Everything but the rotation.
    pub state: MovementSnapshot,
}

impl MockHost {
    /// Creates a host at the origin, looking along yaw 0.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Turns the player.
    pub fn look(&mut self, yaw: f64, pitch: f64) {
        self.rotation = Rotation::new(yaw, pitch);
    }

    /// Moves the player.
    pub fn move_to(&mut self, position: Vec3) {
        self.state.position = position;
    }

    /// Movement messages transmitted so far.
    #[must_use]
    pub fn sent_movement(&self) -> Vec<MovementMessage> {
        self.sent
            .iter()
            .filter_map(|m| match m {
                MockMessage::Movement(movement) => Some(*movement),
                _ => None,
            })
            .collect()
    }

    /// Tick steps only, render calls filtered out.
    #[must_use]
    pub fn tick_calls(&self) -> Vec<HostCall> {
        self.calls
            .iter()
            .copied()
            .filter(|c| !matches!(c, HostCall::Render(_)))
            .collect()
    }
}

impl ClientHost for MockHost {
    type Message = MockMessage;

    fn network_tick(&mut self) {
        self.calls.push(HostCall::Network);
    }

    fn handle_input(&mut self) {
        self.calls.push(HostCall::Input);
    }

    fn world_render_tick(&mut self) {
        self.calls.push(HostCall::WorldRender);
    }

    fn sound_tick(&mut self) {
        self.calls.push(HostCall::Sound);
    }

    fn player_tick(&mut self) {
        self.calls.push(HostCall::Player);
    }

    fn render_frame(&mut self, partial_tick: f64) {
        self.calls.push(HostCall::Render(partial_tick));
    }

    fn player_rotation(&self) -> Rotation {
        self.rotation
    }

    fn set_player_rotation(&mut self, rotation: Rotation) {
        self.rotation = rotation;
    }

    fn player_state(&self) -> MovementSnapshot {
        MovementSnapshot {
            rotation: self.rotation,
            ..self.state
        }
    }

    fn transmit(&mut self, message: &MockMessage) {
        self.sent.push(message.clone());
    }

    fn handle_message(&mut self, message: &MockMessage) {
        if let MockMessage::Correction(rotation) = message {
            self.rotation = *rotation;
        }
        self.handled.push(message.clone());
    }
}
