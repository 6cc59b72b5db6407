//! # Client Driver
//!
//! Runs the host's tick and frame through the sequencer.
//!
//! ## Tick Order
//!
//! ```text
//! sample host rotation
//! Tick.Pre                       (rotation engine evaluates here)
//! 1. Network      host.network_tick
//! 2. Input        host.handle_input        (path dependent, see TickPath)
//! 3. WorldRender  host.world_render_tick
//! 4. Player       host.player_tick, then the movement report
//! 5. Sound        host.sound_tick
//! Tick.Post
//! ```

use pivot_network::{Delivery, MovementReport};
use pivot_phase::Phase;

use crate::context::ClientContext;
use crate::host::{ClientHost, TickPath};

/// A host and the context instrumenting it.
pub struct ClientDriver<H: ClientHost> {
    context: ClientContext<H::Message>,
    host: H,
}

impl<H: ClientHost> ClientDriver<H> {
    /// Pairs `host` with `context`.
    #[must_use]
    pub fn new(context: ClientContext<H::Message>, host: H) -> Self {
        Self { context, host }
    }

    /// The context.
    #[must_use]
    pub fn context(&self) -> &ClientContext<H::Message> {
        &self.context
    }

    /// The host.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The host, mutably.
    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Splits the driver apart.
    pub fn into_parts(self) -> (ClientContext<H::Message>, H) {
        (self.context, self.host)
    }

    /// Starts a session at the host's current rotation.
    pub fn connect(&mut self) {
        self.context.connect(self.host.player_rotation());
    }

    /// Runs one host tick.
    ///
    /// # Panics
    ///
    /// Called while a tick is already open (a subscriber re-entering the
    /// driver is a host adapter defect).
    pub fn tick(&mut self, path: TickPath) -> MovementReport {
        *self.context.host_rotation.lock() = self.host.player_rotation();

        let ClientContext {
            sequencer,
            gate,
            reporter,
            ..
        } = &mut self.context;
        let host = &mut self.host;

        sequencer.begin_tick();
        sequencer.wrap(Phase::Network, || host.network_tick());
        if path == TickPath::InputFirst {
            sequencer.wrap(Phase::Input, || host.handle_input());
        }
        sequencer.wrap(Phase::WorldRender, || host.world_render_tick());
        if path == TickPath::InputDeferred {
            sequencer.wrap(Phase::Input, || host.handle_input());
        }

        let report = sequencer.wrap(Phase::Player, || {
            host.player_tick();
            let state = host.player_state();
            reporter.report(gate, state, |message| host.transmit(message))
        });
        if let Some(lock) = report.lock_rotation {
            host.set_player_rotation(lock);
        }

        sequencer.wrap(Phase::Sound, || host.sound_tick());
        sequencer.end_tick();
        report
    }

    /// Runs one frame containing `ticks` ticks, then draws it at
    /// `partial_tick`.
    pub fn frame(&mut self, ticks: u32, partial_tick: f64, path: TickPath) -> Vec<MovementReport> {
        self.context.sequencer.begin_frame();
        let reports = (0..ticks).map(|_| self.tick(path)).collect();
        self.host.render_frame(partial_tick);
        self.context.sequencer.end_frame();
        reports
    }

    /// Sends a host-originated message through the gate.
    pub fn send(&mut self, message: H::Message) -> Delivery {
        let host = &mut self.host;
        self.context.gate.send(message, |m| host.transmit(m))
    }

    /// Delivers an inbound message through the gate.
    pub fn receive(&mut self, message: H::Message) -> Delivery {
        let host = &mut self.host;
        self.context.gate.receive(message, |m| host.handle_message(m))
    }
}
