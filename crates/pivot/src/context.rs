//! # Client Context
//!
//! The process-wide owner of every PIVOT unit. Construction order is fixed
//! and happens only here:
//!
//! ```text
//! EventBus ──> PhaseSequencer ──> RotationManager ──> PacketGate ──> MovementReporter
//!    │                                 │  (Tick.Pre hook)   │ (Receive.Post hook)
//!    └─────────── shared by all ───────┴────────────────────┘
//! ```
//!
//! Later units subscribe to the bus while they are built, so the bus must
//! exist first. The rotation hook runs ahead of any module's Tick.Pre
//! subscriber, because it is registered before modules exist.

use std::sync::Arc;

use parking_lot::Mutex;

use pivot_events::{EventBus, FaultSink, ModuleRegistry};
use pivot_network::{MovementReporter, PacketGate, PacketReceivePost};
use pivot_phase::PhaseSequencer;
use pivot_rotation::RotationManager;
use pivot_shared::Rotation;

use crate::config::PivotConfig;
use crate::error::ConfigResult;
use crate::host::HostMessage;

/// Every unit, wired together.
pub struct ClientContext<M> {
    config: PivotConfig,
    modules: ModuleRegistry,
    pub(crate) bus: Arc<EventBus>,
    pub(crate) sequencer: PhaseSequencer,
    pub(crate) rotation: Arc<RotationManager>,
    /// Host rotation sampled right before each Tick.Pre.
    pub(crate) host_rotation: Arc<Mutex<Rotation>>,
    pub(crate) gate: PacketGate<M>,
    pub(crate) reporter: MovementReporter,
}

impl<M: HostMessage> ClientContext<M> {
    /// Builds and wires every unit from `config`.
    ///
    /// # Errors
    ///
    /// The configuration fails validation.
    pub fn new(config: PivotConfig) -> ConfigResult<Self> {
        config.validate()?;

        let bus = Arc::new(EventBus::with_fault_sink(FaultSink::new(
            config.events.fault_channel_capacity,
        )));
        let sequencer = PhaseSequencer::new(Arc::clone(&bus));

        let rotation = Arc::new(RotationManager::new(config.rotation.clone())?);
        let host_rotation = Arc::new(Mutex::new(Rotation::ZERO));
        let sampled = Arc::clone(&host_rotation);
        rotation.install(&bus, Arc::new(move || *sampled.lock()));

        let gate = PacketGate::new(Arc::clone(&bus));
        let engine = Arc::downgrade(&rotation);
        bus.subscribe_system::<PacketReceivePost<M>, _>("rotation-correction", move |e| {
            if let (Some(correction), Some(engine)) = (e.message().rotation_correction(), engine.upgrade()) {
                engine.reset(correction);
            }
        });

        let reporter = MovementReporter::new(
            Arc::clone(&bus),
            Arc::clone(&rotation),
            config.network.position_resend_interval,
        );

        tracing::debug!(
            fault_capacity = config.events.fault_channel_capacity,
            resend_interval = config.network.position_resend_interval,
            "client context initialized"
        );

        Ok(Self {
            config,
            modules: ModuleRegistry::new(),
            bus,
            sequencer,
            rotation,
            host_rotation,
            gate,
            reporter,
        })
    }

    /// Starts a session: drops every rotation request and forgets what was
    /// last reported.
    pub fn connect(&self, rotation: Rotation) {
        *self.host_rotation.lock() = rotation;
        self.rotation.reset(rotation);
        self.reporter.reset();
        tracing::debug!("client context connected");
    }
}

impl<M> ClientContext<M> {
    /// The configuration the context was built from.
    #[must_use]
    pub fn config(&self) -> &PivotConfig {
        &self.config
    }

    /// Feature modules.
    #[must_use]
    pub fn modules(&self) -> &ModuleRegistry {
        &self.modules
    }

    /// The event bus.
    #[must_use]
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// The phase sequencer.
    #[must_use]
    pub fn sequencer(&self) -> &PhaseSequencer {
        &self.sequencer
    }

    /// The rotation engine.
    #[must_use]
    pub fn rotation(&self) -> &Arc<RotationManager> {
        &self.rotation
    }

    /// The packet gate.
    #[must_use]
    pub fn gate(&self) -> &PacketGate<M> {
        &self.gate
    }

    /// The movement reporter.
    #[must_use]
    pub fn reporter(&self) -> &MovementReporter {
        &self.reporter
    }
}
