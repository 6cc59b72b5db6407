//! # Rotation Manager
//!
//! Arbitrates between competing [`RotationRequest`]s and derives the
//! [`RotationState`] views once per tick.
//!
//! ## Evaluation (on Tick.Pre)
//!
//! ```text
//! 1. snapshot outstanding requests            (lock, copy, unlock)
//! 2. check owner enabled + validity predicate (no lock held)
//! 3. expire failures, select max (priority, sequence)
//! 4. supersede the previously active request if it lost
//! 5. recompute network / render / interaction views
//! ```
//!
//! Step 2 runs module code, so the lock is released around it. A predicate
//! may call back into the manager (for example to submit a follow-up
//! request); such a request is considered from the next evaluation on.
//!
//! ## Queries
//!
//! Every query returns `None` when no request is active. `None` means "use the
//! host's own value", never zero degrees.

use std::collections::VecDeque;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use pivot_events::{EventBus, SubscriptionId, Toggle};
use pivot_phase::TickPre;
use pivot_shared::Rotation;

use crate::error::{RotationError, RotationResult};
use crate::policy::{AimSource, RenderSmoothing, RotationMode, TurnSpeed};
use crate::request::{validate_target, RequestId, RequestStatus, RotationRequest, Validity};
use crate::settings::RotationSettings;
use crate::state::{RotationState, RotationView};
use crate::strafe::{redirect_strafe, StrafeInput};

/// Reads the host's own (un-overridden) player rotation.
pub type HostRotation = Arc<dyn Fn() -> Rotation + Send + Sync>;

struct Entry {
    id: RequestId,
    owner: Arc<dyn Toggle>,
    request: RotationRequest,
    status: RequestStatus,
}

/// The active request's effective policies.
#[derive(Clone, Copy)]
struct Applied {
    target: Rotation,
    mode: RotationMode,
    turn_speed: TurnSpeed,
    smoothing: RenderSmoothing,
    aim: AimSource,
}

struct Arbiter {
    settings: RotationSettings,
    entries: Vec<Entry>,
    active: Option<RequestId>,
    history: VecDeque<(RequestId, RequestStatus)>,
    state: RotationState,
    rng: ChaCha8Rng,
}

impl Arbiter {
    fn position(&self, id: RequestId) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    fn retire(&mut self, index: usize, status: RequestStatus) {
        let entry = self.entries.remove(index);
        tracing::debug!(
            request = %entry.id,
            owner = entry.owner.name(),
            status = ?status,
            "rotation request retired"
        );

        if self.active == Some(entry.id) {
            self.active = None;
        }
        if self.history.len() >= self.settings.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back((entry.id, status));
    }

    fn applied(&self) -> Option<Applied> {
        let id = self.active?;
        let entry = self.entries.iter().find(|e| e.id == id)?;
        let request = &entry.request;
        Some(Applied {
            target: request.target,
            mode: request.mode.unwrap_or(self.settings.default_mode),
            turn_speed: request.turn_speed.unwrap_or(self.settings.turn_speed),
            smoothing: request.smoothing.unwrap_or(self.settings.render_smoothing),
            aim: request.aim,
        })
    }

    fn recompute(&mut self, host: Rotation) {
        let previous_render = self.state.render;
        self.state.previous_render = previous_render;

        match self.applied() {
            Some(applied) => {
                let network = applied
                    .turn_speed
                    .step(self.state.server, applied.target, &mut self.rng);
                let render = applied.smoothing.apply(previous_render, network);

                self.state.network = network;
                self.state.render = render;
                self.state.interaction = match applied.aim {
                    AimSource::Render => render,
                    AimSource::Network => network,
                };
            }
            None => {
                self.state.network = host;
                self.state.render = host;
                self.state.interaction = host;
            }
        }
    }
}

/// The rotation arbitration engine.
pub struct RotationManager {
    next_id: AtomicU64,
    inner: Mutex<Arbiter>,
}

impl RotationManager {
    /// Creates an engine with `settings`.
    ///
    /// # Errors
    ///
    /// Invalid default policies.
    pub fn new(settings: RotationSettings) -> RotationResult<Self> {
        settings.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(settings.rng_seed);
        Ok(Self {
            next_id: AtomicU64::new(1),
            inner: Mutex::new(Arbiter {
                history: VecDeque::with_capacity(settings.history_capacity),
                settings,
                entries: Vec::new(),
                active: None,
                state: RotationState::default(),
                rng,
            }),
        })
    }

    /// Evaluates on every Tick.Pre posted on `bus`, reading the host's raw
    /// rotation through `host`.
    pub fn install(self: &Arc<Self>, bus: &EventBus, host: HostRotation) -> SubscriptionId {
        let engine: Weak<Self> = Arc::downgrade(self);
        bus.subscribe_system::<TickPre, _>("rotation-manager", move |_| {
            if let Some(engine) = engine.upgrade() {
                engine.evaluate(host());
            }
        })
    }

    /// Current settings.
    #[must_use]
    pub fn settings(&self) -> RotationSettings {
        self.inner.lock().settings.clone()
    }

    /// Submits a request on behalf of `owner`.
    ///
    /// The request is Pending until the next evaluation.
    ///
    /// # Errors
    ///
    /// Malformed targets or policy parameters. Nothing is registered.
    pub fn request<T>(&self, owner: &T, request: RotationRequest) -> RotationResult<RequestId>
    where
        T: Toggle + Clone + 'static,
    {
        if let Err(err) = request.validate() {
            tracing::warn!(owner = owner.name(), error = %err, "rotation request rejected");
            return Err(err);
        }

        let id = RequestId(self.next_id.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(
            request = %id,
            owner = owner.name(),
            priority = request.priority,
            "rotation request accepted"
        );

        self.inner.lock().entries.push(Entry {
            id,
            owner: Arc::new(owner.clone()),
            request,
            status: RequestStatus::Pending,
        });
        Ok(id)
    }

    /// Moves an outstanding request's target.
    ///
    /// # Errors
    ///
    /// Malformed target, or the request is no longer outstanding.
    pub fn retarget(&self, id: RequestId, target: Rotation) -> RotationResult<()> {
        validate_target(target)?;
        let mut arbiter = self.inner.lock();
        let entry = arbiter
            .entries
            .iter_mut()
            .find(|e| e.id == id)
            .ok_or(RotationError::UnknownRequest(id))?;
        entry.request.target = target;
        Ok(())
    }

    /// Marks a request as finished by its owner.
    ///
    /// # Errors
    ///
    /// [`RotationError::UnknownRequest`] if it is no longer outstanding.
    pub fn complete(&self, id: RequestId) -> RotationResult<()> {
        let mut arbiter = self.inner.lock();
        let index = arbiter.position(id).ok_or(RotationError::UnknownRequest(id))?;
        arbiter.retire(index, RequestStatus::Completed);
        Ok(())
    }

    /// Runs one arbitration pass and recomputes the rotation state.
    pub fn evaluate(&self, host: Rotation) {
        let candidates: Vec<(RequestId, Arc<dyn Toggle>, Option<Validity>)> = {
            let arbiter = self.inner.lock();
            arbiter
                .entries
                .iter()
                .map(|e| (e.id, Arc::clone(&e.owner), e.request.validity.clone()))
                .collect()
        };

        let verdicts: Vec<(RequestId, bool)> = candidates
            .into_iter()
            .map(|(id, owner, validity)| (id, still_valid(id, owner.as_ref(), validity.as_ref())))
            .collect();

        let mut arbiter = self.inner.lock();

        for &(id, valid) in &verdicts {
            if !valid {
                if let Some(index) = arbiter.position(id) {
                    arbiter.retire(index, RequestStatus::Expired);
                }
            }
        }

        let selected = arbiter
            .entries
            .iter()
            .filter(|e| verdicts.iter().any(|&(id, valid)| valid && id == e.id))
            .max_by_key(|e| (e.request.priority, e.id))
            .map(|e| e.id);

        if arbiter.active != selected {
            if let Some(previous) = arbiter.active {
                if let Some(index) = arbiter.position(previous) {
                    arbiter.retire(index, RequestStatus::Superseded);
                }
            }
            if let Some(id) = selected {
                if let Some(entry) = arbiter.entries.iter_mut().find(|e| e.id == id) {
                    entry.status = RequestStatus::Active;
                    tracing::debug!(request = %id, owner = entry.owner.name(), "rotation request active");
                }
            }
            arbiter.active = selected;
        }

        arbiter.recompute(host);
    }

    /// Records that the network view was just sent to the peer.
    ///
    /// Returns the rotation the host should write back into its camera when
    /// the active request is in [`RotationMode::Lock`].
    pub fn on_rotation_sent(&self) -> Option<Rotation> {
        let mut arbiter = self.inner.lock();
        arbiter.state.previous_server = arbiter.state.server;
        arbiter.state.server = arbiter.state.network;

        match arbiter.applied() {
            Some(applied) if applied.mode == RotationMode::Lock => Some(arbiter.state.server),
            _ => None,
        }
    }

    /// Expires every request and reseeds all views with `rotation`.
    ///
    /// Used on connect and when the peer corrects the player's rotation.
    pub fn reset(&self, rotation: Rotation) {
        let mut arbiter = self.inner.lock();
        tracing::debug!(yaw = rotation.yaw, pitch = rotation.pitch, "rotation state reset");
        while !arbiter.entries.is_empty() {
            arbiter.retire(0, RequestStatus::Expired);
        }
        arbiter.active = None;
        arbiter.state = RotationState::uniform(rotation);
    }

    /// Lifecycle state of a request. `None` once it has aged out of the
    /// history.
    #[must_use]
    pub fn status(&self, id: RequestId) -> Option<RequestStatus> {
        let arbiter = self.inner.lock();
        if let Some(entry) = arbiter.entries.iter().find(|e| e.id == id) {
            return Some(entry.status);
        }
        arbiter
            .history
            .iter()
            .rev()
            .find(|(h, _)| *h == id)
            .map(|&(_, status)| status)
    }

    /// The request currently driving the state.
    #[must_use]
    pub fn active_request(&self) -> Option<RequestId> {
        self.inner.lock().active
    }

    /// Outstanding (Pending or Active) requests.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Full state snapshot, including pass-through values.
    #[must_use]
    pub fn state(&self) -> RotationState {
        self.inner.lock().state
    }

    /// True once the reported rotation has arrived at the active request's
    /// target.
    #[must_use]
    pub fn target_reached(&self) -> bool {
        let arbiter = self.inner.lock();
        arbiter
            .applied()
            .is_some_and(|applied| arbiter.state.network.approx_eq(applied.target))
    }

    fn query(&self, pick: impl FnOnce(&Applied, &RotationState) -> Option<Rotation>) -> Option<Rotation> {
        let arbiter = self.inner.lock();
        let applied = arbiter.applied()?;
        pick(&applied, &arbiter.state)
    }

    /// Rotation for outbound movement state.
    #[must_use]
    pub fn network_rotation(&self) -> Option<Rotation> {
        self.query(|_, state| Some(state.view(RotationView::Network)))
    }

    /// Rotation local physics should move along. `None` in Silent mode.
    #[must_use]
    pub fn movement_rotation(&self) -> Option<Rotation> {
        self.query(|applied, state| (applied.mode != RotationMode::Silent).then_some(state.network))
    }

    /// Movement yaw override.
    #[must_use]
    pub fn movement_yaw(&self) -> Option<f64> {
        self.movement_rotation().map(|r| r.yaw)
    }

    /// Movement pitch override.
    #[must_use]
    pub fn movement_pitch(&self) -> Option<f64> {
        self.movement_rotation().map(|r| r.pitch)
    }

    /// Rotation for drawing the head and body.
    #[must_use]
    pub fn head_rotation(&self) -> Option<Rotation> {
        self.query(|_, state| Some(state.view(RotationView::Render)))
    }

    /// Head yaw override.
    #[must_use]
    pub fn head_yaw(&self) -> Option<f64> {
        self.head_rotation().map(|r| r.yaw)
    }

    /// Head pitch override.
    #[must_use]
    pub fn head_pitch(&self) -> Option<f64> {
        self.head_rotation().map(|r| r.pitch)
    }

    /// Rotation for the hand and held item. `None` in Silent mode.
    #[must_use]
    pub fn hand_rotation(&self) -> Option<Rotation> {
        self.query(|applied, state| (applied.mode != RotationMode::Silent).then_some(state.interaction))
    }

    /// Hand yaw override.
    #[must_use]
    pub fn hand_yaw(&self) -> Option<f64> {
        self.hand_rotation().map(|r| r.yaw)
    }

    /// Hand pitch override.
    #[must_use]
    pub fn hand_pitch(&self) -> Option<f64> {
        self.hand_rotation().map(|r| r.pitch)
    }

    /// Rotation for aim and line-of-sight math.
    #[must_use]
    pub fn interaction_rotation(&self) -> Option<Rotation> {
        self.query(|_, state| Some(state.view(RotationView::Interaction)))
    }

    /// Render rotation interpolated between the last two ticks.
    #[must_use]
    pub fn render_rotation(&self, partial_tick: f64) -> Option<Rotation> {
        let t = partial_tick.clamp(0.0, 1.0);
        self.query(|_, state| Some(state.previous_render.lerp(state.render, t)))
    }

    /// Rotation for the movement input vector mid-tick: between the last sent
    /// value and the current network value. `None` in Silent mode.
    #[must_use]
    pub fn movement_vector_rotation(&self, partial_tick: f64) -> Option<Rotation> {
        let t = partial_tick.clamp(0.0, 1.0);
        self.query(|applied, state| {
            (applied.mode != RotationMode::Silent).then(|| state.server.lerp(state.network, t))
        })
    }

    /// Rotation the host camera is pinned to. Lock mode only.
    #[must_use]
    pub fn lock_rotation(&self) -> Option<Rotation> {
        self.query(|applied, state| (applied.mode == RotationMode::Lock).then_some(state.network))
    }

    /// Redirects directional input so the character still travels where the
    /// camera faces while moving along the overridden yaw.
    #[must_use]
    pub fn redirect_strafe(&self, input: StrafeInput, camera_yaw: f32) -> StrafeInput {
        match self.movement_yaw() {
            Some(movement_yaw) => redirect_strafe(input, camera_yaw, movement_yaw as f32),
            None => input,
        }
    }
}

impl std::fmt::Debug for RotationManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let arbiter = self.inner.lock();
        f.debug_struct("RotationManager")
            .field("outstanding", &arbiter.entries.len())
            .field("active", &arbiter.active)
            .field("state", &arbiter.state)
            .finish()
    }
}

fn still_valid(id: RequestId, owner: &dyn Toggle, validity: Option<&Validity>) -> bool {
    if !owner.is_enabled() {
        tracing::debug!(request = %id, owner = owner.name(), "owner disabled");
        return false;
    }
    let Some(predicate) = validity else {
        return true;
    };
    match catch_unwind(AssertUnwindSafe(|| predicate())) {
        Ok(valid) => valid,
        Err(_) => {
            tracing::error!(request = %id, owner = owner.name(), "validity predicate panicked, request expired");
            false
        }
    }
}
