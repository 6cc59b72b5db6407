//! # Rotation Requests
//!
//! A module asks for control of the character's orientation by submitting a
//! [`RotationRequest`]. The manager assigns it a [`RequestId`] and tracks its
//! lifecycle:
//!
//! ```text
//!            ┌──────────── selected ───────────┐
//!            │                                 v
//!  request ─> Pending ──(predicate false)──> Expired <──(predicate false)── Active
//!                                                                            │
//!                                       Superseded <──(outranked)────────────┤
//!                                       Completed  <──(complete(id))─────────┘
//! ```
//!
//! Pending requests that lose arbitration stay pending; only a request that
//! was Active and then lost is Superseded.

use std::fmt;
use std::sync::Arc;

use pivot_shared::Rotation;

use crate::error::{RotationError, RotationResult};
use crate::policy::{AimSource, RenderSmoothing, RotationMode, TurnSpeed};

/// Identifier of a submitted request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rot#{}", self.0)
    }
}

/// Lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestStatus {
    /// Submitted, not (yet) selected.
    Pending,
    /// Currently driving the rotation state.
    Active,
    /// Finished by its owner.
    Completed,
    /// Was active, then outranked.
    Superseded,
    /// Predicate returned false, owner was disabled, or the state was reset.
    Expired,
}

impl RequestStatus {
    /// True for Completed, Superseded and Expired.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Superseded | Self::Expired)
    }
}

/// Shared validity predicate.
pub type Validity = Arc<dyn Fn() -> bool + Send + Sync>;

/// What a module submits.
#[derive(Clone)]
pub struct RotationRequest {
    pub(crate) target: Rotation,
    pub(crate) priority: i32,
    pub(crate) mode: Option<RotationMode>,
    pub(crate) turn_speed: Option<TurnSpeed>,
    pub(crate) smoothing: Option<RenderSmoothing>,
    pub(crate) aim: AimSource,
    pub(crate) validity: Option<Validity>,
}

impl RotationRequest {
    /// Request for `target` at `priority`. Higher priority wins.
    #[must_use]
    pub fn new(target: Rotation, priority: i32) -> Self {
        Self {
            target,
            priority,
            mode: None,
            turn_speed: None,
            smoothing: None,
            aim: AimSource::default(),
            validity: None,
        }
    }

    /// Shorthand for `new(Rotation::new(yaw, pitch), priority)`.
    #[must_use]
    pub fn look(yaw: f64, pitch: f64, priority: i32) -> Self {
        Self::new(Rotation::new(yaw, pitch), priority)
    }

    /// Keeps the request alive only while `predicate` returns true.
    ///
    /// Evaluated once per tick, outside any engine lock.
    #[must_use]
    pub fn valid_while(mut self, predicate: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.validity = Some(Arc::new(predicate));
        self
    }

    /// Overrides the configured default mode.
    #[must_use]
    pub fn mode(mut self, mode: RotationMode) -> Self {
        self.mode = Some(mode);
        self
    }

    /// Overrides the configured turn speed.
    #[must_use]
    pub fn turn_speed(mut self, speed: TurnSpeed) -> Self {
        self.turn_speed = Some(speed);
        self
    }

    /// Overrides the configured render smoothing.
    #[must_use]
    pub fn smoothing(mut self, smoothing: RenderSmoothing) -> Self {
        self.smoothing = Some(smoothing);
        self
    }

    /// Selects the view interaction queries read.
    #[must_use]
    pub fn aim(mut self, aim: AimSource) -> Self {
        self.aim = aim;
        self
    }

    /// Target rotation.
    #[must_use]
    pub fn target(&self) -> Rotation {
        self.target
    }

    /// Arbitration priority.
    #[must_use]
    pub fn priority(&self) -> i32 {
        self.priority
    }

    /// Rejects malformed input.
    ///
    /// # Errors
    ///
    /// Non-finite angles, pitch outside `[-90, 90]`, or invalid policy
    /// parameters.
    pub fn validate(&self) -> RotationResult<()> {
        validate_target(self.target)?;
        if let Some(speed) = self.turn_speed {
            speed.validate()?;
        }
        if let Some(smoothing) = self.smoothing {
            smoothing.validate()?;
        }
        Ok(())
    }
}

impl fmt::Debug for RotationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotationRequest")
            .field("target", &self.target)
            .field("priority", &self.priority)
            .field("mode", &self.mode)
            .field("turn_speed", &self.turn_speed)
            .field("smoothing", &self.smoothing)
            .field("aim", &self.aim)
            .field("has_validity", &self.validity.is_some())
            .finish()
    }
}

/// Checks a target rotation.
///
/// # Errors
///
/// [`RotationError::NonFiniteAngle`] or [`RotationError::PitchOutOfRange`].
pub fn validate_target(target: Rotation) -> RotationResult<()> {
    if !target.is_finite() {
        return Err(RotationError::NonFiniteAngle {
            yaw: target.yaw,
            pitch: target.pitch,
        });
    }
    if !target.pitch_in_range() {
        return Err(RotationError::PitchOutOfRange(target.pitch));
    }
    Ok(())
}
