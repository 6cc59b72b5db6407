//! # Rotation Value Type
//!
//! Yaw/pitch pair in degrees, matching the host's entity orientation.
//!
//! ## Continuity
//!
//! Yaw is NEVER wrapped when a step is applied. The host reports yaw as a
//! continuous value (it can be 721.5 after two turns), and the remote peer
//! flags rotations that jump by a multiple of 360 between packets. All
//! interpolation therefore computes the *difference* on the wrapped circle
//! (shortest path) and adds it to the unwrapped current yaw.
//!
//! Pitch is always clamped to `[MIN_PITCH, MAX_PITCH]`.

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_PITCH, MIN_PITCH, ROTATION_EPSILON};

/// Wraps an angle into `[-180, 180)`.
///
/// ```
/// use pivot_shared::wrap_degrees;
/// assert_eq!(wrap_degrees(190.0), -170.0);
/// assert_eq!(wrap_degrees(180.0), -180.0);
/// ```
#[must_use]
pub fn wrap_degrees(degrees: f64) -> f64 {
    let mut d = degrees % 360.0;
    if d >= 180.0 {
        d -= 360.0;
    }
    if d < -180.0 {
        d += 360.0;
    }
    d
}

/// Shortest signed turn from `from` to `to`.
///
/// When `to` is already within half a turn of `from` the raw difference is
/// used, so a target of exactly 180 from 0 arrives as 180 rather than -180.
fn yaw_difference(from: f64, to: f64) -> f64 {
    let raw = to - from;
    if (-180.0..=180.0).contains(&raw) {
        raw
    } else {
        wrap_degrees(raw)
    }
}

/// An orientation: yaw (horizontal) and pitch (vertical), in degrees.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rotation {
    /// Horizontal angle. Continuous, not wrapped.
    pub yaw: f64,
    /// Vertical angle, -90 (up) to 90 (down).
    pub pitch: f64,
}

impl Rotation {
    /// Looking straight ahead along +Z.
    pub const ZERO: Self = Self::new(0.0, 0.0);
    /// Looking straight down.
    pub const DOWN: Self = Self::new(0.0, MAX_PITCH);
    /// Looking straight up.
    pub const UP: Self = Self::new(0.0, MIN_PITCH);

    /// Creates a rotation. No clamping is applied.
    #[must_use]
    pub const fn new(yaw: f64, pitch: f64) -> Self {
        Self { yaw, pitch }
    }

    /// Creates a rotation from the host's single precision angles.
    #[must_use]
    pub fn from_f32(yaw: f32, pitch: f32) -> Self {
        Self::new(f64::from(yaw), f64::from(pitch))
    }

    /// Yaw as the host's single precision value.
    #[must_use]
    pub fn yaw_f32(self) -> f32 {
        self.yaw as f32
    }

    /// Pitch as the host's single precision value.
    #[must_use]
    pub fn pitch_f32(self) -> f32 {
        self.pitch as f32
    }

    /// True when both angles are finite numbers.
    #[must_use]
    pub fn is_finite(self) -> bool {
        self.yaw.is_finite() && self.pitch.is_finite()
    }

    /// True when pitch lies within the legal range.
    #[must_use]
    pub fn pitch_in_range(self) -> bool {
        (MIN_PITCH..=MAX_PITCH).contains(&self.pitch)
    }

    /// Compares the values the host would actually see (f32 precision).
    #[must_use]
    pub fn equal_f32(self, other: Self) -> bool {
        self.yaw_f32() == other.yaw_f32() && self.pitch_f32() == other.pitch_f32()
    }

    /// Adds a delta, clamping the resulting pitch.
    #[must_use]
    pub fn with_delta(self, yaw: f64, pitch: f64) -> Self {
        Self::new(self.yaw + yaw, (self.pitch + pitch).clamp(MIN_PITCH, MAX_PITCH))
    }

    /// Angular distance on the wrapped circle.
    #[must_use]
    pub fn distance(self, other: Self) -> f64 {
        wrap_degrees(self.yaw - other.yaw).hypot(wrap_degrees(self.pitch - other.pitch))
    }

    /// True when `other` is within [`ROTATION_EPSILON`] of `self`.
    #[must_use]
    pub fn approx_eq(self, other: Self) -> bool {
        self.distance(other) <= ROTATION_EPSILON
    }

    /// Linear interpolation along the shortest yaw path.
    ///
    /// `delta` of 0 returns `self`, 1 returns a rotation equivalent to
    /// `other` (same direction, yaw continuous from `self`).
    #[must_use]
    pub fn lerp(self, other: Self, delta: f64) -> Self {
        let yaw_diff = yaw_difference(self.yaw, other.yaw);
        let pitch_diff = other.pitch - self.pitch;

        Self::new(
            self.yaw + delta * yaw_diff,
            (self.pitch + delta * pitch_diff).clamp(MIN_PITCH, MAX_PITCH),
        )
    }

    /// Moves toward `other` by at most `speed` degrees of arc.
    ///
    /// The step is split between yaw and pitch in proportion to their share
    /// of the remaining distance, so both axes arrive on the same tick.
    #[must_use]
    pub fn step_toward(self, other: Self, speed: f64) -> Self {
        let yaw_diff = yaw_difference(self.yaw, other.yaw);
        let pitch_diff = other.pitch - self.pitch;

        let diff = yaw_diff.hypot(pitch_diff);
        let diff = if diff == 0.0 { 1.0 } else { diff };

        let yaw_speed = (yaw_diff / diff).abs() * speed;
        let pitch_speed = (pitch_diff / diff).abs() * speed;

        Self::new(
            self.yaw + yaw_diff.clamp(-yaw_speed, yaw_speed),
            (self.pitch + pitch_diff.clamp(-pitch_speed, pitch_speed)).clamp(MIN_PITCH, MAX_PITCH),
        )
    }

    /// Snaps onto `other` while keeping yaw continuous from `self`.
    #[must_use]
    pub fn snap_to(self, other: Self) -> Self {
        self.lerp(other, 1.0)
    }
}
