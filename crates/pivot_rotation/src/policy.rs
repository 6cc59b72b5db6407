//! # Rotation Policies
//!
//! How a request is applied: which queries report it ([`RotationMode`]), how
//! fast the reported rotation turns ([`TurnSpeed`]), how the rendered rotation
//! follows ([`RenderSmoothing`]) and which view aim math reads
//! ([`AimSource`]).

use rand::Rng;
use serde::{Deserialize, Serialize};

use pivot_shared::Rotation;

use crate::error::{RotationError, RotationResult};

/// Largest useful per-tick step: half a turn reaches any yaw.
pub const MAX_TURN_STEP: f64 = 180.0;

/// Which consumers see the override.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationMode {
    /// Movement, head and hand all follow the override.
    #[default]
    Sync,
    /// Reported to the peer only. Local movement and hand keep the host's
    /// own rotation; the head shows what the peer sees.
    Silent,
    /// Like `Sync`, and the host camera is written back after each send.
    Lock,
}

/// Per-tick bound on the reported rotation's step.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnSpeed {
    /// Snap to the target.
    #[default]
    Instant,
    /// At most this many degrees per tick.
    Fixed(f64),
    /// Gaussian sample per tick, `mean ± spread`, clamped to `[0, 180]`.
    Humanized {
        /// Mean step in degrees.
        mean: f64,
        /// Standard deviation in degrees.
        spread: f64,
    },
}

impl TurnSpeed {
    /// Checks the parameters.
    ///
    /// # Errors
    ///
    /// [`RotationError::InvalidTurnSpeed`] for non-positive or non-finite
    /// values.
    pub fn validate(self) -> RotationResult<()> {
        match self {
            Self::Instant => Ok(()),
            Self::Fixed(step) if step.is_finite() && step > 0.0 => Ok(()),
            Self::Fixed(step) => Err(RotationError::InvalidTurnSpeed(format!("fixed step {step}"))),
            Self::Humanized { mean, spread }
                if mean.is_finite() && mean > 0.0 && spread.is_finite() && spread >= 0.0 =>
            {
                Ok(())
            }
            Self::Humanized { mean, spread } => Err(RotationError::InvalidTurnSpeed(format!(
                "humanized mean {mean} spread {spread}"
            ))),
        }
    }

    /// Moves `from` toward `target` for one tick.
    pub fn step<R: Rng>(self, from: Rotation, target: Rotation, rng: &mut R) -> Rotation {
        match self {
            Self::Instant => from.snap_to(target),
            Self::Fixed(step) => from.step_toward(target, step.min(MAX_TURN_STEP)),
            Self::Humanized { mean, spread } => {
                let step = (mean + spread * gaussian(rng)).clamp(0.0, MAX_TURN_STEP);
                from.step_toward(target, step)
            }
        }
    }
}

/// Standard normal sample (Box-Muller).
fn gaussian<R: Rng>(rng: &mut R) -> f64 {
    // gen() is in [0, 1); flip it so ln() never sees zero.
    let u1: f64 = 1.0 - rng.gen::<f64>();
    let u2: f64 = rng.gen::<f64>();
    (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
}

/// How the rendered rotation follows the reported one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderSmoothing {
    /// Render exactly what is reported.
    #[default]
    Follow,
    /// Close this fraction of the remaining distance per tick, in `(0, 1]`.
    Lerp(f64),
    /// At most this many degrees per tick.
    Step(f64),
}

impl RenderSmoothing {
    /// Checks the parameters.
    ///
    /// # Errors
    ///
    /// [`RotationError::InvalidSmoothing`] when the factor or step is out of
    /// range.
    pub fn validate(self) -> RotationResult<()> {
        match self {
            Self::Follow => Ok(()),
            Self::Lerp(f) if f > 0.0 && f <= 1.0 => Ok(()),
            Self::Lerp(f) => Err(RotationError::InvalidSmoothing(format!("lerp factor {f}"))),
            Self::Step(d) if d.is_finite() && d > 0.0 => Ok(()),
            Self::Step(d) => Err(RotationError::InvalidSmoothing(format!("step {d}"))),
        }
    }

    /// Next rendered rotation.
    #[must_use]
    pub fn apply(self, rendered: Rotation, reported: Rotation) -> Rotation {
        match self {
            Self::Follow => reported,
            Self::Lerp(f) => rendered.lerp(reported, f),
            Self::Step(d) => rendered.step_toward(reported, d),
        }
    }
}

/// The view aim and line-of-sight math read.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AimSource {
    /// What is drawn.
    #[default]
    Render,
    /// What is sent over the wire.
    Network,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn turn_speed_validation() {
        assert!(TurnSpeed::Instant.validate().is_ok());
        assert!(TurnSpeed::Fixed(30.0).validate().is_ok());
        assert!(TurnSpeed::Fixed(0.0).validate().is_err());
        assert!(TurnSpeed::Fixed(f64::NAN).validate().is_err());
        assert!(TurnSpeed::Humanized { mean: 40.0, spread: 0.0 }.validate().is_ok());
        assert!(TurnSpeed::Humanized { mean: 40.0, spread: -1.0 }.validate().is_err());
    }

    #[test]
    fn fixed_step_is_bounded() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let next = TurnSpeed::Fixed(25.0).step(Rotation::ZERO, Rotation::new(180.0, 0.0), &mut rng);
        assert!((next.yaw.abs() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn humanized_steps_stay_within_bounds_and_are_reproducible() {
        let speed = TurnSpeed::Humanized { mean: 20.0, spread: 5.0 };
        let target = Rotation::new(170.0, 0.0);

        let mut a = ChaCha8Rng::seed_from_u64(42);
        let mut b = ChaCha8Rng::seed_from_u64(42);
        for _ in 0..50 {
            let x = speed.step(Rotation::ZERO, target, &mut a);
            let y = speed.step(Rotation::ZERO, target, &mut b);
            assert_eq!(x, y);
            assert!(x.yaw >= 0.0 && x.yaw <= MAX_TURN_STEP);
        }
    }

    #[test]
    fn smoothing_policies() {
        let rendered = Rotation::ZERO;
        let reported = Rotation::new(100.0, 0.0);

        assert_eq!(RenderSmoothing::Follow.apply(rendered, reported), reported);
        assert!((RenderSmoothing::Lerp(0.5).apply(rendered, reported).yaw - 50.0).abs() < 1e-9);
        assert!((RenderSmoothing::Step(10.0).apply(rendered, reported).yaw - 10.0).abs() < 1e-9);

        assert!(RenderSmoothing::Lerp(0.0).validate().is_err());
        assert!(RenderSmoothing::Lerp(1.5).validate().is_err());
        assert!(RenderSmoothing::Step(-2.0).validate().is_err());
    }
}
