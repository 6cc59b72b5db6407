//! # Engine Settings
//!
//! Defaults every request inherits unless it overrides them. Loaded from the
//! `[rotation]` table of the client configuration.

use serde::{Deserialize, Serialize};

use crate::error::{RotationError, RotationResult};
use crate::policy::{RenderSmoothing, RotationMode, TurnSpeed};

/// Default number of terminal statuses remembered.
pub const DEFAULT_HISTORY_CAPACITY: usize = 64;

/// Default seed for humanized turn speeds.
pub const DEFAULT_RNG_SEED: u64 = 0x5049_564F_54;

/// Rotation engine settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RotationSettings {
    /// Mode for requests that don't pick one.
    pub default_mode: RotationMode,
    /// Turn speed for requests that don't pick one.
    pub turn_speed: TurnSpeed,
    /// Render smoothing for requests that don't pick one.
    pub render_smoothing: RenderSmoothing,
    /// Terminal statuses kept for `status()` queries.
    pub history_capacity: usize,
    /// Seed for the humanized turn speed generator.
    pub rng_seed: u64,
}

impl Default for RotationSettings {
    fn default() -> Self {
        Self {
            default_mode: RotationMode::Sync,
            turn_speed: TurnSpeed::Instant,
            render_smoothing: RenderSmoothing::Follow,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            rng_seed: DEFAULT_RNG_SEED,
        }
    }
}

impl RotationSettings {
    /// Checks every field.
    ///
    /// # Errors
    ///
    /// Invalid turn speed or smoothing parameters.
    pub fn validate(&self) -> RotationResult<()> {
        self.turn_speed.validate()?;
        self.render_smoothing.validate()?;
        if self.history_capacity == 0 {
            return Err(RotationError::InvalidSetting(
                "history_capacity must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
