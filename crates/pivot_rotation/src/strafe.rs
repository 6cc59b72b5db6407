//! # Strafe Redirection
//!
//! While the reported movement yaw differs from the camera, the host would
//! move the character along the movement yaw. Rotating the directional input
//! by the difference keeps the character travelling where the camera looks.
//! The result is snapped to the eight key directions, because the peer only
//! ever sees key states.

use std::f32::consts::PI;

use pivot_shared::wrap_degrees;

/// Directional keys.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DirectionKeys {
    /// Forward key.
    pub forward: bool,
    /// Backward key.
    pub backward: bool,
    /// Strafe left.
    pub left: bool,
    /// Strafe right.
    pub right: bool,
}

/// Directional input for one tick.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StrafeInput {
    /// Key states.
    pub keys: DirectionKeys,
    /// Left is positive.
    pub strafe: f32,
    /// Forward is positive.
    pub forward: f32,
}

impl StrafeInput {
    /// Input derived from key states, normalized.
    #[must_use]
    pub fn from_keys(keys: DirectionKeys) -> Self {
        let strafe = axis(keys.left, keys.right);
        let forward = axis(keys.forward, keys.backward);
        let length = strafe.hypot(forward);
        if length == 0.0 {
            return Self { keys, strafe, forward };
        }
        Self {
            keys,
            strafe: strafe / length,
            forward: forward / length,
        }
    }
}

fn axis(positive: bool, negative: bool) -> f32 {
    f32::from(u8::from(positive)) - f32::from(u8::from(negative))
}

/// Rotates `input` so moving along `movement_yaw` heads where `camera_yaw`
/// faces.
///
/// Returns `input` unchanged when there is no input or the yaws already
/// match.
#[must_use]
pub fn redirect_strafe(input: StrafeInput, camera_yaw: f32, movement_yaw: f32) -> StrafeInput {
    let seam = wrap_degrees(f64::from(movement_yaw) - f64::from(camera_yaw));
    if seam * seam < 0.001 {
        return input;
    }
    if input.strafe == 0.0 && input.forward == 0.0 {
        return input;
    }

    let delta = (camera_yaw - movement_yaw).to_radians();
    let (sin, cos) = delta.sin_cos();
    let strafe = input.strafe * cos - input.forward * sin;
    let forward = input.strafe * sin + input.forward * cos;

    StrafeInput::from_keys(sector_keys(strafe.atan2(forward)))
}

/// Keys for the 45 degree sector containing `angle` (radians, 0 = forward,
/// positive = left).
fn sector_keys(angle: f32) -> DirectionKeys {
    const SECTOR: f32 = PI / 4.0;
    const HALF: f32 = PI / 8.0;

    let mut keys = DirectionKeys::default();
    if angle > -HALF && angle <= HALF {
        keys.forward = true;
    } else if angle > HALF && angle <= HALF + SECTOR {
        keys.forward = true;
        keys.left = true;
    } else if angle > HALF + SECTOR && angle <= HALF + 2.0 * SECTOR {
        keys.left = true;
    } else if angle > HALF + 2.0 * SECTOR && angle <= HALF + 3.0 * SECTOR {
        keys.backward = true;
        keys.left = true;
    } else if angle > HALF + 3.0 * SECTOR || angle <= -(HALF + 3.0 * SECTOR) {
        keys.backward = true;
    } else if angle > -(HALF + 3.0 * SECTOR) && angle <= -(HALF + 2.0 * SECTOR) {
        keys.backward = true;
        keys.right = true;
    } else if angle > -(HALF + 2.0 * SECTOR) && angle <= -(HALF + SECTOR) {
        keys.right = true;
    } else {
        keys.forward = true;
        keys.right = true;
    }
    keys
}
