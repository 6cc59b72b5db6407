//! Constants shared between the arbitration engine and the host adapter.

/// Host simulation rate. One tick is 50ms.
pub const TICKS_PER_SECOND: u32 = 20;

/// Lowest legal pitch (looking straight up).
pub const MIN_PITCH: f64 = -90.0;

/// Highest legal pitch (looking straight down).
pub const MAX_PITCH: f64 = 90.0;

/// Two rotations closer than this (in degrees) are considered equal.
pub const ROTATION_EPSILON: f64 = 0.001;
