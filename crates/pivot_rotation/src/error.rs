//! # Rotation Engine Error Types

use thiserror::Error;

use crate::request::RequestId;

/// Reasons a request or setting is refused.
///
/// Every variant is raised synchronously at the call that introduced the bad
/// value; nothing invalid ever reaches arbitration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RotationError {
    /// Yaw or pitch is NaN or infinite.
    #[error("non-finite angle: yaw={yaw}, pitch={pitch}")]
    NonFiniteAngle {
        /// Requested yaw.
        yaw: f64,
        /// Requested pitch.
        pitch: f64,
    },

    /// Pitch outside [-90, 90].
    #[error("pitch out of range: {0} (expected -90..=90)")]
    PitchOutOfRange(f64),

    /// Turn speed is not a positive finite number.
    #[error("invalid turn speed: {0}")]
    InvalidTurnSpeed(String),

    /// Render smoothing parameter out of range.
    #[error("invalid render smoothing: {0}")]
    InvalidSmoothing(String),

    /// Engine setting out of range.
    #[error("invalid rotation setting: {0}")]
    InvalidSetting(String),

    /// No outstanding request with this id.
    #[error("unknown rotation request: {0}")]
    UnknownRequest(RequestId),
}

/// Result type for rotation engine operations.
pub type RotationResult<T> = Result<T, RotationError>;
