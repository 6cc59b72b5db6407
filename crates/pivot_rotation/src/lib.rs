//! # PIVOT Rotation Arbitration
//!
//! Many modules want to aim the character; only one may at a time. Modules
//! submit [`RotationRequest`]s; once per tick the [`RotationManager`] picks the
//! highest-priority valid one and derives three views of it:
//!
//! ```text
//!                  ┌──> network      (outbound movement messages)
//! active request ──┼──> render       (head / body drawing)
//!                  └──> interaction  (aim, line of sight)
//! ```
//!
//! With no active request every query returns `None`: callers use the host's
//! own rotation unchanged.

#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod manager;
pub mod policy;
pub mod request;
pub mod settings;
pub mod state;
pub mod strafe;

pub use error::{RotationError, RotationResult};
pub use manager::{HostRotation, RotationManager};
pub use policy::{AimSource, RenderSmoothing, RotationMode, TurnSpeed, MAX_TURN_STEP};
pub use request::{validate_target, RequestId, RequestStatus, RotationRequest, Validity};
pub use settings::{RotationSettings, DEFAULT_HISTORY_CAPACITY, DEFAULT_RNG_SEED};
pub use state::{RotationState, RotationView};
pub use strafe::{redirect_strafe, DirectionKeys, StrafeInput};
