//! # PIVOT Shared
//!
//! Value types used by every unit of the instrumentation core.
//!
//! ## CRITICAL RULE
//!
//! This crate must stay free of dispatch and host logic. Everything here is a
//! plain `Copy` value so it can cross the host boundary on any thread.

#![deny(unsafe_code)]

pub mod constants;
pub mod math;
pub mod rotation;

pub use constants::{MAX_PITCH, MIN_PITCH, ROTATION_EPSILON, TICKS_PER_SECOND};
pub use math::Vec3;
pub use rotation::{wrap_degrees, Rotation};
