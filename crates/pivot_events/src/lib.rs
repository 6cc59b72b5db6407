//! # PIVOT Event Pipeline
//!
//! Typed, synchronous, cancellable event dispatch between the host client's
//! hooks and feature modules.
//!
//! ## Architecture Rules
//!
//! 1. **Synchronous** - `post` returns after the last eligible subscriber ran
//! 2. **Ordered** - subscribers run in registration order
//! 3. **Contained** - a panicking subscriber is reported, never propagated
//! 4. **Re-entrant** - no lock is held while a subscriber runs
//!
//! ## Example
//!
//! ```rust
//! use pivot_events::{Event, EventBus, ModuleRegistry};
//!
//! struct Jump { height: f64 }
//! impl Event for Jump {
//!     const NAME: &'static str = "Movement.Jump";
//!     const CANCELLABLE: bool = true;
//! }
//!
//! let bus = EventBus::new();
//! let modules = ModuleRegistry::new();
//! let high_jump = modules.register("HighJump").unwrap();
//! high_jump.enable();
//!
//! bus.subscribe::<Jump, _>(&high_jump, |e| e.height *= 2.0);
//! assert_eq!(bus.post(Jump { height: 0.42 }).height, 0.84);
//! ```

#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod bus;
pub mod error;
pub mod event;
pub mod fault;
pub mod module;

pub use bus::{EventBus, Owner, SubscriptionId};
pub use error::{EventError, EventResult};
pub use event::{Envelope, Event};
pub use fault::{FaultReport, FaultSink, DEFAULT_FAULT_CAPACITY};
pub use module::{ModuleHandle, ModuleId, ModuleRegistry, Toggle};
