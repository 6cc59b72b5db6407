//! # PIVOT
//!
//! Instrumentation core for a real-time game client. The host is hooked at
//! its tick, frame and network boundaries; feature modules observe and steer
//! it through events.
//!
//! ## Units
//!
//! | Crate            | Role                                         |
//! |------------------|----------------------------------------------|
//! | `pivot_events`   | Typed, cancellable, synchronous dispatch     |
//! | `pivot_phase`    | Tick/frame phase brackets and their ordering |
//! | `pivot_rotation` | One arbitrated rotation out of many requests |
//! | `pivot_network`  | Send/receive interception, movement reports  |
//!
//! This crate wires them ([`ClientContext`]), defines the adapter the host
//! implements ([`ClientHost`]) and drives it ([`ClientDriver`]).
//!
//! ## Example
//!
//! ```rust
//! use pivot::{ClientContext, ClientDriver, MockHost, PivotConfig, TickPath};
//! use pivot_rotation::RotationRequest;
//!
//! let context = ClientContext::new(PivotConfig::default()).unwrap();
//! let mut driver = ClientDriver::new(context, MockHost::new());
//! driver.connect();
//!
//! let aimbot = driver.context().modules().register("Aim").unwrap();
//! aimbot.enable();
//! driver
//!     .context()
//!     .rotation()
//!     .request(&aimbot, RotationRequest::look(90.0, 10.0, 5))
//!     .unwrap();
//!
//! let report = driver.tick(TickPath::InputFirst);
//! assert!(!report.delivered.is_empty());
//! ```

#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod context;
pub mod driver;
pub mod error;
pub mod host;

pub use config::{EventsConfig, NetworkConfig, PivotConfig};
pub use context::ClientContext;
pub use driver::ClientDriver;
pub use error::{ConfigError, ConfigResult};
pub use host::{ClientHost, HostCall, HostMessage, MockHost, MockMessage, TickPath};
