//! # PIVOT Phase Sequencer
//!
//! Brackets the host's per-tick and per-frame steps with paired Pre/Post
//! events, so every phase fires exactly once per cycle no matter which path
//! the host took.
//!
//! ```text
//! Render.Pre
//! │  Tick.Pre
//! │  │  Network.Pre ... Network.Post
//! │  │  Input.Pre ..... Input.Post        (synthesized if the host skipped it)
//! │  │  WorldRender.Pre ... WorldRender.Post
//! │  │  Player.Pre .... Player.Post
//! │  │  Sound.Pre ..... Sound.Post
//! │  Tick.Post
//! Render.Post
//! ```

#![deny(unsafe_code)]
#![warn(clippy::pedantic)]

pub mod phase;
pub mod sequencer;

pub use phase::{
    post_phase, InputPost, InputPre, NetworkPost, NetworkPre, Phase, PhaseEvent, PhaseMark,
    PhaseRecorder, PlayerPost, PlayerPre, RenderPost, RenderPre, SoundPost, SoundPre, Stage,
    TickPost, TickPre, WorldRenderPost, WorldRenderPre,
};
pub use sequencer::{CycleCounts, PhaseSequencer};
