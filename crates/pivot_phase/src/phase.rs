//! # Phases and Phase Events
//!
//! Fourteen zero-sized event types, one per (phase, stage). They carry no
//! payload and are never cancellable: they are synchronization points only.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use pivot_events::{Event, EventBus, SubscriptionId};

/// A named step within a tick or frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Phase {
    /// One simulation step. Every other phase except Render nests inside it.
    Tick,
    /// Connection upkeep (interaction manager tick).
    Network,
    /// Per-tick input handling.
    Input,
    /// World renderer bookkeeping done on the tick.
    WorldRender,
    /// Sound engine tick.
    Sound,
    /// One rendered frame. Ticks may run inside it.
    Render,
    /// The controlled character's own update.
    Player,
}

impl Phase {
    /// Every phase, in declaration order.
    pub const ALL: [Phase; 7] = [
        Phase::Tick,
        Phase::Network,
        Phase::Input,
        Phase::WorldRender,
        Phase::Sound,
        Phase::Render,
        Phase::Player,
    ];

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Phase::Tick => "Tick",
            Phase::Network => "Network",
            Phase::Input => "Input",
            Phase::WorldRender => "WorldRender",
            Phase::Sound => "Sound",
            Phase::Render => "Render",
            Phase::Player => "Player",
        }
    }

    /// True for the phases that only run inside an open tick.
    #[must_use]
    pub const fn is_nested_in_tick(self) -> bool {
        !matches!(self, Phase::Tick | Phase::Render)
    }

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which side of a phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Before the wrapped host step.
    Pre,
    /// After the wrapped host step.
    Post,
}

/// An event posted for one (phase, stage).
pub trait PhaseEvent: Event + Default {
    /// The phase this event brackets.
    const PHASE: Phase;
    /// Which side of it.
    const STAGE: Stage;
}

/// One observed phase event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PhaseMark {
    /// Phase.
    pub phase: Phase,
    /// Stage.
    pub stage: Stage,
}

impl PhaseMark {
    /// Creates a mark.
    #[must_use]
    pub const fn new(phase: Phase, stage: Stage) -> Self {
        Self { phase, stage }
    }
}

impl fmt::Display for PhaseMark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self.stage {
            Stage::Pre => "Pre",
            Stage::Post => "Post",
        };
        write!(f, "{}.{stage}", self.phase)
    }
}

/// Records every phase event posted on a bus, in order.
///
/// Used by scenario tests and by diagnostics overlays.
pub struct PhaseRecorder {
    marks: Arc<Mutex<Vec<PhaseMark>>>,
    subscriptions: Vec<SubscriptionId>,
}

impl PhaseRecorder {
    /// Recorded marks so far.
    #[must_use]
    pub fn marks(&self) -> Vec<PhaseMark> {
        self.marks.lock().clone()
    }

    /// Forgets recorded marks.
    pub fn clear(&self) {
        self.marks.lock().clear();
    }

    /// How many times (phase, stage) fired.
    #[must_use]
    pub fn count(&self, phase: Phase, stage: Stage) -> usize {
        let mark = PhaseMark::new(phase, stage);
        self.marks.lock().iter().filter(|m| **m == mark).count()
    }

    /// Index of the first occurrence of (phase, stage).
    #[must_use]
    pub fn position(&self, phase: Phase, stage: Stage) -> Option<usize> {
        let mark = PhaseMark::new(phase, stage);
        self.marks.lock().iter().position(|m| *m == mark)
    }

    /// Stops recording.
    pub fn detach(self, bus: &EventBus) {
        for id in self.subscriptions {
            // Already removed by someone else is fine.
            let _ = bus.unsubscribe(id);
        }
    }
}

macro_rules! phase_events {
    ($( $phase:ident => $pre:ident, $post:ident, $name:literal; )*) => {
        $(
            #[doc = concat!("`", $name, ".Pre`")]
            #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
            pub struct $pre;

            impl Event for $pre {
                const NAME: &'static str = concat!($name, ".Pre");
            }

            impl PhaseEvent for $pre {
                const PHASE: Phase = Phase::$phase;
                const STAGE: Stage = Stage::Pre;
            }

            #[doc = concat!("`", $name, ".Post`")]
            #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
            pub struct $post;

            impl Event for $post {
                const NAME: &'static str = concat!($name, ".Post");
            }

            impl PhaseEvent for $post {
                const PHASE: Phase = Phase::$phase;
                const STAGE: Stage = Stage::Post;
            }
        )*

        /// Posts the event type for `(phase, stage)`.
        pub fn post_phase(bus: &EventBus, phase: Phase, stage: Stage) {
            match (phase, stage) {
                $(
                    (Phase::$phase, Stage::Pre) => {
                        bus.post($pre);
                    }
                    (Phase::$phase, Stage::Post) => {
                        bus.post($post);
                    }
                )*
            }
        }

        impl PhaseRecorder {
            /// Subscribes to all fourteen phase events.
            #[must_use]
            pub fn attach(bus: &EventBus) -> Self {
                let marks = Arc::new(Mutex::new(Vec::new()));
                let mut subscriptions = Vec::with_capacity(Phase::ALL.len() * 2);
                $(
                    let sink = Arc::clone(&marks);
                    subscriptions.push(bus.subscribe_system::<$pre, _>("phase-recorder", move |_| {
                        sink.lock().push(PhaseMark::new(Phase::$phase, Stage::Pre));
                    }));
                    let sink = Arc::clone(&marks);
                    subscriptions.push(bus.subscribe_system::<$post, _>("phase-recorder", move |_| {
                        sink.lock().push(PhaseMark::new(Phase::$phase, Stage::Post));
                    }));
                )*
                Self { marks, subscriptions }
            }
        }
    };
}

phase_events! {
    Tick => TickPre, TickPost, "Tick";
    Network => NetworkPre, NetworkPost, "Network";
    Input => InputPre, InputPost, "Input";
    WorldRender => WorldRenderPre, WorldRenderPost, "WorldRender";
    Sound => SoundPre, SoundPost, "Sound";
    Render => RenderPre, RenderPost, "Render";
    Player => PlayerPre, PlayerPost, "Player";
}
