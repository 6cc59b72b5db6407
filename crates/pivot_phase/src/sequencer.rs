//! # Phase Sequencer
//!
//! Per-cycle state machine:
//!
//! ```text
//! tick:   Idle ──begin_tick──> Open ──wrap(phase)*──> Open ──end_tick──> Idle
//! frame:  Idle ──begin_frame─> Open ──(ticks)──────────────> end_frame ─> Idle
//! ```
//!
//! ## The Input Latch
//!
//! The host normally handles input before ticking the world renderer, but on
//! some paths the input step is skipped or deferred. The latch is reset by
//! `begin_tick` and set by the first Input phase. If WorldRender is entered
//! with the latch unset, an Input.Pre/Input.Post pair is synthesized first, so
//! Input.Post always precedes WorldRender.Pre. A host input step arriving
//! after that still runs, but posts nothing.
//!
//! ## Violations
//!
//! Out-of-order or duplicated phases are defects in the host adapter, never
//! runtime conditions. They are logged at `error` and then panic.

use std::sync::Arc;

use pivot_events::EventBus;

use crate::phase::{post_phase, Phase, Stage};

/// Lifetime totals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleCounts {
    /// Completed ticks.
    pub ticks: u64,
    /// Completed frames.
    pub frames: u64,
    /// Input pairs the sequencer had to synthesize.
    pub synthesized_inputs: u64,
}

#[derive(Default)]
struct TickCycle {
    open: bool,
    active: Option<Phase>,
    fired: [u8; 7],
    input_latch: bool,
    input_synthesized: bool,
}

impl TickCycle {
    fn fired(&self, phase: Phase) -> u8 {
        self.fired[phase.index()]
    }
}

/// Brackets host steps with phase events.
pub struct PhaseSequencer {
    bus: Arc<EventBus>,
    tick: TickCycle,
    frame_open: bool,
    counts: CycleCounts,
}

#[track_caller]
fn violation(message: &str) -> ! {
    tracing::error!(violation = message, "phase ordering violated");
    panic!("phase ordering violated: {message}");
}

impl PhaseSequencer {
    /// Creates a sequencer posting to `bus`.
    #[must_use]
    pub fn new(bus: Arc<EventBus>) -> Self {
        Self {
            bus,
            tick: TickCycle::default(),
            frame_open: false,
            counts: CycleCounts::default(),
        }
    }

    /// The bus phase events are posted on.
    #[must_use]
    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    /// Lifetime totals.
    #[must_use]
    pub fn counts(&self) -> CycleCounts {
        self.counts
    }

    /// True between `begin_tick` and `end_tick`.
    #[must_use]
    pub fn is_tick_open(&self) -> bool {
        self.tick.open
    }

    /// True between `begin_frame` and `end_frame`.
    #[must_use]
    pub fn is_frame_open(&self) -> bool {
        self.frame_open
    }

    /// The nested phase currently running, if any.
    #[must_use]
    pub fn active_phase(&self) -> Option<Phase> {
        self.tick.active
    }

    /// Whether an Input pair (real or synthesized) has fired this tick.
    #[must_use]
    pub fn input_handled_this_tick(&self) -> bool {
        self.tick.input_latch
    }

    /// Opens a tick: resets per-tick state, then posts Tick.Pre.
    pub fn begin_tick(&mut self) {
        if self.tick.open {
            violation("Tick.Pre while a tick is already open");
        }

        self.tick = TickCycle {
            open: true,
            ..TickCycle::default()
        };
        post_phase(&self.bus, Phase::Tick, Stage::Pre);
    }

    /// Closes a tick: checks per-tick cardinality, then posts Tick.Post.
    pub fn end_tick(&mut self) {
        if !self.tick.open {
            violation("Tick.Post without Tick.Pre");
        }
        if let Some(active) = self.tick.active {
            tracing::error!(phase = %active, "tick closed inside a phase");
            violation("Tick.Post while a nested phase is open");
        }
        for required in [Phase::Network, Phase::Input, Phase::WorldRender] {
            if self.tick.fired(required) != 1 {
                tracing::error!(phase = %required, fired = self.tick.fired(required), "required phase missing");
                violation("Tick.Post before every required phase fired exactly once");
            }
        }

        post_phase(&self.bus, Phase::Tick, Stage::Post);
        self.tick.open = false;
        self.counts.ticks += 1;
    }

    /// `begin_tick`, `body`, `end_tick`.
    pub fn run_tick<R>(&mut self, body: impl FnOnce(&mut Self) -> R) -> R {
        self.begin_tick();
        let result = body(self);
        self.end_tick();
        result
    }

    /// Opens a frame: posts Render.Pre.
    pub fn begin_frame(&mut self) {
        if self.frame_open {
            violation("Render.Pre while a frame is already open");
        }
        if self.tick.open {
            violation("Render.Pre inside a tick");
        }
        self.frame_open = true;
        post_phase(&self.bus, Phase::Render, Stage::Pre);
    }

    /// Closes a frame: posts Render.Post.
    pub fn end_frame(&mut self) {
        if !self.frame_open {
            violation("Render.Post without Render.Pre");
        }
        if self.tick.open {
            violation("Render.Post while a tick inside the frame is still open");
        }
        post_phase(&self.bus, Phase::Render, Stage::Post);
        self.frame_open = false;
        self.counts.frames += 1;
    }

    /// `begin_frame`, `body`, `end_frame`. Ticks may run inside `body`.
    pub fn run_frame<R>(&mut self, body: impl FnOnce(&mut Self) -> R) -> R {
        self.begin_frame();
        let result = body(self);
        self.end_frame();
        result
    }

    /// Runs a host step bracketed by its phase's Pre/Post events.
    ///
    /// The step always runs: phase events are not cancellable.
    ///
    /// # Panics
    ///
    /// On ordering violations: `phase` is Tick or Render, no tick is open,
    /// another phase is open, the phase already fired this tick, or Sound
    /// precedes WorldRender.
    pub fn wrap<R>(&mut self, phase: Phase, body: impl FnOnce() -> R) -> R {
        if !phase.is_nested_in_tick() {
            violation("Tick and Render are cycles, not wrappable steps");
        }
        if !self.tick.open {
            tracing::error!(phase = %phase, "nested phase outside a tick");
            violation("nested phase outside a tick");
        }
        if let Some(active) = self.tick.active {
            tracing::error!(phase = %phase, active = %active, "phase interleaving");
            violation("phase entered while another phase is open");
        }

        match phase {
            Phase::Input if self.tick.input_synthesized => {
                tracing::debug!("input already synthesized this tick, running host step silently");
                return body();
            }
            Phase::WorldRender if !self.tick.input_latch => self.synthesize_input(),
            Phase::Sound if self.tick.fired(Phase::WorldRender) == 0 => {
                violation("Sound.Pre before WorldRender");
            }
            _ => {}
        }

        if self.tick.fired(phase) > 0 {
            tracing::error!(phase = %phase, "phase fired twice in one tick");
            violation("phase fired twice in one tick");
        }

        self.tick.active = Some(phase);
        post_phase(&self.bus, phase, Stage::Pre);
        let result = body();
        post_phase(&self.bus, phase, Stage::Post);
        self.tick.active = None;

        self.tick.fired[phase.index()] += 1;
        if phase == Phase::Input {
            self.tick.input_latch = true;
        }
        result
    }

    fn synthesize_input(&mut self) {
        tracing::debug!("input step skipped by host, synthesizing Input pair");

        self.tick.active = Some(Phase::Input);
        post_phase(&self.bus, Phase::Input, Stage::Pre);
        post_phase(&self.bus, Phase::Input, Stage::Post);
        self.tick.active = None;

        self.tick.fired[Phase::Input.index()] += 1;
        self.tick.input_latch = true;
        self.tick.input_synthesized = true;
        self.counts.synthesized_inputs += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::{PhaseMark, PhaseRecorder};

    fn setup() -> (PhaseSequencer, PhaseRecorder) {
        let bus = Arc::new(EventBus::new());
        let recorder = PhaseRecorder::attach(&bus);
        (PhaseSequencer::new(bus), recorder)
    }

    fn pair(phase: Phase) -> [PhaseMark; 2] {
        [PhaseMark::new(phase, Stage::Pre), PhaseMark::new(phase, Stage::Post)]
    }

    #[test]
    fn regular_tick_order() {
        let (mut seq, recorder) = setup();

        seq.run_tick(|seq| {
            seq.wrap(Phase::Network, || {});
            seq.wrap(Phase::Input, || {});
            seq.wrap(Phase::WorldRender, || {});
            seq.wrap(Phase::Player, || {});
            seq.wrap(Phase::Sound, || {});
        });

        let mut expected = vec![PhaseMark::new(Phase::Tick, Stage::Pre)];
        for phase in [Phase::Network, Phase::Input, Phase::WorldRender, Phase::Player, Phase::Sound] {
            expected.extend(pair(phase));
        }
        expected.push(PhaseMark::new(Phase::Tick, Stage::Post));

        assert_eq!(recorder.marks(), expected);
        assert_eq!(seq.counts().ticks, 1);
        assert_eq!(seq.counts().synthesized_inputs, 0);
    }

    #[test]
    fn skipped_input_is_synthesized_before_world_render() {
        let (mut seq, recorder) = setup();
        let mut host_input_ran = false;

        seq.run_tick(|seq| {
            seq.wrap(Phase::Network, || {});
            seq.wrap(Phase::WorldRender, || {});
            // Deferred host input step.
            seq.wrap(Phase::Input, || host_input_ran = true);
        });

        assert!(host_input_ran);
        assert_eq!(recorder.count(Phase::Input, Stage::Pre), 1);
        assert_eq!(recorder.count(Phase::Input, Stage::Post), 1);

        let input_post = recorder.position(Phase::Input, Stage::Post).unwrap();
        let world_pre = recorder.position(Phase::WorldRender, Stage::Pre).unwrap();
        assert_eq!(input_post + 1, world_pre);
        assert_eq!(seq.counts().synthesized_inputs, 1);
    }

    #[test]
    fn latch_resets_every_tick() {
        let (mut seq, recorder) = setup();

        seq.run_tick(|seq| {
            seq.wrap(Phase::Network, || {});
            seq.wrap(Phase::WorldRender, || {});
        });
        assert!(seq.input_handled_this_tick());

        seq.begin_tick();
        assert!(!seq.input_handled_this_tick());
        seq.wrap(Phase::Network, || {});
        seq.wrap(Phase::Input, || {});
        seq.wrap(Phase::WorldRender, || {});
        seq.end_tick();

        assert_eq!(recorder.count(Phase::Input, Stage::Pre), 2);
        assert_eq!(seq.counts().synthesized_inputs, 1);
    }

    #[test]
    fn frame_wraps_ticks() {
        let (mut seq, recorder) = setup();

        let value = seq.run_frame(|seq| {
            seq.run_tick(|seq| {
                seq.wrap(Phase::Network, || {});
                seq.wrap(Phase::Input, || {});
                seq.wrap(Phase::WorldRender, || 7)
            })
        });

        assert_eq!(value, 7);
        let marks = recorder.marks();
        assert_eq!(marks.first(), Some(&PhaseMark::new(Phase::Render, Stage::Pre)));
        assert_eq!(marks.last(), Some(&PhaseMark::new(Phase::Render, Stage::Post)));
        assert_eq!(seq.counts().frames, 1);
    }

    #[test]
    #[should_panic(expected = "nested phase outside a tick")]
    fn phase_outside_tick_panics() {
        let (mut seq, _recorder) = setup();
        seq.wrap(Phase::Network, || {});
    }

    #[test]
    #[should_panic(expected = "Sound.Pre before WorldRender")]
    fn sound_before_world_render_panics() {
        let (mut seq, _recorder) = setup();
        seq.begin_tick();
        seq.wrap(Phase::Sound, || {});
    }

    #[test]
    #[should_panic(expected = "phase fired twice in one tick")]
    fn duplicate_network_panics() {
        let (mut seq, _recorder) = setup();
        seq.begin_tick();
        seq.wrap(Phase::Network, || {});
        seq.wrap(Phase::Network, || {});
    }

    #[test]
    #[should_panic(expected = "Tick.Post before every required phase fired exactly once")]
    fn missing_network_panics_at_tick_end() {
        let (mut seq, _recorder) = setup();
        seq.begin_tick();
        seq.wrap(Phase::Input, || {});
        seq.wrap(Phase::WorldRender, || {});
        seq.end_tick();
    }

    #[test]
    #[should_panic(expected = "phase entered while another phase is open")]
    fn interleaving_panics() {
        let (mut seq, _recorder) = setup();
        seq.begin_tick();
        seq.tick.active = Some(Phase::Network);
        seq.wrap(Phase::Input, || {});
    }

    #[test]
    #[should_panic(expected = "Tick.Pre while a tick is already open")]
    fn double_tick_open_panics() {
        let (mut seq, _recorder) = setup();
        seq.begin_tick();
        seq.begin_tick();
    }
}
