//! Frame driver
//!
//! Owns one session and its game mode, turns host display-refresh callbacks
//! into simulation steps, and runs deferred actions on the session clock.

use crate::Bounds;
use crate::consts::{MAX_SUBSTEPS, SIM_DT};
use crate::sim::{
    self, GameEvent, GameMode, InputSampler, InputSnapshot, SimulationState, TimerQueue,
};

/// Driver lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Session set up, waiting for `start`
    Idle,
    Running,
    Paused,
    /// Halted for good (stopped by the host or the session finished)
    Stopped,
}

/// How frames map to steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stepping {
    /// Exactly one nominal step per frame, whatever the refresh rate
    #[default]
    Fixed,
    /// Fixed 60 Hz accumulator over real frame time, capped per frame
    Accumulated,
}

/// Single-session frame driver
pub struct Driver {
    state: SimulationState,
    mode: Box<dyn GameMode>,
    run: RunState,
    stepping: Stepping,
    accumulator: f32,
    last_time: Option<f64>,
    /// Session clock (seconds of simulated time)
    clock: f64,
    timers: TimerQueue,
}

impl Driver {
    /// Set up a session for `mode`; call [`Driver::start`] to begin stepping
    pub fn new(mut mode: Box<dyn GameMode>, seed: u64, bounds: Bounds) -> Self {
        let mut state = SimulationState::new(1, seed, bounds);
        sim::begin(&mut state, mode.as_mut());
        Self {
            state,
            mode,
            run: RunState::Idle,
            stepping: Stepping::default(),
            accumulator: 0.0,
            last_time: None,
            clock: 0.0,
            timers: TimerQueue::new(),
        }
    }

    pub fn with_stepping(mut self, stepping: Stepping) -> Self {
        self.stepping = stepping;
        self
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn mode_name(&self) -> &'static str {
        self.mode.name()
    }

    pub fn run_state(&self) -> RunState {
        self.run
    }

    /// Simulated seconds since the session began
    pub fn elapsed(&self) -> f64 {
        self.clock
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Resize the field (canvas resize)
    pub fn resize(&mut self, bounds: Bounds) {
        self.state.bounds = bounds;
    }

    pub fn set_particle_cap(&mut self, cap: usize) {
        self.state.particle_cap = cap;
    }

    /// Events since the last drain, for the audio and HUD layers
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.state.drain_events()
    }

    pub fn start(&mut self) {
        if self.run == RunState::Idle {
            log::info!("Starting {} ({:?} stepping)", self.mode.name(), self.stepping);
            self.run = RunState::Running;
            self.last_time = None;
        }
    }

    /// Suspend stepping; the session clock and timers freeze. Idempotent.
    pub fn pause(&mut self) {
        if self.run == RunState::Running {
            log::debug!("Paused at {:.2}s", self.clock);
            self.run = RunState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.run == RunState::Paused {
            log::debug!("Resumed at {:.2}s", self.clock);
            self.run = RunState::Running;
            // Time spent paused is not simulated
            self.last_time = None;
            self.accumulator = 0.0;
        }
    }

    /// End the session and cancel every pending timer. Idempotent.
    pub fn stop(&mut self) {
        if self.run == RunState::Stopped {
            return;
        }
        self.run = RunState::Stopped;
        self.timers.clear();
        self.state.end_session();
    }

    /// Replace the session with a fresh one and start it
    pub fn restart(&mut self, seed: u64) {
        let session = self.state.session() + 1;
        let bounds = self.state.bounds;
        let particle_cap = self.state.particle_cap;
        self.stop();

        self.state = SimulationState::new(session, seed, bounds);
        self.state.particle_cap = particle_cap;
        sim::begin(&mut self.state, self.mode.as_mut());
        self.clock = 0.0;
        self.accumulator = 0.0;
        self.last_time = None;
        self.run = RunState::Running;
    }

    /// One manual step with an explicit snapshot (only while running)
    pub fn step(&mut self, input: &InputSnapshot) -> bool {
        if self.run != RunState::Running {
            return false;
        }
        self.tick(input);
        true
    }

    /// Host display-refresh callback. Returns the number of steps run.
    pub fn frame(&mut self, now_ms: f64, sampler: &InputSampler) -> u32 {
        if self.run != RunState::Running {
            return 0;
        }
        let input = sampler.snapshot();

        match self.stepping {
            Stepping::Fixed => {
                self.last_time = Some(now_ms);
                self.tick(&input);
                1
            }
            Stepping::Accumulated => {
                let dt = match self.last_time {
                    Some(last) => ((now_ms - last) / 1000.0) as f32,
                    None => SIM_DT,
                };
                self.last_time = Some(now_ms);
                self.accumulator += dt.clamp(0.0, 0.1);

                let mut substeps = 0;
                while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                    self.tick(&input);
                    self.accumulator -= SIM_DT;
                    substeps += 1;
                    if self.run != RunState::Running {
                        break;
                    }
                }
                substeps
            }
        }
    }

    fn tick(&mut self, input: &InputSnapshot) {
        sim::step(&mut self.state, self.mode.as_mut(), input, 1.0);
        self.clock += SIM_DT as f64;

        self.timers.take_from(&mut self.state, self.clock);
        for action in self.timers.due(self.clock, &self.state) {
            sim::apply_deferred(&mut self.state, self.mode.as_mut(), action);
        }

        if self.state.is_finished() && self.run != RunState::Stopped {
            log::info!("{} finished, halting driver", self.mode.name());
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{
        AdvancePolicy, Answer, CollisionRule, Control, Entity, EntityKind, GameRules, HitKind,
        HitTest, KindRules, Outcome, Payload, Problem,
    };
    use glam::Vec2;

    /// Firing drops a click shot onto the correct carrier; rounds advance after 0.5 s
    struct Quiz {
        rules: GameRules,
    }

    impl Quiz {
        fn boxed(win_target: u32) -> Box<dyn GameMode> {
            let mut rules = GameRules::default();
            rules.kinds.set(
                EntityKind::Obstacle,
                KindRules {
                    radius: 10.0,
                    ..KindRules::default()
                },
            );
            rules.collisions.push(CollisionRule {
                a: EntityKind::Projectile,
                b: EntityKind::Obstacle,
                test: HitTest::Circle,
                kind: HitKind::Answer,
                shared_b: false,
                consume_a: true,
            });
            rules.advance = AdvancePolicy::Delayed { seconds: 0.5 };
            rules.win_target = Some(win_target);
            Box::new(Self { rules })
        }
    }

    impl GameMode for Quiz {
        fn name(&self) -> &'static str {
            "quiz"
        }

        fn rules(&self) -> &GameRules {
            &self.rules
        }

        fn setup(&mut self, _state: &mut SimulationState) {}

        fn control(&mut self, state: &mut SimulationState, input: &InputSnapshot, _dt: f32) {
            if input.fire {
                state
                    .entities
                    .add(Entity::new(EntityKind::Projectile, Vec2::new(50.0, 50.0)).with_ttl(2));
            }
        }

        fn next_round(&mut self, state: &mut SimulationState) {
            state.problem = Some(Problem {
                prompt: "2 + 2 = ?".into(),
                answer: Answer::Number(4),
                candidates: vec![4],
                operands: None,
                tint: None,
                choices: Vec::new(),
            });
            state.entities.add(
                Entity::new(EntityKind::Obstacle, Vec2::new(50.0, 50.0))
                    .with_payload(Payload::Number(4)),
            );
        }
    }

    fn driver(win_target: u32) -> Driver {
        Driver::new(Quiz::boxed(win_target), 1, Bounds::default())
    }

    fn fire() -> InputSampler {
        let mut input = InputSampler::new();
        input.press(Control::Fire);
        input
    }

    #[test]
    fn test_frames_need_start() {
        let mut d = driver(5);
        assert_eq!(d.run_state(), RunState::Idle);
        assert_eq!(d.frame(0.0, &InputSampler::new()), 0);
        d.start();
        assert_eq!(d.frame(16.0, &InputSampler::new()), 1);
        assert_eq!(d.state().time_ticks, 1);
    }

    #[test]
    fn test_fixed_stepping_ignores_frame_time() {
        let mut d = driver(5);
        d.start();
        let idle = InputSampler::new();
        d.frame(0.0, &idle);
        d.frame(500.0, &idle);
        d.frame(501.0, &idle);
        assert_eq!(d.state().time_ticks, 3);
    }

    #[test]
    fn test_accumulated_stepping_is_capped() {
        let mut d = driver(5).with_stepping(Stepping::Accumulated);
        d.start();
        let idle = InputSampler::new();
        assert_eq!(d.frame(1000.0, &idle), 1);
        assert_eq!(d.frame(1075.0, &idle), 4);

        let burst = d.frame(60_000.0, &idle);
        assert!(burst > 0 && burst <= MAX_SUBSTEPS);
    }

    #[test]
    fn test_pause_is_idempotent() {
        let mut once = driver(5);
        let mut twice = driver(5);
        for d in [&mut once, &mut twice] {
            d.start();
            d.frame(0.0, &fire());
        }
        once.pause();
        twice.pause();
        twice.pause();

        assert_eq!(once.run_state(), twice.run_state());
        assert_eq!(format!("{:?}", once.state()), format!("{:?}", twice.state()));
        assert_eq!(once.pending_timers(), twice.pending_timers());
    }

    #[test]
    fn test_stop_after_pause_halts_everything() {
        let mut d = driver(5);
        d.start();
        d.frame(0.0, &fire());
        assert_eq!(d.pending_timers(), 1);

        d.pause();
        d.stop();
        assert_eq!(d.run_state(), RunState::Stopped);
        assert_eq!(d.pending_timers(), 0);
        assert!(!d.state().is_alive());

        let before = format!("{:?}", d.state());
        d.resume();
        d.start();
        for t in 1..100 {
            assert_eq!(d.frame(t as f64 * 16.0, &fire()), 0);
        }
        assert!(!d.step(&InputSnapshot::default()));
        assert_eq!(format!("{:?}", d.state()), before);
    }

    #[test]
    fn test_manual_step_needs_running_driver() {
        let mut d = driver(5);
        assert!(!d.step(&InputSnapshot::default()));
        assert_eq!(d.state().time_ticks, 0);

        d.start();
        assert!(d.step(&InputSnapshot::default()));
        let ticks = d.state().time_ticks;
        let before = format!("{:?}", d.state());

        d.pause();
        assert!(!d.step(&InputSnapshot::default()));
        assert_eq!(d.state().time_ticks, ticks);
        assert_eq!(format!("{:?}", d.state()), before);
        assert_eq!(d.elapsed(), SIM_DT as f64);

        d.resume();
        assert!(d.step(&InputSnapshot::default()));
        assert_eq!(d.state().time_ticks, ticks + 1);
    }

    #[test]
    fn test_timers_freeze_while_paused() {
        let mut d = driver(5);
        d.start();
        d.frame(0.0, &fire());
        assert_eq!(d.state().score, 10);
        assert_eq!(d.state().counters.round, 1);

        d.pause();
        for t in 1..200 {
            d.frame(t as f64 * 16.0, &InputSampler::new());
        }
        assert_eq!(d.state().counters.round, 1);

        d.resume();
        let idle = InputSampler::new();
        for t in 0..29 {
            d.frame(t as f64, &idle);
        }
        assert_eq!(d.state().counters.round, 1);
        for t in 29..31 {
            d.frame(t as f64, &idle);
        }
        assert_eq!(d.state().counters.round, 2);
    }

    #[test]
    fn test_finish_halts_driver() {
        let mut d = driver(1);
        d.start();
        d.frame(0.0, &fire());
        assert_eq!(d.state().outcome(), Some(Outcome::Won));
        assert_eq!(d.run_state(), RunState::Stopped);
        assert_eq!(d.frame(16.0, &fire()), 0);
    }

    #[test]
    fn test_restart_starts_fresh_session() {
        let mut d = driver(5);
        d.start();
        d.frame(0.0, &fire());
        let old_session = d.state().session();
        assert_eq!(d.pending_timers(), 1);

        d.restart(42);
        assert_eq!(d.state().session(), old_session + 1);
        assert_eq!(d.pending_timers(), 0);
        assert_eq!(d.state().score, 0);
        assert_eq!(d.state().counters.round, 1);
        assert_eq!(d.run_state(), RunState::Running);
        assert_eq!(d.elapsed(), 0.0);
    }
}
