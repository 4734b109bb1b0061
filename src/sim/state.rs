//! Session state and semantic events
//!
//! `SimulationState` is the aggregate root of one play session. It is owned by
//! the driver and passed explicitly into every step; nothing about a session
//! lives in globals or captured closures.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::entity::{Entity, EntityKind, EntityStore};
use super::problem::Problem;
use crate::Bounds;

/// Current phase of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Created, not yet set up
    Ready,
    /// Active gameplay
    Playing,
    /// Showing answer feedback; hits and misses are ignored until the next round
    Feedback,
    /// Session over
    Finished(Outcome),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    Won,
    Lost,
}

/// Semantic events for the audio and presentation layers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Correct { pos: Vec2, value: Option<i64> },
    Incorrect { pos: Vec2 },
    Explosion { pos: Vec2 },
    Shot,
    Thrust,
    Miss { pos: Vec2 },
    Crash { pos: Vec2 },
    RoundStarted { round: u32 },
    Finished(Outcome),
}

/// State change scheduled to run after a delay
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeferredAction {
    NextRound,
}

/// Liveness token carried by every deferred action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken(u64);

/// Per-session counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Counters {
    pub correct: u32,
    pub misses: u32,
    pub crashes: u32,
    pub streak: u32,
    pub consecutive_errors: u32,
    /// Partial progress toward the current goal (cleared by `ResetProgress`)
    pub progress: u32,
    pub lives: u32,
    pub fuel: f32,
    pub round: u32,
}

/// Default cap on live particles
pub const MAX_PARTICLES: usize = 256;

/// Complete state of one session
#[derive(Debug, Clone)]
pub struct SimulationState {
    session: u64,
    alive: bool,
    pub seed: u64,
    pub rng: Pcg32,
    pub phase: GamePhase,
    pub entities: EntityStore,
    pub problem: Option<Problem>,
    pub score: i64,
    pub counters: Counters,
    /// Steps run this session
    pub time_ticks: u64,
    pub bounds: Bounds,
    /// Upper bound on live particles (quality setting)
    pub particle_cap: usize,
    /// Events since the host last drained them
    pub events: Vec<GameEvent>,
    /// Delayed actions waiting to be scheduled by the driver
    pub deferred: Vec<(f32, DeferredAction)>,
}

impl SimulationState {
    pub fn new(session: u64, seed: u64, bounds: Bounds) -> Self {
        Self {
            session,
            alive: true,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            phase: GamePhase::Ready,
            entities: EntityStore::new(),
            problem: None,
            score: 0,
            counters: Counters::default(),
            time_ticks: 0,
            bounds,
            particle_cap: MAX_PARTICLES,
            events: Vec::new(),
            deferred: Vec::new(),
        }
    }

    pub fn session(&self) -> u64 {
        self.session
    }

    pub fn token(&self) -> SessionToken {
        SessionToken(self.session)
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    /// Whether a deferred action stamped with `token` may still mutate this state
    pub fn is_current(&self, token: SessionToken) -> bool {
        self.alive && token.0 == self.session
    }

    /// Mark the session torn down; later deferred actions are dropped
    pub fn end_session(&mut self) {
        if self.alive {
            log::info!("Session {} ended (score {})", self.session, self.score);
            self.alive = false;
        }
    }

    /// Gameplay is running (including feedback delays)
    pub fn is_active(&self) -> bool {
        self.alive && matches!(self.phase, GamePhase::Playing | GamePhase::Feedback)
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, GamePhase::Finished(_))
    }

    pub fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            GamePhase::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    /// Enter the terminal phase (first outcome sticks)
    pub fn finish(&mut self, outcome: Outcome) {
        if self.is_finished() {
            return;
        }
        log::info!(
            "Session {} finished: {:?} (score {}, correct {}, misses {})",
            self.session,
            outcome,
            self.score,
            self.counters.correct,
            self.counters.misses
        );
        self.phase = GamePhase::Finished(outcome);
        self.deferred.clear();
        self.events.push(GameEvent::Finished(outcome));
    }

    pub fn reward(&mut self, amount: i64) {
        self.score += amount;
    }

    /// Subtract `amount`, never going below `floor` when one is set
    pub fn penalize(&mut self, amount: i64, floor: Option<i64>) {
        let next = self.score - amount;
        self.score = match floor {
            Some(floor) => next.max(floor.min(self.score)),
            None => next,
        };
    }

    pub fn emit(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    pub fn defer(&mut self, seconds: f32, action: DeferredAction) {
        self.deferred.push((seconds, action));
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Scatter `count` short-lived particles from `pos`
    pub fn burst(&mut self, pos: Vec2, count: usize, speed: f32, ttl: u32) {
        let room = self
            .particle_cap
            .saturating_sub(self.entities.live_count(EntityKind::Particle));
        for _ in 0..count.min(room) {
            let angle = self.rng.random_range(0.0..std::f32::consts::TAU);
            let v = crate::heading(angle) * self.rng.random_range(0.2f32..1.0) * speed;
            self.entities
                .add(Entity::new(EntityKind::Particle, pos).with_vel(v).with_ttl(ttl));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_penalty_floor() {
        let mut state = SimulationState::new(1, 0, Bounds::default());
        state.score = 2;
        state.penalize(5, Some(0));
        assert_eq!(state.score, 0);

        state.score = 2;
        state.penalize(5, None);
        assert_eq!(state.score, -3);
    }

    #[test]
    fn test_penalty_never_raises_score() {
        let mut state = SimulationState::new(1, 0, Bounds::default());
        state.score = -10;
        state.penalize(5, Some(0));
        assert_eq!(state.score, -10);
    }

    #[test]
    fn test_session_token() {
        let mut state = SimulationState::new(7, 0, Bounds::default());
        let token = state.token();
        assert!(state.is_current(token));
        assert!(!state.is_current(SimulationState::new(8, 0, Bounds::default()).token()));

        state.end_session();
        assert!(!state.is_current(token));
    }

    #[test]
    fn test_finish_is_sticky() {
        let mut state = SimulationState::new(1, 0, Bounds::default());
        state.phase = GamePhase::Playing;
        state.defer(1.0, DeferredAction::NextRound);
        state.finish(Outcome::Lost);
        state.finish(Outcome::Won);
        assert_eq!(state.outcome(), Some(Outcome::Lost));
        assert!(state.deferred.is_empty());
        assert_eq!(state.drain_events(), vec![GameEvent::Finished(Outcome::Lost)]);
    }

    #[test]
    fn test_burst_respects_cap() {
        let mut state = SimulationState::new(1, 0, Bounds::default());
        state.particle_cap = 5;
        state.burst(Vec2::ZERO, 3, 2.0, 30);
        state.burst(Vec2::ZERO, 3, 2.0, 30);
        assert_eq!(state.entities.live_count(EntityKind::Particle), 5);
    }
}
