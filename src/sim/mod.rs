//! Entity simulation loop
//!
//! All gameplay logic lives here. This module must stay pure and deterministic:
//! - Explicit session state passed into every step
//! - Seeded RNG only
//! - Stable iteration order (entity insertion order)
//! - No rendering, audio or platform dependencies

pub mod collision;
pub mod entity;
pub mod input;
pub mod mode;
pub mod physics;
pub mod problem;
pub mod resolve;
pub mod rules;
pub mod state;
pub mod tick;
pub mod timers;

pub use collision::{Hit, circles_overlap, detect, point_in_rect};
pub use entity::{Disposal, Entity, EntityId, EntityKind, EntityStore, Payload};
pub use input::{Control, InputSampler, InputSnapshot};
pub use mode::GameMode;
pub use physics::{Exit, integrate};
pub use problem::{
    Answer, Color, Difficulty, GOALKEEPER_WAVES, Operation, Problem, Shape, Target, distractors,
    generate_operands, generate_problem,
};
pub use resolve::{advance_round, apply_deferred, begin, check_terminal, resolve};
pub use rules::{
    AdvancePolicy, Boundary, CollisionRule, Edge, GameRules, HitKind, HitTest, KindRules,
    KindTable, MissPolicy, ScoreRule, WrongHitPolicy,
};
pub use state::{
    Counters, DeferredAction, GameEvent, GamePhase, Outcome, SessionToken, SimulationState,
};
pub use tick::step;
pub use timers::TimerQueue;
