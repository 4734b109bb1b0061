//! Space defender
//!
//! Numbered asteroids fall toward the ground in four columns. Clicking the
//! one that answers the prompt blows it up and, after a short pause, deals a
//! new wave. Any asteroid reaching the ground ends the game.

use glam::Vec2;
use rand::Rng;

use crate::sim::{
    AdvancePolicy, Boundary, CollisionRule, Difficulty, Disposal, Edge, Entity, EntityKind,
    GameEvent, GameMode, GameRules, HitKind, HitTest, InputSnapshot, KindRules, MissPolicy,
    Operation, Payload, ScoreRule, SimulationState, WrongHitPolicy, generate_problem,
};
use crate::tuning::DefenderTuning;

/// Column centers as fractions of the field width
const COLUMNS: [f32; 4] = [0.15, 0.38, 0.61, 0.84];
/// Click shots live long enough to be tested once
const CLICK_TTL: u32 = 2;

pub struct Defender {
    operation: Operation,
    difficulty: Difficulty,
    tuning: DefenderTuning,
    rules: GameRules,
    was_firing: bool,
}

impl Defender {
    pub fn new(operation: Operation, difficulty: Difficulty, tuning: DefenderTuning) -> Self {
        let mut rules = GameRules::default();
        rules
            .kinds
            .set(
                EntityKind::Obstacle,
                KindRules {
                    radius: tuning.asteroid_radius,
                    boundary: Boundary::Terminal {
                        edge: Edge::Bottom,
                        inset: tuning.ground_inset,
                    },
                    ..KindRules::default()
                },
            )
            .set(
                EntityKind::Projectile,
                KindRules {
                    boundary: Boundary::None,
                    ..KindRules::default()
                },
            );
        rules.collisions = vec![CollisionRule {
            a: EntityKind::Projectile,
            b: EntityKind::Obstacle,
            test: HitTest::Circle,
            kind: HitKind::Answer,
            shared_b: false,
            consume_a: true,
        }];
        rules.scoring = ScoreRule {
            correct: tuning.correct_points,
            wrong_penalty: tuning.wrong_penalty,
            crash_penalty: 0,
            miss_penalty: 0,
            floor: Some(0),
        };
        rules.wrong_hit = WrongHitPolicy::Keep;
        rules.miss_policy = MissPolicy::Any;
        rules.advance = AdvancePolicy::Delayed {
            seconds: tuning.feedback_delay,
        };
        rules.max_misses = Some(1);
        rules.explosions = true;

        Self {
            operation,
            difficulty,
            tuning,
            rules,
            was_firing: false,
        }
    }

    /// Horizontal center of a column
    pub fn column_x(state: &SimulationState, column: usize) -> f32 {
        let frac = COLUMNS[column % COLUMNS.len()];
        state.bounds.min.x + state.bounds.width() * frac
    }
}

impl GameMode for Defender {
    fn name(&self) -> &'static str {
        "defender"
    }

    fn rules(&self) -> &GameRules {
        &self.rules
    }

    fn setup(&mut self, _state: &mut SimulationState) {
        self.was_firing = false;
    }

    fn control(&mut self, state: &mut SimulationState, input: &InputSnapshot, _dt: f32) {
        // One shot per click, not per held step
        let pressed = input.fire && !self.was_firing;
        self.was_firing = input.fire;
        if let (true, Some(pointer)) = (pressed, input.pointer) {
            state
                .entities
                .add(Entity::new(EntityKind::Projectile, pointer).with_ttl(CLICK_TTL));
            state.emit(GameEvent::Shot);
        }
    }

    fn next_round(&mut self, state: &mut SimulationState) {
        // Control is skipped during feedback, so the held state is stale
        self.was_firing = false;
        state.entities.dispose_kind(EntityKind::Obstacle, Disposal::Cleared);
        let problem = generate_problem(
            self.operation,
            self.difficulty,
            self.tuning.candidates,
            &mut state.rng,
        );
        let speed = self.tuning.fall_speed(self.difficulty);
        for (column, &value) in problem.candidates.iter().enumerate() {
            let x = Self::column_x(state, column);
            let fall = if speed.max > speed.min {
                state.rng.random_range(speed.min..speed.max)
            } else {
                speed.min
            };
            state.entities.add(
                Entity::new(EntityKind::Obstacle, Vec2::new(x, state.bounds.min.y))
                    .with_vel(Vec2::new(0.0, fall))
                    .with_size(Vec2::splat(self.tuning.asteroid_radius))
                    .with_payload(Payload::Number(value)),
            );
        }
        state.problem = Some(problem);
    }
}
