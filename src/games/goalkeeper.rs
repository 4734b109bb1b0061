//! Shape goalkeeper
//!
//! Shape/colour tokens fly from the left toward the goal on the right. The
//! keeper follows the pointer vertically and must stop every token matching
//! the current wave target while letting the others through. The prompt is
//! drawn in a colour that never matches a colour target.

use glam::Vec2;
use rand::Rng;

use crate::sim::{
    AdvancePolicy, Boundary, CollisionRule, Color, Edge, Entity, EntityKind, GOALKEEPER_WAVES,
    GameMode, GameRules, HitKind, HitTest, InputSnapshot, KindRules, MissPolicy, Problem,
    ScoreRule, SimulationState, Target, WrongHitPolicy, advance_round, problem::random_token,
};
use crate::tuning::GoalkeeperTuning;

/// Tokens enter this far from the left edge
const SPAWN_X: f32 = 50.0;
/// Vertical spawn margin and keeper clamp margin
const EDGE_MARGIN: f32 = 50.0;
const KEEPER_CLAMP: f32 = 40.0;

pub struct Goalkeeper {
    tuning: GoalkeeperTuning,
    rules: GameRules,
    wave: usize,
    countdown: u32,
}

impl Goalkeeper {
    pub fn new(tuning: GoalkeeperTuning) -> Self {
        let mut rules = GameRules::default();
        rules
            .kinds
            .set(
                EntityKind::Obstacle,
                KindRules {
                    radius: tuning.token_radius,
                    boundary: Boundary::Terminal {
                        edge: Edge::Right,
                        inset: tuning.goal_inset,
                    },
                    ..KindRules::default()
                },
            )
            .set(
                EntityKind::Keeper,
                KindRules {
                    boundary: Boundary::None,
                    consumable: false,
                    ..KindRules::default()
                },
            );
        rules.collisions = vec![CollisionRule {
            a: EntityKind::Obstacle,
            b: EntityKind::Keeper,
            test: HitTest::Rect {
                margin: tuning.catch_margin,
            },
            kind: HitKind::Answer,
            shared_b: true,
            consume_a: false,
        }];
        rules.scoring = ScoreRule {
            correct: tuning.save_points,
            wrong_penalty: tuning.wrong_save_penalty,
            crash_penalty: 0,
            miss_penalty: tuning.goal_penalty,
            floor: None,
        };
        rules.wrong_hit = WrongHitPolicy::Dispose;
        rules.miss_policy = MissPolicy::CorrectOnly;
        rules.advance = AdvancePolicy::Never;
        rules.max_misses = Some(tuning.max_goals);

        Self {
            tuning,
            rules,
            wave: 0,
            countdown: 0,
        }
    }

    /// Index into the wave table
    pub fn wave(&self) -> usize {
        self.wave
    }

    pub fn target(&self) -> Target {
        GOALKEEPER_WAVES[self.wave % GOALKEEPER_WAVES.len()]
    }

    fn token_speed(&self) -> f32 {
        self.tuning.base_speed + self.tuning.speed_per_wave * self.wave as f32
    }

    fn spawn_token(&self, state: &mut SimulationState) {
        let top = state.bounds.min.y + EDGE_MARGIN;
        let bottom = (state.bounds.max.y - EDGE_MARGIN).max(top + 1.0);
        let y = state.rng.random_range(top..bottom);
        let payload = random_token(&mut state.rng);
        state.entities.add(
            Entity::new(EntityKind::Obstacle, Vec2::new(state.bounds.min.x + SPAWN_X, y))
                .with_vel(Vec2::new(self.token_speed(), 0.0))
                .with_size(Vec2::splat(self.tuning.token_radius))
                .with_payload(payload),
        );
    }

    /// Prompt colour, never the colour being asked for
    fn stroop_tint<R: Rng + ?Sized>(target: Target, rng: &mut R) -> Color {
        let forbidden = match target {
            Target::Color(c) | Target::Both(_, c) => Some(c),
            Target::Shape(_) => None,
        };
        let allowed: Vec<Color> = Color::ALL
            .into_iter()
            .filter(|&c| Some(c) != forbidden)
            .collect();
        allowed[rng.random_range(0..allowed.len())]
    }
}

impl GameMode for Goalkeeper {
    fn name(&self) -> &'static str {
        "goalkeeper"
    }

    fn rules(&self) -> &GameRules {
        &self.rules
    }

    fn setup(&mut self, state: &mut SimulationState) {
        self.wave = 0;
        self.countdown = 0;
        let pos = Vec2::new(
            state.bounds.max.x - self.tuning.keeper_inset,
            state.bounds.center().y,
        );
        state.entities.add(
            Entity::new(EntityKind::Keeper, pos)
                .with_size(Vec2::new(self.tuning.keeper_width, self.tuning.keeper_height)),
        );
    }

    fn control(&mut self, state: &mut SimulationState, input: &InputSnapshot, _dt: f32) {
        let bounds = state.bounds;
        let inset = self.tuning.keeper_inset;
        if let Some(keeper) = state.entities.first_mut(EntityKind::Keeper) {
            keeper.pos.x = bounds.max.x - inset;
            if let Some(pointer) = input.pointer {
                let lo = bounds.min.y + KEEPER_CLAMP;
                let hi = (bounds.max.y - KEEPER_CLAMP).max(lo);
                keeper.pos.y = pointer.y.clamp(lo, hi);
            }
        }

        if self.countdown == 0 {
            self.spawn_token(state);
            self.countdown = self.tuning.spawn_interval;
        }
        self.countdown = self.countdown.saturating_sub(1);
    }

    fn next_round(&mut self, state: &mut SimulationState) {
        let target = self.target();
        let mut problem = Problem::target(target);
        problem.tint = Some(Self::stroop_tint(target, &mut state.rng));
        log::debug!("Goalkeeper wave {}: {}", self.wave, problem.prompt);
        state.problem = Some(problem);
    }

    fn post_step(&mut self, state: &mut SimulationState, _dt: f32) {
        if state.counters.progress >= self.tuning.saves_per_wave {
            state.counters.progress = 0;
            self.wave = (self.wave + 1) % GOALKEEPER_WAVES.len();
            advance_round(state, self);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Bounds;
    use crate::sim::{Outcome, Payload, Shape, begin, step};

    fn session() -> (Goalkeeper, SimulationState) {
        let mut mode = Goalkeeper::new(GoalkeeperTuning::default());
        let mut state = SimulationState::new(1, 21, Bounds::default());
        begin(&mut state, &mut mode);
        (mode, state)
    }

    fn token(state: &mut SimulationState, x: f32, y: f32, shape: Shape, color: Color) {
        state.entities.add(
            Entity::new(EntityKind::Obstacle, Vec2::new(x, y))
                .with_vel(Vec2::new(2.0, 0.0))
                .with_payload(Payload::Token { shape, color }),
        );
    }

    fn pointer(y: f32) -> InputSnapshot {
        InputSnapshot {
            pointer: Some(Vec2::new(0.0, y)),
            ..Default::default()
        }
    }

    #[test]
    fn test_spawn_schedule() {
        let (mut mode, mut state) = session();
        let idle = InputSnapshot::default();
        step(&mut state, &mut mode, &idle, 1.0);
        assert_eq!(state.entities.live_count(EntityKind::Obstacle), 1);
        for _ in 0..89 {
            step(&mut state, &mut mode, &idle, 1.0);
        }
        assert_eq!(state.entities.live_count(EntityKind::Obstacle), 1);
        step(&mut state, &mut mode, &idle, 1.0);
        assert_eq!(state.entities.live_count(EntityKind::Obstacle), 2);

        let t = state.entities.first(EntityKind::Obstacle).unwrap();
        assert_eq!(t.vel, Vec2::new(2.0, 0.0));
    }

    #[test]
    fn test_zero_spawn_interval_spawns_every_step() {
        let mut mode = Goalkeeper::new(GoalkeeperTuning {
            spawn_interval: 0,
            ..GoalkeeperTuning::default()
        });
        let mut state = SimulationState::new(1, 21, Bounds::default());
        begin(&mut state, &mut mode);
        for _ in 0..3 {
            step(&mut state, &mut mode, &InputSnapshot::default(), 1.0);
        }
        assert_eq!(state.entities.live_count(EntityKind::Obstacle), 3);
    }

    #[test]
    fn test_keeper_follows_pointer_clamped() {
        let (mut mode, mut state) = session();
        step(&mut state, &mut mode, &pointer(5.0), 1.0);
        let keeper = state.entities.first(EntityKind::Keeper).unwrap();
        assert_eq!(keeper.pos, Vec2::new(690.0, 40.0));

        step(&mut state, &mut mode, &pointer(250.0), 1.0);
        assert_eq!(state.entities.first(EntityKind::Keeper).unwrap().pos.y, 250.0);
    }

    #[test]
    fn test_matching_save_scores_and_wrong_save_is_free() {
        let (mut mode, mut state) = session();
        assert_eq!(mode.target(), Target::Color(Color::Red));
        // Keeper at (690, 300); tokens right in front of it
        token(&mut state, 655.0, 300.0, Shape::Star, Color::Red);
        token(&mut state, 655.0, 320.0, Shape::Circle, Color::Blue);

        step(&mut state, &mut mode, &pointer(300.0), 1.0);
        assert_eq!(state.score, 5);
        assert_eq!(state.counters.correct, 1);
        let left: Vec<_> = state
            .entities
            .of_kind(EntityKind::Obstacle)
            .filter(|e| e.pos.x > 600.0)
            .collect();
        assert!(left.is_empty());
    }

    #[test]
    fn test_goals_against_lose_the_game() {
        let (mut mode, mut state) = session();
        for i in 0..5 {
            token(&mut state, 739.0, 100.0 + i as f32 * 10.0, Shape::Square, Color::Red);
            // Letting a non-target through is fine
            token(&mut state, 739.0, 500.0, Shape::Square, Color::Green);
            step(&mut state, &mut mode, &pointer(300.0), 1.0);
        }
        assert_eq!(state.counters.misses, 5);
        assert_eq!(state.score, -25);
        assert_eq!(state.outcome(), Some(Outcome::Lost));
    }

    #[test]
    fn test_wave_rotates_after_ten_saves() {
        let (mut mode, mut state) = session();
        for _ in 0..10 {
            token(&mut state, 660.0, 300.0, Shape::Triangle, Color::Red);
            step(&mut state, &mut mode, &pointer(300.0), 1.0);
        }
        assert_eq!(state.counters.correct, 10);
        assert_eq!(mode.wave(), 1);
        assert_eq!(state.counters.progress, 0);
        assert_eq!(state.counters.round, 2);
        let problem = state.problem.as_ref().unwrap();
        assert_eq!(problem.answer, crate::sim::Answer::Target(Target::Color(Color::Blue)));
        assert_ne!(problem.tint, Some(Color::Blue));
        assert!((mode.token_speed() - 2.3).abs() < 1e-6);
    }

    #[test]
    fn test_stroop_tint_never_matches_target_colour() {
        let mut rng = rand_pcg::Pcg32::new(1, 1);
        for _ in 0..200 {
            let tint = Goalkeeper::stroop_tint(Target::Both(Shape::Star, Color::Yellow), &mut rng);
            assert_ne!(tint, Color::Yellow);
        }
    }
}
