//! Math asteroids
//!
//! The ship rotates, thrusts and wraps around the field. Every asteroid
//! carries a number; shooting the one that answers the prompt scores and
//! deals a fresh set, shooting a wrong one swaps it for another distractor,
//! and flying into any of them costs points and respawns the ship.

use glam::Vec2;
use rand::Rng;

use super::point_around;
use crate::consts::DISTRACTOR_ATTEMPTS;
use crate::sim::problem::extend_distractors;
use crate::sim::{
    AdvancePolicy, Boundary, CollisionRule, Difficulty, Disposal, Entity, EntityId, EntityKind,
    GameEvent, GameMode, GameRules, HitKind, HitTest, InputSnapshot, KindRules, Operation,
    Payload, ScoreRule, SimulationState, WrongHitPolicy, generate_problem,
};
use crate::tuning::AsteroidsTuning;

/// Ship orientation at spawn (pointing up)
const SHIP_START_ANGLE: f32 = -std::f32::consts::FRAC_PI_2;
/// Bullets leave from the nose, this far ahead of the ship center
const NOSE_OFFSET: f32 = 20.0;

pub struct Asteroids {
    operation: Operation,
    difficulty: Difficulty,
    tuning: AsteroidsTuning,
    rules: GameRules,
    cooldown: u32,
    was_thrusting: bool,
}

impl Asteroids {
    pub fn new(operation: Operation, difficulty: Difficulty, tuning: AsteroidsTuning) -> Self {
        let mut rules = GameRules::default();
        rules
            .kinds
            .set(
                EntityKind::Ship,
                KindRules {
                    radius: tuning.ship_radius,
                    drag: tuning.friction,
                    boundary: Boundary::Wrap { margin: 0.0 },
                    consumable: false,
                },
            )
            .set(
                EntityKind::Obstacle,
                KindRules {
                    radius: tuning.asteroid_radius,
                    boundary: Boundary::Wrap {
                        margin: tuning.wrap_margin,
                    },
                    ..KindRules::default()
                },
            )
            .set(
                EntityKind::Projectile,
                KindRules {
                    boundary: Boundary::Despawn { margin: 0.0 },
                    ..KindRules::default()
                },
            );
        rules.collisions = vec![
            CollisionRule {
                a: EntityKind::Projectile,
                b: EntityKind::Obstacle,
                test: HitTest::Circle,
                kind: HitKind::Answer,
                shared_b: false,
                consume_a: true,
            },
            CollisionRule {
                a: EntityKind::Ship,
                b: EntityKind::Obstacle,
                test: HitTest::Circle,
                kind: HitKind::Crash,
                shared_b: false,
                consume_a: false,
            },
        ];
        rules.scoring = ScoreRule {
            correct: tuning.correct_points,
            wrong_penalty: tuning.wrong_penalty,
            crash_penalty: tuning.crash_penalty,
            miss_penalty: 0,
            floor: Some(0),
        };
        rules.wrong_hit = WrongHitPolicy::Respawn;
        rules.advance = AdvancePolicy::Immediate;
        rules.explosions = true;

        Self {
            operation,
            difficulty,
            tuning,
            rules,
            cooldown: 0,
            was_thrusting: false,
        }
    }

    fn ship_pos(state: &SimulationState) -> Vec2 {
        state
            .entities
            .first(EntityKind::Ship)
            .map(|s| s.pos)
            .unwrap_or_else(|| state.bounds.center())
    }

    /// Drift velocity with neither component slower than the minimum on both axes
    fn drift<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec2 {
        let speed = self.tuning.asteroid_speed;
        let span = (speed.max - speed.min).max(f32::EPSILON);
        for _ in 0..DISTRACTOR_ATTEMPTS {
            let v = Vec2::new(rng.random_range(-span..span), rng.random_range(-span..span));
            if v.x.abs() >= speed.min || v.y.abs() >= speed.min {
                return v;
            }
        }
        Vec2::new(speed.min, 0.0)
    }

    fn spawn_asteroid(&self, state: &mut SimulationState, value: i64) -> EntityId {
        let pos = point_around(Self::ship_pos(state), self.tuning.spawn_clearance, &mut state.rng);
        let vel = self.drift(&mut state.rng);
        let angle = state.rng.random_range(0.0..std::f32::consts::TAU);
        let spin = (state.rng.random::<f32>() - 0.5) * 0.05;
        state.entities.add(
            Entity::new(EntityKind::Obstacle, pos)
                .with_vel(vel)
                .with_angle(angle, spin)
                .with_size(Vec2::splat(self.tuning.asteroid_radius))
                .with_payload(Payload::Number(value)),
        )
    }

    fn fire(&mut self, state: &mut SimulationState, pos: Vec2, angle: f32) {
        let dir = crate::heading(angle);
        state.entities.add(
            Entity::new(EntityKind::Projectile, pos + dir * NOSE_OFFSET)
                .with_vel(dir * self.tuning.bullet_speed)
                .with_ttl(self.tuning.bullet_ttl),
        );
        self.cooldown = self.tuning.fire_cooldown;
        state.emit(GameEvent::Shot);
    }

    fn exhaust(state: &mut SimulationState, pos: Vec2, vel: Vec2, angle: f32) {
        if state.entities.live_count(EntityKind::Particle) >= state.particle_cap {
            return;
        }
        let back = -crate::heading(angle);
        let kick = state.rng.random_range(2.0f32..7.0);
        state.entities.add(
            Entity::new(EntityKind::Particle, pos + back * 15.0)
                .with_vel(vel + back * kick)
                .with_ttl(20),
        );
    }
}

impl GameMode for Asteroids {
    fn name(&self) -> &'static str {
        "asteroids"
    }

    fn rules(&self) -> &GameRules {
        &self.rules
    }

    fn setup(&mut self, state: &mut SimulationState) {
        self.cooldown = 0;
        self.was_thrusting = false;
        state.entities.add(
            Entity::new(EntityKind::Ship, state.bounds.center())
                .with_angle(SHIP_START_ANGLE, 0.0)
                .with_size(Vec2::splat(self.tuning.ship_radius)),
        );
    }

    fn control(&mut self, state: &mut SimulationState, input: &InputSnapshot, dt: f32) {
        self.cooldown = self.cooldown.saturating_sub(1);

        let rotation = input.rotation() * self.tuning.rotation_speed * dt;
        let thrust = self.tuning.thrust;
        let Some(ship) = state.entities.first_mut(EntityKind::Ship) else {
            return;
        };
        ship.angle += rotation;
        ship.accel = if input.thrust {
            crate::heading(ship.angle) * thrust
        } else {
            Vec2::ZERO
        };
        let (pos, vel, angle) = (ship.pos, ship.vel, ship.angle);

        if input.thrust {
            if !self.was_thrusting {
                state.emit(GameEvent::Thrust);
            }
            if state.rng.random_bool(0.5) {
                Self::exhaust(state, pos, vel, angle);
            }
        }
        self.was_thrusting = input.thrust;

        if input.fire && self.cooldown == 0 {
            self.fire(state, pos, angle);
        }
    }

    fn next_round(&mut self, state: &mut SimulationState) {
        state.entities.dispose_kind(EntityKind::Obstacle, Disposal::Cleared);
        let problem = generate_problem(
            self.operation,
            self.difficulty,
            self.tuning.candidates,
            &mut state.rng,
        );
        for &value in &problem.candidates {
            self.spawn_asteroid(state, value);
        }
        state.problem = Some(problem);
    }

    fn respawn_distractor(&mut self, state: &mut SimulationState, _near: Vec2) {
        let Some(answer) = state.problem.as_ref().and_then(|p| p.correct_value()) else {
            return;
        };
        let mut in_play: Vec<i64> = state
            .entities
            .of_kind(EntityKind::Obstacle)
            .filter_map(Entity::number)
            .collect();
        let before = in_play.len();
        extend_distractors(
            answer,
            &mut in_play,
            1,
            self.difficulty.distractor_spread(),
            &mut state.rng,
        );
        if let Some(&value) = in_play.get(before) {
            self.spawn_asteroid(state, value);
        }
    }

    fn on_crash(&mut self, state: &mut SimulationState, craft: EntityId) {
        let center = state.bounds.center();
        if let Some(ship) = state.entities.get_mut(craft) {
            ship.pos = center;
            ship.vel = Vec2::ZERO;
            ship.accel = Vec2::ZERO;
            ship.angle = SHIP_START_ANGLE;
            ship.invulnerable = self.tuning.invulnerable_steps;
        }
    }
}
