//! Math lander
//!
//! A lander drifts down under gravity over generated terrain. Three raised
//! platforms carry candidate answers; touching down gently and upright on the
//! right one scores a bonus for the fuel left. Touching the ground, flying
//! off the bottom or landing too hard counts as a crash. Crashing with an
//! empty tank ends the game.

use std::f32::consts::{FRAC_PI_2, PI, TAU};

use glam::Vec2;
use rand::Rng;

use crate::sim::{
    AdvancePolicy, Boundary, CollisionRule, Difficulty, Disposal, Entity, EntityId, EntityKind,
    GameEvent, GameMode, GameRules, GamePhase, Hit, HitKind, HitTest, InputSnapshot, KindRules,
    Operation, Outcome, Payload, ScoreRule, SimulationState, WrongHitPolicy, generate_problem,
};
use crate::tuning::LanderTuning;

const UPRIGHT: f32 = -FRAC_PI_2;
/// Spawn height below the top edge
const START_HEIGHT: f32 = 50.0;
/// Hull geometry: nose distance and rear corner distance/angle
const NOSE: f32 = 20.0;
const REAR: f32 = 15.0;
const REAR_ANGLE: f32 = 2.6;
/// Platforms float this far above the ground under them
const PLATFORM_LIFT: f32 = 20.0;
/// First platform segment and spacing between platforms
const FIRST_PLATFORM: usize = 4;
const PLATFORM_STRIDE: usize = 6;
/// Max height change between neighbouring terrain points
const ROUGHNESS: f32 = 50.0;

/// Endpoints of a terrain segment entity
pub fn segment_ends(segment: &Entity) -> (Vec2, Vec2) {
    let half = crate::heading(segment.angle) * segment.size.x * 0.5;
    (segment.pos - half, segment.pos + half)
}

/// Nose and rear corners of the lander hull
pub fn hull_points(ship: &Entity) -> [Vec2; 3] {
    [
        ship.pos + crate::heading(ship.angle) * NOSE,
        ship.pos + crate::heading(ship.angle + REAR_ANGLE) * REAR,
        ship.pos + crate::heading(ship.angle - REAR_ANGLE) * REAR,
    ]
}

/// Absolute deviation from upright, in `[0, PI]`
fn tilt(angle: f32) -> f32 {
    let d = (angle - UPRIGHT).rem_euclid(TAU);
    if d > PI { TAU - d } else { d }
}

pub struct Lander {
    operation: Operation,
    difficulty: Difficulty,
    tuning: LanderTuning,
    rules: GameRules,
    was_thrusting: bool,
}

impl Lander {
    pub fn new(operation: Operation, difficulty: Difficulty, tuning: LanderTuning) -> Self {
        let fixed = KindRules {
            boundary: Boundary::None,
            consumable: false,
            ..KindRules::default()
        };
        let mut rules = GameRules::default();
        rules
            .kinds
            .set(
                EntityKind::Ship,
                KindRules {
                    radius: REAR,
                    boundary: Boundary::WrapHorizontal { margin: 0.0 },
                    consumable: false,
                    ..KindRules::default()
                },
            )
            .set(EntityKind::Platform, fixed)
            .set(EntityKind::Terrain, fixed);
        rules.collisions = vec![CollisionRule {
            a: EntityKind::Ship,
            b: EntityKind::Platform,
            test: HitTest::Rect {
                margin: tuning.contact_margin,
            },
            kind: HitKind::Answer,
            shared_b: true,
            consume_a: false,
        }];
        rules.scoring = ScoreRule {
            correct: tuning.base_points,
            wrong_penalty: tuning.wrong_penalty,
            crash_penalty: 0,
            miss_penalty: 0,
            floor: Some(0),
        };
        rules.wrong_hit = WrongHitPolicy::Keep;
        rules.advance = AdvancePolicy::Delayed {
            seconds: tuning.feedback_delay,
        };
        rules.max_crashes = Some(tuning.max_crashes);

        Self {
            operation,
            difficulty,
            tuning,
            rules,
            was_thrusting: false,
        }
    }

    fn gravity(&self) -> Vec2 {
        Vec2::new(0.0, self.tuning.gravity)
    }

    /// Put the lander back at the top, upright, with a small sideways drift
    fn reset_ship(&self, state: &mut SimulationState) {
        let start = Vec2::new(state.bounds.center().x, state.bounds.min.y + START_HEIGHT);
        let drift = state.rng.random_range(-1.0f32..1.0);
        let gravity = self.gravity();
        if let Some(ship) = state.entities.first_mut(EntityKind::Ship) {
            ship.pos = start;
            ship.vel = Vec2::new(drift, 0.0);
            ship.accel = gravity;
            ship.angle = UPRIGHT;
        }
    }

    fn refuel(&self, state: &mut SimulationState) {
        state.counters.fuel = self.tuning.fuel;
    }

    /// Random-walk terrain with flat shelves under the platforms
    fn build_terrain(&self, state: &mut SimulationState, values: &[i64]) {
        let bounds = state.bounds;
        let segments = self.tuning.terrain_segments.max(1);
        let seg_w = bounds.width() / segments as f32;
        let (lo, hi) = (
            bounds.min.y + bounds.height() * 0.6,
            bounds.min.y + bounds.height() * 0.9,
        );
        let pads: Vec<usize> = (0..values.len())
            .map(|k| FIRST_PLATFORM + k * PLATFORM_STRIDE)
            .collect();

        let mut height = bounds.min.y + bounds.height() * 0.8;
        let mut points = Vec::with_capacity(segments + 1);
        for i in 0..=segments {
            let on_pad = pads.contains(&i) || (i > 0 && pads.contains(&(i - 1)));
            if let Some(k) = pads.iter().position(|&p| p == i) {
                let center = Vec2::new(bounds.min.x + i as f32 * seg_w + seg_w, height - PLATFORM_LIFT);
                state.entities.add(
                    Entity::new(EntityKind::Platform, center)
                        .with_size(Vec2::new(seg_w * 3.0, 0.0))
                        .with_payload(Payload::Number(values[k])),
                );
            }
            if !on_pad {
                height += state.rng.random_range(-ROUGHNESS..ROUGHNESS);
                height = height.clamp(lo, hi);
            }
            points.push(Vec2::new(bounds.min.x + i as f32 * seg_w, height));
        }

        for pair in points.windows(2) {
            let (p1, p2) = (pair[0], pair[1]);
            let d = p2 - p1;
            state.entities.add(
                Entity::new(EntityKind::Terrain, (p1 + p2) * 0.5)
                    .with_angle(d.y.atan2(d.x), 0.0)
                    .with_size(Vec2::new(d.length(), 0.0)),
            );
        }
    }

    /// Terrain segment under `x` and the ground height there
    fn ground_at(state: &SimulationState, x: f32) -> Option<(EntityId, f32)> {
        state.entities.of_kind(EntityKind::Terrain).find_map(|seg| {
            let (p1, p2) = segment_ends(seg);
            if x < p1.x || x > p2.x || p2.x <= p1.x {
                return None;
            }
            let t = (x - p1.x) / (p2.x - p1.x);
            Some((seg.id, p1.y + t * (p2.y - p1.y)))
        })
    }

    fn exhaust(state: &mut SimulationState, ship: &Entity) {
        let back = -crate::heading(ship.angle);
        for _ in 0..3 {
            if state.entities.live_count(EntityKind::Particle) >= state.particle_cap {
                return;
            }
            let kick = state.rng.random_range(2.0f32..7.0);
            state.entities.add(
                Entity::new(EntityKind::Particle, ship.pos + back * REAR)
                    .with_vel(ship.vel + back * kick)
                    .with_ttl(20),
            );
        }
    }
}

impl GameMode for Lander {
    fn name(&self) -> &'static str {
        "lander"
    }

    fn rules(&self) -> &GameRules {
        &self.rules
    }

    fn setup(&mut self, state: &mut SimulationState) {
        self.was_thrusting = false;
        state
            .entities
            .add(Entity::new(EntityKind::Ship, state.bounds.center()).with_size(Vec2::splat(NOSE)));
    }

    fn control(&mut self, state: &mut SimulationState, input: &InputSnapshot, dt: f32) {
        let burning = input.thrust && state.counters.fuel > 0.0;
        if burning {
            state.counters.fuel = (state.counters.fuel - dt).max(0.0);
        }
        let (rotation, thrust, gravity) = (
            input.rotation() * self.tuning.rotation_speed * dt,
            self.tuning.thrust,
            self.gravity(),
        );
        let Some(ship) = state.entities.first_mut(EntityKind::Ship) else {
            return;
        };
        ship.angle += rotation;
        ship.accel = gravity;
        if burning {
            ship.accel += crate::heading(ship.angle) * thrust;
        }
        let ship = ship.clone();

        if burning {
            if !self.was_thrusting {
                state.emit(GameEvent::Thrust);
            }
            Self::exhaust(state, &ship);
        }
        self.was_thrusting = burning;
    }

    fn next_round(&mut self, state: &mut SimulationState) {
        state.entities.dispose_kind(EntityKind::Terrain, Disposal::Cleared);
        state.entities.dispose_kind(EntityKind::Platform, Disposal::Cleared);
        let problem = generate_problem(
            self.operation,
            self.difficulty,
            self.tuning.candidates,
            &mut state.rng,
        );
        self.build_terrain(state, &problem.candidates);
        state.problem = Some(problem);
        self.reset_ship(state);
        self.refuel(state);
    }

    /// Hard or tilted touchdowns become crashes; ground contact adds one
    fn review_hits(&mut self, state: &SimulationState, hits: &mut Vec<Hit>) {
        if state.phase != GamePhase::Playing {
            return;
        }
        let Some(ship) = state.entities.first(EntityKind::Ship) else {
            return;
        };

        let mut touched = false;
        for hit in hits.iter_mut().filter(|h| h.a == ship.id) {
            touched = true;
            let speed = ship.vel.length();
            let lean = tilt(ship.angle);
            if hit.kind == HitKind::Answer
                && (speed >= self.tuning.max_landing_speed || lean >= self.tuning.max_landing_angle)
            {
                log::debug!("Rough landing (speed {:.2}, tilt {:.2})", speed, lean);
                hit.kind = HitKind::Crash;
            }
        }
        if touched {
            return;
        }

        for p in hull_points(ship) {
            let ground = if p.y > state.bounds.max.y {
                Some(ship.id)
            } else {
                Self::ground_at(state, p.x)
                    .and_then(|(segment, y)| (p.y >= y).then_some(segment))
            };
            if let Some(b) = ground {
                hits.push(Hit {
                    a: ship.id,
                    b,
                    kind: HitKind::Crash,
                    consume_a: false,
                });
                return;
            }
        }
    }

    fn award(&self, state: &SimulationState) -> i64 {
        let bonus = (state.counters.fuel / self.tuning.fuel_per_point).floor() as i64;
        self.rules.scoring.correct + bonus
    }

    fn on_answer(&mut self, state: &mut SimulationState, hit: &Hit, correct: bool) {
        if correct {
            if let Some(ship) = state.entities.get_mut(hit.a) {
                ship.vel = Vec2::ZERO;
                ship.accel = Vec2::ZERO;
            }
        } else {
            self.reset_ship(state);
        }
    }

    fn on_crash(&mut self, state: &mut SimulationState, _craft: EntityId) {
        if state.counters.fuel <= 0.0 {
            log::info!("Lander crashed with an empty tank");
            state.finish(Outcome::Lost);
            return;
        }
        self.reset_ship(state);
        self.refuel(state);
    }
}
