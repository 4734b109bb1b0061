//! Knowledge tower
//!
//! A general-knowledge quiz where every answer drops a block onto a tower.
//! Right answers land near the centre line; wrong ones land further off
//! centre the more mistakes come in a row. A block hanging past the edge of
//! the block under it slides off. The tower has fallen once any block but the
//! first reaches the ground or leaves the field.

use glam::Vec2;
use rand::Rng;
use rand::seq::SliceRandom;

use crate::sim::{
    AdvancePolicy, Answer, Boundary, CollisionRule, Disposal, Entity, EntityId, EntityKind,
    GameEvent, GameMode, GameRules, Hit, HitKind, HitTest, InputSnapshot, KindRules, Outcome,
    Payload, Problem, ScoreRule, SimulationState, WrongHitPolicy,
};
use crate::tuning::TowerTuning;

use super::questions::{self, QUESTIONS, Question};

/// Click shots live long enough to be tested once
const CLICK_TTL: u32 = 2;
/// Spin of a block sliding off its support (radians per step)
const TIP_SPIN: f32 = 0.05;
/// How far a block may already overlap a surface and still count as landing on it
const CONTACT_SLACK: f32 = 0.5;

/// What a falling block came down on this step
#[derive(Debug, Clone, Copy, PartialEq)]
enum Contact {
    Ground { top: f32 },
    Block { top: f32, x: f32 },
}

pub struct Tower {
    tuning: TowerTuning,
    rules: GameRules,
    /// Question indices not asked yet
    deck: Vec<usize>,
    was_firing: bool,
    /// Every block in drop order
    dropped: Vec<EntityId>,
    /// Blocks resting on the ground or on another block
    settled: Vec<EntityId>,
}

impl Tower {
    pub fn new(tuning: TowerTuning) -> Self {
        let loose = KindRules {
            boundary: Boundary::None,
            ..KindRules::default()
        };
        let fixed = KindRules {
            consumable: false,
            ..loose
        };
        let mut rules = GameRules::default();
        rules
            .kinds
            .set(EntityKind::Obstacle, loose)
            .set(EntityKind::Projectile, loose)
            .set(EntityKind::Block, fixed)
            .set(EntityKind::Terrain, fixed);
        rules.collisions = vec![CollisionRule {
            a: EntityKind::Projectile,
            b: EntityKind::Obstacle,
            test: HitTest::Rect { margin: 0.0 },
            kind: HitKind::Answer,
            shared_b: false,
            consume_a: true,
        }];
        rules.scoring = ScoreRule {
            correct: tuning.correct_points,
            wrong_penalty: tuning.wrong_penalty,
            crash_penalty: 0,
            miss_penalty: 0,
            floor: None,
        };
        rules.wrong_hit = WrongHitPolicy::ResetProgress;
        rules.advance = AdvancePolicy::Delayed {
            seconds: tuning.feedback_delay,
        };

        Self {
            tuning,
            rules,
            deck: Vec::new(),
            was_firing: false,
            dropped: Vec::new(),
            settled: Vec::new(),
        }
    }

    /// Blocks dropped so far
    pub fn blocks(&self) -> usize {
        self.dropped.len()
    }

    fn ground_y(&self, state: &SimulationState) -> f32 {
        state
            .entities
            .first(EntityKind::Terrain)
            .map_or(state.bounds.max.y - self.tuning.ground_height, |g| g.pos.y)
    }

    /// Next question; the deck is reshuffled once every question was asked
    fn draw_question(&mut self, state: &mut SimulationState) -> Option<&'static Question> {
        if self.deck.is_empty() {
            self.deck = questions::indices(self.tuning.category);
            self.deck.shuffle(&mut state.rng);
            log::debug!(
                "Tower deck shuffled: {} {} questions",
                self.deck.len(),
                self.tuning.category.as_str()
            );
        }
        self.deck.pop().and_then(|i| QUESTIONS.get(i))
    }

    /// Sideways offset and tilt for the block an answer drops
    fn placement(&self, state: &mut SimulationState, correct: bool) -> (f32, f32) {
        if correct {
            let jitter = self.tuning.correct_jitter;
            let offset = if jitter > 0.0 {
                state.rng.random_range(-jitter..jitter)
            } else {
                0.0
            };
            return (offset, state.rng.random_range(-0.015f32..0.015));
        }
        // consecutive_errors already counts this answer
        let steps = state
            .counters
            .consecutive_errors
            .saturating_sub(1)
            .min(self.tuning.max_error_steps) as f32;
        let side = if state.rng.random_bool(0.5) { 1.0 } else { -1.0 };
        let offset = self.tuning.wrong_offset + steps * self.tuning.wrong_offset_step;
        let wobble = 0.02 + steps * 0.01;
        (side * offset, state.rng.random_range(-wobble..wobble))
    }

    /// Release a block `offset` pixels from the centre line
    fn drop_block(&mut self, state: &mut SimulationState, offset: f32, tilt: f32) {
        let pos = Vec2::new(
            state.bounds.center().x + offset,
            state.bounds.min.y + self.tuning.drop_height,
        );
        let id = state.entities.add(
            Entity::new(EntityKind::Block, pos)
                .with_accel(Vec2::new(0.0, self.tuning.gravity))
                .with_angle(tilt, 0.0)
                .with_size(Vec2::new(self.tuning.block_width, self.tuning.block_height)),
        );
        self.dropped.push(id);
        log::debug!("Block {} dropped {:.1}px off centre", self.dropped.len(), offset);
    }

    /// Highest surface the block's bottom crossed during the last `dt`
    fn contact(&self, state: &SimulationState, block: &Entity, dt: f32, ground: f32) -> Option<Contact> {
        let bottom = block.pos.y + block.size.y * 0.5;
        let before = bottom - block.vel.y * dt;
        let support = self
            .settled
            .iter()
            .filter_map(|&id| state.entities.get(id))
            .filter(|s| (s.pos.x - block.pos.x).abs() < (s.size.x + block.size.x) * 0.5)
            .map(|s| (s.pos.y - s.size.y * 0.5, s.pos.x))
            .filter(|&(top, _)| before <= top + CONTACT_SLACK && bottom >= top)
            .min_by(|a, b| a.0.total_cmp(&b.0));

        match support {
            Some((top, x)) => Some(Contact::Block { top, x }),
            None => (bottom >= ground).then_some(Contact::Ground { top: ground }),
        }
    }

    fn settle(&mut self, state: &mut SimulationState, id: EntityId, top: f32) {
        if let Some(block) = state.entities.get_mut(id) {
            block.pos.y = top - block.size.y * 0.5;
            block.vel = Vec2::ZERO;
            block.accel = Vec2::ZERO;
            block.spin = 0.0;
        }
        self.settled.push(id);
    }

    fn off_field(&self, state: &SimulationState) -> bool {
        let m = self.tuning.off_screen_margin;
        let b = state.bounds;
        self.dropped
            .iter()
            .filter_map(|&id| state.entities.get(id))
            .any(|e| e.pos.x < b.min.x - m || e.pos.x > b.max.x + m || e.pos.y > b.max.y + m)
    }
}

impl GameMode for Tower {
    fn name(&self) -> &'static str {
        "tower"
    }

    fn rules(&self) -> &GameRules {
        &self.rules
    }

    fn setup(&mut self, state: &mut SimulationState) {
        self.deck.clear();
        self.dropped.clear();
        self.settled.clear();
        self.was_firing = false;
        let ground = Vec2::new(
            state.bounds.center().x,
            state.bounds.max.y - self.tuning.ground_height,
        );
        state.entities.add(
            Entity::new(EntityKind::Terrain, ground).with_size(Vec2::new(state.bounds.width(), 0.0)),
        );
    }

    fn control(&mut self, state: &mut SimulationState, input: &InputSnapshot, _dt: f32) {
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
        let Some(question) = self.draw_question(state) else {
            log::warn!("No tower questions for {}", self.tuning.category.as_str());
            return;
        };

        let mut candidates: Vec<i64> = (0..question.answers.len() as i64).collect();
        candidates.shuffle(&mut state.rng);

        let slot = state.bounds.width() / candidates.len().max(1) as f32;
        let size = Vec2::new(
            self.tuning.choice_width.min(slot - 12.0).max(1.0),
            self.tuning.choice_height,
        );
        let y = state.bounds.min.y + self.tuning.choice_row;
        for (i, &value) in candidates.iter().enumerate() {
            let x = state.bounds.min.x + slot * (i as f32 + 0.5);
            state.entities.add(
                Entity::new(EntityKind::Obstacle, Vec2::new(x, y))
                    .with_size(size)
                    .with_payload(Payload::Number(value)),
            );
        }

        state.problem = Some(Problem {
            prompt: question.text.to_string(),
            answer: Answer::Number(question.correct as i64),
            candidates,
            operands: None,
            tint: None,
            choices: question.answers.iter().map(|a| a.to_string()).collect(),
        });
    }

    fn on_answer(&mut self, state: &mut SimulationState, _hit: &Hit, correct: bool) {
        if correct {
            state.entities.dispose_kind(EntityKind::Obstacle, Disposal::Cleared);
        }
        let (offset, tilt) = self.placement(state, correct);
        self.drop_block(state, offset, tilt);
    }

    /// Land falling blocks, then check whether the tower stands or fell
    fn post_step(&mut self, state: &mut SimulationState, dt: f32) {
        let ground = self.ground_y(state);
        let falling: Vec<EntityId> = self
            .dropped
            .iter()
            .copied()
            .filter(|id| !self.settled.contains(id))
            .collect();

        for id in falling {
            let Some(block) = state.entities.get(id) else {
                continue;
            };
            let (x, half_width) = (block.pos.x, block.size.x * 0.5);
            match self.contact(state, block, dt, ground) {
                None => {}
                Some(Contact::Ground { top }) => {
                    self.settle(state, id, top);
                    if self.dropped.first() != Some(&id) {
                        log::info!("Tower fell: block {} reached the ground", id);
                        state.finish(Outcome::Lost);
                        return;
                    }
                }
                Some(Contact::Block { top, x: support }) => {
                    let overhang = x - support;
                    if overhang.abs() <= half_width {
                        self.settle(state, id, top);
                    } else if let Some(block) = state.entities.get_mut(id) {
                        let side = overhang.signum();
                        block.vel.x = side * self.tuning.tip_speed;
                        block.spin = side * TIP_SPIN;
                    }
                }
            }
        }

        if self.off_field(state) {
            log::info!("Tower fell: a block left the field");
            state.finish(Outcome::Lost);
            return;
        }
        let steady = self.settled.len() == self.dropped.len();
        if steady && state.counters.correct >= self.tuning.blocks_to_win {
            state.finish(Outcome::Won);
        }
    }
}
