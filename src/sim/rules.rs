//! Per-game rule configuration
//!
//! One `GameRules` value parametrizes the shared loop: how each entity kind
//! moves and leaves the field, which kinds collide and how, and how hits and
//! misses turn into score and terminal state.

use serde::{Deserialize, Serialize};

use super::entity::EntityKind;

/// Field edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Edge {
    Left,
    Right,
    Top,
    Bottom,
}

/// What happens when an entity reaches the field boundary
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Boundary {
    /// No boundary handling
    None,
    /// Re-enter from the opposite edge on both axes
    Wrap { margin: f32 },
    /// Re-enter from the opposite side horizontally only
    WrapHorizontal { margin: f32 },
    /// Dispose once fully past any edge
    Despawn { margin: f32 },
    /// Keep inside the field
    Clamp,
    /// Dispose and report a terminal exit when crossing a line `inset` pixels inside `edge`
    Terminal { edge: Edge, inset: f32 },
}

/// Physics and collision parameters for one entity kind
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KindRules {
    /// Collision radius (fixed per kind, independent of drawn size)
    pub radius: f32,
    /// Velocity multiplier per nominal step
    pub drag: f32,
    pub boundary: Boundary,
    /// Whether a collision may consume it (static pads are not consumable)
    pub consumable: bool,
}

impl Default for KindRules {
    fn default() -> Self {
        Self {
            radius: 0.0,
            drag: 1.0,
            boundary: Boundary::Despawn { margin: 50.0 },
            consumable: true,
        }
    }
}

/// Per-kind rule lookup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindTable {
    rules: [KindRules; EntityKind::COUNT],
}

impl Default for KindTable {
    fn default() -> Self {
        Self {
            rules: [KindRules::default(); EntityKind::COUNT],
        }
    }
}

impl KindTable {
    pub fn get(&self, kind: EntityKind) -> &KindRules {
        &self.rules[kind.index()]
    }

    pub fn set(&mut self, kind: EntityKind, rules: KindRules) -> &mut Self {
        self.rules[kind.index()] = rules;
        self
    }
}

/// Proximity test used by a collision rule
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum HitTest {
    /// Centers closer than the summed kind radii
    Circle,
    /// `a`'s center inside `b`'s rectangle (its `size`) grown by `margin`
    Rect { margin: f32 },
}

/// Meaning of a hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HitKind {
    /// One side carries a value judged against the problem
    Answer,
    /// The player's craft crashed
    Crash,
}

/// Which kinds are tested against each other
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CollisionRule {
    pub a: EntityKind,
    pub b: EntityKind,
    pub test: HitTest,
    pub kind: HitKind,
    /// `b` may be matched by several `a`s in the same step (e.g. the keeper)
    pub shared_b: bool,
    /// Dispose `a` when the hit resolves (bullets, click shots)
    pub consume_a: bool,
}

/// Score deltas and floor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRule {
    pub correct: i64,
    pub wrong_penalty: i64,
    pub crash_penalty: i64,
    pub miss_penalty: i64,
    /// Lowest score a penalty can take the player to (None = may go negative)
    pub floor: Option<i64>,
}

impl Default for ScoreRule {
    fn default() -> Self {
        Self {
            correct: 10,
            wrong_penalty: 5,
            crash_penalty: 0,
            miss_penalty: 0,
            floor: Some(0),
        }
    }
}

/// What a wrong answer hit does to the value carrier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WrongHitPolicy {
    /// Remove it
    #[default]
    Dispose,
    /// Remove it and spawn a fresh distractor
    Respawn,
    /// Remove it and clear accumulated progress
    ResetProgress,
    /// Leave it in play
    Keep,
}

/// Which terminal exits count as misses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MissPolicy {
    /// Only carriers of the correct answer
    #[default]
    CorrectOnly,
    /// Any value carrier
    Any,
}

/// When the next round starts after a correct answer
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum AdvancePolicy {
    #[default]
    Immediate,
    /// Show feedback for `seconds`, then advance
    Delayed { seconds: f32 },
    /// The game advances on its own terms
    Never,
}

/// Complete rule set for one game
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GameRules {
    pub kinds: KindTable,
    /// Evaluated in order; earlier rules claim entities first
    pub collisions: Vec<CollisionRule>,
    pub scoring: ScoreRule,
    pub wrong_hit: WrongHitPolicy,
    pub miss_policy: MissPolicy,
    pub advance: AdvancePolicy,
    pub win_target: Option<u32>,
    pub max_misses: Option<u32>,
    pub max_crashes: Option<u32>,
    /// Consumed carriers burst into particles with an explosion event
    pub explosions: bool,
}

impl GameRules {
    pub fn kind(&self, kind: EntityKind) -> &KindRules {
        self.kinds.get(kind)
    }

    pub fn radius(&self, kind: EntityKind) -> f32 {
        self.kinds.get(kind).radius
    }
}
