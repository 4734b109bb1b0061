//! Arcade games built on the shared simulation loop
//!
//! Each game is a [`GameMode`]: a rule table plus the few hooks that cannot be
//! expressed as data (ship controls, timed spawns, terrain, block stacking).

pub mod asteroids;
pub mod defender;
pub mod goalkeeper;
pub mod lander;
pub mod questions;
pub mod tower;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::sim::{Difficulty, GameMode, Operation};
use crate::tuning::GameTuning;

pub use asteroids::Asteroids;
pub use defender::Defender;
pub use goalkeeper::Goalkeeper;
pub use lander::Lander;
pub use tower::Tower;

/// Game catalog entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameKind {
    Asteroids,
    Goalkeeper,
    Defender,
    Lander,
    Tower,
}

impl GameKind {
    pub const ALL: [GameKind; 5] = [
        GameKind::Asteroids,
        GameKind::Goalkeeper,
        GameKind::Defender,
        GameKind::Lander,
        GameKind::Tower,
    ];

    /// Stable identifier (URLs, storage, logs)
    pub fn id(&self) -> &'static str {
        match self {
            GameKind::Asteroids => "asteroids",
            GameKind::Goalkeeper => "goalkeeper",
            GameKind::Defender => "defender",
            GameKind::Lander => "lander",
            GameKind::Tower => "tower",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            GameKind::Asteroids => "Math Asteroids",
            GameKind::Goalkeeper => "Shape Goalkeeper",
            GameKind::Defender => "Space Defender",
            GameKind::Lander => "Math Lander",
            GameKind::Tower => "Knowledge Tower",
        }
    }

    /// Whether the selector should offer an arithmetic operation
    pub fn takes_operation(&self) -> bool {
        !matches!(self, GameKind::Goalkeeper | GameKind::Tower)
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.id() == id)
    }
}

/// Build the game mode for a catalog entry
pub fn new_mode(
    kind: GameKind,
    operation: Operation,
    difficulty: Difficulty,
    tuning: &GameTuning,
) -> Box<dyn GameMode> {
    log::info!(
        "Creating {} ({} / {})",
        kind.title(),
        operation.as_str(),
        difficulty.as_str()
    );
    match kind {
        GameKind::Asteroids => Box::new(Asteroids::new(operation, difficulty, tuning.asteroids.clone())),
        GameKind::Goalkeeper => Box::new(Goalkeeper::new(tuning.goalkeeper.clone())),
        GameKind::Defender => Box::new(Defender::new(operation, difficulty, tuning.defender.clone())),
        GameKind::Lander => Box::new(Lander::new(operation, difficulty, tuning.lander.clone())),
        GameKind::Tower => Box::new(Tower::new(tuning.tower.clone())),
    }
}

/// Point `distance` away from `center` in a random direction
fn point_around<R: Rng + ?Sized>(center: Vec2, distance: f32, rng: &mut R) -> Vec2 {
    let angle = rng.random_range(0.0..std::f32::consts::TAU);
    center + crate::heading(angle) * distance
}
