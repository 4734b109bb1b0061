//! Edu Arcade - educational arcade mini-games for kids
//!
//! Core modules:
//! - `sim`: Entity simulation loop (kinematics, collisions, scoring, problems)
//! - `driver`: Frame driver with pause/resume/stop and deferred timers
//! - `games`: The arcade games built on the simulation loop
//! - `render`: Pure renderer over a 2D drawing surface
//! - `audio`: Sound reactions to simulation events
//! - `settings`: Player preferences
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod driver;
pub mod games;
pub mod render;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use driver::{Driver, RunState, Stepping};
pub use games::{GameKind, new_mode};
pub use settings::{QualityPreset, Settings};
pub use tuning::{GameTuning, TuningError};

use glam::Vec2;

/// Simulation configuration constants
pub mod consts {
    /// Nominal display refresh the per-step tunings assume
    pub const NOMINAL_HZ: f32 = 60.0;
    /// Seconds per nominal step
    pub const SIM_DT: f32 = 1.0 / NOMINAL_HZ;
    /// Maximum catch-up steps per frame in accumulated mode
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Default field size (pixels), replaced by the canvas size on the web
    pub const FIELD_WIDTH: f32 = 800.0;
    pub const FIELD_HEIGHT: f32 = 600.0;

    /// Cap on distractor sampling attempts per window
    pub const DISTRACTOR_ATTEMPTS: u32 = 100;
    /// Number of times the sampling window doubles before the fill fallback
    pub const DISTRACTOR_WIDENINGS: u32 = 4;
}

/// Axis-aligned field bounds in drawing-surface pixels
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Bounds {
    pub min: Vec2,
    pub max: Vec2,
}

impl Bounds {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            min: Vec2::ZERO,
            max: Vec2::new(width, height),
        }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }
}

impl Default for Bounds {
    fn default() -> Self {
        Self::new(consts::FIELD_WIDTH, consts::FIELD_HEIGHT)
    }
}

/// Wrap a coordinate that left `[lo - margin, hi + margin]` onto the opposite side
#[inline]
pub fn wrap_coord(v: f32, lo: f32, hi: f32, margin: f32) -> f32 {
    if v < lo - margin {
        hi + margin
    } else if v > hi + margin {
        lo - margin
    } else {
        v
    }
}

/// Unit vector pointing along `angle` (radians, screen coordinates)
#[inline]
pub fn heading(angle: f32) -> Vec2 {
    Vec2::new(angle.cos(), angle.sin())
}
