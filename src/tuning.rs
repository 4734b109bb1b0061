//! Data-driven game balance
//!
//! Every number a game uses to build its rules lives here, so balance can be
//! changed from JSON without touching game code. Missing fields fall back to
//! the built-in defaults.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::games::questions::Category;
use crate::sim::Difficulty;

/// Invalid tuning data
#[derive(Debug)]
pub enum TuningError {
    /// Not valid JSON for the tuning schema
    Parse(serde_json::Error),
    /// A value outside its allowed range
    Invalid { field: &'static str, reason: String },
}

impl fmt::Display for TuningError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TuningError::Parse(e) => write!(f, "tuning parse error: {}", e),
            TuningError::Invalid { field, reason } => {
                write!(f, "invalid tuning value `{}`: {}", field, reason)
            }
        }
    }
}

impl std::error::Error for TuningError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TuningError::Parse(e) => Some(e),
            TuningError::Invalid { .. } => None,
        }
    }
}

impl From<serde_json::Error> for TuningError {
    fn from(e: serde_json::Error) -> Self {
        TuningError::Parse(e)
    }
}

fn positive(field: &'static str, v: f32) -> Result<(), TuningError> {
    if v.is_finite() && v > 0.0 {
        Ok(())
    } else {
        Err(TuningError::Invalid {
            field,
            reason: format!("must be positive, got {}", v),
        })
    }
}

fn non_negative(field: &'static str, v: i64) -> Result<(), TuningError> {
    if v >= 0 {
        Ok(())
    } else {
        Err(TuningError::Invalid {
            field,
            reason: format!("must not be negative, got {}", v),
        })
    }
}

fn at_least(field: &'static str, v: usize, min: usize) -> Result<(), TuningError> {
    if v >= min {
        Ok(())
    } else {
        Err(TuningError::Invalid {
            field,
            reason: format!("must be at least {}, got {}", min, v),
        })
    }
}

/// Inclusive speed range (pixels per step)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedRange {
    pub min: f32,
    pub max: f32,
}

impl SpeedRange {
    fn validate(&self, field: &'static str) -> Result<(), TuningError> {
        positive(field, self.min)?;
        if self.max < self.min {
            return Err(TuningError::Invalid {
                field,
                reason: format!("max {} below min {}", self.max, self.min),
            });
        }
        Ok(())
    }
}

/// Math asteroids balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AsteroidsTuning {
    pub rotation_speed: f32,
    pub thrust: f32,
    pub friction: f32,
    pub bullet_speed: f32,
    pub bullet_ttl: u32,
    pub fire_cooldown: u32,
    pub ship_radius: f32,
    pub asteroid_radius: f32,
    pub asteroid_speed: SpeedRange,
    pub wrap_margin: f32,
    /// Minimum spawn distance from the ship
    pub spawn_clearance: f32,
    pub invulnerable_steps: u32,
    pub candidates: usize,
    pub correct_points: i64,
    pub wrong_penalty: i64,
    pub crash_penalty: i64,
}

impl Default for AsteroidsTuning {
    fn default() -> Self {
        Self {
            rotation_speed: 0.08,
            thrust: 0.15,
            friction: 0.99,
            bullet_speed: 10.0,
            bullet_ttl: 60,
            fire_cooldown: 15,
            ship_radius: 10.0,
            asteroid_radius: 40.0,
            asteroid_speed: SpeedRange { min: 0.5, max: 1.5 },
            wrap_margin: 50.0,
            spawn_clearance: 300.0,
            invulnerable_steps: 180,
            candidates: 5,
            correct_points: 500,
            wrong_penalty: 100,
            crash_penalty: 200,
        }
    }
}

/// Shape goalkeeper balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GoalkeeperTuning {
    pub keeper_width: f32,
    pub keeper_height: f32,
    /// Extra reach around the keeper rectangle
    pub catch_margin: f32,
    /// Keeper center distance from the right edge
    pub keeper_inset: f32,
    /// Goal line distance from the right edge
    pub goal_inset: f32,
    pub base_speed: f32,
    pub speed_per_wave: f32,
    pub spawn_interval: u32,
    pub token_radius: f32,
    pub saves_per_wave: u32,
    pub save_points: i64,
    pub wrong_save_penalty: i64,
    pub goal_penalty: i64,
    pub max_goals: u32,
}

impl Default for GoalkeeperTuning {
    fn default() -> Self {
        Self {
            keeper_width: 60.0,
            keeper_height: 80.0,
            catch_margin: 25.0,
            keeper_inset: 110.0,
            goal_inset: 60.0,
            base_speed: 2.0,
            speed_per_wave: 0.3,
            spawn_interval: 90,
            token_radius: 25.0,
            saves_per_wave: 10,
            save_points: 5,
            wrong_save_penalty: 0,
            goal_penalty: 5,
            max_goals: 5,
        }
    }
}

/// Space defender balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DefenderTuning {
    pub asteroid_radius: f32,
    pub fall_easy: SpeedRange,
    pub fall_medium: SpeedRange,
    pub fall_hard: SpeedRange,
    /// Height of the danger zone above the bottom edge
    pub ground_inset: f32,
    pub candidates: usize,
    pub correct_points: i64,
    pub wrong_penalty: i64,
    /// Seconds between a correct answer and the next round
    pub feedback_delay: f32,
}

impl DefenderTuning {
    pub fn fall_speed(&self, tier: Difficulty) -> SpeedRange {
        match tier {
            Difficulty::Easy => self.fall_easy,
            Difficulty::Medium => self.fall_medium,
            Difficulty::Hard => self.fall_hard,
        }
    }
}

impl Default for DefenderTuning {
    fn default() -> Self {
        Self {
            asteroid_radius: 40.0,
            fall_easy: SpeedRange { min: 0.2, max: 0.8 },
            fall_medium: SpeedRange { min: 0.6, max: 1.2 },
            fall_hard: SpeedRange { min: 1.0, max: 1.6 },
            ground_inset: 90.0,
            candidates: 4,
            correct_points: 10,
            wrong_penalty: 5,
            feedback_delay: 0.7,
        }
    }
}

/// Math lander balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LanderTuning {
    pub gravity: f32,
    pub thrust: f32,
    pub rotation_speed: f32,
    pub fuel: f32,
    pub max_landing_speed: f32,
    /// Allowed tilt from upright when touching down (radians)
    pub max_landing_angle: f32,
    pub terrain_segments: usize,
    /// Extra reach around platform and ground rectangles
    pub contact_margin: f32,
    pub candidates: usize,
    pub base_points: i64,
    /// Fuel units per bonus point
    pub fuel_per_point: f32,
    pub wrong_penalty: i64,
    pub max_crashes: u32,
    pub feedback_delay: f32,
}

impl Default for LanderTuning {
    fn default() -> Self {
        Self {
            gravity: 0.015,
            thrust: 0.05,
            rotation_speed: 0.03,
            fuel: 1000.0,
            max_landing_speed: 3.0,
            max_landing_angle: 0.8,
            terrain_segments: 20,
            contact_margin: 10.0,
            candidates: 3,
            base_points: 100,
            fuel_per_point: 10.0,
            wrong_penalty: 50,
            max_crashes: 3,
            feedback_delay: 1.5,
        }
    }
}

/// Knowledge tower balance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TowerTuning {
    pub category: Category,
    pub gravity: f32,
    pub block_width: f32,
    pub block_height: f32,
    /// Height of the ground strip at the bottom of the field
    pub ground_height: f32,
    /// Blocks are released this far below the top edge
    pub drop_height: f32,
    /// Max sideways jitter of a correctly answered block
    pub correct_jitter: f32,
    /// Sideways offset of the first wrongly answered block
    pub wrong_offset: f32,
    /// Extra offset per consecutive error, up to `max_error_steps`
    pub wrong_offset_step: f32,
    pub max_error_steps: u32,
    /// Sideways speed of a block sliding off its support
    pub tip_speed: f32,
    /// Blocks further than this outside the field have fallen
    pub off_screen_margin: f32,
    pub choice_width: f32,
    pub choice_height: f32,
    /// Row of answer choices, below the top edge
    pub choice_row: f32,
    pub blocks_to_win: u32,
    pub correct_points: i64,
    pub wrong_penalty: i64,
    pub feedback_delay: f32,
}

impl Default for TowerTuning {
    fn default() -> Self {
        Self {
            category: Category::Mixed,
            gravity: 0.5,
            block_width: 120.0,
            block_height: 30.0,
            ground_height: 30.0,
            drop_height: 160.0,
            correct_jitter: 7.5,
            wrong_offset: 15.0,
            wrong_offset_step: 13.75,
            max_error_steps: 4,
            tip_speed: 2.0,
            off_screen_margin: 50.0,
            choice_width: 180.0,
            choice_height: 50.0,
            choice_row: 100.0,
            blocks_to_win: 10,
            correct_points: 10,
            wrong_penalty: 3,
            feedback_delay: 1.5,
        }
    }
}

/// Balance for every game
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameTuning {
    pub asteroids: AsteroidsTuning,
    pub goalkeeper: GoalkeeperTuning,
    pub defender: DefenderTuning,
    pub lander: LanderTuning,
    pub tower: TowerTuning,
}

impl GameTuning {
    /// Parse and validate tuning JSON
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Self = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), TuningError> {
        let a = &self.asteroids;
        positive("asteroids.bullet_speed", a.bullet_speed)?;
        positive("asteroids.asteroid_radius", a.asteroid_radius)?;
        a.asteroid_speed.validate("asteroids.asteroid_speed")?;
        if !(0.0..=1.0).contains(&a.friction) {
            return Err(TuningError::Invalid {
                field: "asteroids.friction",
                reason: format!("must be within 0..=1, got {}", a.friction),
            });
        }
        at_least("asteroids.candidates", a.candidates, 1)?;
        non_negative("asteroids.wrong_penalty", a.wrong_penalty)?;
        non_negative("asteroids.crash_penalty", a.crash_penalty)?;

        let g = &self.goalkeeper;
        positive("goalkeeper.keeper_width", g.keeper_width)?;
        positive("goalkeeper.keeper_height", g.keeper_height)?;
        positive("goalkeeper.base_speed", g.base_speed)?;
        if g.spawn_interval == 0 || g.saves_per_wave == 0 || g.max_goals == 0 {
            return Err(TuningError::Invalid {
                field: "goalkeeper",
                reason: "spawn_interval, saves_per_wave and max_goals must be non-zero".into(),
            });
        }
        non_negative("goalkeeper.goal_penalty", g.goal_penalty)?;

        let d = &self.defender;
        positive("defender.asteroid_radius", d.asteroid_radius)?;
        d.fall_easy.validate("defender.fall_easy")?;
        d.fall_medium.validate("defender.fall_medium")?;
        d.fall_hard.validate("defender.fall_hard")?;
        at_least("defender.candidates", d.candidates, 1)?;
        non_negative("defender.wrong_penalty", d.wrong_penalty)?;

        let l = &self.lander;
        positive("lander.gravity", l.gravity)?;
        positive("lander.thrust", l.thrust)?;
        positive("lander.fuel", l.fuel)?;
        positive("lander.fuel_per_point", l.fuel_per_point)?;
        at_least("lander.candidates", l.candidates, 1)?;
        // Platforms sit every six segments starting at the fourth
        at_least("lander.terrain_segments", l.terrain_segments, 6 * l.candidates + 2)?;
        non_negative("lander.wrong_penalty", l.wrong_penalty)?;

        let t = &self.tower;
        positive("tower.gravity", t.gravity)?;
        positive("tower.block_width", t.block_width)?;
        positive("tower.block_height", t.block_height)?;
        positive("tower.choice_width", t.choice_width)?;
        positive("tower.choice_height", t.choice_height)?;
        if t.blocks_to_win == 0 {
            return Err(TuningError::Invalid {
                field: "tower.blocks_to_win",
                reason: "must be non-zero".into(),
            });
        }
        non_negative("tower.wrong_penalty", t.wrong_penalty)?;
        Ok(())
    }

    /// Storage key for host-provided overrides
    const STORAGE_KEY: &'static str = "edu_arcade_tuning";

    /// Load overrides from LocalStorage, falling back to defaults (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(Ok(Some(json))) = storage.map(|s| s.get_item(Self::STORAGE_KEY)) {
            match Self::from_json(&json) {
                Ok(tuning) => {
                    log::info!("Loaded tuning overrides from LocalStorage");
                    return tuning;
                }
                Err(e) => log::warn!("Ignoring stored tuning: {}", e),
            }
        }
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        match std::env::var(Self::STORAGE_KEY.to_uppercase()) {
            Ok(json) => Self::from_json(&json).unwrap_or_else(|e| {
                log::warn!("Ignoring tuning from environment: {}", e);
                Self::default()
            }),
            Err(_) => Self::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(GameTuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let t = GameTuning::from_json(r#"{ "goalkeeper": { "max_goals": 3 } }"#).unwrap();
        assert_eq!(t.goalkeeper.max_goals, 3);
        assert_eq!(t.goalkeeper.save_points, 5);
        assert_eq!(t.asteroids, AsteroidsTuning::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = GameTuning::from_json(r#"{ "lander": { "gravity": -1.0 } }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field: "lander.gravity", .. }));
        assert!(err.to_string().contains("lander.gravity"));

        let err = GameTuning::from_json(
            r#"{ "defender": { "fall_easy": { "min": 2.0, "max": 1.0 } } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field: "defender.fall_easy", .. }));
    }

    #[test]
    fn test_tower_category_from_json() {
        let t = GameTuning::from_json(r#"{ "tower": { "category": "science" } }"#).unwrap();
        assert_eq!(t.tower.category, Category::Science);
        assert_eq!(t.tower.blocks_to_win, 10);

        let err = GameTuning::from_json(r#"{ "tower": { "blocks_to_win": 0 } }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field: "tower.blocks_to_win", .. }));
    }

    #[test]
    fn test_parse_error() {
        let err = GameTuning::from_json("{ not json").unwrap_err();
        assert!(matches!(err, TuningError::Parse(_)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_json_round_trip() {
        let mut t = GameTuning::default();
        t.defender.correct_points = 25;
        let back = GameTuning::from_json(&t.to_json().unwrap()).unwrap();
        assert_eq!(back, t);
    }
}
