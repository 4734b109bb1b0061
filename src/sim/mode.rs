//! Game-specific strategy plugged into the shared step pipeline

use glam::Vec2;

use super::collision::Hit;
use super::entity::EntityId;
use super::input::InputSnapshot;
use super::rules::GameRules;
use super::state::SimulationState;

/// The parts of a game the shared engine cannot express as data
///
/// Everything else (kinematics, boundaries, hit detection, scoring, terminal
/// conditions) comes from [`GameMode::rules`].
pub trait GameMode {
    /// Stable identifier used in logs
    fn name(&self) -> &'static str;

    fn rules(&self) -> &GameRules;

    /// Place the persistent entities of a fresh session (ship, keeper, terrain)
    fn setup(&mut self, state: &mut SimulationState);

    /// Turn this step's input into entity motion, shots and spawns
    fn control(&mut self, state: &mut SimulationState, input: &InputSnapshot, dt: f32);

    /// Generate the next problem and spawn its carriers
    fn next_round(&mut self, state: &mut SimulationState);

    /// Inspect or reclassify hits before they are resolved
    fn review_hits(&mut self, _state: &SimulationState, _hits: &mut Vec<Hit>) {}

    /// Points for a correct answer
    fn award(&self, _state: &SimulationState) -> i64 {
        self.rules().scoring.correct
    }

    /// Replace a wrongly hit carrier with a fresh distractor
    fn respawn_distractor(&mut self, _state: &mut SimulationState, _near: Vec2) {}

    /// Game-specific follow-up once an answer hit has been scored
    fn on_answer(&mut self, _state: &mut SimulationState, _hit: &Hit, _correct: bool) {}

    /// Game-specific reset after the player's craft crashed
    fn on_crash(&mut self, _state: &mut SimulationState, _craft: EntityId) {}

    /// Per-step housekeeping after resolution (timed spawns, custom loss checks)
    fn post_step(&mut self, _state: &mut SimulationState, _dt: f32) {}
}
