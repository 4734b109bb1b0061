//! One simulation step
//!
//! Strict order within a step: control → physics → collision → resolution →
//! mode housekeeping → sweep. Rendering reads the state only after `step`
//! returns.

use super::collision;
use super::input::InputSnapshot;
use super::mode::GameMode;
use super::physics;
use super::resolve;
use super::state::{GamePhase, SimulationState};

/// Advance the session by `dt` nominal steps using one input snapshot
pub fn step(state: &mut SimulationState, mode: &mut dyn GameMode, input: &InputSnapshot, dt: f32) {
    if !state.is_active() {
        return;
    }
    state.time_ticks += 1;

    let playing = state.phase == GamePhase::Playing;
    if playing {
        mode.control(state, input, dt);
    }

    let exits = physics::integrate(&mut state.entities, mode.rules(), &state.bounds, dt);

    let mut hits = if playing {
        collision::detect(&state.entities, mode.rules())
    } else {
        Vec::new()
    };
    mode.review_hits(state, &mut hits);

    resolve::resolve(state, mode, &hits, &exits);
    resolve::check_terminal(state, mode.rules());

    if state.is_active() {
        mode.post_step(state, dt);
    }

    state.entities.sweep();
}
