//! Event resolution
//!
//! Turns hits and terminal exits into score changes, disposals, round
//! advancement and the terminal outcome.

use glam::Vec2;

use super::collision::Hit;
use super::entity::{Disposal, EntityId, Payload};
use super::mode::GameMode;
use super::physics::Exit;
use super::rules::{AdvancePolicy, GameRules, HitKind, MissPolicy, WrongHitPolicy};
use super::state::{DeferredAction, GameEvent, GamePhase, Outcome, SimulationState};

/// Particles per explosion burst
const BURST_PARTICLES: usize = 12;
const CRASH_PARTICLES: usize = 20;

/// Set up a fresh session and start its first round
pub fn begin(state: &mut SimulationState, mode: &mut dyn GameMode) {
    mode.setup(state);
    state.counters.lives = mode.rules().max_crashes.unwrap_or(0);
    log::info!(
        "Session {} started: {} (seed {})",
        state.session(),
        mode.name(),
        state.seed
    );
    state.phase = GamePhase::Playing;
    advance_round(state, mode);
}

/// Generate the next problem and return to play
pub fn advance_round(state: &mut SimulationState, mode: &mut dyn GameMode) {
    if !state.is_alive() || state.is_finished() {
        return;
    }
    state.counters.round += 1;
    mode.next_round(state);
    state.phase = GamePhase::Playing;
    state.emit(GameEvent::RoundStarted {
        round: state.counters.round,
    });
}

/// Run a deferred action that passed its liveness check
pub fn apply_deferred(state: &mut SimulationState, mode: &mut dyn GameMode, action: DeferredAction) {
    match action {
        DeferredAction::NextRound => {
            if state.phase == GamePhase::Feedback {
                advance_round(state, mode);
            }
        }
    }
}

/// Terminal conditions shared by every game. Returns whether the session is over.
pub fn check_terminal(state: &mut SimulationState, rules: &GameRules) -> bool {
    if state.is_finished() {
        return true;
    }
    let c = &state.counters;
    if rules.win_target.is_some_and(|t| c.correct >= t) {
        state.finish(Outcome::Won);
    } else if rules.max_misses.is_some_and(|m| c.misses >= m)
        || rules.max_crashes.is_some_and(|m| c.crashes >= m)
    {
        state.finish(Outcome::Lost);
    }
    state.is_finished()
}

/// Resolve this step's hits, then its terminal exits
///
/// Only the `Playing` phase scores anything; during `Feedback` hits and
/// misses are ignored. Hits whose entities were disposed earlier in the same
/// resolution pass are skipped.
pub fn resolve(state: &mut SimulationState, mode: &mut dyn GameMode, hits: &[Hit], exits: &[Exit]) {
    for hit in hits {
        if state.phase != GamePhase::Playing {
            return;
        }
        let live = |id: EntityId| state.entities.get(id).is_some_and(|e| !e.is_disposed());
        if !live(hit.a) || !live(hit.b) {
            continue;
        }
        match hit.kind {
            HitKind::Answer => resolve_answer(state, mode, hit),
            HitKind::Crash => resolve_crash(state, mode, hit),
        }
        if check_terminal(state, mode.rules()) {
            return;
        }
    }

    if state.phase != GamePhase::Playing {
        return;
    }
    for exit in exits.iter().filter(|e| e.terminal) {
        if let Some(payload) = exit.payload
            && counts_as_miss(state, mode.rules().miss_policy, &payload)
        {
            let scoring = mode.rules().scoring;
            state.penalize(scoring.miss_penalty, scoring.floor);
            state.counters.misses += 1;
            state.counters.streak = 0;
            state.emit(GameEvent::Miss { pos: exit.pos });
            log::debug!("Miss at {:?} ({} total)", exit.pos, state.counters.misses);
            if check_terminal(state, mode.rules()) {
                return;
            }
        }
    }
}

fn counts_as_miss(state: &SimulationState, policy: MissPolicy, payload: &Payload) -> bool {
    match policy {
        MissPolicy::Any => true,
        MissPolicy::CorrectOnly => state
            .problem
            .as_ref()
            .is_some_and(|p| p.answer.accepts(payload)),
    }
}

fn resolve_answer(state: &mut SimulationState, mode: &mut dyn GameMode, hit: &Hit) {
    // The value carrier is whichever side has a payload, target side first
    let carrier = [hit.b, hit.a].into_iter().find_map(|id| {
        state
            .entities
            .get(id)
            .and_then(|e| e.payload.map(|p| (id, e.kind, e.pos, p)))
    });
    let Some((carrier_id, carrier_kind, pos, payload)) = carrier else {
        return;
    };
    let Some(problem) = state.problem.as_ref() else {
        return;
    };
    let correct = problem.answer.accepts(&payload);

    if hit.consume_a && hit.a != carrier_id {
        dispose(state, hit.a, Disposal::Consumed);
    }

    let rules = mode.rules();
    let scoring = rules.scoring;
    let consumable = rules.kind(carrier_kind).consumable;
    let explosions = rules.explosions;
    let value = match payload {
        Payload::Number(n) => Some(n),
        Payload::Token { .. } => None,
    };

    if correct {
        let award = mode.award(state);
        state.reward(award);
        let c = &mut state.counters;
        c.correct += 1;
        c.streak += 1;
        c.progress += 1;
        c.consecutive_errors = 0;
        state.emit(GameEvent::Correct { pos, value });
        log::debug!("Correct answer {:?} (+{}, score {})", value, award, state.score);

        if consumable {
            consume(state, carrier_id, pos, explosions);
        }
        mode.on_answer(state, hit, true);
        if check_terminal(state, mode.rules()) {
            return;
        }
        match mode.rules().advance {
            AdvancePolicy::Immediate => advance_round(state, mode),
            AdvancePolicy::Delayed { seconds } => {
                state.phase = GamePhase::Feedback;
                state.defer(seconds, DeferredAction::NextRound);
            }
            AdvancePolicy::Never => {}
        }
    } else {
        state.penalize(scoring.wrong_penalty, scoring.floor);
        let c = &mut state.counters;
        c.streak = 0;
        c.consecutive_errors += 1;
        state.emit(GameEvent::Incorrect { pos });
        log::debug!("Wrong answer {:?} (-{}, score {})", value, scoring.wrong_penalty, state.score);

        let policy = mode.rules().wrong_hit;
        if consumable && policy != WrongHitPolicy::Keep {
            consume(state, carrier_id, pos, explosions);
        }
        match policy {
            WrongHitPolicy::Respawn => mode.respawn_distractor(state, pos),
            WrongHitPolicy::ResetProgress => state.counters.progress = 0,
            WrongHitPolicy::Dispose | WrongHitPolicy::Keep => {}
        }
        mode.on_answer(state, hit, false);
    }

    if hit.consume_a && hit.a == carrier_id {
        dispose(state, hit.a, Disposal::Consumed);
    }
}

fn resolve_crash(state: &mut SimulationState, mode: &mut dyn GameMode, hit: &Hit) {
    let Some(pos) = state.entities.get(hit.a).map(|e| e.pos) else {
        return;
    };
    let scoring = mode.rules().scoring;
    state.penalize(scoring.crash_penalty, scoring.floor);
    let c = &mut state.counters;
    c.crashes += 1;
    c.lives = c.lives.saturating_sub(1);
    c.streak = 0;
    state.emit(GameEvent::Crash { pos });
    state.emit(GameEvent::Explosion { pos });
    state.burst(pos, CRASH_PARTICLES, 4.0, 45);
    log::debug!("Crash at {:?} ({} total)", pos, state.counters.crashes);

    if hit.consume_a {
        dispose(state, hit.a, Disposal::Consumed);
    }
    mode.on_crash(state, hit.a);
}

fn consume(state: &mut SimulationState, id: EntityId, pos: Vec2, explode: bool) {
    dispose(state, id, Disposal::Consumed);
    if explode {
        state.emit(GameEvent::Explosion { pos });
        state.burst(pos, BURST_PARTICLES, 3.0, 30);
    }
}

fn dispose(state: &mut SimulationState, id: EntityId, reason: Disposal) {
    if let Some(e) = state.entities.get_mut(id) {
        e.dispose(reason);
    }
}
