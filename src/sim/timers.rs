//! Deferred actions on the session clock
//!
//! Every timer carries the token of the session that scheduled it. A timer
//! whose session has ended (or been replaced) is dropped instead of fired.

use super::state::{DeferredAction, SessionToken, SimulationState};

#[derive(Debug, Clone, Copy, PartialEq)]
struct Timer {
    due: f64,
    token: SessionToken,
    action: DeferredAction,
}

/// Pending deferred actions, ordered by due time
#[derive(Debug, Clone, Default)]
pub struct TimerQueue {
    timers: Vec<Timer>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `action` at session time `due` (seconds)
    pub fn schedule(&mut self, due: f64, token: SessionToken, action: DeferredAction) {
        let idx = self.timers.partition_point(|t| t.due <= due);
        self.timers.insert(idx, Timer { due, token, action });
    }

    /// Move the state's deferred outbox into the queue, relative to `now`
    pub fn take_from(&mut self, state: &mut SimulationState, now: f64) {
        let token = state.token();
        for (delay, action) in state.deferred.drain(..) {
            self.schedule(now + delay as f64, token, action);
        }
    }

    /// Remove and return the actions due at `now` that still belong to the live session
    pub fn due(&mut self, now: f64, state: &SimulationState) -> Vec<DeferredAction> {
        let split = self.timers.partition_point(|t| t.due <= now);
        self.timers
            .drain(..split)
            .filter_map(|t| {
                if state.is_current(t.token) {
                    Some(t.action)
                } else {
                    log::debug!("Dropping stale {:?} from ended session", t.action);
                    None
                }
            })
            .collect()
    }

    /// Cancel everything
    pub fn clear(&mut self) {
        if !self.timers.is_empty() {
            log::debug!("Cancelling {} pending timer(s)", self.timers.len());
        }
        self.timers.clear();
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}
