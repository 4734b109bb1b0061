//! Input sampling
//!
//! Device events update held state whenever they arrive; the simulation reads
//! one immutable snapshot per step. Last state wins: a press and release that
//! both land between two steps are never seen.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Logical control a device event maps to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Control {
    Thrust,
    RotateLeft,
    RotateRight,
    Fire,
}

impl Control {
    const COUNT: usize = 4;

    fn index(self) -> usize {
        match self {
            Control::Thrust => 0,
            Control::RotateLeft => 1,
            Control::RotateRight => 2,
            Control::Fire => 3,
        }
    }

    /// Map a `KeyboardEvent.code` to a control
    pub fn from_key_code(code: &str) -> Option<Self> {
        match code {
            "ArrowUp" | "KeyW" => Some(Control::Thrust),
            "ArrowLeft" | "KeyA" => Some(Control::RotateLeft),
            "ArrowRight" | "KeyD" => Some(Control::RotateRight),
            "Space" | "Enter" => Some(Control::Fire),
            _ => None,
        }
    }
}

/// Control intent for one step
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InputSnapshot {
    pub thrust: bool,
    pub rotate_left: bool,
    pub rotate_right: bool,
    pub fire: bool,
    /// Pointer position in field pixels (mouse or first touch)
    pub pointer: Option<Vec2>,
}

impl InputSnapshot {
    /// Net rotation direction: -1 left, +1 right, 0 none
    pub fn rotation(&self) -> f32 {
        match (self.rotate_left, self.rotate_right) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }
}

/// Event-driven held-state map
#[derive(Debug, Clone, Default)]
pub struct InputSampler {
    /// Press sequence number per held control (None = released)
    held: [Option<u64>; Control::COUNT],
    press_seq: u64,
    pointer: Option<Vec2>,
    pointer_down: bool,
}

impl InputSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a press. Repeats while held keep the original press order.
    pub fn press(&mut self, control: Control) {
        let slot = &mut self.held[control.index()];
        if slot.is_none() {
            self.press_seq += 1;
            *slot = Some(self.press_seq);
        }
    }

    pub fn release(&mut self, control: Control) {
        self.held[control.index()] = None;
    }

    pub fn key_down(&mut self, code: &str) -> bool {
        match Control::from_key_code(code) {
            Some(control) => {
                self.press(control);
                true
            }
            None => false,
        }
    }

    pub fn key_up(&mut self, code: &str) -> bool {
        match Control::from_key_code(code) {
            Some(control) => {
                self.release(control);
                true
            }
            None => false,
        }
    }

    pub fn pointer_move(&mut self, pos: Vec2) {
        self.pointer = Some(pos);
    }

    /// Mouse down / touch start: moves the pointer and holds fire
    pub fn pointer_down(&mut self, pos: Vec2) {
        self.pointer = Some(pos);
        self.pointer_down = true;
    }

    pub fn pointer_up(&mut self) {
        self.pointer_down = false;
    }

    /// Drop all held state (window blur, session end)
    pub fn release_all(&mut self) {
        self.held = [None; Control::COUNT];
        self.pointer_down = false;
    }

    fn is_held(&self, control: Control) -> bool {
        self.held[control.index()].is_some()
    }

    /// Current control intent
    ///
    /// When both rotation keys are held, the most recently pressed one wins.
    pub fn snapshot(&self) -> InputSnapshot {
        let left = self.held[Control::RotateLeft.index()];
        let right = self.held[Control::RotateRight.index()];
        let (rotate_left, rotate_right) = match (left, right) {
            (Some(l), Some(r)) => (l > r, r > l),
            (l, r) => (l.is_some(), r.is_some()),
        };

        InputSnapshot {
            thrust: self.is_held(Control::Thrust),
            rotate_left,
            rotate_right,
            fire: self.is_held(Control::Fire) || self.pointer_down,
            pointer: self.pointer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        let mut input = InputSampler::new();
        assert!(input.key_down("ArrowUp"));
        assert!(input.key_down("Space"));
        assert!(!input.key_down("KeyQ"));
        let snap = input.snapshot();
        assert!(snap.thrust && snap.fire);
        assert!(!snap.rotate_left && !snap.rotate_right);

        input.key_up("ArrowUp");
        assert!(!input.snapshot().thrust);
    }

    #[test]
    fn test_opposing_rotation_last_press_wins() {
        let mut input = InputSampler::new();
        input.press(Control::RotateLeft);
        input.press(Control::RotateRight);
        let snap = input.snapshot();
        assert!(snap.rotate_right && !snap.rotate_left);
        assert_eq!(snap.rotation(), 1.0);

        // Re-pressing a held key (auto-repeat) doesn't change precedence
        input.press(Control::RotateLeft);
        assert!(input.snapshot().rotate_right);

        // Releasing and pressing again does
        input.release(Control::RotateLeft);
        input.press(Control::RotateLeft);
        let snap = input.snapshot();
        assert!(snap.rotate_left && !snap.rotate_right);
        assert_eq!(snap.rotation(), -1.0);
    }

    #[test]
    fn test_press_release_between_snapshots_is_lost() {
        let mut input = InputSampler::new();
        input.press(Control::Fire);
        input.release(Control::Fire);
        assert!(!input.snapshot().fire);
    }

    #[test]
    fn test_pointer_and_release_all() {
        let mut input = InputSampler::new();
        input.pointer_down(Vec2::new(10.0, 20.0));
        input.press(Control::Thrust);
        let snap = input.snapshot();
        assert!(snap.fire);
        assert_eq!(snap.pointer, Some(Vec2::new(10.0, 20.0)));

        input.release_all();
        let snap = input.snapshot();
        assert!(!snap.fire && !snap.thrust);
        // Pointer position is kept; only held state is dropped
        assert_eq!(snap.pointer, Some(Vec2::new(10.0, 20.0)));
    }
}
