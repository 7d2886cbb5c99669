//! Keyboard and mouse state collected between frames.
//!
//! The frame loop polls this once per tick: movement keys are read as
//! held state, toggles are consumed as press edges, and mouse motion is
//! accumulated into a single delta.

use std::collections::HashSet;

use winit::event::{ElementState, KeyEvent};
use winit::keyboard::{KeyCode, PhysicalKey};

#[derive(Debug, Default)]
pub struct InputState {
    held: HashSet<KeyCode>,
    pressed: Vec<KeyCode>,
    mouse_delta: (f64, f64),
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a winit keyboard event. A key produces one press edge per
    /// physical press; OS key repeat does not re-trigger it.
    pub fn handle_key_event(&mut self, event: &KeyEvent) {
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };

        match event.state {
            ElementState::Pressed => {
                if self.held.insert(code) && !event.repeat {
                    self.pressed.push(code);
                }
            }
            ElementState::Released => {
                self.held.remove(&code);
            }
        }
    }

    pub fn accumulate_mouse(&mut self, delta: (f64, f64)) {
        self.mouse_delta.0 += delta.0;
        self.mouse_delta.1 += delta.1;
    }

    pub fn is_held(&self, code: KeyCode) -> bool {
        self.held.contains(&code)
    }

    /// Consumes the press edges recorded since the last call.
    pub fn drain_pressed(&mut self) -> Vec<KeyCode> {
        std::mem::take(&mut self.pressed)
    }

    /// Consumes the mouse motion accumulated since the last call.
    pub fn take_mouse_delta(&mut self) -> (f64, f64) {
        std::mem::take(&mut self.mouse_delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // winit has no public KeyEvent constructor, so these tests drive the
    // recorded state directly.

    #[test]
    fn press_edge_fires_once() {
        let mut input = InputState::new();
        input.held.insert(KeyCode::KeyM);
        input.pressed.push(KeyCode::KeyM);

        assert_eq!(input.drain_pressed(), vec![KeyCode::KeyM]);
        assert!(input.drain_pressed().is_empty());
        assert!(input.is_held(KeyCode::KeyM));
    }

    #[test]
    fn release_clears_held_state() {
        let mut input = InputState::new();
        input.held.insert(KeyCode::KeyW);
        assert!(input.is_held(KeyCode::KeyW));

        input.held.remove(&KeyCode::KeyW);
        assert!(!input.is_held(KeyCode::KeyW));
    }

    #[test]
    fn mouse_delta_accumulates_and_resets() {
        let mut input = InputState::new();
        input.accumulate_mouse((3.0, -1.0));
        input.accumulate_mouse((2.0, 0.5));

        assert_eq!(input.take_mouse_delta(), (5.0, -0.5));
        assert_eq!(input.take_mouse_delta(), (0.0, 0.0));
    }
}
