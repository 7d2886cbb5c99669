use winit::keyboard::KeyCode;

use crate::input::InputState;

use super::walk_camera::{MoveDirection, WalkCamera};

/// Translates polled input into camera calls once per frame.
pub struct WalkController {
    pub move_speed: f32,
    pub mouse_sensitivity: f32,
}

impl WalkController {
    pub fn new(move_speed: f32, mouse_sensitivity: f32) -> Self {
        Self {
            move_speed,
            mouse_sensitivity,
        }
    }

    pub fn process_held_keys(&self, input: &InputState, camera: &mut WalkCamera) {
        if input.is_held(KeyCode::KeyW) {
            camera.shift(MoveDirection::Forward, self.move_speed);
        }
        if input.is_held(KeyCode::KeyS) {
            camera.shift(MoveDirection::Backward, self.move_speed);
        }
        if input.is_held(KeyCode::KeyA) {
            camera.shift(MoveDirection::Left, self.move_speed);
        }
        if input.is_held(KeyCode::KeyD) {
            camera.shift(MoveDirection::Right, self.move_speed);
        }
    }

    /// Pointer deltas rotate the camera; vertical motion pitches inverted
    /// so that dragging up looks up.
    pub fn process_mouse(&self, delta: (f64, f64), camera: &mut WalkCamera) {
        if delta == (0.0, 0.0) {
            return;
        }

        camera.rotate(
            -(delta.1 as f32) * self.mouse_sensitivity,
            delta.0 as f32 * self.mouse_sensitivity,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{InnerSpace, Vector3};

    #[test]
    fn mouse_motion_rotates_with_inverted_pitch() {
        let controller = WalkController::new(0.1, 0.02);
        let mut camera = WalkCamera::new(
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, 1.0, -1.0),
            Vector3::unit_y(),
        );

        // Dragging the pointer down (positive y) must pitch the view down.
        controller.process_mouse((0.0, 50.0), &mut camera);
        assert!(camera.front().y < 0.0);
        assert!((camera.front().magnitude() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn zero_delta_leaves_camera_untouched() {
        let controller = WalkController::new(0.1, 0.02);
        let mut camera = WalkCamera::new(
            Vector3::new(0.0, 1.0, 0.0),
            Vector3::new(0.0, 1.0, -1.0),
            Vector3::unit_y(),
        );
        let target = camera.target;

        controller.process_mouse((0.0, 0.0), &mut camera);
        assert_eq!(camera.target, target);
    }
}
