//! First-person walkthrough camera.
//!
//! The camera keeps an explicit look target rather than a free direction
//! vector: [`WalkCamera::rotate`] rewrites the target as an absolute point
//! around the *current* position, so translation and rotation do not
//! commute. Recorded walkthroughs depend on that coupling; do not replace
//! it with a conventional yaw/pitch-to-direction formula.

use cgmath::{EuclideanSpace, InnerSpace, Matrix4, Point3, Vector3};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Forward,
    Backward,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy)]
pub struct WalkCamera {
    pub position: Vector3<f32>,
    pub target: Vector3<f32>,
    front: Vector3<f32>,
    right: Vector3<f32>,
    up: Vector3<f32>,
    yaw: f32,
    pitch: f32,
}

impl WalkCamera {
    pub fn new(position: Vector3<f32>, target: Vector3<f32>, up: Vector3<f32>) -> Self {
        let front = (target - position).normalize();
        let right = front.cross(up).normalize();

        Self {
            position,
            target,
            front,
            right,
            up,
            yaw: 0.0,
            pitch: 0.0,
        }
    }

    /// View transform for the current pose. Up is pinned to world up here;
    /// the stored `up` only participates in deriving the right axis.
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(
            Point3::from_vec(self.position),
            Point3::from_vec(self.position + self.front),
            Vector3::unit_y(),
        )
    }

    /// Displaces the position along the front axis or its horizontal
    /// perpendicular. The effective step is `speed / 5`. Orientation is
    /// left untouched; the view matrix is stale until recomputed.
    pub fn shift(&mut self, direction: MoveDirection, speed: f32) {
        let speed = speed / 5.0;

        match direction {
            MoveDirection::Forward => self.position += self.front * speed,
            MoveDirection::Backward => self.position -= self.front * speed,
            MoveDirection::Left => {
                self.position -= self.front.cross(self.up).normalize() * speed;
            }
            MoveDirection::Right => {
                self.position += self.front.cross(self.up).normalize() * speed;
            }
        }
    }

    /// Accumulates pitch and yaw (degrees, unbounded, no gimbal clamp) and
    /// recomputes the look target as an absolute point one unit out from
    /// the current position. Because the target is rebuilt from wherever
    /// the camera currently stands, interleaved `shift` and `rotate` calls
    /// are order dependent.
    pub fn rotate(&mut self, pitch: f32, yaw: f32) {
        self.yaw += yaw;
        self.pitch += pitch;

        self.target.z = self.position.z - self.yaw.to_radians().cos();
        self.target.x = self.position.x + self.yaw.to_radians().sin();
        self.target.y = self.position.y + self.pitch.to_radians().sin();

        self.front = (self.target - self.position).normalize();
        self.right = self.front.cross(self.up).normalize();
    }

    pub fn front(&self) -> Vector3<f32> {
        self.front
    }

    pub fn right(&self) -> Vector3<f32> {
        self.right
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn park_entrance() -> WalkCamera {
        WalkCamera::new(
            Vector3::new(-3.74433, 1.60775, 1.44585),
            Vector3::new(-0.943888, 1.60775, 1.7225),
            Vector3::unit_y(),
        )
    }

    fn assert_vec3_eq(a: Vector3<f32>, b: Vector3<f32>) {
        assert!(
            (a - b).magnitude() < EPS,
            "vectors differ: {a:?} vs {b:?}"
        );
    }

    fn assert_mat4_eq(a: Matrix4<f32>, b: Matrix4<f32>) {
        let a: &[f32; 16] = a.as_ref();
        let b: &[f32; 16] = b.as_ref();
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < EPS, "matrices differ: {a:?} vs {b:?}");
        }
    }

    #[test]
    fn movement_never_alters_orientation() {
        let mut camera = park_entrance();
        let front = camera.front();
        let right = camera.right();

        camera.shift(MoveDirection::Forward, 0.3);
        camera.shift(MoveDirection::Left, 1.2);
        camera.shift(MoveDirection::Backward, 0.7);
        camera.shift(MoveDirection::Right, 2.5);

        assert_vec3_eq(camera.front(), front);
        assert_vec3_eq(camera.right(), right);
    }

    #[test]
    fn forward_step_is_a_fifth_of_speed_along_front() {
        let mut camera = park_entrance();
        let start = camera.position;
        let front = camera.front();

        camera.shift(MoveDirection::Forward, 0.5);

        assert_vec3_eq(camera.position, start + front * 0.1);
    }

    #[test]
    fn zero_rotation_is_idempotent() {
        let mut camera = park_entrance();

        // The first zero rotation snaps the target onto the yaw/pitch
        // parametrization; every one after that must be a no-op.
        camera.rotate(0.0, 0.0);
        let target = camera.target;
        let front = camera.front();
        let right = camera.right();

        for _ in 0..4 {
            camera.rotate(0.0, 0.0);
        }

        assert_vec3_eq(camera.target, target);
        assert_vec3_eq(camera.front(), front);
        assert_vec3_eq(camera.right(), right);
    }

    #[test]
    fn front_stays_unit_length_under_rotation() {
        let mut camera = park_entrance();

        for (pitch, yaw) in [(12.5, -40.0), (300.0, 720.5), (-1000.0, 0.03), (0.0, 9999.0)] {
            camera.rotate(pitch, yaw);
            assert!((camera.front().magnitude() - 1.0).abs() < EPS);
        }
    }

    #[test]
    fn rotation_targets_a_point_relative_to_position() {
        let mut camera = park_entrance();
        camera.rotate(10.0, 30.0);

        let expected = Vector3::new(
            camera.position.x + 30.0f32.to_radians().sin(),
            camera.position.y + 10.0f32.to_radians().sin(),
            camera.position.z - 30.0f32.to_radians().cos(),
        );
        assert_vec3_eq(camera.target, expected);

        // Moving and rotating again re-anchors the target on the new
        // position; the coupling is intentional.
        camera.shift(MoveDirection::Forward, 1.0);
        camera.rotate(0.0, 0.0);
        let expected = Vector3::new(
            camera.position.x + 30.0f32.to_radians().sin(),
            camera.position.y + 10.0f32.to_radians().sin(),
            camera.position.z - 30.0f32.to_radians().cos(),
        );
        assert_vec3_eq(camera.target, expected);
    }

    #[test]
    fn view_matrix_uses_world_up_regardless_of_stored_up() {
        let camera = WalkCamera::new(
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(4.0, 2.0, -1.0),
            Vector3::unit_z(),
        );

        let expected = Matrix4::look_at_rh(
            Point3::from_vec(camera.position),
            Point3::from_vec(camera.position + camera.front()),
            Vector3::unit_y(),
        );
        assert_mat4_eq(camera.view_matrix(), expected);
    }
}
