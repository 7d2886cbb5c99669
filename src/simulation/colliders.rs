//! Static collision surfaces for the rain simulation.
//!
//! The park shelter is the only geometry raindrops interact with. Its two
//! roof slopes and two side walls are hand-surveyed planar patches, each
//! tested as an axis-aligned extent plus a plane-side check. The corner
//! coordinates are authored data taken off the shelter model; they are not
//! derived from the mesh at runtime.

use cgmath::{InnerSpace, Vector3};

/// One planar patch: the box it spans and the plane it lies in.
///
/// A point counts as inside only when it is strictly within the extent on
/// every axis (boundary points are outside) *and* on the interior side of
/// the plane, i.e. the surface normal dotted with the offset from the
/// anchor corner is negative.
#[derive(Debug, Clone, Copy)]
pub struct PlanarObstacle {
    pub min: Vector3<f32>,
    pub max: Vector3<f32>,
    pub normal: Vector3<f32>,
    pub anchor: Vector3<f32>,
}

impl PlanarObstacle {
    pub fn new(
        min: Vector3<f32>,
        max: Vector3<f32>,
        normal: Vector3<f32>,
        anchor: Vector3<f32>,
    ) -> Self {
        Self {
            min,
            max,
            normal,
            anchor,
        }
    }

    fn contains(&self, point: Vector3<f32>) -> bool {
        point.x > self.min.x
            && point.x < self.max.x
            && point.y > self.min.y
            && point.y < self.max.y
            && point.z > self.min.z
            && point.z < self.max.z
    }

    /// True when `point` is within the extent and behind the surface.
    pub fn blocks(&self, point: Vector3<f32>) -> bool {
        self.contains(point) && self.normal.dot(point - self.anchor) < 0.0
    }
}

/// The four shelter surfaces, in the order roof right, roof left, wall
/// right, wall left.
pub fn shelter_obstacles() -> [PlanarObstacle; 4] {
    // Shelter corners: ridge front/back, wall tops front/back and wall
    // bottoms front/back, right side then left.
    let ridge_front = Vector3::new(8.45154, 3.58871, 2.47549);
    let _ridge_back = Vector3::new(12.8966, 3.62955, 2.55956);
    let wall_r_top_front = Vector3::new(8.40777, 1.63252, 3.92667);
    let wall_r_top_back = Vector3::new(12.8452, 1.63252, 4.00412);
    let wall_l_top_front = Vector3::new(8.47413, 1.63252, 1.04179);
    let wall_l_top_back = Vector3::new(12.9299, 1.59839, 1.10053);
    let wall_r_bottom_front = Vector3::new(8.45149, 0.007231, 3.904);
    let wall_r_bottom_back = Vector3::new(12.8534, 0.007231, 3.99226);
    let wall_l_bottom_front = Vector3::new(8.46879, 0.007231, 1.07433);
    let wall_l_bottom_back = Vector3::new(12.9299, 0.007231, 1.11824);

    [
        PlanarObstacle::new(
            Vector3::new(8.40777, 1.63252, 2.47549),
            Vector3::new(12.8966, 3.62955, 4.00412),
            (ridge_front - wall_r_top_front).cross(wall_r_top_back - wall_r_top_front),
            ridge_front,
        ),
        PlanarObstacle::new(
            Vector3::new(8.45154, 1.59839, 1.04179),
            Vector3::new(12.9299, 3.62955, 2.55956),
            (ridge_front - wall_l_top_front).cross(wall_l_top_back - wall_l_top_front),
            ridge_front,
        ),
        PlanarObstacle::new(
            Vector3::new(8.40777, 0.007231, 3.904),
            Vector3::new(12.8534, 1.63252, 4.00412),
            (wall_r_top_front - wall_r_bottom_front)
                .cross(wall_r_bottom_back - wall_r_bottom_front),
            wall_r_top_front,
        ),
        PlanarObstacle::new(
            Vector3::new(8.46879, 0.007231, 1.04179),
            Vector3::new(12.9299, 1.63252, 1.11824),
            (wall_l_top_front - wall_l_bottom_front)
                .cross(wall_l_bottom_back - wall_l_bottom_front),
            wall_l_top_front,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roof_interior_point_is_blocked_exterior_is_not() {
        let roof_right = shelter_obstacles()[0];

        // Midpoint of the four authored roof-right corners.
        let midpoint = Vector3::new(10.65028, 2.620825, 3.24146);
        let inward = roof_right.normal.normalize();

        assert!(roof_right.blocks(midpoint - inward * 0.05));
        assert!(!roof_right.blocks(midpoint + inward * 0.1));
    }

    #[test]
    fn wall_distinguishes_plane_sides_within_its_extent() {
        let wall_right = shelter_obstacles()[2];

        // Both probes sit inside the wall's thin extent; only the one
        // behind the plane collides.
        assert!(wall_right.blocks(Vector3::new(10.0, 0.8, 3.95)));
        assert!(!wall_right.blocks(Vector3::new(10.0, 0.8, 3.906)));
    }

    #[test]
    fn boundary_points_are_outside() {
        let roof_right = shelter_obstacles()[0];

        // Exactly on the minimum x face: the half-open extent excludes it.
        let on_face = Vector3::new(roof_right.min.x, 2.6, 3.2);
        assert!(!roof_right.blocks(on_face));
    }
}
