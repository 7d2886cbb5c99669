//! Directional-light shadow mapping parameters.
//!
//! The light frustum is a fixed symmetric box anchored on the park
//! shelter. The transform is recomputed every frame; the light is static
//! in this build but nothing here caches on that.

use cgmath::{ortho, EuclideanSpace, Matrix4, Point3, Vector3};

use crate::gfx::camera::walk_camera::OPENGL_TO_WGPU_MATRIX;

pub const SHADOW_MAP_SIZE: u32 = 2048;

const SHADOW_EXTENT: f32 = 7.0;
const SHADOW_NEAR: f32 = 5.0;
const SHADOW_FAR: f32 = 20.0;

/// World point the light looks at.
const SHADOW_ANCHOR: [f32; 3] = [12.0, 0.0, 0.0];

/// Projection x view that maps world coordinates into the shadow map's
/// clip space. Independent of the camera.
pub fn light_space_matrix(light_dir: Vector3<f32>) -> Matrix4<f32> {
    let light_view = Matrix4::look_at_rh(
        Point3::from_vec(light_dir),
        Point3::from(SHADOW_ANCHOR),
        Vector3::unit_y(),
    );
    let light_proj = ortho(
        -SHADOW_EXTENT,
        SHADOW_EXTENT,
        -SHADOW_EXTENT,
        SHADOW_EXTENT,
        SHADOW_NEAR,
        SHADOW_FAR,
    );

    OPENGL_TO_WGPU_MATRIX * light_proj * light_view
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::Vector4;

    #[test]
    fn anchor_projects_to_the_shadow_map_center() {
        let light_space = light_space_matrix(Vector3::new(0.0, 7.0, 1.0));
        let anchor = Vector4::new(12.0, 0.0, 0.0, 1.0);

        let clip = light_space * anchor;
        // Orthographic: w stays 1, the anchor lands on the view axis and
        // inside the wgpu depth range.
        assert!((clip.w - 1.0).abs() < 1e-5);
        assert!(clip.x.abs() < 1e-4);
        assert!(clip.y.abs() < 1e-4);
        assert!(clip.z > 0.0 && clip.z < 1.0);
    }

    #[test]
    fn transform_is_deterministic_for_a_static_light() {
        let dir = Vector3::new(0.0, 7.0, 1.0);
        let a = light_space_matrix(dir);
        let b = light_space_matrix(dir);

        let a: &[f32; 16] = a.as_ref();
        let b: &[f32; 16] = b.as_ref();
        assert_eq!(a, b);
    }
}
