//! Global uniform bindings shared by every render pipeline.
//!
//! One uniform buffer carries the per-frame state: view and projection,
//! the light-space transform for shadow sampling, and the light/fog
//! toggles. Uniform locations are resolved once at pipeline creation
//! through the bind group layout; nothing is looked up by name per frame.

use cgmath::Matrix4;

use crate::wgpu_utils::uniform_buffer::UniformBuffer;

/// Which light the main shader evaluates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightMode {
    Directional,
    Point,
}

impl LightMode {
    pub fn flip(self) -> Self {
        match self {
            LightMode::Directional => LightMode::Point,
            LightMode::Point => LightMode::Directional,
        }
    }

    fn as_u32(self) -> u32 {
        match self {
            LightMode::Directional => 0,
            LightMode::Point => 1,
        }
    }
}

/// Process-wide light state. Mutated only by input toggles.
#[derive(Debug, Clone, Copy)]
pub struct LightingConfig {
    /// Direction toward the directional light.
    pub light_dir: [f32; 3],
    pub light_color: [f32; 3],
    pub point_light_pos: [f32; 3],
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            light_dir: [0.0, 7.0, 1.0],
            light_color: [1.0, 1.0, 1.0],
            point_light_pos: [3.77206, 0.789307, 2.86863],
        }
    }
}

/// Global uniform buffer contents. Must match `GlobalUniforms` in the
/// shaders exactly; vec3s are widened to vec4 so the Rust and WGSL
/// layouts cannot drift apart.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GlobalUniforms {
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    light_space: [[f32; 4]; 4],
    light_dir: [f32; 4],
    light_color: [f32; 4],
    point_light_pos: [f32; 4],
    /// x = light mode, y = fog enabled.
    flags: [u32; 4],
}

pub type GlobalUbo = UniformBuffer<GlobalUniforms>;

/// Writes the per-frame global state into the uniform buffer.
#[allow(clippy::too_many_arguments)]
pub fn update_global_ubo(
    ubo: &mut GlobalUbo,
    queue: &wgpu::Queue,
    view: Matrix4<f32>,
    proj: Matrix4<f32>,
    light_space: Matrix4<f32>,
    lighting: &LightingConfig,
    light_mode: LightMode,
    fog: bool,
) {
    let widen = |v: [f32; 3]| [v[0], v[1], v[2], 1.0];

    let content = GlobalUniforms {
        view: view.into(),
        proj: proj.into(),
        light_space: light_space.into(),
        light_dir: widen(lighting.light_dir),
        light_color: widen(lighting.light_color),
        point_light_pos: widen(lighting.point_light_pos),
        flags: [light_mode.as_u32(), fog as u32, 0, 0],
    };

    ubo.update_content(queue, content);
}

/// Bind group layout and bind group for the global uniforms, bound at
/// slot 0 in every pipeline.
pub struct GlobalBindings {
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: Option<wgpu::BindGroup>,
}

impl GlobalBindings {
    pub fn new(device: &wgpu::Device) -> Self {
        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("Globals Bind Group Layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                }],
            });

        GlobalBindings {
            bind_group_layout,
            bind_group: None,
        }
    }

    /// Must be called once after the uniform buffer exists and before the
    /// first frame.
    pub fn create_bind_group(&mut self, device: &wgpu::Device, ubo: &GlobalUbo) {
        self.bind_group = Some(device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Globals Bind Group"),
            layout: &self.bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.binding_resource(),
            }],
        }));
    }

    pub fn layout(&self) -> &wgpu::BindGroupLayout {
        &self.bind_group_layout
    }

    /// # Panics
    /// Panics if `create_bind_group()` has not been called yet.
    pub fn bind_group(&self) -> &wgpu::BindGroup {
        self.bind_group
            .as_ref()
            .expect("Bind group has not been created yet!")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn light_mode_flips_between_the_two_modes() {
        assert_eq!(LightMode::Directional.flip(), LightMode::Point);
        assert_eq!(LightMode::Point.flip(), LightMode::Directional);
        assert_eq!(LightMode::Directional.as_u32(), 0);
        assert_eq!(LightMode::Point.as_u32(), 1);
    }

    #[test]
    fn uniform_struct_has_the_shader_layout_size() {
        // 3 mat4 + 3 vec4 + 1 vec4<u32> = 256 bytes.
        assert_eq!(std::mem::size_of::<GlobalUniforms>(), 256);
    }

    #[test]
    fn default_lighting_matches_the_authored_scene() {
        let lighting = LightingConfig::default();
        assert_eq!(lighting.light_dir, [0.0, 7.0, 1.0]);
        assert_eq!(lighting.light_color, [1.0, 1.0, 1.0]);
        assert_eq!(lighting.point_light_pos, [3.77206, 0.789307, 2.86863]);
    }
}
