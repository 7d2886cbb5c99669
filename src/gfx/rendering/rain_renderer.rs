//! Instanced rendering of the raindrop pool.
//!
//! One mesh, one instance buffer of model matrices refreshed every frame
//! from the simulation. When wind is on every drop carries the same tilt.

use cgmath::{Matrix4, Rad};

use crate::simulation::rain::Raindrop;

/// Tilt applied to drops while the wind blows, radians about x.
const WIND_TILT: f32 = 0.1;

/// Per-instance vertex data: the drop's model matrix as four vec4
/// attributes at locations 2..=5.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct RainInstance {
    model: [[f32; 4]; 4],
}

impl RainInstance {
    const ATTRIBUTES: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        2 => Float32x4,
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
    ];

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<RainInstance>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

pub struct RainRenderer {
    instance_buffer: wgpu::Buffer,
    capacity: usize,
    count: u32,
}

impl RainRenderer {
    pub fn new(device: &wgpu::Device, capacity: usize) -> Self {
        let instance_buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Rain Instance Buffer"),
            size: (capacity * std::mem::size_of::<RainInstance>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            instance_buffer,
            capacity,
            count: 0,
        }
    }

    /// Rewrites the instance buffer from the current drop positions.
    pub fn update(&mut self, queue: &wgpu::Queue, drops: &[Raindrop], wind: bool) {
        let tilt = Matrix4::from_angle_x(Rad(WIND_TILT));

        let take = drops.len().min(self.capacity);
        if take < drops.len() {
            log::warn!(
                "rain pool of {} exceeds instance capacity {}, truncating",
                drops.len(),
                self.capacity
            );
        }

        let instances: Vec<RainInstance> = drops[..take]
            .iter()
            .map(|drop| {
                let mut model = Matrix4::from_translation(drop.position);
                if wind {
                    model = model * tilt;
                }
                RainInstance {
                    model: model.into(),
                }
            })
            .collect();

        if instances.is_empty() {
            self.count = 0;
            return;
        }

        queue.write_buffer(&self.instance_buffer, 0, bytemuck::cast_slice(&instances));
        self.count = take as u32;
    }

    pub fn clear(&mut self) {
        self.count = 0;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn instance_buffer(&self) -> &wgpu::Buffer {
        &self.instance_buffer
    }
}
