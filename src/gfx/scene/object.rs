use std::ops::Range;

use cgmath::{Matrix, Matrix3, Matrix4, SquareMatrix, Vector3};
use wgpu::util::DeviceExt;
use wgpu::Device;

use super::vertex::Vertex3D;

/// Per-object uniform contents. Must match the `ObjectUniforms` struct in
/// the scene shaders exactly: the normal matrix is a mat3x4 in WGSL, three
/// vec4-padded columns.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
    pub color: [f32; 4],
}

impl ObjectUniform {
    pub fn new(model: Matrix4<f32>, view: Matrix4<f32>, color: [f32; 4]) -> Self {
        Self {
            model: model.into(),
            normal: pad_mat3(normal_matrix(view, model)),
            color,
        }
    }
}

/// Inverse-transpose of the upper 3x3 of `view * model`, the transform
/// that keeps normals perpendicular under non-uniform scale.
pub fn normal_matrix(view: Matrix4<f32>, model: Matrix4<f32>) -> Matrix3<f32> {
    let mv = view * model;
    let upper = Matrix3::from_cols(mv.x.truncate(), mv.y.truncate(), mv.z.truncate());
    upper
        .invert()
        .unwrap_or_else(Matrix3::identity)
        .transpose()
}

fn pad_mat3(m: Matrix3<f32>) -> [[f32; 4]; 3] {
    [
        [m.x.x, m.x.y, m.x.z, 0.0],
        [m.y.x, m.y.y, m.y.z, 0.0],
        [m.z.x, m.z.y, m.z.z, 0.0],
    ]
}

/// Bind group layout for per-object uniforms, bound at slot 1 of the
/// scene pipelines. Created once by the render engine and shared.
pub fn object_bind_group_layout(device: &Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("Object Bind Group Layout"),
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
    })
}

pub struct Mesh {
    vertices: Vec<Vertex3D>,
    indices: Vec<u32>,
    vertex_buffer: Option<wgpu::Buffer>,
    index_buffer: Option<wgpu::Buffer>,
    index_count: u32,
}

impl Mesh {
    pub fn new(positions: Vec<f32>, normals: Vec<f32>, indices: Vec<u32>) -> Self {
        let index_count = indices.len() as u32;

        let mut vertices = Vec::with_capacity(positions.len() / 3);
        for i in 0..positions.len() / 3 {
            vertices.push(Vertex3D {
                position: [positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2]],
                normal: [normals[i * 3], normals[i * 3 + 1], normals[i * 3 + 2]],
            });
        }

        Self {
            vertices,
            indices,
            vertex_buffer: None,
            index_buffer: None,
            index_count,
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Area-weighted per-vertex normals for meshes whose OBJ file carries
    /// none.
    pub fn calculate_face_normals(positions: &[f32], indices: &[u32]) -> Vec<f32> {
        let mut normals = vec![0.0f32; positions.len()];

        for triangle in indices.chunks(3) {
            let [i0, i1, i2] = [
                triangle[0] as usize,
                triangle[1] as usize,
                triangle[2] as usize,
            ];
            let v = |i: usize| {
                Vector3::new(positions[i * 3], positions[i * 3 + 1], positions[i * 3 + 2])
            };

            let face = (v(i1) - v(i0)).cross(v(i2) - v(i0));
            for &i in &[i0, i1, i2] {
                normals[i * 3] += face.x;
                normals[i * 3 + 1] += face.y;
                normals[i * 3 + 2] += face.z;
            }
        }

        for chunk in normals.chunks_mut(3) {
            let len = (chunk[0] * chunk[0] + chunk[1] * chunk[1] + chunk[2] * chunk[2]).sqrt();
            if len > 0.0 {
                chunk[0] /= len;
                chunk[1] /= len;
                chunk[2] /= len;
            }
        }

        normals
    }

    pub fn upload(&mut self, device: &Device) {
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Vertex Buffer"),
            contents: bytemuck::cast_slice(&self.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Index Buffer"),
            contents: bytemuck::cast_slice(&self.indices),
            usage: wgpu::BufferUsages::INDEX,
        });

        self.vertex_buffer = Some(vertex_buffer);
        self.index_buffer = Some(index_buffer);
    }
}

pub struct ObjectGpuResources {
    pub uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

pub struct Object {
    pub name: String,
    pub meshes: Vec<Mesh>,
    pub transform: Matrix4<f32>,
    pub base_color: [f32; 4],
    pub visible: bool,
    pub casts_shadow: bool,
    pub gpu_resources: Option<ObjectGpuResources>,
}

impl Object {
    pub fn new(name: impl Into<String>, meshes: Vec<Mesh>) -> Self {
        Self {
            name: name.into(),
            meshes,
            transform: Matrix4::identity(),
            base_color: [0.8, 0.8, 0.8, 1.0],
            visible: true,
            casts_shadow: true,
            gpu_resources: None,
        }
    }

    pub fn set_translation(&mut self, translation: Vector3<f32>) {
        self.transform = Matrix4::from_translation(translation);
    }

    pub fn init_gpu_resources(&mut self, device: &Device, layout: &wgpu::BindGroupLayout) {
        for mesh in &mut self.meshes {
            mesh.upload(device);
        }

        let uniform = ObjectUniform::new(self.transform, Matrix4::identity(), self.base_color);
        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Object Uniform Buffer"),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Object Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        self.gpu_resources = Some(ObjectGpuResources {
            uniform_buffer,
            bind_group,
        });
    }

    /// Writes the current transform and its view-dependent normal matrix
    /// to the GPU. Called every frame once the view is known.
    pub fn update_uniform(&self, queue: &wgpu::Queue, view: Matrix4<f32>) {
        if let Some(resources) = &self.gpu_resources {
            let uniform = ObjectUniform::new(self.transform, view, self.base_color);
            queue.write_buffer(&resources.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
        }
    }

    pub fn bind_group(&self) -> Option<&wgpu::BindGroup> {
        self.gpu_resources.as_ref().map(|r| &r.bind_group)
    }
}

pub trait DrawObject<'a> {
    fn draw_mesh(&mut self, mesh: &'a Mesh);
    fn draw_mesh_instanced(&mut self, mesh: &'a Mesh, instances: Range<u32>);
    fn draw_object(&mut self, object: &'a Object);
}

impl<'a, 'b> DrawObject<'b> for wgpu::RenderPass<'a>
where
    'b: 'a,
{
    fn draw_mesh(&mut self, mesh: &'b Mesh) {
        self.draw_mesh_instanced(mesh, 0..1);
    }

    fn draw_mesh_instanced(&mut self, mesh: &'b Mesh, instances: Range<u32>) {
        let (Some(vertex_buffer), Some(index_buffer)) =
            (&mesh.vertex_buffer, &mesh.index_buffer)
        else {
            return; // not uploaded yet
        };

        self.set_vertex_buffer(0, vertex_buffer.slice(..));
        self.set_index_buffer(index_buffer.slice(..), wgpu::IndexFormat::Uint32);
        self.draw_indexed(0..mesh.index_count, 0, instances);
    }

    fn draw_object(&mut self, object: &'b Object) {
        for mesh in &object.meshes {
            self.draw_mesh(mesh);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::{vec3, Deg, InnerSpace};

    #[test]
    fn normal_matrix_of_rigid_transform_matches_rotation() {
        let view = Matrix4::from_angle_y(Deg(30.0));
        let model = Matrix4::from_translation(vec3(4.0, 1.0, -2.0));

        // Translation must not leak into the normal matrix; for a pure
        // rotation the inverse-transpose is the rotation itself.
        let n = normal_matrix(view, model);
        let r = Matrix3::from_angle_y(Deg(30.0));

        for col in 0..3 {
            let diff = n[col] - r[col];
            assert!(diff.magnitude() < 1e-5);
        }
    }

    #[test]
    fn calculated_normals_are_unit_length() {
        // A single upward-facing triangle.
        let positions = vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 0.0, -1.0];
        let indices = vec![0, 1, 2];

        let normals = Mesh::calculate_face_normals(&positions, &indices);
        for chunk in normals.chunks(3) {
            let n = Vector3::new(chunk[0], chunk[1], chunk[2]);
            assert!((n.magnitude() - 1.0).abs() < 1e-5);
            assert!(n.y > 0.99);
        }
    }

    #[test]
    fn mesh_interleaves_positions_and_normals() {
        let mesh = Mesh::new(
            vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0],
            vec![0.0, 1.0, 0.0, 0.0, 0.0, 1.0],
            vec![0, 1, 0],
        );

        assert_eq!(mesh.vertex_count(), 2);
        assert_eq!(mesh.vertices[1].position, [4.0, 5.0, 6.0]);
        assert_eq!(mesh.vertices[1].normal, [0.0, 0.0, 1.0]);
        assert_eq!(mesh.index_count, 3);
    }
}
