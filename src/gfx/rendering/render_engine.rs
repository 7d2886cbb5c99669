//! wgpu-based rendering engine.
//!
//! Owns the surface, device and every GPU resource, and drives the two
//! passes of a frame: the depth-only shadow pass into the shadow map,
//! then the shaded color pass that samples it. The shadow map is fully
//! written before the color pass begins; the pass order is fixed.

use std::sync::Arc;

use anyhow::{Context, Result};
use cgmath::{perspective, Deg, Matrix4};
use wgpu::{Device, TextureFormat};

use crate::gfx::camera::walk_camera::OPENGL_TO_WGPU_MATRIX;
use crate::gfx::resources::global_bindings::{
    update_global_ubo, GlobalBindings, GlobalUbo, LightingConfig,
};
use crate::gfx::resources::texture_resource::TextureResource;
use crate::gfx::scene::object::{object_bind_group_layout, DrawObject};
use crate::gfx::scene::scene::Scene;
use crate::gfx::scene::vertex::Vertex3D;

use super::pipeline_manager::{PipelineConfig, PipelineManager};
use super::rain_renderer::{RainInstance, RainRenderer};
use super::shadow::{light_space_matrix, SHADOW_MAP_SIZE};

const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.7,
    g: 0.7,
    b: 0.7,
    a: 1.0,
};

const FOV_Y: f32 = 45.0;
const Z_NEAR: f32 = 0.1;
const Z_FAR: f32 = 500.0;

pub struct RenderEngine {
    surface: wgpu::Surface<'static>,
    device: Arc<wgpu::Device>,
    queue: Arc<wgpu::Queue>,
    config: wgpu::SurfaceConfiguration,
    format: TextureFormat,

    depth_texture: TextureResource,
    msaa_target: Option<TextureResource>,
    sample_count: u32,

    shadow_map: TextureResource,
    shadow_layout: wgpu::BindGroupLayout,
    shadow_bind_group: wgpu::BindGroup,

    object_layout: wgpu::BindGroupLayout,
    pipeline_manager: PipelineManager,
    global_ubo: GlobalUbo,
    global_bindings: GlobalBindings,
    lighting: LightingConfig,
    rain_renderer: RainRenderer,

    projection: Matrix4<f32>,
    line_mode_supported: bool,
}

impl RenderEngine {
    pub async fn new(
        window: impl Into<wgpu::SurfaceTarget<'static>>,
        width: u32,
        height: u32,
    ) -> Result<RenderEngine> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window)
            .context("failed to create render surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to acquire GPU adapter")?;

        // Wireframe needs line rasterization; take it only if offered.
        let line_mode_supported = adapter
            .features()
            .contains(wgpu::Features::POLYGON_MODE_LINE);
        let required_features = if line_mode_supported {
            wgpu::Features::POLYGON_MODE_LINE
        } else {
            wgpu::Features::default()
        };

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Corvus Device"),
                required_features,
                required_limits: wgpu::Limits::downlevel_defaults(),
                memory_hints: wgpu::MemoryHints::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("failed to create GPU device")?;

        // Runtime graphics errors are logged and the loop keeps going;
        // dropped frames are acceptable, crashes are not.
        device.on_uncaptured_error(Box::new(|error| {
            log::error!("uncaptured wgpu error: {error}");
        }));

        let surface_capabilities = surface.get_capabilities(&adapter);
        let format = surface_capabilities
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .unwrap_or(surface_capabilities.formats[0]);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: width.max(1),
            height: height.max(1),
            present_mode: wgpu::PresentMode::Fifo,
            alpha_mode: surface_capabilities.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture =
            TextureResource::create_depth_texture(&device, &config, 1, "depth_texture");
        let shadow_map = TextureResource::create_shadow_map(&device, SHADOW_MAP_SIZE);

        let shadow_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Shadow Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        multisampled: false,
                        view_dimension: wgpu::TextureViewDimension::D2,
                        sample_type: wgpu::TextureSampleType::Depth,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let shadow_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Shadow Bind Group"),
            layout: &shadow_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: wgpu::BindingResource::TextureView(&shadow_map.view),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::Sampler(&shadow_map.sampler),
                },
            ],
        });

        let global_ubo = GlobalUbo::new(&device);
        let mut global_bindings = GlobalBindings::new(&device);
        global_bindings.create_bind_group(&device, &global_ubo);

        let object_layout = object_bind_group_layout(&device);

        let rain_renderer =
            RainRenderer::new(&device, crate::simulation::rain::DEFAULT_DROP_COUNT);

        let device_handle: Arc<Device> = device.into();
        let queue_handle: Arc<wgpu::Queue> = queue.into();
        let mut pipeline_manager = PipelineManager::new(device_handle.clone());

        pipeline_manager.load_shader("scene", include_str!("scene.wgsl"));
        pipeline_manager.load_shader("shadow", include_str!("shadow.wgsl"));
        pipeline_manager.load_shader("rain", include_str!("rain.wgsl"));
        pipeline_manager.load_shader("rain_shadow", include_str!("rain_shadow.wgsl"));

        // Depth-only passes: no culling, so thin geometry cannot leak
        // light through the shadow map.
        pipeline_manager.register_pipeline(
            "shadow",
            PipelineConfig::default()
                .with_label("SHADOW")
                .with_shader("shadow")
                .with_vertex_only()
                .with_cull_mode(None)
                .with_depth_format(TextureResource::DEPTH_FORMAT)
                .with_bind_group_layouts(vec![
                    global_bindings.layout().clone(),
                    object_layout.clone(),
                ]),
        );
        pipeline_manager.register_pipeline(
            "rain_shadow",
            PipelineConfig::default()
                .with_label("RAIN SHADOW")
                .with_shader("rain_shadow")
                .with_vertex_only()
                .with_cull_mode(None)
                .with_depth_format(TextureResource::DEPTH_FORMAT)
                .with_vertex_buffers(vec![Vertex3D::desc(), RainInstance::desc()])
                .with_bind_group_layouts(vec![global_bindings.layout().clone()]),
        );

        let mut engine = RenderEngine {
            surface,
            device: device_handle,
            queue: queue_handle,
            config,
            format,
            depth_texture,
            msaa_target: None,
            sample_count: 1,
            shadow_map,
            shadow_layout,
            shadow_bind_group,
            object_layout,
            pipeline_manager,
            global_ubo,
            global_bindings,
            lighting: LightingConfig::default(),
            rain_renderer,
            projection: projection_matrix(width, height),
            line_mode_supported,
        };

        engine.register_color_pipelines();
        if let Err(errors) = engine.pipeline_manager.create_all_pipelines() {
            for error in errors {
                log::error!("{error}");
            }
        }

        Ok(engine)
    }

    /// (Re)registers the color pipelines for the current sample count.
    /// Called at startup and whenever multisampling flips.
    fn register_color_pipelines(&mut self) {
        let color_target = Some(wgpu::ColorTargetState {
            format: self.format,
            blend: Some(wgpu::BlendState::REPLACE),
            write_mask: wgpu::ColorWrites::ALL,
        });

        let scene_config = PipelineConfig::default()
            .with_label("SCENE")
            .with_shader("scene")
            .with_depth_format(TextureResource::DEPTH_FORMAT)
            .with_sample_count(self.sample_count)
            .with_color_targets(vec![color_target.clone()])
            .with_bind_group_layouts(vec![
                self.global_bindings.layout().clone(),
                self.object_layout.clone(),
                self.shadow_layout.clone(),
            ]);

        let rain_config = PipelineConfig::default()
            .with_label("RAIN")
            .with_shader("rain")
            .with_depth_format(TextureResource::DEPTH_FORMAT)
            .with_sample_count(self.sample_count)
            .with_color_targets(vec![color_target])
            .with_vertex_buffers(vec![Vertex3D::desc(), RainInstance::desc()])
            .with_bind_group_layouts(vec![
                self.global_bindings.layout().clone(),
                self.shadow_layout.clone(),
            ]);

        if self.line_mode_supported {
            self.pipeline_manager.register_pipeline(
                "scene_wire",
                scene_config
                    .clone()
                    .with_label("SCENE WIRE")
                    .with_polygon_mode(wgpu::PolygonMode::Line),
            );
            self.pipeline_manager.register_pipeline(
                "rain_wire",
                rain_config
                    .clone()
                    .with_label("RAIN WIRE")
                    .with_polygon_mode(wgpu::PolygonMode::Line),
            );
        }

        self.pipeline_manager.register_pipeline("scene", scene_config);
        self.pipeline_manager.register_pipeline("rain", rain_config);
    }

    /// Uploads the per-frame global and per-object uniforms and the rain
    /// instance buffer. Must run before `render_frame`.
    pub fn prepare_frame(&mut self, scene: &Scene) {
        let view = scene.camera.view_matrix();
        let light_space = light_space_matrix(self.lighting.light_dir.into());

        update_global_ubo(
            &mut self.global_ubo,
            &self.queue,
            view,
            self.projection,
            light_space,
            &self.lighting,
            scene.settings.light_mode,
            scene.settings.fog,
        );

        for object in &scene.objects {
            object.update_uniform(&self.queue, view);
        }

        match &scene.rain {
            Some(rain) => {
                self.rain_renderer
                    .update(&self.queue, rain.drops(), scene.settings.wind);
            }
            None => self.rain_renderer.clear(),
        }
    }

    /// Renders one frame: shadow depth pass, then the color pass, then
    /// present. Surface loss is handled by reconfiguring and dropping the
    /// frame.
    pub fn render_frame(&mut self, scene: &Scene) {
        let surface_texture = match self.surface.get_current_texture() {
            Ok(texture) => texture,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("surface out of memory, dropping frame");
                return;
            }
            Err(error) => {
                log::warn!("dropping frame: {error}");
                return;
            }
        };

        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        let draw_rain = scene.settings.rain && self.rain_renderer.count() > 0;

        // PASS 1: scene depth from the light's point of view.
        {
            let mut shadow_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Shadow Depth Pass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.shadow_map.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            shadow_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);

            if let Some(pipeline) = self.pipeline_manager.get_pipeline("shadow") {
                shadow_pass.set_pipeline(pipeline);
                for object in &scene.objects {
                    if object.visible && object.casts_shadow {
                        if let Some(bind_group) = object.bind_group() {
                            shadow_pass.set_bind_group(1, bind_group, &[]);
                            shadow_pass.draw_object(object);
                        }
                    }
                }
            }

            if draw_rain {
                if let Some(pipeline) = self.pipeline_manager.get_pipeline("rain_shadow") {
                    shadow_pass.set_pipeline(pipeline);
                    shadow_pass
                        .set_vertex_buffer(1, self.rain_renderer.instance_buffer().slice(..));
                    for mesh in &scene.raindrop_meshes {
                        shadow_pass.draw_mesh_instanced(mesh, 0..self.rain_renderer.count());
                    }
                }
            }
        }

        // PASS 2: shaded color pass sampling the finished shadow map.
        {
            let (attachment_view, resolve_target) = match &self.msaa_target {
                Some(msaa) => (&msaa.view, Some(&surface_view)),
                None => (&surface_view, None),
            };

            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Main Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: attachment_view,
                    resolve_target,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            render_pass.set_bind_group(0, self.global_bindings.bind_group(), &[]);

            let wire = scene.settings.wireframe && self.line_mode_supported;
            let scene_pipeline = if wire { "scene_wire" } else { "scene" };
            if let Some(pipeline) = self.pipeline_manager.get_pipeline(scene_pipeline) {
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(2, &self.shadow_bind_group, &[]);
                for object in &scene.objects {
                    if object.visible {
                        if let Some(bind_group) = object.bind_group() {
                            render_pass.set_bind_group(1, bind_group, &[]);
                            render_pass.draw_object(object);
                        } else {
                            log::debug!("skipping '{}': no GPU resources", object.name);
                        }
                    }
                }
            }

            if draw_rain {
                let rain_pipeline = if wire { "rain_wire" } else { "rain" };
                if let Some(pipeline) = self.pipeline_manager.get_pipeline(rain_pipeline) {
                    render_pass.set_pipeline(pipeline);
                    render_pass.set_bind_group(1, &self.shadow_bind_group, &[]);
                    render_pass
                        .set_vertex_buffer(1, self.rain_renderer.instance_buffer().slice(..));
                    for mesh in &scene.raindrop_meshes {
                        render_pass.draw_mesh_instanced(mesh, 0..self.rain_renderer.count());
                    }
                }
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        surface_texture.present();
    }

    /// Switches 4x multisampling on or off. No-op when already in the
    /// requested state.
    pub fn set_multisampling(&mut self, enabled: bool) {
        let sample_count = if enabled { 4 } else { 1 };
        if sample_count == self.sample_count {
            return;
        }

        self.sample_count = sample_count;
        self.depth_texture = TextureResource::create_depth_texture(
            &self.device,
            &self.config,
            sample_count,
            "depth_texture",
        );
        self.msaa_target = (sample_count > 1).then(|| {
            TextureResource::create_msaa_target(&self.device, &self.config, sample_count)
        });

        self.register_color_pipelines();
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.config.width = width;
        self.config.height = height;
        self.surface.configure(&self.device, &self.config);

        self.depth_texture = TextureResource::create_depth_texture(
            &self.device,
            &self.config,
            self.sample_count,
            "depth_texture",
        );
        if self.msaa_target.is_some() {
            self.msaa_target = Some(TextureResource::create_msaa_target(
                &self.device,
                &self.config,
                self.sample_count,
            ));
        }

        self.projection = projection_matrix(width, height);
        // The shadow map keeps its fixed resolution.
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    pub fn object_layout(&self) -> &wgpu::BindGroupLayout {
        &self.object_layout
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.format
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }
}

fn projection_matrix(width: u32, height: u32) -> Matrix4<f32> {
    let aspect = width.max(1) as f32 / height.max(1) as f32;
    OPENGL_TO_WGPU_MATRIX * perspective(Deg(FOV_Y), aspect, Z_NEAR, Z_FAR)
}
