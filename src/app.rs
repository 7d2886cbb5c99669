//! Application shell and frame orchestration.
//!
//! One winit event loop drives everything in strict sequence per tick:
//! poll input, apply camera and toggle effects (or consume one scripted
//! fly-through sample), advance animation and rain, upload uniforms, run
//! the shadow and color passes, present. Single-threaded; the scene has
//! exactly one writer per tick.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use cgmath::Vector3;
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowAttributes},
};

use crate::gfx::camera::{FlyThrough, WalkCamera, WalkController};
use crate::gfx::rendering::render_engine::RenderEngine;
use crate::gfx::scene::Scene;
use crate::input::InputState;

const WINDOW_WIDTH: u32 = 1024;
const WINDOW_HEIGHT: u32 = 768;
const WINDOW_TITLE: &str = "Corvus";

const CAMERA_SPEED: f32 = 0.1;
const MOUSE_SENSITIVITY: f32 = 0.02;

pub struct CorvusApp {
    event_loop: Option<EventLoop<()>>,
    state: AppState,
}

struct AppState {
    window: Option<Arc<Window>>,
    engine: Option<RenderEngine>,
    scene: Scene,
    input: InputState,
    controller: WalkController,
    flythrough: Option<FlyThrough>,
    asset_root: PathBuf,
    init_error: Option<anyhow::Error>,
}

impl CorvusApp {
    /// Builds the application. Window and GPU setup happen once the event
    /// loop delivers `resumed`.
    pub fn new(asset_root: PathBuf) -> Result<Self> {
        let event_loop = EventLoop::new().context("failed to create event loop")?;

        Ok(Self {
            event_loop: Some(event_loop),
            state: AppState {
                window: None,
                engine: None,
                scene: Scene::new(),
                input: InputState::new(),
                controller: WalkController::new(CAMERA_SPEED, MOUSE_SENSITIVITY),
                flythrough: None,
                asset_root,
                init_error: None,
            },
        })
    }

    /// Runs the event loop until the window closes. Initialization
    /// failures inside the loop surface here as an error, so the process
    /// exits non-zero.
    pub fn run(mut self) -> Result<()> {
        let event_loop = self
            .event_loop
            .take()
            .ok_or_else(|| anyhow!("event loop already consumed"))?;
        event_loop.set_control_flow(ControlFlow::Poll);

        event_loop
            .run_app(&mut self.state)
            .context("event loop terminated abnormally")?;

        match self.state.init_error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

impl ApplicationHandler for AppState {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        if let Err(error) = self.initialize(event_loop) {
            log::error!("initialization failed: {error:?}");
            self.init_error = Some(error);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                if matches!(
                    event.physical_key,
                    PhysicalKey::Code(KeyCode::Escape)
                ) {
                    event_loop.exit();
                    return;
                }
                self.input.handle_key_event(&event);
            }
            WindowEvent::Resized(PhysicalSize { width, height }) => {
                if let Some(engine) = self.engine.as_mut() {
                    engine.resize(width, height);
                }
            }
            WindowEvent::RedrawRequested => {
                self.tick();
            }
            _ => (),
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: winit::event::DeviceEvent,
    ) {
        if let winit::event::DeviceEvent::MouseMotion { delta } = event {
            self.input.accumulate_mouse(delta);
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

impl AppState {
    fn initialize(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attributes = WindowAttributes::default()
            .with_title(WINDOW_TITLE)
            .with_inner_size(LogicalSize::new(WINDOW_WIDTH, WINDOW_HEIGHT));

        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .context("failed to create window")?,
        );
        let (width, height) = window.inner_size().into();

        let engine = pollster::block_on(RenderEngine::new(window.clone(), width, height))?;

        let asset_root = self.asset_root.clone();
        self.scene
            .load_park_assets(&asset_root)
            .context("failed to load park models")?;
        self.scene
            .init_gpu_resources(engine.device(), engine.object_layout());

        log::info!("scene ready: {} objects loaded", self.scene.objects.len());

        self.window = Some(window);
        self.engine = Some(engine);
        Ok(())
    }

    /// One frame of the orchestrated loop.
    fn tick(&mut self) {
        if self.engine.is_none() {
            return;
        }

        // Either consume one fly-through sample or process live input.
        // The fly-through is checked every frame, so close/quit stays
        // responsive during playback.
        let mut finished = false;
        if let Some(fly) = self.flythrough.as_mut() {
            match fly.advance() {
                Some(sample) => {
                    self.scene.camera =
                        WalkCamera::new(sample, FlyThrough::look_target(), Vector3::unit_y());
                    // Scripted flight replaces normal camera control.
                    self.input.drain_pressed();
                    self.input.take_mouse_delta();
                }
                None => finished = true,
            }
        } else {
            self.process_input();
        }
        if finished {
            self.flythrough = None;
        }

        self.scene.update();

        let Some(engine) = self.engine.as_mut() else {
            return;
        };
        engine.set_multisampling(self.scene.settings.multisampling);
        engine.prepare_frame(&self.scene);
        engine.render_frame(&self.scene);
    }

    /// Applies the per-frame input effects: edge-triggered toggles, held
    /// movement keys, the held animation key and pointer rotation.
    fn process_input(&mut self) {
        for key in self.input.drain_pressed() {
            match key {
                KeyCode::KeyT => {
                    self.flythrough = Some(FlyThrough::over_park());
                }
                KeyCode::KeyM => {
                    self.scene.settings.wireframe = !self.scene.settings.wireframe;
                }
                KeyCode::KeyN => {
                    self.scene.settings.multisampling = !self.scene.settings.multisampling;
                }
                KeyCode::KeyL => {
                    self.scene.settings.light_mode = self.scene.settings.light_mode.flip();
                }
                KeyCode::KeyF => {
                    self.scene.settings.fog = !self.scene.settings.fog;
                }
                KeyCode::KeyZ => {
                    self.scene.toggle_rain(&mut rand::rng());
                }
                KeyCode::KeyX => {
                    self.scene.settings.wind = !self.scene.settings.wind;
                }
                _ => (),
            }
        }

        if self.input.is_held(KeyCode::KeyC) {
            self.scene.crow.advance();
        }

        self.controller
            .process_held_keys(&self.input, &mut self.scene.camera);
        let delta = self.input.take_mouse_delta();
        self.controller.process_mouse(delta, &mut self.scene.camera);
    }
}
