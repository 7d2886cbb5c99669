//! # Graphics Module
//!
//! Everything the renderer is built from:
//!
//! - **Camera** ([`camera`]) - walkthrough camera, controller and the
//!   scripted fly-through
//! - **Rendering** ([`rendering`]) - render engine, pipelines, shadow
//!   mapping and the instanced rain renderer
//! - **Scene** ([`scene`]) - park objects, animation state and meshes
//! - **Resources** ([`resources`]) - global uniforms and texture helpers

pub mod camera;
pub mod rendering;
pub mod resources;
pub mod scene;

// Re-export commonly used types
pub use camera::walk_camera::WalkCamera;
pub use rendering::render_engine::RenderEngine;
