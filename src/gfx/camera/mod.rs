pub mod camera_controller;
pub mod flythrough;
pub mod walk_camera;

// Re-export main types
pub use camera_controller::WalkController;
pub use flythrough::FlyThrough;
pub use walk_camera::{MoveDirection, WalkCamera, OPENGL_TO_WGPU_MATRIX};
