// src/wgpu_utils/mod.rs
//! Small wgpu helpers.

pub mod uniform_buffer;

pub use uniform_buffer::UniformBuffer;
