//! GPU resource management: the global uniform buffer shared by every
//! pipeline and the texture helpers for depth and shadow targets.

pub mod global_bindings;
pub mod texture_resource;

pub use global_bindings::{GlobalBindings, GlobalUbo, LightMode, LightingConfig};
pub use texture_resource::TextureResource;
