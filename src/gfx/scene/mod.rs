//! Scene management: the park objects, their transforms and animation
//! state, and the vertex/mesh structures they render with.

pub mod object;
pub mod scene;
pub mod vertex;

// Re-export main types
pub use object::{DrawObject, Mesh, Object, ObjectUniform};
pub use scene::{AssetError, CrowAnimation, Scene, SceneSettings};
pub use vertex::Vertex3D;
