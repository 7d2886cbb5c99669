pub mod pipeline_manager;
pub mod rain_renderer;
pub mod render_engine;
pub mod shadow;

pub use pipeline_manager::{PipelineConfig, PipelineManager};
pub use rain_renderer::RainRenderer;
pub use render_engine::RenderEngine;
pub use shadow::{light_space_matrix, SHADOW_MAP_SIZE};
