pub mod buffers;
pub mod context;
pub mod error;
pub mod frame;
pub mod graph;
pub mod lights;
pub mod passes;
pub mod pipeline_builder;
pub mod readback;
pub mod renderer;
pub mod resources;
pub mod shader;
pub mod shadows;
pub mod texture;
pub mod uniforms;

pub use context::RenderContext;
pub use error::{GraphError, ReadbackError, RendererError, RendererResult};
pub use frame::FrameData;
pub use graph::{FrameGraph, FrameResource, StageNode};
pub use lights::{LightKind, LightLayout, PerLight};
pub use readback::OffscreenTarget;
pub use renderer::{Renderer, RendererStats};
pub use shader::{ProgramKind, ShaderLibrary};
