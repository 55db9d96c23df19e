// renderer/passes/mod.rs
//
// The four frame stages. Each stage owns its pipelines, declares the frame
// resources it reads and writes, and records its own render passes.

pub mod composite;
pub mod irradiance;
pub mod material;
pub mod shadow;

pub use composite::CompositeStage;
pub use irradiance::IrradianceStage;
pub use material::MaterialStage;
pub use shadow::ShadowStage;

use crate::asset::{GpuModel, Handle};
use crate::renderer::frame::FrameData;
use crate::renderer::graph::StageNode;
use crate::renderer::renderer::RendererStats;
use crate::renderer::resources::ResourceManager;

/// A stage that can be placed in the frame graph.
pub trait RenderStage: StageNode {
    /// Records this stage's passes. A stage whose pipeline is unavailable
    /// still clears its outputs.
    fn record(&self, ctx: &mut FrameContext<'_>);
}

/// One scene instance resolved to its uploaded model and object uniform slot.
#[derive(Clone, Copy, Debug)]
pub struct InstanceDraw {
    pub object: usize,
    pub model: Handle<GpuModel>,
}

/// Everything a stage needs while recording one frame.
pub struct FrameContext<'a> {
    pub encoder: &'a mut wgpu::CommandEncoder,
    pub resources: &'a ResourceManager,
    pub data: &'a FrameData,
    pub draws: &'a [InstanceDraw],
    pub target: &'a wgpu::TextureView,
    pub background: wgpu::Color,
    pub stats: &'a mut RendererStats,
}

pub(crate) const POSITION_STREAM: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: 12,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x3,
        offset: 0,
        shader_location: 0,
    }],
};

pub(crate) const NORMAL_STREAM: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: 12,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x3,
        offset: 0,
        shader_location: 1,
    }],
};

pub(crate) const TEXCOORD_STREAM: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: 8,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x2,
        offset: 0,
        shader_location: 2,
    }],
};

pub(crate) const QUAD_STREAM: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: 8,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[wgpu::VertexAttribute {
        format: wgpu::VertexFormat::Float32x2,
        offset: 0,
        shader_location: 0,
    }],
};

/// Bind group slot of the per-instance object uniforms in every scene pipeline.
pub(crate) const OBJECT_GROUP: u32 = 1;
const MATERIAL_GROUP: u32 = 2;

#[derive(Clone, Copy, PartialEq, Eq)]
pub(crate) enum Geometry {
    Positions,
    Shaded,
}

/// Draws every resolved instance in scene order. Returns the draw call count.
pub(crate) fn draw_instances(
    pass: &mut wgpu::RenderPass<'_>,
    resources: &ResourceManager,
    draws: &[InstanceDraw],
    geometry: Geometry,
) -> u32 {
    let mut calls = 0;
    for draw in draws {
        let Some(model) = resources.models.get(draw.model) else {
            continue;
        };
        pass.set_bind_group(
            OBJECT_GROUP,
            &resources.objects.bind_group,
            &[resources.objects.offset(draw.object)],
        );
        for submesh in &model.submeshes {
            pass.set_vertex_buffer(0, submesh.position_buffer().slice(..));
            if geometry == Geometry::Shaded {
                pass.set_vertex_buffer(1, submesh.normal_buffer().slice(..));
                pass.set_vertex_buffer(2, submesh.texcoord_buffer().slice(..));
                pass.set_bind_group(MATERIAL_GROUP, submesh.material_bind_group(), &[]);
            }
            pass.set_index_buffer(submesh.index_buffer().slice(..), wgpu::IndexFormat::Uint32);
            pass.draw_indexed(0..submesh.index_count(), 0, 0..1);
            calls += 1;
        }
    }
    calls
}

pub(crate) fn cleared_color(
    view: &wgpu::TextureView,
    color: wgpu::Color,
) -> Option<wgpu::RenderPassColorAttachment<'_>> {
    Some(wgpu::RenderPassColorAttachment {
        view,
        resolve_target: None,
        depth_slice: None,
        ops: wgpu::Operations {
            load: wgpu::LoadOp::Clear(color),
            store: wgpu::StoreOp::Store,
        },
    })
}

pub(crate) fn cleared_depth(view: &wgpu::TextureView) -> wgpu::RenderPassDepthStencilAttachment<'_> {
    wgpu::RenderPassDepthStencilAttachment {
        view,
        depth_ops: Some(wgpu::Operations {
            load: wgpu::LoadOp::Clear(1.0),
            store: wgpu::StoreOp::Store,
        }),
        stencil_ops: None,
    }
}
