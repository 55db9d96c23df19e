use crate::renderer::graph::{FrameResource, StageNode};
use crate::renderer::passes::{
    cleared_color, cleared_depth, draw_instances, FrameContext, Geometry, RenderStage, NORMAL_STREAM,
    POSITION_STREAM, TEXCOORD_STREAM,
};
use crate::renderer::pipeline_builder::PipelineBuilder;
use crate::renderer::resources::{ResourceManager, DEPTH_FORMAT, GBUFFER_FORMATS};
use crate::renderer::shader::{ProgramKind, ShaderLibrary};

/// Fills the G-buffer with surface attributes seen from the camera.
pub struct MaterialStage {
    pipeline: Option<wgpu::RenderPipeline>,
}

impl MaterialStage {
    pub fn new(device: &wgpu::Device, shaders: &ShaderLibrary, resources: &ResourceManager) -> Self {
        let layouts = &resources.layouts;
        let pipeline = shaders
            .module_for(ProgramKind::Material, &["vs_main", "fs_main"])
            .map(|module| {
                PipelineBuilder::new(
                    device,
                    "MaterialPipeline",
                    module,
                    &[&layouts.frame, &resources.objects.bind_layout, &layouts.material],
                )
                .with_vertex_buffer(POSITION_STREAM)
                .with_vertex_buffer(NORMAL_STREAM)
                .with_vertex_buffer(TEXCOORD_STREAM)
                .with_color_targets(&GBUFFER_FORMATS)
                .with_depth(DEPTH_FORMAT, true, wgpu::CompareFunction::Less)
                .build()
            });
        Self { pipeline }
    }
}

impl StageNode for MaterialStage {
    fn label(&self) -> &'static str {
        "material"
    }

    fn reads(&self) -> Vec<FrameResource> {
        Vec::new()
    }

    fn writes(&self) -> Vec<FrameResource> {
        vec![FrameResource::GBuffer]
    }
}

impl RenderStage for MaterialStage {
    fn record(&self, ctx: &mut FrameContext<'_>) {
        let resources = ctx.resources;
        let attachments: Vec<Option<wgpu::RenderPassColorAttachment>> = resources
            .gbuffer
            .iter()
            .map(|target| cleared_color(&target.view, wgpu::Color::TRANSPARENT))
            .collect();

        let mut pass = ctx.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("MaterialPass"),
            color_attachments: &attachments,
            depth_stencil_attachment: Some(cleared_depth(&resources.scene_depth.view)),
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let Some(pipeline) = &self.pipeline else {
            return;
        };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &resources.frame_bind_group, &[]);
        let calls = draw_instances(&mut pass, resources, ctx.draws, Geometry::Shaded);
        drop(pass);

        ctx.stats.material_draws += calls;
    }
}
