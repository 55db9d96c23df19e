use crate::renderer::graph::{FrameResource, StageNode};
use crate::renderer::passes::{cleared_depth, draw_instances, FrameContext, Geometry, RenderStage, POSITION_STREAM};
use crate::renderer::pipeline_builder::PipelineBuilder;
use crate::renderer::resources::{ResourceManager, DEPTH_FORMAT};
use crate::renderer::shader::{ProgramKind, ShaderLibrary};

/// Depth from the point of view of the sun and of every spotlight.
pub struct ShadowStage {
    pipeline: Option<wgpu::RenderPipeline>,
    casters: usize,
}

impl ShadowStage {
    pub fn new(device: &wgpu::Device, shaders: &ShaderLibrary, resources: &ResourceManager) -> Self {
        let pipeline = shaders
            .module_for(ProgramKind::Shadow, &["vs_main"])
            .map(|module| {
                PipelineBuilder::new(
                    device,
                    "ShadowPipeline",
                    module,
                    &[&resources.shadow_views.bind_layout, &resources.objects.bind_layout],
                )
                .depth_only()
                .with_vertex_buffer(POSITION_STREAM)
                .with_depth(DEPTH_FORMAT, true, wgpu::CompareFunction::Less)
                .build()
            });

        Self {
            pipeline,
            casters: resources.light_layout.shadow_casters(),
        }
    }
}

impl StageNode for ShadowStage {
    fn label(&self) -> &'static str {
        "shadow"
    }

    fn reads(&self) -> Vec<FrameResource> {
        Vec::new()
    }

    fn writes(&self) -> Vec<FrameResource> {
        (0..self.casters).map(FrameResource::ShadowMap).collect()
    }
}

impl RenderStage for ShadowStage {
    fn record(&self, ctx: &mut FrameContext<'_>) {
        let resources = ctx.resources;
        let mut calls = 0;

        for (slot, shadow_map) in resources.shadow_maps.iter().enumerate() {
            let mut pass = ctx.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("ShadowPass"),
                color_attachments: &[],
                depth_stencil_attachment: Some(cleared_depth(&shadow_map.view)),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let Some(pipeline) = &self.pipeline else {
                continue;
            };
            if !ctx.data.is_active(slot) {
                continue;
            }

            pass.set_pipeline(pipeline);
            pass.set_bind_group(
                0,
                &resources.shadow_views.bind_group,
                &[resources.shadow_views.offset(slot)],
            );
            calls += draw_instances(&mut pass, resources, ctx.draws, Geometry::Positions);
        }

        ctx.stats.shadow_draws += calls;
    }
}
