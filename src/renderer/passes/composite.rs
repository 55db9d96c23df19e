use crate::renderer::graph::{FrameResource, StageNode};
use crate::renderer::passes::{cleared_color, FrameContext, RenderStage, QUAD_STREAM};
use crate::renderer::pipeline_builder::{PipelineBuilder, ADDITIVE};
use crate::renderer::resources::ResourceManager;
use crate::renderer::shader::{ProgramKind, ShaderLibrary};

/// Sums one full-screen lighting draw per light into the output target.
pub struct CompositeStage {
    pipeline: Option<wgpu::RenderPipeline>,
    lights: usize,
}

impl CompositeStage {
    pub fn new(
        device: &wgpu::Device,
        shaders: &ShaderLibrary,
        resources: &ResourceManager,
        output_format: wgpu::TextureFormat,
    ) -> Self {
        let layouts = &resources.layouts;
        let pipeline = shaders
            .module_for(ProgramKind::Composite, &["vs_main", "fs_main"])
            .map(|module| {
                PipelineBuilder::new(
                    device,
                    "CompositePipeline",
                    module,
                    &[&layouts.gbuffer, &layouts.composite_light],
                )
                .with_vertex_buffer(QUAD_STREAM)
                .with_color_target(output_format, Some(ADDITIVE))
                .build()
            });

        Self {
            pipeline,
            lights: resources.light_layout.total(),
        }
    }
}

impl StageNode for CompositeStage {
    fn label(&self) -> &'static str {
        "composite"
    }

    fn reads(&self) -> Vec<FrameResource> {
        std::iter::once(FrameResource::GBuffer)
            .chain((0..self.lights).map(FrameResource::Irradiance))
            .collect()
    }

    fn writes(&self) -> Vec<FrameResource> {
        vec![FrameResource::Backbuffer]
    }
}

impl RenderStage for CompositeStage {
    fn record(&self, ctx: &mut FrameContext<'_>) {
        let resources = ctx.resources;
        let mut pass = ctx.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("CompositePass"),
            color_attachments: &[cleared_color(ctx.target, ctx.background)],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
        });

        let Some(pipeline) = &self.pipeline else {
            return;
        };
        pass.set_pipeline(pipeline);
        pass.set_bind_group(0, &resources.gbuffer_bind_group, &[]);
        pass.set_vertex_buffer(0, resources.quad.slice(..));

        let mut calls = 0;
        for (slot, light) in resources.lights.iter().enumerate() {
            if !ctx.data.is_active(slot) {
                continue;
            }
            pass.set_bind_group(1, &light.composite_bind_group, &[]);
            pass.draw(0..6, 0..1);
            calls += 1;
        }
        drop(pass);

        ctx.stats.composite_draws += calls;
    }
}
