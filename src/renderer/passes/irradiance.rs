use crate::renderer::graph::{FrameResource, StageNode};
use crate::renderer::lights::LightKind;
use crate::renderer::passes::{
    cleared_color, cleared_depth, draw_instances, FrameContext, Geometry, RenderStage, POSITION_STREAM,
};
use crate::renderer::pipeline_builder::PipelineBuilder;
use crate::renderer::resources::{ResourceManager, DEPTH_FORMAT, IRRADIANCE_FORMAT};
use crate::renderer::shader::{ProgramKind, ShaderLibrary};

/// Per light, the camera-space direction towards the light and its shadow
/// visibility, rendered from the camera.
pub struct IrradianceStage {
    shadowed: Option<wgpu::RenderPipeline>,
    unshadowed: Option<wgpu::RenderPipeline>,
    casters: usize,
    lights: usize,
}

impl IrradianceStage {
    pub fn new(device: &wgpu::Device, shaders: &ShaderLibrary, resources: &ResourceManager) -> Self {
        let layouts = &resources.layouts;
        let build = |entry: &'static str, light_layout: &wgpu::BindGroupLayout, label: &'static str| {
            shaders
                .module_for(ProgramKind::Irradiance, &["vs_main", entry])
                .map(|module| {
                    PipelineBuilder::new(
                        device,
                        label,
                        module,
                        &[&layouts.frame, &resources.objects.bind_layout, light_layout],
                    )
                    .with_fragment_entry(entry)
                    .with_vertex_buffer(POSITION_STREAM)
                    .with_color_target(IRRADIANCE_FORMAT, None)
                    .with_depth(DEPTH_FORMAT, true, wgpu::CompareFunction::Less)
                    .build()
                })
        };

        let light_layout = resources.light_layout;
        let shadowed = build("fs_shadowed", &layouts.shadowed_light, "IrradianceShadowedPipeline");
        // Point lights only exist in the unshadowed variant.
        let unshadowed = if light_layout.points > 0 {
            build("fs_unshadowed", &layouts.unshadowed_light, "IrradianceUnshadowedPipeline")
        } else {
            None
        };

        Self {
            shadowed,
            unshadowed,
            casters: light_layout.shadow_casters(),
            lights: light_layout.total(),
        }
    }

    fn pipeline_for(&self, kind: LightKind) -> Option<&wgpu::RenderPipeline> {
        if kind.casts_shadow() {
            self.shadowed.as_ref()
        } else {
            self.unshadowed.as_ref()
        }
    }
}

impl StageNode for IrradianceStage {
    fn label(&self) -> &'static str {
        "irradiance"
    }

    fn reads(&self) -> Vec<FrameResource> {
        (0..self.casters).map(FrameResource::ShadowMap).collect()
    }

    fn writes(&self) -> Vec<FrameResource> {
        (0..self.lights).map(FrameResource::Irradiance).collect()
    }
}

impl RenderStage for IrradianceStage {
    fn record(&self, ctx: &mut FrameContext<'_>) {
        let resources = ctx.resources;
        let mut calls = 0;

        for (slot, light) in resources.lights.iter().enumerate() {
            let mut pass = ctx.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("IrradiancePass"),
                color_attachments: &[cleared_color(&light.irradiance.view, wgpu::Color::TRANSPARENT)],
                depth_stencil_attachment: Some(cleared_depth(&resources.scene_depth.view)),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            let Some(pipeline) = self.pipeline_for(light.kind) else {
                continue;
            };
            if !ctx.data.is_active(slot) {
                continue;
            }

            pass.set_pipeline(pipeline);
            pass.set_bind_group(0, &resources.frame_bind_group, &[]);
            pass.set_bind_group(2, &light.irradiance_bind_group, &[]);
            calls += draw_instances(&mut pass, resources, ctx.draws, Geometry::Positions);
        }

        ctx.stats.irradiance_draws += calls;
    }
}
