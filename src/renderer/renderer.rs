// renderer/renderer.rs
use std::path::Path;

use crate::renderer::context::RenderContext;
use crate::renderer::error::RendererResult;
use crate::renderer::frame::FrameData;
use crate::renderer::graph::FrameGraph;
use crate::renderer::passes::{
    CompositeStage, FrameContext, InstanceDraw, IrradianceStage, MaterialStage, RenderStage, ShadowStage,
};
use crate::renderer::resources::ResourceManager;
use crate::renderer::shader::ShaderLibrary;
use crate::scene::{Camera, Scene};
use crate::settings::RenderSettings;

/// Counters for the last rendered frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RendererStats {
    pub frame: u64,
    pub shadow_draws: u32,
    pub irradiance_draws: u32,
    pub material_draws: u32,
    pub composite_draws: u32,
    pub active_lights: usize,
    /// Instances whose model was never uploaded.
    pub skipped_instances: usize,
}

pub struct Renderer {
    context: RenderContext,
    settings: RenderSettings,
    resources: ResourceManager,
    graph: FrameGraph<Box<dyn RenderStage>>,
    stats: RendererStats,
    frame_index: u64,
    layout_warned: bool,
    released: bool,
}

impl Renderer {
    /// Uploads the scene, compiles the shaders and builds the stage graph.
    ///
    /// Light counts are fixed here: lights added to the scene later are not
    /// drawn.
    pub fn initialize(
        context: RenderContext,
        camera: &Camera,
        scene: &Scene,
        shader_path: impl AsRef<Path>,
        settings: RenderSettings,
    ) -> RendererResult<Self> {
        let settings = settings.validate();
        context.check_target_support(settings.output_format.to_wgpu())?;

        let aspect = settings.viewport_aspect();
        if (camera.aspect() - aspect).abs() > 1e-3 {
            log::warn!(
                "Camera aspect {:.3} differs from the {}x{} viewport ({:.3})",
                camera.aspect(),
                settings.resolution.width,
                settings.resolution.height,
                aspect
            );
        }

        let device = &context.device;
        let mut resources = ResourceManager::new(device, &context.queue, scene, &settings);
        resources.ensure_scene_models(device, &context.queue, scene);

        let shaders = ShaderLibrary::load(device, shader_path.as_ref());
        let stages: Vec<Box<dyn RenderStage>> = vec![
            Box::new(ShadowStage::new(device, &shaders, &resources)),
            Box::new(IrradianceStage::new(device, &shaders, &resources)),
            Box::new(MaterialStage::new(device, &shaders, &resources)),
            Box::new(CompositeStage::new(
                device,
                &shaders,
                &resources,
                settings.output_format.to_wgpu(),
            )),
        ];
        let graph = FrameGraph::compile(stages)?;

        log::info!(
            "Renderer ready: {} instances, {} lights, stages {:?}",
            scene.models().len(),
            resources.light_layout.total(),
            graph.labels()
        );

        Ok(Self {
            context,
            settings,
            resources,
            graph,
            stats: RendererStats::default(),
            frame_index: 0,
            layout_warned: false,
            released: false,
        })
    }

    /// Renders one frame into `target`, which must match the configured
    /// resolution and output format.
    pub fn render(&mut self, camera: &Camera, scene: &Scene, target: &wgpu::TextureView) {
        if self.released {
            log::warn!("render called after release; ignored");
            return;
        }

        if !self.resources.light_layout.matches(scene) && !self.layout_warned {
            log::warn!(
                "Scene lights changed since initialization ({:?}); drawing the original slots only",
                self.resources.light_layout
            );
            self.layout_warned = true;
        }

        let data = FrameData::gather(camera, scene, &self.resources.light_layout, &self.settings);
        let device = &self.context.device;
        let queue = &self.context.queue;
        self.resources.upload_frame(device, queue, &data);

        let mut skipped = 0;
        let draws: Vec<InstanceDraw> = scene
            .models()
            .iter()
            .enumerate()
            .filter_map(|(object, instance)| {
                let model = self.resources.models.lookup(instance.model_name());
                if model.is_none() {
                    log::warn!("Model {} was never uploaded; instance skipped", instance.model_name());
                    skipped += 1;
                }
                model.map(|model| InstanceDraw { object, model })
            })
            .collect();

        let mut stats = RendererStats {
            frame: self.frame_index,
            active_lights: data.active_lights(),
            skipped_instances: skipped,
            ..Default::default()
        };

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("FrameEncoder"),
        });
        {
            let mut ctx = FrameContext {
                encoder: &mut encoder,
                resources: &self.resources,
                data: &data,
                draws: &draws,
                target,
                background: self.settings.background_color(),
                stats: &mut stats,
            };
            for stage in self.graph.ordered() {
                stage.record(&mut ctx);
            }
        }
        queue.submit(Some(encoder.finish()));

        log::debug!("Frame {}: {:?}", self.frame_index, stats);
        self.stats = stats;
        self.frame_index += 1;
    }

    /// Destroys every GPU resource the renderer owns. Later frames are ignored.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.resources.destroy();
        self.released = true;
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn last_frame_stats(&self) -> RendererStats {
        self.stats
    }

    /// Number of distinct models uploaded so far.
    pub fn uploaded_models(&self) -> usize {
        self.resources.models.uploads()
    }

    pub fn settings(&self) -> &RenderSettings {
        &self.settings
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.context.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.context.queue
    }

    /// Format the composite pipeline was built for.
    pub fn output_format(&self) -> wgpu::TextureFormat {
        self.settings.output_format.to_wgpu()
    }
}
