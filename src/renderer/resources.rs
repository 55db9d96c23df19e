// renderer/resources.rs
//
// GPU resources owned by the renderer. Per-light arrays are sized once from
// the light layout captured at initialization; models are uploaded lazily,
// once per identity.

use std::mem;

use wgpu::util::DeviceExt;

use crate::asset::{GpuModel, Handle, MaterialBinding, ModelCache};
use crate::renderer::buffers::DynamicUniformBuffer;
use crate::renderer::frame::FrameData;
use crate::renderer::lights::{LightKind, LightLayout, PerLight};
use crate::renderer::texture::Texture;
use crate::renderer::uniforms::{
    CompositeLightUniform, FrameUniform, IrradianceLightUniform, ObjectUniform, ShadowViewUniform,
};
use crate::scene::{Model, Scene};
use crate::settings::RenderSettings;

/// Normal, ambient, diffuse, specular, specular exponent, position.
///
/// The exponent lives in the red channel of a half-float target: single
/// channel float targets are not renderable on downlevel adapters.
pub const GBUFFER_FORMATS: [wgpu::TextureFormat; 6] = [
    wgpu::TextureFormat::Rgba16Float,
    wgpu::TextureFormat::Rgba8Unorm,
    wgpu::TextureFormat::Rgba8Unorm,
    wgpu::TextureFormat::Rgba8Unorm,
    wgpu::TextureFormat::Rgba16Float,
    wgpu::TextureFormat::Rgba16Float,
];

const GBUFFER_LABELS: [&str; 6] = [
    "GBufferNormal",
    "GBufferAmbient",
    "GBufferDiffuse",
    "GBufferSpecular",
    "GBufferExponent",
    "GBufferPosition",
];

pub const IRRADIANCE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba16Float;
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Two triangles covering clip space.
const FULLSCREEN_QUAD: [[f32; 2]; 6] = [
    [-1.0, -1.0],
    [1.0, -1.0],
    [1.0, 1.0],
    [-1.0, -1.0],
    [1.0, 1.0],
    [-1.0, 1.0],
];

/// A 2D texture rendered into by one stage and read by later ones.
pub struct RenderTarget {
    texture: wgpu::Texture,
    pub view: wgpu::TextureView,
}

impl RenderTarget {
    fn new(
        device: &wgpu::Device,
        label: &str,
        width: u32,
        height: u32,
        format: wgpu::TextureFormat,
    ) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { texture, view }
    }

    fn destroy(&self) {
        self.texture.destroy();
    }
}

/// Bind group layouts shared by the stage pipelines.
pub struct BindLayouts {
    pub frame: wgpu::BindGroupLayout,
    pub material: wgpu::BindGroupLayout,
    pub shadowed_light: wgpu::BindGroupLayout,
    pub unshadowed_light: wgpu::BindGroupLayout,
    pub gbuffer: wgpu::BindGroupLayout,
    pub composite_light: wgpu::BindGroupLayout,
}

impl BindLayouts {
    fn new(device: &wgpu::Device) -> Self {
        let frame = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("FrameLayout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT)],
        });

        let material = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("MaterialLayout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                texture_entry(1, wgpu::TextureSampleType::Float { filterable: true }),
                texture_entry(2, wgpu::TextureSampleType::Float { filterable: true }),
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let shadowed_light = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("ShadowedLightLayout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                texture_entry(1, wgpu::TextureSampleType::Depth),
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                    count: None,
                },
            ],
        });

        let unshadowed_light = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("UnshadowedLightLayout"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::FRAGMENT)],
        });

        let unfilterable = wgpu::TextureSampleType::Float { filterable: false };
        let gbuffer_entries: Vec<wgpu::BindGroupLayoutEntry> = (0..GBUFFER_FORMATS.len() as u32)
            .map(|binding| texture_entry(binding, unfilterable))
            .collect();
        let gbuffer = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("GBufferLayout"),
            entries: &gbuffer_entries,
        });

        let composite_light = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("CompositeLightLayout"),
            entries: &[
                uniform_entry(0, wgpu::ShaderStages::FRAGMENT),
                texture_entry(1, unfilterable),
            ],
        });

        Self {
            frame,
            material,
            shadowed_light,
            unshadowed_light,
            gbuffer,
            composite_light,
        }
    }
}

fn uniform_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
        },
        count: None,
    }
}

fn texture_entry(binding: u32, sample_type: wgpu::TextureSampleType) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type,
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

/// Everything allocated for one light slot.
pub struct LightSlot {
    pub kind: LightKind,
    pub irradiance: RenderTarget,
    irradiance_uniform: wgpu::Buffer,
    pub irradiance_bind_group: wgpu::BindGroup,
    composite_uniform: wgpu::Buffer,
    pub composite_bind_group: wgpu::BindGroup,
}

impl LightSlot {
    fn destroy(&self) {
        self.irradiance.destroy();
        self.irradiance_uniform.destroy();
        self.composite_uniform.destroy();
    }
}

pub struct ResourceManager {
    pub layouts: BindLayouts,
    pub light_layout: LightLayout,
    pub models: ModelCache<GpuModel>,
    frame_uniform: wgpu::Buffer,
    pub frame_bind_group: wgpu::BindGroup,
    pub objects: DynamicUniformBuffer<ObjectUniform>,
    pub shadow_views: DynamicUniformBuffer<ShadowViewUniform>,
    pub shadow_maps: PerLight<RenderTarget>,
    pub lights: PerLight<LightSlot>,
    pub gbuffer: Vec<RenderTarget>,
    pub gbuffer_bind_group: wgpu::BindGroup,
    pub scene_depth: RenderTarget,
    pub quad: wgpu::Buffer,
    material_sampler: wgpu::Sampler,
    white: Texture,
}

impl ResourceManager {
    pub fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        scene: &Scene,
        settings: &RenderSettings,
    ) -> Self {
        let layouts = BindLayouts::new(device);
        let light_layout = LightLayout::from_scene(scene);
        let (width, height) = (settings.resolution.width, settings.resolution.height);

        let frame_uniform = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("FrameUniform"),
            size: mem::size_of::<FrameUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("FrameBindGroup"),
            layout: &layouts.frame,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_uniform.as_entire_binding(),
            }],
        });

        let objects = DynamicUniformBuffer::new(
            device,
            "ObjectUniforms",
            wgpu::ShaderStages::VERTEX,
            scene.models().len(),
        );
        let shadow_views = DynamicUniformBuffer::new(
            device,
            "ShadowViewUniforms",
            wgpu::ShaderStages::VERTEX,
            light_layout.shadow_casters(),
        );

        let shadow_size = settings.shadow_map_size;
        let shadow_maps = PerLight::allocate(light_layout.shadow_casters(), |slot| {
            RenderTarget::new(
                device,
                &format!("ShadowMap{slot}"),
                shadow_size,
                shadow_size,
                DEPTH_FORMAT,
            )
        });

        let shadow_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("ShadowSampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            compare: Some(wgpu::CompareFunction::LessEqual),
            ..Default::default()
        });

        let lights = PerLight::allocate(light_layout.total(), |slot| {
            let kind = light_layout.kind(slot).unwrap_or(LightKind::Point);
            let irradiance = RenderTarget::new(
                device,
                &format!("Irradiance{slot}"),
                width,
                height,
                IRRADIANCE_FORMAT,
            );

            let irradiance_uniform = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("IrradianceLight{slot}")),
                size: mem::size_of::<IrradianceLightUniform>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let shadow_map = light_layout
                .shadow_index(slot)
                .and_then(|index| shadow_maps.get(index));
            let irradiance_bind_group = match shadow_map {
                Some(shadow_map) => device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("IrradianceLight{slot}")),
                    layout: &layouts.shadowed_light,
                    entries: &[
                        wgpu::BindGroupEntry {
                            binding: 0,
                            resource: irradiance_uniform.as_entire_binding(),
                        },
                        wgpu::BindGroupEntry {
                            binding: 1,
                            resource: wgpu::BindingResource::TextureView(&shadow_map.view),
                        },
                        wgpu::BindGroupEntry {
                            binding: 2,
                            resource: wgpu::BindingResource::Sampler(&shadow_sampler),
                        },
                    ],
                }),
                None => device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("IrradianceLight{slot}")),
                    layout: &layouts.unshadowed_light,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: irradiance_uniform.as_entire_binding(),
                    }],
                }),
            };

            let composite_uniform = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some(&format!("CompositeLight{slot}")),
                size: mem::size_of::<CompositeLightUniform>() as u64,
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            let composite_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some(&format!("CompositeLight{slot}")),
                layout: &layouts.composite_light,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: composite_uniform.as_entire_binding(),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::TextureView(&irradiance.view),
                    },
                ],
            });

            LightSlot {
                kind,
                irradiance,
                irradiance_uniform,
                irradiance_bind_group,
                composite_uniform,
                composite_bind_group,
            }
        });

        let gbuffer: Vec<RenderTarget> = GBUFFER_FORMATS
            .iter()
            .zip(GBUFFER_LABELS)
            .map(|(format, label)| RenderTarget::new(device, label, width, height, *format))
            .collect();
        let gbuffer_entries: Vec<wgpu::BindGroupEntry> = gbuffer
            .iter()
            .enumerate()
            .map(|(binding, target)| wgpu::BindGroupEntry {
                binding: binding as u32,
                resource: wgpu::BindingResource::TextureView(&target.view),
            })
            .collect();
        let gbuffer_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("GBufferBindGroup"),
            layout: &layouts.gbuffer,
            entries: &gbuffer_entries,
        });

        let scene_depth = RenderTarget::new(device, "SceneDepth", width, height, DEPTH_FORMAT);

        let quad = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("FullscreenQuad"),
            contents: bytemuck::cast_slice(&FULLSCREEN_QUAD),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let material_sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("MaterialSampler"),
            address_mode_u: wgpu::AddressMode::Repeat,
            address_mode_v: wgpu::AddressMode::Repeat,
            address_mode_w: wgpu::AddressMode::Repeat,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });
        let white = Texture::white(device, queue);

        log::info!(
            "Allocated frame resources: {}x{} viewport, {} shadow maps ({}px), {} irradiance targets",
            width,
            height,
            shadow_maps.len(),
            shadow_size,
            lights.len()
        );

        Self {
            layouts,
            light_layout,
            models: ModelCache::new(),
            frame_uniform,
            frame_bind_group,
            objects,
            shadow_views,
            shadow_maps,
            lights,
            gbuffer,
            gbuffer_bind_group,
            scene_depth,
            quad,
            material_sampler,
            white,
        }
    }

    /// Uploads `model` unless a model with the same identity already is.
    pub fn ensure_model(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        model: &Model,
    ) -> Handle<GpuModel> {
        let binding = MaterialBinding {
            layout: &self.layouts.material,
            sampler: &self.material_sampler,
            fallback: &self.white,
        };
        self.models
            .get_or_insert_with(&model.name, || GpuModel::upload(device, queue, model, &binding))
    }

    /// Uploads every model the scene references.
    pub fn ensure_scene_models(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, scene: &Scene) {
        for instance in scene.models() {
            self.ensure_model(device, queue, &instance.model);
        }
        log::info!(
            "{} instances share {} uploaded models",
            scene.models().len(),
            self.models.len()
        );
    }

    /// Writes this frame's uniform values. Inactive light slots keep their
    /// previous contents; no stage reads them.
    pub fn upload_frame(&mut self, device: &wgpu::Device, queue: &wgpu::Queue, data: &FrameData) {
        queue.write_buffer(&self.frame_uniform, 0, bytemuck::bytes_of(&data.frame));
        self.objects.write(device, queue, &data.objects);

        let views: Vec<ShadowViewUniform> = data
            .shadow_views
            .iter()
            .map(|view| view.unwrap_or_else(bytemuck::Zeroable::zeroed))
            .collect();
        self.shadow_views.write(device, queue, &views);

        for (slot, light) in self.lights.iter().enumerate() {
            if let Some(Some(uniform)) = data.irradiance.get(slot) {
                queue.write_buffer(&light.irradiance_uniform, 0, bytemuck::bytes_of(uniform));
            }
            if let Some(Some(uniform)) = data.composite.get(slot) {
                queue.write_buffer(&light.composite_uniform, 0, bytemuck::bytes_of(uniform));
            }
        }
    }

    pub fn destroy(&mut self) {
        for model in self.models.iter() {
            model.destroy();
        }
        self.models.clear();
        self.frame_uniform.destroy();
        self.objects.destroy();
        self.shadow_views.destroy();
        for shadow_map in self.shadow_maps.iter() {
            shadow_map.destroy();
        }
        for light in self.lights.iter() {
            light.destroy();
        }
        for target in &self.gbuffer {
            target.destroy();
        }
        self.scene_depth.destroy();
        self.quad.destroy();
        self.white.destroy();
        log::info!("Released renderer resources");
    }
}
