use crate::renderer::error::RendererError;
use crate::renderer::resources::{DEPTH_FORMAT, GBUFFER_FORMATS, IRRADIANCE_FORMAT};

/// Downlevel features the stages rely on. Shadow lookups use comparison samplers.
const REQUIRED_DOWNLEVEL: wgpu::DownlevelFlags = wgpu::DownlevelFlags::COMPARISON_SAMPLERS;

/// Usage every intermediate target needs: drawn by one stage, sampled by a later one.
const TARGET_USAGE: wgpu::TextureUsages =
    wgpu::TextureUsages::RENDER_ATTACHMENT.union(wgpu::TextureUsages::TEXTURE_BINDING);

/// Adapter, device and queue the renderer records into. Windowed hosts build
/// one with [`RenderContext::from_parts`]; tools and tests use
/// [`RenderContext::headless`].
pub struct RenderContext {
    pub adapter: wgpu::Adapter,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
}

impl RenderContext {
    /// Wraps a device the host already created.
    ///
    /// The G-buffer is drawn in one pass, so the device must be requested with
    /// `max_color_attachment_bytes_per_sample` of at least
    /// [`gbuffer_bytes_per_sample`]. The WebGPU default of 32 is too small and
    /// makes [`Renderer::initialize`](super::Renderer::initialize) fail.
    pub fn from_parts(adapter: wgpu::Adapter, device: wgpu::Device, queue: wgpu::Queue) -> Self {
        Self {
            adapter,
            device,
            queue,
        }
    }

    /// Requests an adapter without a surface and a device with enough colour
    /// attachment budget for the G-buffer.
    pub async fn headless() -> Result<Self, RendererError> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await?;

        log::info!("Using adapter: {:?}", adapter.get_info());
        log::info!("Using backend: {:?}", adapter.get_info().backend);

        let required = gbuffer_bytes_per_sample();
        check_attachment_budget(required, adapter.limits().max_color_attachment_bytes_per_sample)?;

        let mut limits = wgpu::Limits::default();
        limits.max_color_attachment_bytes_per_sample =
            limits.max_color_attachment_bytes_per_sample.max(required);

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("Device"),
                required_features: wgpu::Features::empty(),
                required_limits: limits,
                experimental_features: wgpu::ExperimentalFeatures::disabled(),
                memory_hints: wgpu::MemoryHints::Performance,
                trace: wgpu::Trace::Off,
            })
            .await?;

        Ok(Self::from_parts(adapter, device, queue))
    }

    /// Fails if the device cannot draw and sample every target the stages use,
    /// or cannot bind all G-buffer attachments in one pass.
    pub fn check_target_support(&self, output_format: wgpu::TextureFormat) -> Result<(), RendererError> {
        check_attachment_budget(
            gbuffer_bytes_per_sample(),
            self.device.limits().max_color_attachment_bytes_per_sample,
        )?;

        let downlevel = self.adapter.get_downlevel_capabilities();
        if !downlevel.flags.contains(REQUIRED_DOWNLEVEL) {
            return Err(RendererError::MissingDownlevelFlags(
                REQUIRED_DOWNLEVEL.difference(downlevel.flags),
            ));
        }

        let allowed = |format: wgpu::TextureFormat| {
            self.adapter.get_texture_format_features(format).allowed_usages
        };
        let intermediate = GBUFFER_FORMATS
            .into_iter()
            .chain([IRRADIANCE_FORMAT, DEPTH_FORMAT]);
        if let Some(format) = first_unsupported(intermediate, TARGET_USAGE, allowed) {
            return Err(RendererError::UnsupportedTarget {
                format,
                usage: TARGET_USAGE,
            });
        }
        let output_usage = wgpu::TextureUsages::RENDER_ATTACHMENT;
        if let Some(format) = first_unsupported([output_format], output_usage, allowed) {
            return Err(RendererError::UnsupportedTarget {
                format,
                usage: output_usage,
            });
        }
        Ok(())
    }
}

fn check_attachment_budget(required: u32, available: u32) -> Result<(), RendererError> {
    if available < required {
        return Err(RendererError::InsufficientAttachmentBudget {
            required,
            available,
        });
    }
    Ok(())
}

/// First format in `formats` whose allowed usages lack any of `required`.
pub fn first_unsupported(
    formats: impl IntoIterator<Item = wgpu::TextureFormat>,
    required: wgpu::TextureUsages,
    allowed: impl Fn(wgpu::TextureFormat) -> wgpu::TextureUsages,
) -> Option<wgpu::TextureFormat> {
    formats.into_iter().find(|&format| !allowed(format).contains(required))
}

pub fn gbuffer_bytes_per_sample() -> u32 {
    color_attachment_bytes_per_sample(&GBUFFER_FORMATS)
}

/// Per-sample byte cost of binding `formats` as colour attachments together,
/// following wgpu's alignment rules.
pub fn color_attachment_bytes_per_sample(formats: &[wgpu::TextureFormat]) -> u32 {
    formats.iter().fold(0, |total, format| {
        let cost = format.target_pixel_byte_cost().unwrap_or(0);
        let alignment = format.target_component_alignment().unwrap_or(1).max(1);
        total.div_ceil(alignment) * alignment + cost
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::TextureFormat::*;
    use wgpu::TextureUsages;

    #[test]
    fn attachment_cost_aligns_each_target() {
        // 4 bytes, then 8 bytes aligned to 2.
        assert_eq!(color_attachment_bytes_per_sample(&[R32Float, Rgba16Float]), 12);
        assert_eq!(color_attachment_bytes_per_sample(&[]), 0);
    }

    #[test]
    fn gbuffer_exceeds_default_budget() {
        // Six attachments do not fit the 32 byte WebGPU default, so the
        // limit has to be raised explicitly.
        assert_eq!(gbuffer_bytes_per_sample(), 48);
        assert!(gbuffer_bytes_per_sample() > wgpu::Limits::default().max_color_attachment_bytes_per_sample);
    }

    #[test]
    fn small_budget_is_reported_not_panicked() {
        let err = check_attachment_budget(48, 32).unwrap_err();
        assert!(matches!(
            err,
            RendererError::InsufficientAttachmentBudget {
                required: 48,
                available: 32
            }
        ));
        assert!(check_attachment_budget(48, 64).is_ok());
    }

    #[test]
    fn gbuffer_avoids_single_channel_float_targets() {
        // Downlevel GL refuses R32Float/R16Float as render attachments.
        assert!(!GBUFFER_FORMATS.contains(&R32Float));
        assert!(!GBUFFER_FORMATS.contains(&R16Float));
    }

    #[test]
    fn unrenderable_format_is_found() {
        let downlevel_gl = |format: wgpu::TextureFormat| match format {
            R32Float => TextureUsages::TEXTURE_BINDING | TextureUsages::COPY_DST,
            _ => TextureUsages::all(),
        };

        let with_r32 = [Rgba16Float, R32Float, Rgba8Unorm];
        assert_eq!(first_unsupported(with_r32, TARGET_USAGE, downlevel_gl), Some(R32Float));

        let intermediate = GBUFFER_FORMATS.into_iter().chain([IRRADIANCE_FORMAT, DEPTH_FORMAT]);
        assert_eq!(first_unsupported(intermediate, TARGET_USAGE, downlevel_gl), None);
    }

    #[test]
    fn partial_usage_is_not_enough() {
        let render_only = |_: wgpu::TextureFormat| TextureUsages::RENDER_ATTACHMENT;
        assert_eq!(
            first_unsupported([Rgba8Unorm], TARGET_USAGE, render_only),
            Some(Rgba8Unorm)
        );
    }
}
