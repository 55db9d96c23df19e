use log::{info, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSettings {
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default = "RenderSettings::default_shadow_map_size")]
    pub shadow_map_size: u32,
    /// Half-width of the sun's orthographic shadow volume.
    #[serde(default = "RenderSettings::default_sun_shadow_extent")]
    pub sun_shadow_extent: f32,
    /// Distance of the sun's shadow eye from the origin.
    #[serde(default = "RenderSettings::default_sun_shadow_distance")]
    pub sun_shadow_distance: f32,
    #[serde(default = "RenderSettings::default_shadow_depth_bias")]
    pub shadow_depth_bias: f32,
    #[serde(default)]
    pub output_format: OutputFormat,
    #[serde(default = "RenderSettings::default_background")]
    pub background: [f32; 4],
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            shadow_map_size: Self::default_shadow_map_size(),
            sun_shadow_extent: Self::default_sun_shadow_extent(),
            sun_shadow_distance: Self::default_sun_shadow_distance(),
            shadow_depth_bias: Self::default_shadow_depth_bias(),
            output_format: OutputFormat::default(),
            background: Self::default_background(),
        }
    }
}

impl RenderSettings {
    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        use std::fs;

        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<RenderSettings>(&contents) {
                Ok(settings) => {
                    info!("Loaded render settings from {:?}", path);
                    settings.validate()
                }
                Err(err) => {
                    warn!(
                        "Failed to parse {:?} ({}). Falling back to default render settings.",
                        path, err
                    );
                    RenderSettings::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Render settings file {:?} not found. Using default settings.",
                    path
                );
                RenderSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default render settings.",
                    path, err
                );
                RenderSettings::default()
            }
        }
    }

    pub fn validate(mut self) -> Self {
        if self.shadow_map_size == 0 {
            warn!("Shadow map size must be greater than zero. Using default value.");
            self.shadow_map_size = Self::default_shadow_map_size();
        }

        if self.resolution.width == 0 || self.resolution.height == 0 {
            warn!("Resolution must be greater than zero. Using default resolution.");
            self.resolution = Resolution::default();
        }

        if !(self.sun_shadow_extent.is_finite() && self.sun_shadow_extent > 0.0) {
            warn!("Sun shadow extent must be positive. Using default value.");
            self.sun_shadow_extent = Self::default_sun_shadow_extent();
        }

        if !(self.sun_shadow_distance.is_finite() && self.sun_shadow_distance > 0.0) {
            warn!("Sun shadow distance must be positive. Using default value.");
            self.sun_shadow_distance = Self::default_sun_shadow_distance();
        }

        if !(self.shadow_depth_bias.is_finite() && self.shadow_depth_bias >= 0.0) {
            warn!("Shadow depth bias must be non-negative. Using default value.");
            self.shadow_depth_bias = Self::default_shadow_depth_bias();
        }

        self
    }

    pub fn viewport_aspect(&self) -> f32 {
        self.resolution.width as f32 / self.resolution.height.max(1) as f32
    }

    pub fn background_color(&self) -> wgpu::Color {
        let [r, g, b, a] = self.background;
        wgpu::Color {
            r: r as f64,
            g: g as f64,
            b: b as f64,
            a: a as f64,
        }
    }

    const fn default_shadow_map_size() -> u32 {
        2048
    }

    const fn default_sun_shadow_extent() -> f32 {
        25.0
    }

    const fn default_sun_shadow_distance() -> f32 {
        50.0
    }

    const fn default_shadow_depth_bias() -> f32 {
        0.005
    }

    const fn default_background() -> [f32; 4] {
        [0.0, 0.0, 0.0, 1.0]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
        }
    }
}

/// Colour format of the composite target.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    #[default]
    Rgba8UnormSrgb,
    Rgba8Unorm,
    Bgra8UnormSrgb,
    Bgra8Unorm,
    Rgba16Float,
}

impl OutputFormat {
    pub fn to_wgpu(self) -> wgpu::TextureFormat {
        match self {
            OutputFormat::Rgba8UnormSrgb => wgpu::TextureFormat::Rgba8UnormSrgb,
            OutputFormat::Rgba8Unorm => wgpu::TextureFormat::Rgba8Unorm,
            OutputFormat::Bgra8UnormSrgb => wgpu::TextureFormat::Bgra8UnormSrgb,
            OutputFormat::Bgra8Unorm => wgpu::TextureFormat::Bgra8Unorm,
            OutputFormat::Rgba16Float => wgpu::TextureFormat::Rgba16Float,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn invalid_settings() -> RenderSettings {
        RenderSettings {
            resolution: Resolution {
                width: 0,
                height: 0,
            },
            shadow_map_size: 0,
            sun_shadow_extent: -1.0,
            sun_shadow_distance: f32::NAN,
            shadow_depth_bias: -0.5,
            output_format: OutputFormat::Rgba8Unorm,
            background: [0.1, 0.2, 0.3, 1.0],
        }
    }

    #[test]
    fn validate_replaces_invalid_values_with_defaults() {
        let validated = invalid_settings().validate();
        let defaults = RenderSettings::default();

        assert_eq!(validated.shadow_map_size, defaults.shadow_map_size);
        assert_eq!(validated.resolution, Resolution::default());
        assert_eq!(validated.sun_shadow_extent, defaults.sun_shadow_extent);
        assert_eq!(validated.sun_shadow_distance, defaults.sun_shadow_distance);
        assert_eq!(validated.shadow_depth_bias, defaults.shadow_depth_bias);
        assert_eq!(validated.output_format, OutputFormat::Rgba8Unorm);
    }

    #[test]
    fn validate_preserves_valid_values() {
        let valid = RenderSettings {
            resolution: Resolution {
                width: 1920,
                height: 1080,
            },
            shadow_map_size: 1024,
            sun_shadow_extent: 10.0,
            sun_shadow_distance: 20.0,
            shadow_depth_bias: 0.0,
            ..RenderSettings::default()
        };

        let validated = valid.clone().validate();

        assert_eq!(validated.shadow_map_size, 1024);
        assert_eq!(validated.resolution, valid.resolution);
        assert_eq!(validated.sun_shadow_extent, 10.0);
        assert_eq!(validated.sun_shadow_distance, 20.0);
        assert_eq!(validated.shadow_depth_bias, 0.0);
    }

    #[test]
    fn missing_fields_take_defaults() {
        let parsed: RenderSettings =
            serde_json::from_str(r#"{ "resolution": { "width": 320, "height": 200 }, "output_format": "bgra8_unorm" }"#)
                .expect("parse");
        assert_eq!(parsed.resolution.width, 320);
        assert_eq!(parsed.output_format.to_wgpu(), wgpu::TextureFormat::Bgra8Unorm);
        assert_eq!(parsed.shadow_map_size, RenderSettings::default().shadow_map_size);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let settings = RenderSettings::load_from_path("definitely/not/here.json");
        assert_eq!(settings.resolution, Resolution::default());
    }

    #[test]
    fn viewport_aspect_uses_resolution() {
        let settings = RenderSettings::default();
        assert!((settings.viewport_aspect() - 640.0 / 480.0).abs() < 1e-6);
    }
}
