// renderer/uniforms.rs
use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3};

use crate::renderer::lights::LightKind;
use crate::scene::{Attenuation, MaterialDesc};

/// Camera matrices shared by the irradiance and material stages.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct FrameUniform {
    pub view: [[f32; 4]; 4],
    pub proj: [[f32; 4]; 4],
}

impl FrameUniform {
    pub fn new(view: Mat4, proj: Mat4) -> Self {
        Self {
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
        }
    }
}

/// Per-instance matrices, bound with a dynamic offset.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct ObjectUniform {
    pub model: [[f32; 4]; 4],
    pub model_view: [[f32; 4]; 4],
    /// Inverse-transpose of `model_view`, stored as a mat4 for alignment.
    pub normal: [[f32; 4]; 4],
}

impl ObjectUniform {
    pub fn new(model: Mat4, view: Mat4) -> Self {
        let model_view = view * model;
        let normal = Mat3::from_mat4(model_view).inverse().transpose();
        Self {
            model: model.to_cols_array_2d(),
            model_view: model_view.to_cols_array_2d(),
            normal: Mat4::from_mat3(normal).to_cols_array_2d(),
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct MaterialUniform {
    pub ambient: [f32; 4],
    pub diffuse: [f32; 4],
    pub specular: [f32; 4],
    /// x: shininess, y: ambient texture bound, z: diffuse texture bound.
    pub params: [f32; 4],
}

impl MaterialUniform {
    pub fn new(material: &MaterialDesc, has_ambient_texture: bool, has_diffuse_texture: bool) -> Self {
        Self {
            ambient: material.ambient.extend(1.0).to_array(),
            diffuse: material.diffuse.extend(1.0).to_array(),
            specular: material.specular.extend(1.0).to_array(),
            params: [
                material.shininess,
                flag(has_ambient_texture),
                flag(has_diffuse_texture),
                0.0,
            ],
        }
    }
}

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct ShadowViewUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Per-light input of the irradiance stage.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct IrradianceLightUniform {
    /// World space to shadow texture space.
    pub shadow_matrix: [[f32; 4]; 4],
    /// View space. w = 0: direction the light travels; w = 1: light position.
    pub vector: [f32; 4],
    /// x: light kind tag, y: has shadow map, z: depth bias.
    pub params: [f32; 4],
}

impl IrradianceLightUniform {
    pub fn directional(direction_view: Vec3, shadow_matrix: Mat4, depth_bias: f32) -> Self {
        Self {
            shadow_matrix: shadow_matrix.to_cols_array_2d(),
            vector: direction_view.extend(0.0).to_array(),
            params: [LightKind::Sun.shader_tag() as f32, 1.0, depth_bias, 0.0],
        }
    }

    pub fn positional(
        kind: LightKind,
        position_view: Vec3,
        shadow_matrix: Option<Mat4>,
        depth_bias: f32,
    ) -> Self {
        Self {
            shadow_matrix: shadow_matrix.unwrap_or(Mat4::IDENTITY).to_cols_array_2d(),
            vector: position_view.extend(1.0).to_array(),
            params: [
                kind.shader_tag() as f32,
                flag(shadow_matrix.is_some()),
                depth_bias,
                0.0,
            ],
        }
    }
}

/// Per-light input of the composite stage. Vectors are in view space.
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Debug, PartialEq)]
pub struct CompositeLightUniform {
    /// rgb: colour, a: ambient strength (sun only, zero otherwise).
    pub color: [f32; 4],
    /// xyz: direction the light travels, w: cosine of the cone half-angle.
    pub direction: [f32; 4],
    /// xyz: position, w: cone falloff exponent.
    pub position: [f32; 4],
    /// Kc, Kl, Kq, range (0 = unlimited).
    pub attenuation: [f32; 4],
    /// x: light kind tag.
    pub kind: [u32; 4],
}

impl CompositeLightUniform {
    pub fn sun(color: Vec3, ambient: f32, direction_view: Vec3) -> Self {
        Self {
            color: color.extend(ambient).to_array(),
            direction: direction_view.extend(-1.0).to_array(),
            position: [0.0; 4],
            attenuation: [1.0, 0.0, 0.0, 0.0],
            kind: [LightKind::Sun.shader_tag(), 0, 0, 0],
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn spot(
        color: Vec3,
        position_view: Vec3,
        direction_view: Vec3,
        cos_cutoff: f32,
        exponent: f32,
        attenuation: Attenuation,
        range: f32,
    ) -> Self {
        let [kc, kl, kq] = attenuation.to_array();
        Self {
            color: color.extend(0.0).to_array(),
            direction: direction_view.extend(cos_cutoff).to_array(),
            position: position_view.extend(exponent).to_array(),
            attenuation: [kc, kl, kq, range],
            kind: [LightKind::Spot.shader_tag(), 0, 0, 0],
        }
    }

    pub fn point(color: Vec3, position_view: Vec3, attenuation: Attenuation) -> Self {
        let [kc, kl, kq] = attenuation.to_array();
        Self {
            color: color.extend(0.0).to_array(),
            direction: [0.0, 0.0, 0.0, -1.0],
            position: position_view.extend(0.0).to_array(),
            attenuation: [kc, kl, kq, 0.0],
            kind: [LightKind::Point.shader_tag(), 0, 0, 0],
        }
    }
}

fn flag(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Rounds `size` up to the device's dynamic-offset alignment.
pub fn aligned_stride(size: u64, alignment: u64) -> u64 {
    let alignment = alignment.max(1);
    size.div_ceil(alignment) * alignment
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_sizes_match_wgsl_layouts() {
        assert_eq!(std::mem::size_of::<FrameUniform>(), 128);
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 192);
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 64);
        assert_eq!(std::mem::size_of::<ShadowViewUniform>(), 64);
        assert_eq!(std::mem::size_of::<IrradianceLightUniform>(), 96);
        assert_eq!(std::mem::size_of::<CompositeLightUniform>(), 80);
    }

    #[test]
    fn stride_rounds_up_to_alignment() {
        assert_eq!(aligned_stride(192, 256), 256);
        assert_eq!(aligned_stride(256, 256), 256);
        assert_eq!(aligned_stride(257, 256), 512);
        assert_eq!(aligned_stride(64, 0), 64);
    }

    #[test]
    fn normal_matrix_undoes_non_uniform_scale() {
        let model = Mat4::from_scale(Vec3::new(2.0, 1.0, 1.0));
        let uniform = ObjectUniform::new(model, Mat4::IDENTITY);
        let normal = Mat4::from_cols_array_2d(&uniform.normal);
        let n = normal.transform_vector3(Vec3::new(1.0, 1.0, 0.0));
        assert!((n.x - 0.5).abs() < 1e-6);
        assert!((n.y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn only_the_sun_carries_ambient() {
        let sun = CompositeLightUniform::sun(Vec3::ONE, 0.3, Vec3::NEG_Y);
        let point = CompositeLightUniform::point(Vec3::ONE, Vec3::ZERO, Attenuation::NONE);
        assert_eq!(sun.color[3], 0.3);
        assert_eq!(point.color[3], 0.0);
    }

    #[test]
    fn material_flags_textures() {
        let uniform = MaterialUniform::new(&MaterialDesc::default(), false, true);
        assert_eq!(uniform.params[1], 0.0);
        assert_eq!(uniform.params[2], 1.0);
    }
}
