// renderer/shadows.rs
//
// Light-space matrices for the shadow and irradiance stages.

use glam::{Mat4, Vec3, Vec4};

use crate::scene::{DirectionalLight, SpotLight};

/// `|dot(direction, Y)|` above which Y is too close to the view axis to be
/// used as the up vector.
pub const VERTICAL_TOLERANCE: f32 = 0.99;

const SPOT_NEAR: f32 = 0.1;
const SUN_NEAR: f32 = 0.1;

/// Maps clip space to shadow-map texture space: xy from [-1,1] to [0,1] with
/// y flipped, depth left in [0,1].
pub const BIAS: Mat4 = Mat4::from_cols(
    Vec4::new(0.5, 0.0, 0.0, 0.0),
    Vec4::new(0.0, -0.5, 0.0, 0.0),
    Vec4::new(0.0, 0.0, 1.0, 0.0),
    Vec4::new(0.5, 0.5, 0.0, 1.0),
);

pub fn shadow_up(direction: Vec3) -> Vec3 {
    if direction.normalize_or_zero().dot(Vec3::Y).abs() > VERTICAL_TOLERANCE {
        Vec3::Z
    } else {
        Vec3::Y
    }
}

/// Fixed orthographic volume centred on the world origin, looking along the
/// sun direction from `distance` away.
pub fn directional_view_proj(light: &DirectionalLight, extent: f32, distance: f32) -> Mat4 {
    let direction = light.direction;
    let eye = -direction * distance;
    let view = Mat4::look_to_rh(eye, direction, shadow_up(direction));

    let extent = extent.max(0.1);
    let left = -extent;
    let right = extent;
    let bottom = -extent;
    let top = extent;
    let near = SUN_NEAR;
    let far = distance * 2.0;

    let projection = Mat4::from_cols(
        Vec4::new(2.0 / (right - left), 0.0, 0.0, 0.0),
        Vec4::new(0.0, 2.0 / (top - bottom), 0.0, 0.0),
        Vec4::new(0.0, 0.0, -1.0 / (far - near), 0.0),
        Vec4::new(
            -(right + left) / (right - left),
            -(top + bottom) / (top - bottom),
            -near / (far - near),
            1.0,
        ),
    );

    projection * view
}

/// Perspective frustum covering the full cone (twice the half-angle) out to
/// the light's range.
pub fn spot_view_proj(light: &SpotLight) -> Mat4 {
    let far = light.length.max(SPOT_NEAR + 0.1);
    let fov = (2.0 * light.angle.to_radians()).clamp(0.1, std::f32::consts::PI - 0.1);
    let view = Mat4::look_to_rh(light.position, light.direction, shadow_up(light.direction));
    let projection = Mat4::perspective_rh(fov, 1.0, SPOT_NEAR, far);
    projection * view
}

/// World space to shadow-map texture space.
pub fn shadow_matrix(light_view_proj: Mat4) -> Mat4 {
    BIAS * light_view_proj
}
