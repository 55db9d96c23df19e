// scene/lights.rs
use glam::Vec3;

/// The scene's sun. Always present, always the first light drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    pub direction: Vec3,
    pub color: Vec3,
    pub ambient: f32,
}

impl DirectionalLight {
    pub fn new(direction: Vec3, color: Vec3, ambient: f32) -> Self {
        Self {
            direction: safe_normalize(direction, Vec3::NEG_Y),
            color: clamp_color(color),
            ambient: ambient.clamp(0.0, 1.0),
        }
    }
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self::new(Vec3::NEG_Y, Vec3::ONE, 0.0)
    }
}

/// Distance attenuation `1 / (kc + kl*d + kq*d^2)`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Attenuation {
    pub constant: f32,
    pub linear: f32,
    pub quadratic: f32,
}

impl Attenuation {
    pub const NONE: Self = Self {
        constant: 1.0,
        linear: 0.0,
        quadratic: 0.0,
    };

    pub fn new(constant: f32, linear: f32, quadratic: f32) -> Self {
        Self {
            constant,
            linear,
            quadratic,
        }
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.constant, self.linear, self.quadratic]
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpotLight {
    pub position: Vec3,
    pub direction: Vec3,
    pub color: Vec3,
    /// Half-angle of the cone, in degrees.
    pub angle: f32,
    pub exponent: f32,
    /// Maximum reach; also the far plane of the shadow projection.
    pub length: f32,
    pub attenuation: Attenuation,
}

impl SpotLight {
    pub fn new(position: Vec3, direction: Vec3, color: Vec3, angle: f32, length: f32) -> Self {
        Self {
            position,
            direction: safe_normalize(direction, Vec3::NEG_Y),
            color: clamp_color(color),
            angle: angle.clamp(0.0, 180.0),
            exponent: 0.0,
            length: length.max(0.0),
            attenuation: Attenuation::NONE,
        }
    }

    pub fn with_exponent(mut self, exponent: f32) -> Self {
        self.exponent = exponent;
        self
    }

    pub fn with_attenuation(mut self, attenuation: Attenuation) -> Self {
        self.attenuation = attenuation;
        self
    }

    pub fn cos_cutoff(&self) -> f32 {
        self.angle.to_radians().cos()
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointLight {
    pub position: Vec3,
    pub color: Vec3,
    pub attenuation: Attenuation,
}

impl PointLight {
    pub fn new(position: Vec3, color: Vec3, attenuation: Attenuation) -> Self {
        Self {
            position,
            color: clamp_color(color),
            attenuation,
        }
    }
}

fn clamp_color(color: Vec3) -> Vec3 {
    color.clamp(Vec3::ZERO, Vec3::ONE)
}

pub(crate) fn safe_normalize(vec: Vec3, fallback: Vec3) -> Vec3 {
    if vec.length_squared() > 1e-12 {
        vec.normalize()
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sunlight_is_normalized_and_clamped() {
        let sun = DirectionalLight::new(Vec3::new(0.0, -4.0, 0.0), Vec3::new(2.0, 0.5, -1.0), 1.7);
        assert!(sun.direction.abs_diff_eq(Vec3::NEG_Y, 1e-6));
        assert_eq!(sun.color, Vec3::new(1.0, 0.5, 0.0));
        assert_eq!(sun.ambient, 1.0);
    }

    #[test]
    fn spotlight_clamps_angle_and_length() {
        let spot = SpotLight::new(Vec3::ZERO, Vec3::ZERO, Vec3::ONE, 270.0, -3.0);
        assert_eq!(spot.angle, 180.0);
        assert_eq!(spot.length, 0.0);
        assert_eq!(spot.direction, Vec3::NEG_Y);
    }

    #[test]
    fn cos_cutoff_uses_half_angle_in_degrees() {
        let spot = SpotLight::new(Vec3::ZERO, Vec3::NEG_Y, Vec3::ONE, 60.0, 10.0);
        assert!((spot.cos_cutoff() - 0.5).abs() < 1e-6);
    }
}
