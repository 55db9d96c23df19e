use glam::{EulerRot, Mat4, Quat, Vec3};

/// Placement of a scene instance. Orientation is stored in degrees as
/// (roll, pitch, yaw): roll about Z, pitch about X, yaw about Y.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub position: Vec3,
    pub orientation: Vec3,
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            orientation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    pub fn new(position: Vec3, orientation: Vec3, scale: Vec3) -> Self {
        Self {
            position,
            orientation,
            scale,
        }
    }

    pub fn rotation(&self) -> Quat {
        let roll = self.orientation.x.to_radians();
        let pitch = self.orientation.y.to_radians();
        let yaw = self.orientation.z.to_radians();
        Quat::from_euler(EulerRot::YXZ, yaw, pitch, roll)
    }

    /// Scale, then rotate, then translate.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation(), self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_identity() {
        let m = Transform::default().matrix();
        assert!(m.abs_diff_eq(Mat4::IDENTITY, 1e-6));
    }

    #[test]
    fn scale_applies_before_translation() {
        let tr = Transform::new(Vec3::new(1.0, 2.0, 3.0), Vec3::ZERO, Vec3::splat(2.0));
        let p = tr.matrix().transform_point3(Vec3::X);
        // (1,0,0) -> (2,0,0) -> (3,2,3)
        assert!(p.abs_diff_eq(Vec3::new(3.0, 2.0, 3.0), 1e-6));
    }

    #[test]
    fn yaw_turns_about_y_in_degrees() {
        let tr = Transform::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 90.0), Vec3::ONE);
        let p = tr.matrix().transform_point3(Vec3::X);
        assert!(p.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-5));
    }
}
