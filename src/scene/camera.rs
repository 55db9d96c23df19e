use glam::{Mat4, Vec3};

/// Perspective camera. The projection is fixed at construction; eye and
/// orientation are driven by an external input handler between frames.
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    projection: Mat4,
    aspect: f32,
    pub eye: Vec3,
    pub direction: Vec3,
    pub up: Vec3,
}

impl Camera {
    pub fn new(fov_y_degrees: f32, aspect: f32, near: f32, far: f32) -> Self {
        Self {
            projection: Mat4::perspective_rh(fov_y_degrees.to_radians(), aspect, near, far),
            aspect,
            eye: Vec3::ZERO,
            direction: Vec3::NEG_Z,
            up: Vec3::Y,
        }
    }

    pub fn looking_at(mut self, eye: Vec3, target: Vec3) -> Self {
        self.eye = eye;
        let direction = target - eye;
        if direction.length_squared() > 0.0 {
            self.direction = direction.normalize();
        }
        self
    }

    pub fn projection(&self) -> Mat4 {
        self.projection
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn view(&self) -> Mat4 {
        let up = if self.direction.cross(self.up).length_squared() < 1e-8 {
            Vec3::Z
        } else {
            self.up
        };
        Mat4::look_to_rh(self.eye, self.direction, up)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection * self.view()
    }

    /// Moves the eye along the camera's own right/up/forward axes.
    pub fn translate_local(&mut self, offset: Vec3) {
        let forward = self.direction.normalize_or_zero();
        let right = forward.cross(self.up).normalize_or_zero();
        let up = right.cross(forward);
        self.eye += right * offset.x + up * offset.y + forward * offset.z;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(45.0, 1.25, 1.0, 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_proj_is_invertible() {
        let cam = Camera::default().looking_at(Vec3::new(0.0, 2.0, 5.0), Vec3::ZERO);
        let vp = cam.view_proj();
        let id = vp * vp.inverse();
        assert!(id.abs_diff_eq(Mat4::IDENTITY, 1e-4));
    }

    #[test]
    fn straight_down_view_does_not_degenerate() {
        let cam = Camera::default().looking_at(Vec3::new(0.0, 10.0, 0.0), Vec3::ZERO);
        assert!(cam.view().determinant().abs() > 1e-6);
    }

    #[test]
    fn translate_local_moves_along_view_direction() {
        let mut cam = Camera::default();
        cam.translate_local(Vec3::new(0.0, 0.0, 2.0));
        assert!(cam.eye.abs_diff_eq(Vec3::new(0.0, 0.0, -2.0), 1e-6));
        cam.translate_local(Vec3::new(1.0, 0.0, 0.0));
        assert!(cam.eye.abs_diff_eq(Vec3::new(1.0, 0.0, -2.0), 1e-6));
    }
}
