use glam::{Mat4, Vec3};

pub const DEFAULT_YAW: f32 = -90.0;
pub const DEFAULT_PITCH: f32 = 0.0;
pub const DEFAULT_FOV: f32 = 45.0;
pub const MAX_PITCH: f32 = 89.0;
pub const MIN_FOV: f32 = 1.0;
pub const MAX_FOV: f32 = 45.0;
pub const NEAR_PLANE: f32 = 0.1;
pub const FAR_PLANE: f32 = 100.0;

/// Fly camera. Angles are in degrees; yaw -90 looks down -Z.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub front: Vec3,
    pub up: Vec3,
    pub right: Vec3,
    pub world_up: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, 0.0, 3.0))
    }
}

impl Camera {
    pub fn new(position: Vec3) -> Self {
        let mut camera = Self {
            position,
            front: Vec3::NEG_Z,
            up: Vec3::Y,
            right: Vec3::X,
            world_up: Vec3::Y,
            yaw: DEFAULT_YAW,
            pitch: DEFAULT_PITCH,
            fov: DEFAULT_FOV,
        };
        camera.update_vectors();
        camera
    }

    pub fn rotate(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw += delta_yaw;
        self.pitch = (self.pitch + delta_pitch).clamp(-MAX_PITCH, MAX_PITCH);
        self.update_vectors();
    }

    /// Narrows the field of view for positive `delta`.
    pub fn zoom(&mut self, delta: f32) {
        self.fov = (self.fov - delta).clamp(MIN_FOV, MAX_FOV);
    }

    /// Moves by `offset` expressed in camera space (x right, y world up,
    /// z forward).
    pub fn translate_local(&mut self, offset: Vec3) {
        self.position += self.right * offset.x + self.world_up * offset.y + self.front * offset.z;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.position + self.front, self.up)
    }

    pub fn projection(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov.to_radians(), aspect, NEAR_PLANE, FAR_PLANE)
    }

    fn update_vectors(&mut self) {
        let (sy, cy) = self.yaw.to_radians().sin_cos();
        let (sp, cp) = self.pitch.to_radians().sin_cos();
        self.front = Vec3::new(cy * cp, sp, sy * cp).normalize();
        self.right = self.front.cross(self.world_up).normalize();
        self.up = self.right.cross(self.front).normalize();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_default_camera_looks_down_negative_z() {
        let camera = Camera::default();
        assert_relative_eq!(camera.front.x, 0.0, epsilon = 1e-6);
        assert_relative_eq!(camera.front.z, -1.0, epsilon = 1e-6);
        assert_relative_eq!(camera.right.x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(camera.up.y, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_pitch_is_clamped() {
        let mut camera = Camera::default();
        camera.rotate(0.0, 500.0);
        assert_eq!(camera.pitch, MAX_PITCH);
        camera.rotate(0.0, -1000.0);
        assert_eq!(camera.pitch, -MAX_PITCH);
        assert!(camera.front.is_finite());
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut camera = Camera::default();
        camera.zoom(-10.0);
        assert_eq!(camera.fov, MAX_FOV);
        camera.zoom(100.0);
        assert_eq!(camera.fov, MIN_FOV);
    }

    #[test]
    fn test_view_matrix_moves_eye_to_origin() {
        let mut camera = Camera::new(Vec3::new(1.0, 2.0, 3.0));
        camera.rotate(37.0, 12.0);
        let eye = camera.view_matrix().transform_point3(camera.position);
        assert_relative_eq!(eye.length(), 0.0, epsilon = 1e-5);

        let ahead = camera.view_matrix().transform_point3(camera.position + camera.front);
        assert_relative_eq!(ahead.z, -1.0, epsilon = 1e-5);
    }

    #[test]
    fn test_translate_local_follows_orientation() {
        let mut camera = Camera::new(Vec3::ZERO);
        camera.rotate(90.0, 0.0);
        camera.translate_local(Vec3::new(0.0, 0.0, 2.0));
        assert_relative_eq!(camera.position.x, 2.0, epsilon = 1e-5);
        assert_relative_eq!(camera.position.z, 0.0, epsilon = 1e-5);
    }
}
