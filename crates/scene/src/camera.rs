use glam::{Mat4, Vec3};
use shadelab_common::{Pose, rotation_matrix};
use shadelab_input::{ControlKeys, ControlRates, InputSnapshot, drive};

/// Perspective camera driven by the same control routine as models.
///
/// View and projection are cached like an entity's world matrix and only
/// change in [`Camera::update_matrices`].
#[derive(Debug, Clone)]
pub struct Camera {
    pose: Pose,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    view: Mat4,
    projection: Mat4,
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(Pose::default())
    }
}

impl Camera {
    pub fn new(pose: Pose) -> Self {
        let mut camera = Self {
            pose,
            fov_y: std::f32::consts::FRAC_PI_4,
            aspect: 4.0 / 3.0,
            near: 0.1,
            far: 10_000.0,
            view: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
        };
        camera.update_matrices();
        camera
    }

    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    pub fn position(&self) -> Vec3 {
        self.pose.position
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.pose.position = position;
    }

    pub fn set_rotation(&mut self, rotation: Vec3) {
        self.pose.rotation = rotation;
    }

    /// Width over height. Degenerate sizes (minimised window) are ignored.
    pub fn set_aspect(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn control(
        &mut self,
        dt: f32,
        input: &InputSnapshot,
        keys: &ControlKeys,
        rates: &ControlRates,
    ) -> bool {
        drive(&mut self.pose, dt, input, keys, rates)
    }

    /// Recompute view (inverse of the camera's rigid transform, scale ignored)
    /// and projection.
    pub fn update_matrices(&mut self) {
        let camera_to_world =
            Mat4::from_translation(self.pose.position) * rotation_matrix(self.pose.rotation);
        self.view = camera_to_world.inverse();
        self.projection = Mat4::perspective_lh(self.fov_y, self.aspect, self.near, self.far);
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shadelab_input::Key;

    #[test]
    fn view_maps_camera_position_to_origin() {
        let mut cam = Camera::new(Pose {
            position: Vec3::new(-15.0, 20.0, -40.0),
            rotation: Vec3::new(13f32.to_radians(), 18f32.to_radians(), 0.0),
            scale: Vec3::ONE,
        });
        cam.update_matrices();
        let origin = cam.view_matrix().transform_point3(cam.position());
        assert!(origin.abs_diff_eq(Vec3::ZERO, 1e-4));
    }

    #[test]
    fn looks_down_positive_z_by_default() {
        let cam = Camera::new(Pose::at(Vec3::ZERO));
        let ahead = cam.view_projection().project_point3(Vec3::new(0.0, 0.0, 10.0));
        assert!(ahead.x.abs() < 1e-5 && ahead.y.abs() < 1e-5);
        assert!(ahead.z > 0.0 && ahead.z < 1.0);
        let behind = cam.view_matrix().transform_point3(Vec3::new(0.0, 0.0, -10.0));
        assert!(behind.z < 0.0);
    }

    #[test]
    fn matrices_wait_for_update() {
        let mut cam = Camera::default();
        let before = cam.view_matrix();
        cam.set_position(Vec3::new(0.0, 5.0, 0.0));
        assert_eq!(cam.view_matrix(), before);
        cam.update_matrices();
        assert_ne!(cam.view_matrix(), before);
    }

    #[test]
    fn camera_keys_fly_forward() {
        let mut cam = Camera::default();
        let input: InputSnapshot = [Key::W].into_iter().collect();
        assert!(cam.control(0.5, &input, &ControlKeys::CAMERA, &ControlRates::CAMERA));
        assert!(cam.position().abs_diff_eq(Vec3::new(0.0, 0.0, 20.0), 1e-4));
    }

    #[test]
    fn zero_sized_aspect_is_ignored() {
        let mut cam = Camera::default();
        cam.set_aspect(1600, 900);
        assert!((cam.aspect - 16.0 / 9.0).abs() < 1e-6);
        cam.set_aspect(0, 900);
        assert!((cam.aspect - 16.0 / 9.0).abs() < 1e-6);
    }
}
