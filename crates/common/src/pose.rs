use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};

/// Spatial pose: position, Euler rotation (radians), scale.
///
/// The world is left-handed with +Y up and +Z forward. Rotation is applied
/// roll (Z) first, then pitch (X), then yaw (Y).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec3,
    pub rotation: Vec3,
    pub scale: Vec3,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Vec3::ZERO,
            scale: Vec3::ONE,
        }
    }
}

/// Rotation matrix for Euler angles: `Ry * Rx * Rz`.
pub fn rotation_matrix(rotation: Vec3) -> Mat4 {
    Mat4::from_rotation_y(rotation.y)
        * Mat4::from_rotation_x(rotation.x)
        * Mat4::from_rotation_z(rotation.z)
}

impl Pose {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Local-to-world matrix: scale, then rotate, then translate.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_translation(self.position) * rotation_matrix(self.rotation) * Mat4::from_scale(self.scale)
    }

    /// Unit local +Z axis in world space.
    pub fn forward(&self) -> Vec3 {
        rotation_matrix(self.rotation).transform_vector3(Vec3::Z)
    }

    /// Unit local +X axis in world space.
    pub fn right(&self) -> Vec3 {
        rotation_matrix(self.rotation).transform_vector3(Vec3::X)
    }

    pub fn up(&self) -> Vec3 {
        rotation_matrix(self.rotation).transform_vector3(Vec3::Y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn default_pose_is_identity() {
        let p = Pose::default();
        assert_eq!(p.matrix(), Mat4::IDENTITY);
    }

    #[test]
    fn matrix_scales_then_rotates_then_translates() {
        let p = Pose {
            position: Vec3::new(10.0, 0.0, 0.0),
            rotation: Vec3::new(0.0, FRAC_PI_2, 0.0),
            scale: Vec3::splat(2.0),
        };
        // Local +X, scaled to 2, yawed a quarter turn onto -Z, then moved.
        let world = p.matrix().transform_point3(Vec3::X);
        assert!(world.abs_diff_eq(Vec3::new(10.0, 0.0, -2.0), 1e-5));
    }

    #[test]
    fn positive_pitch_tilts_forward_down() {
        let p = Pose {
            rotation: Vec3::new(0.3, 0.0, 0.0),
            ..Pose::default()
        };
        assert!(p.forward().y < 0.0);
        assert!((p.forward().length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn axes_are_orthonormal() {
        let p = Pose {
            rotation: Vec3::new(0.4, -1.1, 0.7),
            ..Pose::default()
        };
        assert!(p.forward().dot(p.right()).abs() < 1e-5);
        assert!(p.forward().dot(p.up()).abs() < 1e-5);
        assert!(p.right().cross(p.up()).abs_diff_eq(p.forward(), 1e-5));
    }
}
