use crate::key::{InputSnapshot, Key};
use serde::{Deserialize, Serialize};
use shadelab_common::Pose;

/// Key bindings for one controllable pose. Unbound actions are `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlKeys {
    pub turn_up: Option<Key>,
    pub turn_down: Option<Key>,
    pub turn_left: Option<Key>,
    pub turn_right: Option<Key>,
    pub roll_clockwise: Option<Key>,
    pub roll_anticlockwise: Option<Key>,
    pub move_forward: Option<Key>,
    pub move_backward: Option<Key>,
    pub move_left: Option<Key>,
    pub move_right: Option<Key>,
}

impl ControlKeys {
    /// Arrow keys to look, WASD to fly.
    pub const CAMERA: Self = Self {
        turn_up: Some(Key::Up),
        turn_down: Some(Key::Down),
        turn_left: Some(Key::Left),
        turn_right: Some(Key::Right),
        roll_clockwise: None,
        roll_anticlockwise: None,
        move_forward: Some(Key::W),
        move_backward: Some(Key::S),
        move_left: Some(Key::A),
        move_right: Some(Key::D),
    };

    /// IJKL to turn, U/O to roll, Period/Comma to move along the local Z axis.
    pub const MODEL: Self = Self {
        turn_up: Some(Key::I),
        turn_down: Some(Key::K),
        turn_left: Some(Key::J),
        turn_right: Some(Key::L),
        roll_clockwise: Some(Key::U),
        roll_anticlockwise: Some(Key::O),
        move_forward: Some(Key::Period),
        move_backward: Some(Key::Comma),
        move_left: None,
        move_right: None,
    };
}

/// Per-second control rates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ControlRates {
    /// World units per second.
    pub move_speed: f32,
    /// Radians per second.
    pub turn_speed: f32,
}

impl ControlRates {
    pub const MODEL: Self = Self {
        move_speed: 10.0,
        turn_speed: 2.0,
    };

    pub const CAMERA: Self = Self {
        move_speed: 40.0,
        turn_speed: 1.5,
    };
}

impl Default for ControlRates {
    fn default() -> Self {
        Self::MODEL
    }
}

/// Apply one frame of keyboard control to `pose`.
///
/// Rotation changes first, then translation along the local axes of the
/// rotated pose. Returns whether any bound key was held, i.e. whether the
/// pose may have changed.
pub fn drive(
    pose: &mut Pose,
    dt: f32,
    input: &InputSnapshot,
    keys: &ControlKeys,
    rates: &ControlRates,
) -> bool {
    let turn = rates.turn_speed * dt;
    let step = rates.move_speed * dt;
    let held = |k: Option<Key>| input.binding_held(k);
    let mut touched = false;

    let axis = |pos: Option<Key>, neg: Option<Key>| -> f32 {
        (held(pos) as i32 - held(neg) as i32) as f32
    };

    let pitch = axis(keys.turn_down, keys.turn_up);
    let yaw = axis(keys.turn_right, keys.turn_left);
    let roll = axis(keys.roll_anticlockwise, keys.roll_clockwise);
    if pitch != 0.0 || yaw != 0.0 || roll != 0.0 {
        pose.rotation.x += pitch * turn;
        pose.rotation.y += yaw * turn;
        pose.rotation.z += roll * turn;
        touched = true;
    }

    let forward = axis(keys.move_forward, keys.move_backward);
    let strafe = axis(keys.move_right, keys.move_left);
    if forward != 0.0 || strafe != 0.0 {
        pose.position += pose.forward() * (forward * step) + pose.right() * (strafe * step);
        touched = true;
    }

    if touched {
        tracing::trace!(position = ?pose.position, rotation = ?pose.rotation, "pose driven");
    }
    touched
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn keys(held: &[Key]) -> InputSnapshot {
        held.iter().copied().collect()
    }

    #[test]
    fn no_keys_leaves_pose_alone() {
        let mut pose = Pose::at(Vec3::new(1.0, 2.0, 3.0));
        let before = pose;
        let moved = drive(
            &mut pose,
            0.5,
            &InputSnapshot::empty(),
            &ControlKeys::CAMERA,
            &ControlRates::CAMERA,
        );
        assert!(!moved);
        assert_eq!(pose, before);
    }

    #[test]
    fn forward_moves_along_local_z_at_fixed_rate() {
        let mut pose = Pose::default();
        drive(&mut pose, 0.5, &keys(&[Key::W]), &ControlKeys::CAMERA, &ControlRates::MODEL);
        assert!(pose.position.abs_diff_eq(Vec3::new(0.0, 0.0, 5.0), 1e-5));
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut pose = Pose::default();
        let moved = drive(
            &mut pose,
            1.0,
            &keys(&[Key::W, Key::S]),
            &ControlKeys::CAMERA,
            &ControlRates::MODEL,
        );
        assert!(!moved);
        assert_eq!(pose.position, Vec3::ZERO);
    }

    #[test]
    fn model_keys_turn_and_roll() {
        let mut pose = Pose::default();
        drive(
            &mut pose,
            0.25,
            &keys(&[Key::L, Key::K, Key::O]),
            &ControlKeys::MODEL,
            &ControlRates::MODEL,
        );
        assert!((pose.rotation.y - 0.5).abs() < 1e-6);
        assert!((pose.rotation.x - 0.5).abs() < 1e-6);
        assert!((pose.rotation.z - 0.5).abs() < 1e-6);
    }

    #[test]
    fn strafe_follows_yaw() {
        let mut pose = Pose {
            rotation: Vec3::new(0.0, std::f32::consts::FRAC_PI_2, 0.0),
            ..Pose::default()
        };
        drive(&mut pose, 1.0, &keys(&[Key::D]), &ControlKeys::CAMERA, &ControlRates::MODEL);
        // Yawed a quarter turn right: local +X now points along world -Z.
        assert!(pose.position.abs_diff_eq(Vec3::new(0.0, 0.0, -10.0), 1e-4));
    }

    #[test]
    fn model_preset_ignores_camera_keys() {
        let mut pose = Pose::default();
        let moved = drive(
            &mut pose,
            1.0,
            &keys(&[Key::W, Key::Up]),
            &ControlKeys::MODEL,
            &ControlRates::MODEL,
        );
        assert!(!moved);
    }
}
