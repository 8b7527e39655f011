//! Arm kinematics and hit testing.
//!
//! The arm is a rectangle hinged at `pivot`, extending `length` along its
//! local up axis and `width` across it. Rotation 0 points the arm straight
//! up, which corresponds to a servo angle of 90.

use rig_common::math::{
    Vec2, angle_between, rotate_towards, servo_angle, signed_angle, up_from_rotation,
};
use rig_common::rig::config::ServoConfig;

/// Geometric state of the servo arm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmState {
    /// Hinge point in world units
    pivot: Vec2,
    /// Rotation about the pivot in degrees, counter-clockwise from up
    rotation: f64,
    /// Extent along the local up axis
    length: f64,
    /// Extent across the local up axis
    width: f64,
}

impl ArmState {
    /// Arm at the configured pivot and initial rotation.
    pub fn from_config(config: &ServoConfig) -> Self {
        Self {
            pivot: config.position,
            rotation: config.initial_rotation,
            length: config.arm_length,
            width: config.arm_width,
        }
    }

    /// Current rotation in degrees.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Overwrite the rotation.
    pub fn set_rotation(&mut self, rotation: f64) {
        self.rotation = rotation;
    }

    /// Local up axis in world space.
    pub fn up(&self) -> Vec2 {
        up_from_rotation(self.rotation)
    }

    /// Whether `point` lies on the arm.
    pub fn contains(&self, point: Vec2) -> bool {
        let local = (point - self.pivot).rotated(-self.rotation);
        local.x.abs() <= self.width / 2.0 && (0.0..=self.length).contains(&local.y)
    }

    /// Rotation the arm wants to reach to point at `pointer`.
    ///
    /// Signed angle from world up to the pivot→pointer direction, clamped to
    /// `±max_angle`.
    pub fn target_rotation(&self, pointer: Vec2, max_angle: f64) -> f64 {
        let direction = (pointer - self.pivot).normalized();
        signed_angle(Vec2::UP, direction).clamp(-max_angle, max_angle)
    }

    /// Rotate toward `pointer` by at most `max_step` degrees.
    ///
    /// Returns the new rotation.
    pub fn steer_toward(&mut self, pointer: Vec2, max_angle: f64, max_step: f64) -> f64 {
        let target = self.target_rotation(pointer, max_angle);
        self.rotation = rotate_towards(self.rotation, target, max_step);
        self.rotation
    }

    /// Angle to command: the unsigned angle between world right and the arm.
    pub fn servo_angle(&self) -> u8 {
        servo_angle(angle_between(Vec2::RIGHT, self.up()))
    }
}
