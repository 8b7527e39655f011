//! 2D geometry, angle helpers and smoothing.
//!
//! All angles are in degrees, counter-clockwise positive, measured in the
//! world plane (z is always zero). Rotation of an object is a single angle
//! about the z axis; its local "up" at rotation 0 is `Vec2::UP`.

use crate::consts::SERVO_MAX_ANGLE;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Neg, Sub};

/// Magnitudes below this are treated as zero when normalising.
const NORMALIZE_EPSILON: f64 = 1e-5;

/// Squared magnitudes below this make an angle undefined (returned as 0).
const ANGLE_EPSILON_SQ: f64 = 1e-15;

/// Smallest smoothing time accepted by [`smooth_damp`].
const MIN_SMOOTH_TIME: f64 = 1e-4;

/// Tolerance absorbing floating-point noise before truncating servo angles.
const ANGLE_SNAP: f64 = 1e-6;

// ─── Vec2 ───────────────────────────────────────────────────────────

/// Point or direction in the world plane.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Vec2 {
    /// Horizontal component (right is positive).
    pub x: f64,
    /// Vertical component (up is positive).
    pub y: f64,
}

impl Vec2 {
    /// Origin / zero vector.
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };
    /// Unit vector pointing up.
    pub const UP: Vec2 = Vec2 { x: 0.0, y: 1.0 };
    /// Unit vector pointing right.
    pub const RIGHT: Vec2 = Vec2 { x: 1.0, y: 0.0 };

    /// Create a vector from components.
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Dot product.
    #[inline]
    pub fn dot(self, other: Vec2) -> f64 {
        self.x * other.x + self.y * other.y
    }

    /// z component of the 3D cross product.
    #[inline]
    pub fn cross(self, other: Vec2) -> f64 {
        self.x * other.y - self.y * other.x
    }

    /// Squared length.
    #[inline]
    pub fn length_squared(self) -> f64 {
        self.dot(self)
    }

    /// Euclidean length.
    #[inline]
    pub fn length(self) -> f64 {
        self.length_squared().sqrt()
    }

    /// Unit vector in the same direction, or zero for near-zero input.
    pub fn normalized(self) -> Vec2 {
        let len = self.length();
        if len > NORMALIZE_EPSILON {
            self * (1.0 / len)
        } else {
            Vec2::ZERO
        }
    }

    /// Rotate counter-clockwise by `degrees`.
    pub fn rotated(self, degrees: f64) -> Vec2 {
        let (sin, cos) = degrees.to_radians().sin_cos();
        Vec2::new(self.x * cos - self.y * sin, self.x * sin + self.y * cos)
    }

    /// Distance to another point.
    #[inline]
    pub fn distance(self, other: Vec2) -> f64 {
        (self - other).length()
    }
}

impl From<[f64; 2]> for Vec2 {
    fn from(v: [f64; 2]) -> Self {
        Vec2::new(v[0], v[1])
    }
}

impl From<Vec2> for [f64; 2] {
    fn from(v: Vec2) -> Self {
        [v.x, v.y]
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f64> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f64) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

impl Neg for Vec2 {
    type Output = Vec2;
    fn neg(self) -> Vec2 {
        Vec2::new(-self.x, -self.y)
    }
}

// ─── Angles ─────────────────────────────────────────────────────────

/// Unsigned angle between two vectors, in [0, 180].
///
/// Returns 0 when either vector is (near) zero.
pub fn angle_between(from: Vec2, to: Vec2) -> f64 {
    let denominator = (from.length_squared() * to.length_squared()).sqrt();
    if denominator < ANGLE_EPSILON_SQ {
        return 0.0;
    }
    let cos = (from.dot(to) / denominator).clamp(-1.0, 1.0);
    cos.acos().to_degrees()
}

/// Signed angle from `from` to `to`, in [-180, 180], counter-clockwise positive.
///
/// Collinear vectors count as positive.
pub fn signed_angle(from: Vec2, to: Vec2) -> f64 {
    let unsigned = angle_between(from, to);
    if from.cross(to) < 0.0 { -unsigned } else { unsigned }
}

/// Shortest signed difference `target - current`, in (-180, 180].
pub fn delta_angle(current: f64, target: f64) -> f64 {
    let delta = (target - current).rem_euclid(360.0);
    if delta > 180.0 { delta - 360.0 } else { delta }
}

/// Step `current` toward `target` along the shortest arc by at most `max_delta`.
///
/// A negative `max_delta` is treated as zero.
pub fn rotate_towards(current: f64, target: f64, max_delta: f64) -> f64 {
    let delta = delta_angle(current, target);
    let step = max_delta.max(0.0);
    if delta.abs() <= step {
        current + delta
    } else {
        current + step.copysign(delta)
    }
}

/// Local up axis of an object rotated by `rotation` degrees.
#[inline]
pub fn up_from_rotation(rotation: f64) -> Vec2 {
    Vec2::UP.rotated(rotation)
}

/// Convert an angle to the value sent to the servo.
///
/// Negative angles are wrapped by one turn, the result is clamped to
/// [0, 180] and truncated toward zero. Values within `ANGLE_SNAP` below an
/// integer count as that integer, so 134.99999999999997 from `acos` is 135.
pub fn servo_angle(angle: f64) -> u8 {
    let wrapped = if angle < 0.0 { angle + 360.0 } else { angle };
    // NaN falls through clamp; `as` saturates it to 0.
    (wrapped + ANGLE_SNAP).clamp(0.0, SERVO_MAX_ANGLE as f64) as u8
}

// ─── Readings ───────────────────────────────────────────────────────

/// Normalise a raw sensor reading against the calibration bound.
///
/// ```text
/// normalized = clamp(value, 0, c) / (c != 0 ? c : 1)
/// ```
///
/// A calibration of zero therefore always yields 0. Negative calibrations are
/// rejected by config validation and treated as zero here.
pub fn normalize_reading(value: i32, calibration: i32) -> f64 {
    let bound = calibration.max(0);
    let magnitude = value.clamp(0, bound) as f64;
    let divisor = if bound != 0 { bound as f64 } else { 1.0 };
    magnitude / divisor
}

// ─── Smoothing ──────────────────────────────────────────────────────

/// Critically damped spring toward `target`.
///
/// `velocity` carries state between calls. `smooth_time` is roughly the time
/// to reach the target and is floored at 1e-4. When the step would overshoot
/// the target, the result snaps to it. `dt <= 0` returns `current` untouched.
///
/// ```text
/// ω = 2 / smooth_time
/// k = 1 / (1 + ωdt + 0.48(ωdt)² + 0.235(ωdt)³)
/// ```
pub fn smooth_damp(
    current: Vec2,
    target: Vec2,
    velocity: &mut Vec2,
    smooth_time: f64,
    dt: f64,
) -> Vec2 {
    if dt <= 0.0 {
        return current;
    }

    let smooth_time = smooth_time.max(MIN_SMOOTH_TIME);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + change * omega) * dt;
    *velocity = (*velocity - temp * omega) * decay;
    let mut output = target + (change + temp) * decay;

    // Overshoot guard
    if (target - current).dot(output - target) > 0.0 {
        output = target;
        *velocity = Vec2::ZERO;
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-9;

    #[test]
    fn angle_between_axes() {
        assert!((angle_between(Vec2::RIGHT, Vec2::UP) - 90.0).abs() < EPS);
        assert!((angle_between(Vec2::UP, Vec2::UP)).abs() < EPS);
        assert!((angle_between(Vec2::UP, -Vec2::UP) - 180.0).abs() < EPS);
        assert_eq!(angle_between(Vec2::ZERO, Vec2::UP), 0.0);
    }

    #[test]
    fn signed_angle_is_counter_clockwise_positive() {
        let left = Vec2::new(-1.0, 1.0);
        let right = Vec2::new(1.0, 1.0);
        assert!((signed_angle(Vec2::UP, left) - 45.0).abs() < EPS);
        assert!((signed_angle(Vec2::UP, right) + 45.0).abs() < EPS);
        assert_eq!(signed_angle(Vec2::UP, Vec2::UP), 0.0);
    }

    #[test]
    fn delta_angle_takes_short_way() {
        assert!((delta_angle(170.0, -170.0) - 20.0).abs() < EPS);
        assert!((delta_angle(-170.0, 170.0) + 20.0).abs() < EPS);
        assert!((delta_angle(0.0, 180.0) - 180.0).abs() < EPS);
    }

    #[test]
    fn rotate_towards_bounded_step() {
        assert!((rotate_towards(0.0, 30.0, 10.0) - 10.0).abs() < EPS);
        assert!((rotate_towards(0.0, -30.0, 10.0) + 10.0).abs() < EPS);
        assert!((rotate_towards(25.0, 30.0, 10.0) - 30.0).abs() < EPS);
        assert!((rotate_towards(5.0, 30.0, -1.0) - 5.0).abs() < EPS);
    }

    #[test]
    fn up_from_rotation_quarter_turn() {
        let up = up_from_rotation(90.0);
        assert!((up.x + 1.0).abs() < EPS);
        assert!(up.y.abs() < EPS);
    }

    #[test]
    fn servo_angle_wraps_and_clamps() {
        assert_eq!(servo_angle(90.0), 90);
        assert_eq!(servo_angle(90.9), 90);
        assert_eq!(servo_angle(200.0), 180);
        assert_eq!(servo_angle(-10.0), 180);
        assert_eq!(servo_angle(-350.0), 10);
        assert_eq!(servo_angle(-400.0), 0);
        assert_eq!(servo_angle(f64::NAN), 0);
    }

    #[test]
    fn normalize_reading_clamps_and_guards_zero() {
        assert_eq!(normalize_reading(120, 100), 1.0);
        assert_eq!(normalize_reading(50, 100), 0.5);
        assert_eq!(normalize_reading(-5, 100), 0.0);
        assert_eq!(normalize_reading(42, 0), 0.0);
        assert_eq!(normalize_reading(42, -7), 0.0);
    }

    #[test]
    fn normalized_handles_zero() {
        assert_eq!(Vec2::ZERO.normalized(), Vec2::ZERO);
        let n = Vec2::new(3.0, 4.0).normalized();
        assert!((n.length() - 1.0).abs() < EPS);
    }

    #[test]
    fn smooth_damp_converges_without_overshoot() {
        let target = Vec2::new(15.0, 0.0);
        let mut position = Vec2::ZERO;
        let mut velocity = Vec2::ZERO;
        for _ in 0..600 {
            position = smooth_damp(position, target, &mut velocity, 0.3, 1.0 / 60.0);
            assert!(position.x <= target.x + EPS);
        }
        assert!(position.distance(target) < 1e-3);
    }

    #[test]
    fn smooth_damp_zero_dt_is_noop() {
        let mut velocity = Vec2::new(1.0, 1.0);
        let out = smooth_damp(Vec2::ZERO, Vec2::RIGHT, &mut velocity, 0.5, 0.0);
        assert_eq!(out, Vec2::ZERO);
        assert_eq!(velocity, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn vec2_deserializes_from_array() {
        #[derive(Deserialize)]
        struct P {
            p: Vec2,
        }
        let p: P = toml::from_str("p = [1.5, -2.0]").unwrap();
        assert_eq!(p.p, Vec2::new(1.5, -2.0));
    }
}
