//! Property tests for the servo clamp and reading normalisation.

use proptest::prelude::*;
use rig_common::math::{normalize_reading, rotate_towards, servo_angle, signed_angle, Vec2};

proptest! {
    #[test]
    fn servo_angle_is_idempotent(angle in -720.0f64..720.0) {
        let once = servo_angle(angle);
        prop_assert_eq!(servo_angle(once as f64), once);
        prop_assert!(once <= 180);
    }

    #[test]
    fn servo_angle_is_monotonic_in_range(a in 0.0f64..=180.0, b in 0.0f64..=180.0) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(servo_angle(lo) <= servo_angle(hi));
    }

    #[test]
    fn normalized_reading_is_unit_range(value in any::<i32>(), calibration in 0i32..10_000) {
        let n = normalize_reading(value, calibration);
        prop_assert!((0.0..=1.0).contains(&n));
        if calibration > 0 {
            let expected = value.clamp(0, calibration) as f64 / calibration as f64;
            prop_assert!((n - expected).abs() < 1e-12);
        } else {
            prop_assert_eq!(n, 0.0);
        }
    }

    #[test]
    fn rotate_towards_never_exceeds_step(
        current in -180.0f64..180.0,
        target in -180.0f64..180.0,
        step in 0.0f64..90.0,
    ) {
        let next = rotate_towards(current, target, step);
        prop_assert!((next - current).abs() <= step + 1e-9);
    }

    #[test]
    fn signed_angle_is_antisymmetric(ax in -10.0f64..10.0, ay in 0.1f64..10.0, bx in -10.0f64..10.0, by in 0.1f64..10.0) {
        let a = Vec2::new(ax, ay);
        let b = Vec2::new(bx, by);
        let forward = signed_angle(a, b);
        let backward = signed_angle(b, a);
        if forward.abs() > 1e-6 {
            prop_assert!((forward + backward).abs() < 1e-6);
        }
    }
}

#[test]
fn pointer_straight_up_needs_no_clamp() {
    let pivot = Vec2::ZERO;
    let pointer = Vec2::new(0.0, 1.0);
    let angle = signed_angle(Vec2::UP, (pointer - pivot).normalized());
    assert_eq!(angle, 0.0);
    assert_eq!(angle.clamp(-45.0, 45.0), angle);
}
