//! Servo driver.
//!
//! Grabbing the arm with the pointer makes it follow the pointer within
//! `±max_angle`, rate-limited by `rotation_speed`. The arm angle is streamed
//! to the servo board as integer degree lines.

mod arm;
mod driver;

pub use arm::ArmState;
pub use driver::{ServoDriver, create_component};
