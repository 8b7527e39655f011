//! Rig component implementations.
//!
//! - [`servo`] - Pointer-driven servo arm
//! - [`distance`] - Ultrasonic distance reader
//!
//! # Adding New Components
//!
//! 1. Create a new submodule under `components/`
//! 2. Implement the `Component` trait from `rig_common::rig::component`
//! 3. Register its factory in [`register_builtin`]

pub mod distance;
pub mod servo;

use crate::component_registry::ComponentRegistry;
use rig_common::rig::config::{DISTANCE_COMPONENT, SERVO_COMPONENT};

/// Register every built-in component factory.
pub fn register_builtin(registry: &mut ComponentRegistry) {
    registry.register(SERVO_COMPONENT, servo::create_component);
    registry.register(DISTANCE_COMPONENT, distance::create_component);
}
