//! Prelude module for common re-exports.
//!
//! ```rust
//! use rig_common::prelude::*;
//! ```

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{ConfigError, ConfigLoader, LogLevel, SharedConfig};
pub use crate::rig::config::{
    DISTANCE_COMPONENT, DistanceConfig, PointerConfig, PointerMode, RigConfig, SERVO_COMPONENT,
    ServoConfig,
};

// ─── Components ─────────────────────────────────────────────────────
pub use crate::rig::component::{Component, ComponentDiagnostics, ComponentFactory, RigError};
pub use crate::rig::types::{
    ComponentStatus, DistanceStatus, FrameInput, PointerState, ServoStatus,
};

// ─── Serial ─────────────────────────────────────────────────────────
pub use crate::serial::protocol::{format_angle_line, parse_reading};
pub use crate::serial::{LineLink, LineStream, LinkError, LinkOpener, SerialLink, SerialSettings};

// ─── Math ───────────────────────────────────────────────────────────
pub use crate::math::{
    Vec2, angle_between, normalize_reading, rotate_towards, servo_angle, signed_angle,
    smooth_damp,
};
