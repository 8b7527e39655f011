//! Rig Common Library
//!
//! Shared building blocks for the rig workspace: configuration loading,
//! the serial link seam, the component trait and the geometry used by the
//! servo and distance components.
//!
//! # Module Structure
//!
//! - [`config`] - Configuration loading traits and types
//! - [`rig`] - Rig configuration, component trait, frame and status types
//! - [`serial`] - Serial link trait, line framing and line protocol
//! - [`math`] - 2D geometry, angle helpers and smoothing
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use rig_common::prelude::*;
//!
//! let angle = servo_angle(angle_between(Vec2::RIGHT, Vec2::UP));
//! assert_eq!(angle, 90);
//! ```

pub mod config;
pub mod consts;
pub mod math;
pub mod prelude;
pub mod rig;
pub mod serial;
