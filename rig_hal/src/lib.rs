//! # Rig HAL Library
//!
//! Drives a hobby servo and reads an ultrasonic distance sensor over two
//! serial links, both synchronised to one fixed-period frame loop.
//! Components implement the `Component` trait defined in
//! `rig_common::rig::component`.
//!
//! # Module Structure
//!
//! - [`core`] - RigCore struct, frame loop management
//! - [`component_registry`] - Component factory registration
//! - [`components`] - Servo driver and distance reader
//! - [`transport`] - serialport, loopback and simulated links
//! - [`input`] - Pointer sources feeding the servo
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                      rig_hal (single crate)                   │
//! │  ┌──────────────┐    ┌─────────────┐    ┌──────────────────┐  │
//! │  │ PointerSource│───►│  RigCore    │◄──►│ ComponentRegistry│  │
//! │  └──────────────┘    │ (frame loop)│    └──────────────────┘  │
//! │                      └──────┬──────┘                          │
//! │                             ▼                                 │
//! │              ┌──────────────┴──────────────┐                  │
//! │              │ ServoDriver   DistanceReader│ (Component)      │
//! │              └──────────────┬──────────────┘                  │
//! │                             ▼                                 │
//! │                 SerialLink (port / loopback / sim)            │
//! └───────────────────────────────────────────────────────────────┘
//! ```

#![deny(warnings)]
#![deny(missing_docs)]

pub mod component_registry;
pub mod components;
pub mod core;
pub mod input;
pub mod transport;

// Re-export key types for convenience
pub use crate::component_registry::ComponentRegistry;
pub use crate::core::{RigCore, TimingStats};
pub use crate::input::{PointerSource, SweepPointer};
