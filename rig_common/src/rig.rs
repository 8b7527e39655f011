//! Rig configuration, component seam and per-frame data types.

pub mod component;
pub mod config;
pub mod types;
