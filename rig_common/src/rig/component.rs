//! Component trait and error types.
//!
//! This module defines:
//! - `Component` trait - Interface for frame-driven serial components
//! - `RigError` enum - Error types for rig operations
//! - `ComponentFactory` type alias - Factory function type
//! - `ComponentDiagnostics` struct - Per-component counters

use crate::config::ConfigError;
use crate::rig::config::RigConfig;
use crate::rig::types::{ComponentStatus, FrameInput};
use crate::serial::{LinkError, LinkOpener};
use std::time::Duration;
use thiserror::Error;

/// Error types for rig operations.
#[derive(Debug, Clone, Error)]
pub enum RigError {
    /// Start-of-life failed
    #[error("Initialization failed: {0}")]
    InitFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// No factory registered under this name
    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    /// Tick requested I/O before `start` opened the link
    #[error("Component {0} has not been started")]
    NotStarted(&'static str),

    /// Serial link failure
    #[error(transparent)]
    Link(#[from] LinkError),
}

impl From<ConfigError> for RigError {
    fn from(e: ConfigError) -> Self {
        RigError::ConfigError(e.to_string())
    }
}

/// Factory function type for creating component instances.
pub type ComponentFactory = fn(&RigConfig) -> Result<Box<dyn Component>, RigError>;

/// Per-component counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ComponentDiagnostics {
    /// Ticks executed
    pub ticks: u64,
    /// Lines written to the link
    pub lines_written: u64,
    /// Lines read from the link
    pub lines_read: u64,
    /// Reads that produced no line within the window
    pub timeouts: u64,
    /// Lines rejected by the protocol
    pub parse_errors: u64,
}

/// Interface of a frame-driven component that owns one serial link.
///
/// # Lifecycle
///
/// 1. `start()` - Called once; opens the link
/// 2. `tick()` - Called once per frame by the host loop
/// 3. `shutdown()` - Called once when the host stops, even if `start()` failed
///
/// `shutdown()` must be idempotent: the reset/close sequence runs at most once.
pub trait Component: Send {
    /// Returns the component's registry name (e.g., "servo", "distance").
    fn name(&self) -> &'static str;

    /// Open the link and perform start-of-life I/O.
    ///
    /// # Errors
    /// Returns `RigError::Link` if the port cannot be opened or the first
    /// write fails. The component stays usable for `shutdown()`.
    fn start(&mut self, opener: &dyn LinkOpener) -> Result<(), RigError>;

    /// Execute one frame.
    ///
    /// # Arguments
    /// * `frame` - Input sampled for this frame
    /// * `dt` - Elapsed time since the previous frame
    ///
    /// # Errors
    /// Only fatal conditions are returned; recoverable link errors are
    /// absorbed and counted in [`ComponentDiagnostics`].
    fn tick(&mut self, frame: &FrameInput, dt: Duration) -> Result<ComponentStatus, RigError>;

    /// End-of-life: reset outputs and close the link.
    fn shutdown(&mut self) -> Result<(), RigError>;

    /// Counters accumulated so far.
    fn diagnostics(&self) -> ComponentDiagnostics;
}
