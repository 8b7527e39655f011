//! Pointer sources.
//!
//! The servo follows a pointer in world coordinates. A headless host has no
//! mouse, so the pointer comes from a [`PointerSource`] selected in the
//! `[pointer]` config section. Button edges are derived from consecutive
//! samples, so a source only decides position and whether the button is held.

use rig_common::math::Vec2;
use rig_common::rig::config::{PointerConfig, PointerMode, RigConfig};
use rig_common::rig::types::PointerState;
use std::f64::consts::TAU;
use std::time::Duration;

/// Produces one pointer sample per frame.
pub trait PointerSource: Send {
    /// Sample the pointer at `elapsed` time since the loop started.
    fn sample(&mut self, elapsed: Duration) -> PointerState;
}

/// Tracks the previous `held` flag and fills in the edge flags.
#[derive(Debug, Default, Clone, Copy)]
struct EdgeDetector {
    was_held: bool,
}

impl EdgeDetector {
    fn update(&mut self, position: Vec2, held: bool) -> PointerState {
        let state = PointerState {
            position,
            held,
            pressed_this_frame: held && !self.was_held,
            released_this_frame: !held && self.was_held,
        };
        self.was_held = held;
        state
    }
}

/// Pointer that never presses.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdlePointer {
    position: Vec2,
}

impl IdlePointer {
    /// Pointer resting at `position`.
    pub fn new(position: Vec2) -> Self {
        Self { position }
    }
}

impl PointerSource for IdlePointer {
    fn sample(&mut self, _elapsed: Duration) -> PointerState {
        PointerState::hover(self.position)
    }
}

/// Pointer that repeatedly grabs the arm and sweeps it.
///
/// Each cycle holds the button for `hold_s`, then releases for `release_s`.
/// The press lands on the arm pivot (always inside the arm), after which the
/// pointer follows an arc of `radius` around the pivot, swinging
/// `amplitude_deg` either side of up with period `period_s`.
#[derive(Debug, Clone)]
pub struct SweepPointer {
    pivot: Vec2,
    radius: f64,
    amplitude_deg: f64,
    period_s: f64,
    hold_s: f64,
    release_s: f64,
    edges: EdgeDetector,
}

impl SweepPointer {
    /// Sweep around `pivot` with the `[pointer]` parameters.
    pub fn new(pivot: Vec2, config: &PointerConfig) -> Self {
        Self {
            pivot,
            radius: config.radius,
            amplitude_deg: config.amplitude_deg,
            period_s: config.period_s,
            hold_s: config.hold_s,
            release_s: config.release_s,
            edges: EdgeDetector::default(),
        }
    }

    fn arc_point(&self, t: f64) -> Vec2 {
        let phase = (TAU * t / self.period_s).sin();
        self.pivot + Vec2::UP.rotated(self.amplitude_deg * phase) * self.radius
    }
}

impl PointerSource for SweepPointer {
    fn sample(&mut self, elapsed: Duration) -> PointerState {
        let cycle = self.hold_s + self.release_s;
        let t = elapsed.as_secs_f64() % cycle;
        let held = t < self.hold_s;

        let position = if held && !self.edges.was_held {
            self.pivot
        } else {
            self.arc_point(t)
        };

        self.edges.update(position, held)
    }
}

/// Build the pointer source configured in `[pointer]`.
///
/// The sweep pivots around the servo arm when a servo is configured.
pub fn from_config(config: &RigConfig) -> Box<dyn PointerSource> {
    let pivot = config
        .servo
        .as_ref()
        .map(|s| s.position)
        .unwrap_or(Vec2::ZERO);

    match config.pointer.mode {
        PointerMode::Idle => Box::new(IdlePointer::new(pivot)),
        PointerMode::Sweep => Box::new(SweepPointer::new(pivot, &config.pointer)),
    }
}
