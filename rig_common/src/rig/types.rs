//! Per-frame input and component status types.
//!
//! - `FrameInput` - Everything a component may look at during one tick
//! - `PointerState` - Pointer position and button edges in world units
//! - `ComponentStatus` - What a component reports after a tick

use crate::math::Vec2;

/// Pointer sampled once per frame, already projected into the world plane.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    /// Pointer position in world units
    pub position: Vec2,
    /// Button currently held
    pub held: bool,
    /// Button went down since the previous frame
    pub pressed_this_frame: bool,
    /// Button went up since the previous frame
    pub released_this_frame: bool,
}

impl PointerState {
    /// Pointer resting at `position` with the button up.
    pub fn hover(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Button pressed at `position` this frame.
    pub fn press(position: Vec2) -> Self {
        Self {
            position,
            held: true,
            pressed_this_frame: true,
            released_this_frame: false,
        }
    }

    /// Button held at `position`, no edge this frame.
    pub fn drag(position: Vec2) -> Self {
        Self {
            position,
            held: true,
            ..Self::default()
        }
    }

    /// Button released at `position` this frame.
    pub fn release(position: Vec2) -> Self {
        Self {
            position,
            released_this_frame: true,
            ..Self::default()
        }
    }
}

/// Input handed to every component on each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameInput {
    /// Pointer state for this frame
    pub pointer: PointerState,
}

impl FrameInput {
    /// Frame carrying only a pointer sample.
    pub fn with_pointer(pointer: PointerState) -> Self {
        Self { pointer }
    }
}

/// Servo driver status.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ServoStatus {
    /// Arm follows the pointer
    pub moveable: bool,
    /// Arm rotation in degrees
    pub rotation_deg: f64,
    /// Last angle written to the link, if any
    pub last_angle: Option<u8>,
}

/// Distance reader status.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DistanceStatus {
    /// Last successfully parsed reading
    pub raw: i32,
    /// Reading normalised against the calibration bound, in [0, 1]
    pub normalized: f64,
    /// Current position of the tracked object
    pub position: Vec2,
}

/// Status returned by a component after each tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ComponentStatus {
    /// Servo driver status
    Servo(ServoStatus),
    /// Distance reader status
    Distance(DistanceStatus),
}

impl ComponentStatus {
    /// Servo status, if this is one.
    pub fn as_servo(&self) -> Option<&ServoStatus> {
        match self {
            ComponentStatus::Servo(s) => Some(s),
            ComponentStatus::Distance(_) => None,
        }
    }

    /// Distance status, if this is one.
    pub fn as_distance(&self) -> Option<&DistanceStatus> {
        match self {
            ComponentStatus::Distance(d) => Some(d),
            ComponentStatus::Servo(_) => None,
        }
    }
}
