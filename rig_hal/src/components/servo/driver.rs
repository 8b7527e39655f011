//! Servo driver component.
//!
//! Grabbing the arm with the pointer makes it follow the pointer; every
//! moving frame sends the resulting servo angle as one text line.

use super::arm::ArmState;
use rig_common::consts::SERVO_NEUTRAL_ANGLE;
use rig_common::rig::component::{Component, ComponentDiagnostics, RigError};
use rig_common::rig::config::{RigConfig, SERVO_COMPONENT, ServoConfig};
use rig_common::rig::types::{ComponentStatus, FrameInput, ServoStatus};
use rig_common::serial::protocol::format_angle_line;
use rig_common::serial::{LinkOpener, SerialLink};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Servo driver implementing the [`Component`] trait.
pub struct ServoDriver {
    /// Section this driver was created from
    config: ServoConfig,
    /// Arm geometry
    arm: ArmState,
    /// Arm follows the pointer
    moveable: bool,
    /// Serial link; `None` before start or if opening failed
    link: Option<Box<dyn SerialLink>>,
    /// Last angle successfully written
    last_angle: Option<u8>,
    /// Reset/close sequence already ran
    shut_down: bool,
    /// Counters
    diagnostics: ComponentDiagnostics,
}

impl ServoDriver {
    /// Create a driver from its config section.
    pub fn new(config: ServoConfig) -> Self {
        let arm = ArmState::from_config(&config);
        Self {
            config,
            arm,
            moveable: false,
            link: None,
            last_angle: None,
            shut_down: false,
            diagnostics: ComponentDiagnostics::default(),
        }
    }

    /// Arm geometry.
    pub fn arm(&self) -> &ArmState {
        &self.arm
    }

    /// Whether the arm currently follows the pointer.
    pub fn is_moveable(&self) -> bool {
        self.moveable
    }

    fn status(&self) -> ServoStatus {
        ServoStatus {
            moveable: self.moveable,
            rotation_deg: self.arm.rotation(),
            last_angle: self.last_angle,
        }
    }

    fn send_angle(&mut self, angle: u8) -> Result<(), RigError> {
        let link = self.link.as_mut().ok_or(RigError::NotStarted(SERVO_COMPONENT))?;
        link.write_line(&format_angle_line(angle))?;
        self.diagnostics.lines_written += 1;
        self.last_angle = Some(angle);
        Ok(())
    }
}

/// Factory registered under `"servo"`.
pub fn create_component(config: &RigConfig) -> Result<Box<dyn Component>, RigError> {
    let section = config
        .servo
        .clone()
        .ok_or_else(|| RigError::ConfigError("missing [servo] section".to_string()))?;
    section.validate()?;
    Ok(Box::new(ServoDriver::new(section)))
}

impl Component for ServoDriver {
    fn name(&self) -> &'static str {
        SERVO_COMPONENT
    }

    fn start(&mut self, opener: &dyn LinkOpener) -> Result<(), RigError> {
        let settings = self.config.serial_settings();
        info!("Starting servo driver on {}", settings);

        self.link = Some(opener.open(&settings)?);
        self.send_angle(self.arm.servo_angle())?;

        info!(
            "Servo driver started (rotation={:.1}°, angle={})",
            self.arm.rotation(),
            self.arm.servo_angle()
        );
        Ok(())
    }

    fn tick(&mut self, frame: &FrameInput, dt: Duration) -> Result<ComponentStatus, RigError> {
        self.diagnostics.ticks += 1;
        let pointer = &frame.pointer;

        if self.moveable {
            let max_step = self.config.rotation_speed * dt.as_secs_f64();
            self.arm
                .steer_toward(pointer.position, self.config.max_angle, max_step);
            self.send_angle(self.arm.servo_angle())?;
        }

        // A press that misses the arm leaves the mode unchanged.
        if pointer.pressed_this_frame && self.arm.contains(pointer.position) {
            if !self.moveable {
                debug!("Arm grabbed at ({:.2}, {:.2})", pointer.position.x, pointer.position.y);
            }
            self.moveable = true;
        }

        if pointer.released_this_frame && self.moveable {
            debug!("Arm released at rotation {:.1}°", self.arm.rotation());
            self.moveable = false;
        }

        Ok(ComponentStatus::Servo(self.status()))
    }

    fn shutdown(&mut self) -> Result<(), RigError> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;
        self.moveable = false;
        info!("Shutting down servo driver");

        // Neutral: arm straight up.
        self.arm.set_rotation(0.0);
        let Some(mut link) = self.link.take() else {
            debug!("Servo link never opened, nothing to reset");
            return Ok(());
        };

        if link.is_open() {
            match link.write_line(&format_angle_line(SERVO_NEUTRAL_ANGLE)) {
                Ok(()) => {
                    self.diagnostics.lines_written += 1;
                    self.last_angle = Some(SERVO_NEUTRAL_ANGLE);
                }
                Err(e) => warn!("Failed to reset servo to {}: {}", SERVO_NEUTRAL_ANGLE, e),
            }
        }

        link.close()?;
        Ok(())
    }

    fn diagnostics(&self) -> ComponentDiagnostics {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::LoopbackOpener;
    use rig_common::math::Vec2;
    use rig_common::rig::types::PointerState;
    use rig_common::serial::LinkError;

    const FRAME: Duration = Duration::from_millis(100);

    fn started() -> (ServoDriver, crate::transport::LoopbackStream) {
        let opener = LoopbackOpener::new();
        let handle = opener.stream("servo0");
        let mut config = ServoConfig::with_port("servo0");
        config.rotation_speed = 100.0;
        config.max_angle = 45.0;
        let mut driver = ServoDriver::new(config);
        driver.start(&opener).unwrap();
        (driver, handle)
    }

    fn frame(pointer: PointerState) -> FrameInput {
        FrameInput::with_pointer(pointer)
    }

    #[test]
    fn start_sends_initial_angle() {
        let (_driver, handle) = started();
        assert_eq!(handle.drain(), b"90\n");
    }

    #[test]
    fn press_off_arm_does_not_grab() {
        let (mut driver, handle) = started();
        handle.drain();
        driver
            .tick(&frame(PointerState::press(Vec2::new(5.0, 5.0))), FRAME)
            .unwrap();
        assert!(!driver.is_moveable());
        driver
            .tick(&frame(PointerState::drag(Vec2::new(-5.0, 5.0))), FRAME)
            .unwrap();
        assert!(handle.drain().is_empty());
    }

    #[test]
    fn grab_drag_release() {
        let (mut driver, handle) = started();
        handle.drain();

        // Press on the arm: becomes moveable, nothing sent yet.
        let status = driver
            .tick(&frame(PointerState::press(Vec2::new(0.0, 1.0))), FRAME)
            .unwrap();
        assert!(status.as_servo().unwrap().moveable);
        assert!(handle.drain().is_empty());

        // Drag far left: 100°/s * 0.1 s = 10° per frame.
        driver
            .tick(&frame(PointerState::drag(Vec2::new(-3.0, 0.0))), FRAME)
            .unwrap();
        assert_eq!(handle.drain_lines(), vec!["100"]);

        for _ in 0..10 {
            driver
                .tick(&frame(PointerState::drag(Vec2::new(-3.0, 0.0))), FRAME)
                .unwrap();
        }
        // Clamped at max_angle 45 → 135.
        assert_eq!(handle.drain_lines().last().map(String::as_str), Some("135"));

        // Release frame still moves once, then stops.
        driver
            .tick(&frame(PointerState::release(Vec2::new(3.0, 0.0))), FRAME)
            .unwrap();
        assert!(!driver.is_moveable());
        assert_eq!(handle.drain_lines(), vec!["125"]);
        driver
            .tick(&frame(PointerState::hover(Vec2::new(3.0, 0.0))), FRAME)
            .unwrap();
        assert!(handle.drain().is_empty());
    }

    #[test]
    fn write_failure_mid_session_is_fatal() {
        let (mut driver, handle) = started();
        driver
            .tick(&frame(PointerState::press(Vec2::new(0.0, 1.0))), FRAME)
            .unwrap();
        handle.set_fail_writes(true);
        let err = driver
            .tick(&frame(PointerState::drag(Vec2::new(1.0, 1.0))), FRAME)
            .unwrap_err();
        assert!(matches!(err, RigError::Link(LinkError::Disconnected { .. })));
    }

    #[test]
    fn shutdown_resets_once_and_closes() {
        let (mut driver, handle) = started();
        driver
            .tick(&frame(PointerState::press(Vec2::new(0.0, 1.0))), FRAME)
            .unwrap();
        driver
            .tick(&frame(PointerState::drag(Vec2::new(-3.0, 0.0))), FRAME)
            .unwrap();
        handle.drain();

        driver.shutdown().unwrap();
        driver.shutdown().unwrap();
        assert_eq!(handle.drain_lines(), vec!["90"]);
        assert_eq!(driver.arm().servo_angle(), 90);
        assert_eq!(driver.diagnostics().lines_written, 3);
    }

    #[test]
    fn shutdown_without_start_is_clean() {
        let mut driver = ServoDriver::new(ServoConfig::with_port("never"));
        driver.shutdown().unwrap();
        assert_eq!(driver.arm().servo_angle(), 90);
    }

    #[test]
    fn moving_before_start_reports_not_started() {
        let mut driver = ServoDriver::new(ServoConfig::with_port("never"));
        driver
            .tick(&frame(PointerState::press(Vec2::new(0.0, 1.0))), FRAME)
            .unwrap();
        let err = driver
            .tick(&frame(PointerState::drag(Vec2::new(0.0, 1.0))), FRAME)
            .unwrap_err();
        assert!(matches!(err, RigError::NotStarted("servo")));
    }
}
