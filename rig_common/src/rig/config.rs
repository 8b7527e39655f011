//! Rig configuration types.
//!
//! This module contains the configuration loaded from `rig.toml`:
//! - `RigConfig` - Root document
//! - `HostConfig` - Frame loop timing
//! - `ServoConfig` / `DistanceConfig` - Per-component serial and motion settings
//! - `PointerConfig` - Pointer source used to drive the servo
//! - `SimulationConfig` - Simulated microcontroller behaviour
//!
//! A component is enabled by the presence of its section.

use crate::config::{ConfigError, SharedConfig};
use crate::consts::{
    DEFAULT_BAUD_RATE, DEFAULT_CYCLE_TIME_US, DEFAULT_READ_TIMEOUT_MS, DEFAULT_WRITE_TIMEOUT_MS,
};
use crate::math::Vec2;
use crate::serial::SerialSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Component name of the servo driver.
pub const SERVO_COMPONENT: &str = "servo";

/// Component name of the distance reader.
pub const DISTANCE_COMPONENT: &str = "distance";

fn default_cycle_time_us() -> u32 {
    DEFAULT_CYCLE_TIME_US
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

fn default_read_timeout_ms() -> u64 {
    DEFAULT_READ_TIMEOUT_MS
}

fn default_write_timeout_ms() -> u64 {
    DEFAULT_WRITE_TIMEOUT_MS
}

fn default_rotation_speed() -> f64 {
    180.0
}

fn default_max_angle() -> f64 {
    45.0
}

fn default_arm_length() -> f64 {
    2.0
}

fn default_arm_width() -> f64 {
    0.5
}

fn default_smooth_time() -> f64 {
    100.0
}

fn default_max_distance() -> f64 {
    15.0
}

fn default_calibration() -> i32 {
    100
}

/// Root of `rig.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RigConfig {
    /// Logging and instance identity.
    #[serde(default)]
    pub shared: SharedConfig,

    /// Frame loop timing.
    #[serde(default)]
    pub host: HostConfig,

    /// Servo driver; absent disables the component.
    #[serde(default)]
    pub servo: Option<ServoConfig>,

    /// Distance reader; absent disables the component.
    #[serde(default)]
    pub distance: Option<DistanceConfig>,

    /// Pointer source for the servo.
    #[serde(default)]
    pub pointer: PointerConfig,

    /// Behaviour of the simulated microcontroller (`--simulate`).
    #[serde(default)]
    pub simulation: SimulationConfig,
}

impl RigConfig {
    /// Validate the whole document.
    ///
    /// # Validation Rules
    /// 1. `shared.service_name` is not empty
    /// 2. `host.cycle_time_us` > 0
    /// 3. every enabled component passes its own validation
    /// 4. no two components share a port
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        if self.host.cycle_time_us == 0 {
            return Err(ConfigError::ValidationError(
                "host.cycle_time_us must be greater than 0".to_string(),
            ));
        }

        if let Some(servo) = &self.servo {
            servo.validate()?;
        }
        if let Some(distance) = &self.distance {
            distance.validate()?;
        }

        if let (Some(servo), Some(distance)) = (&self.servo, &self.distance) {
            if servo.port == distance.port {
                return Err(ConfigError::ValidationError(format!(
                    "servo and distance cannot share port {}",
                    servo.port
                )));
            }
        }

        self.pointer.validate()?;
        self.simulation.validate()?;
        Ok(())
    }

    /// Names of the components whose sections are present, in tick order.
    pub fn enabled_components(&self) -> Vec<&'static str> {
        let mut names = Vec::with_capacity(2);
        if self.servo.is_some() {
            names.push(SERVO_COMPONENT);
        }
        if self.distance.is_some() {
            names.push(DISTANCE_COMPONENT);
        }
        names
    }

    /// Frame period.
    pub fn cycle_time(&self) -> Duration {
        Duration::from_micros(self.host.cycle_time_us as u64)
    }
}

/// Frame loop timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HostConfig {
    /// Frame period in microseconds.
    #[serde(default = "default_cycle_time_us")]
    pub cycle_time_us: u32,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            cycle_time_us: default_cycle_time_us(),
        }
    }
}

fn validate_port(section: &str, port: &str, baud_rate: u32) -> Result<(), ConfigError> {
    if port.trim().is_empty() {
        return Err(ConfigError::ValidationError(format!(
            "{section}.port cannot be empty"
        )));
    }
    if baud_rate == 0 {
        return Err(ConfigError::ValidationError(format!(
            "{section}.baud_rate must be greater than 0"
        )));
    }
    Ok(())
}

fn validate_non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::ValidationError(format!(
            "{field} must be a finite, non-negative number (got {value})"
        )));
    }
    Ok(())
}

fn validate_positive(field: &str, value: f64) -> Result<(), ConfigError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ConfigError::ValidationError(format!(
            "{field} must be a finite, positive number (got {value})"
        )));
    }
    Ok(())
}

/// Servo driver section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServoConfig {
    /// Serial device of the servo microcontroller.
    pub port: String,

    /// Baud rate.
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Timeout applied to device operations, in milliseconds.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,

    /// Maximum arm rotation speed in degrees per second.
    #[serde(default = "default_rotation_speed")]
    pub rotation_speed: f64,

    /// Maximum deflection from up, in degrees, either side.
    #[serde(default = "default_max_angle")]
    pub max_angle: f64,

    /// Arm rotation at start-of-life, in degrees.
    #[serde(default)]
    pub initial_rotation: f64,

    /// Arm pivot in world units.
    #[serde(default)]
    pub position: Vec2,

    /// Length of the grabbable arm, from the pivot along its up axis.
    #[serde(default = "default_arm_length")]
    pub arm_length: f64,

    /// Width of the grabbable arm.
    #[serde(default = "default_arm_width")]
    pub arm_width: f64,
}

impl ServoConfig {
    /// Section defaults for `port`.
    pub fn with_port(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: default_baud_rate(),
            write_timeout_ms: default_write_timeout_ms(),
            rotation_speed: default_rotation_speed(),
            max_angle: default_max_angle(),
            initial_rotation: 0.0,
            position: Vec2::ZERO,
            arm_length: default_arm_length(),
            arm_width: default_arm_width(),
        }
    }

    /// Validate the section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_port("servo", &self.port, self.baud_rate)?;
        validate_non_negative("servo.rotation_speed", self.rotation_speed)?;
        validate_non_negative("servo.max_angle", self.max_angle)?;
        if self.max_angle > 180.0 {
            return Err(ConfigError::ValidationError(format!(
                "servo.max_angle must be at most 180 (got {})",
                self.max_angle
            )));
        }
        if !self.initial_rotation.is_finite() {
            return Err(ConfigError::ValidationError(
                "servo.initial_rotation must be finite".to_string(),
            ));
        }
        validate_positive("servo.arm_length", self.arm_length)?;
        validate_positive("servo.arm_width", self.arm_width)?;
        Ok(())
    }

    /// Serial settings of the servo link.
    pub fn serial_settings(&self) -> SerialSettings {
        SerialSettings::new(
            self.port.clone(),
            self.baud_rate,
            Duration::from_millis(self.write_timeout_ms),
        )
    }
}

/// Distance reader section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DistanceConfig {
    /// Serial device of the sensor microcontroller.
    pub port: String,

    /// Baud rate.
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Blocking read window per frame, in milliseconds.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,

    /// Smoothing factor; multiplied by the frame delta to get the smooth time.
    #[serde(default = "default_smooth_time")]
    pub smooth_time: f64,

    /// Offset reached at a full-scale reading, in world units.
    #[serde(default = "default_max_distance")]
    pub max_distance: f64,

    /// Raw reading that maps to full scale. Zero pins the object at its start.
    #[serde(default = "default_calibration")]
    pub calibration: i32,

    /// Resting position of the tracked object.
    #[serde(default)]
    pub start_position: Vec2,
}

impl DistanceConfig {
    /// Section defaults for `port`.
    pub fn with_port(port: impl Into<String>) -> Self {
        Self {
            port: port.into(),
            baud_rate: default_baud_rate(),
            read_timeout_ms: default_read_timeout_ms(),
            smooth_time: default_smooth_time(),
            max_distance: default_max_distance(),
            calibration: default_calibration(),
            start_position: Vec2::ZERO,
        }
    }

    /// Validate the section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_port("distance", &self.port, self.baud_rate)?;
        validate_non_negative("distance.smooth_time", self.smooth_time)?;
        validate_non_negative("distance.max_distance", self.max_distance)?;
        if self.calibration < 0 {
            return Err(ConfigError::ValidationError(format!(
                "distance.calibration cannot be negative (got {})",
                self.calibration
            )));
        }
        Ok(())
    }

    /// Serial settings of the sensor link.
    pub fn serial_settings(&self) -> SerialSettings {
        SerialSettings::new(
            self.port.clone(),
            self.baud_rate,
            Duration::from_millis(self.read_timeout_ms),
        )
    }
}

/// Pointer source selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerMode {
    /// Pointer never pressed; the servo holds its start angle.
    #[default]
    Idle,
    /// Periodically grab the arm and sweep it back and forth.
    Sweep,
}

fn default_radius() -> f64 {
    3.0
}

fn default_amplitude_deg() -> f64 {
    60.0
}

fn default_period_s() -> f64 {
    4.0
}

fn default_hold_s() -> f64 {
    8.0
}

fn default_release_s() -> f64 {
    2.0
}

/// Pointer section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PointerConfig {
    /// Source kind.
    #[serde(default)]
    pub mode: PointerMode,
    /// Sweep radius around the arm pivot.
    #[serde(default = "default_radius")]
    pub radius: f64,
    /// Sweep amplitude either side of up, in degrees.
    #[serde(default = "default_amplitude_deg")]
    pub amplitude_deg: f64,
    /// Sweep period in seconds.
    #[serde(default = "default_period_s")]
    pub period_s: f64,
    /// How long the arm is held per cycle, in seconds.
    #[serde(default = "default_hold_s")]
    pub hold_s: f64,
    /// How long the pointer stays released per cycle, in seconds.
    #[serde(default = "default_release_s")]
    pub release_s: f64,
}

impl Default for PointerConfig {
    fn default() -> Self {
        Self {
            mode: PointerMode::default(),
            radius: default_radius(),
            amplitude_deg: default_amplitude_deg(),
            period_s: default_period_s(),
            hold_s: default_hold_s(),
            release_s: default_release_s(),
        }
    }
}

impl PointerConfig {
    /// Validate the section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_positive("pointer.radius", self.radius)?;
        validate_non_negative("pointer.amplitude_deg", self.amplitude_deg)?;
        validate_positive("pointer.period_s", self.period_s)?;
        validate_positive("pointer.hold_s", self.hold_s)?;
        validate_non_negative("pointer.release_s", self.release_s)?;
        Ok(())
    }
}

fn default_distance_max() -> i32 {
    120
}

fn default_distance_step() -> i32 {
    3
}

/// Simulated microcontroller section.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    /// Peak of the simulated distance triangle wave.
    #[serde(default = "default_distance_max")]
    pub distance_max: i32,
    /// Change of the simulated distance per line.
    #[serde(default = "default_distance_step")]
    pub distance_step: i32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            distance_max: default_distance_max(),
            distance_step: default_distance_step(),
        }
    }
}

impl SimulationConfig {
    /// Validate the section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.distance_max <= 0 || self.distance_step <= 0 {
            return Err(ConfigError::ValidationError(format!(
                "simulation.distance_max and distance_step must be positive (got {} / {})",
                self.distance_max, self.distance_step
            )));
        }
        if self.distance_step > self.distance_max {
            return Err(ConfigError::ValidationError(format!(
                "simulation.distance_step ({}) must not exceed distance_max ({})",
                self.distance_step, self.distance_max
            )));
        }
        Ok(())
    }
}
