//! Workspace-wide defaults.
//!
//! Single source of truth for numeric defaults and default paths.

/// Canonical service name (used for logging).
pub const RIG_SERVICE_NAME: &str = "rig";

/// Default frame period in microseconds (60 Hz).
pub const DEFAULT_CYCLE_TIME_US: u32 = 16_667;

/// Default baud rate of both serial links.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default blocking read window of the distance link, in milliseconds.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 50;

/// Default write timeout of the servo link, in milliseconds.
pub const DEFAULT_WRITE_TIMEOUT_MS: u64 = 100;

/// Servo angle sent on shutdown.
pub const SERVO_NEUTRAL_ANGLE: u8 = 90;

/// Upper bound of the servo angle range (degrees).
pub const SERVO_MAX_ANGLE: u8 = 180;

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/rig/rig.toml";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constants_are_consistent() {
        assert!(DEFAULT_CYCLE_TIME_US > 0);
        assert!(DEFAULT_BAUD_RATE > 0);
        assert!(SERVO_NEUTRAL_ANGLE <= SERVO_MAX_ANGLE);
    }
}
