//! Distance reader component.
//!
//! Each frame reads one reading from the sensor board, maps it onto a
//! horizontal offset and eases a tracked object toward
//! `start_position + (normalized * max_distance, 0)`.

use rig_common::math::{Vec2, normalize_reading, smooth_damp};
use rig_common::rig::component::{Component, ComponentDiagnostics, RigError};
use rig_common::rig::config::{DISTANCE_COMPONENT, DistanceConfig, RigConfig};
use rig_common::rig::types::{ComponentStatus, DistanceStatus, FrameInput};
use rig_common::serial::protocol::parse_reading;
use rig_common::serial::{LinkError, LinkOpener, SerialLink};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Distance reader implementing the [`Component`] trait.
pub struct DistanceReader {
    /// Section this reader was created from
    config: DistanceConfig,
    /// Serial link; `None` before start or if opening failed
    link: Option<Box<dyn SerialLink>>,
    /// Last successfully parsed reading
    raw: i32,
    /// Position of the tracked object
    position: Vec2,
    /// Smoothing velocity carried between frames
    velocity: Vec2,
    /// Reset/close sequence already ran
    shut_down: bool,
    /// Counters
    diagnostics: ComponentDiagnostics,
}

impl DistanceReader {
    /// Create a reader from its config section.
    pub fn new(config: DistanceConfig) -> Self {
        let position = config.start_position;
        Self {
            config,
            link: None,
            raw: 0,
            position,
            velocity: Vec2::ZERO,
            shut_down: false,
            diagnostics: ComponentDiagnostics::default(),
        }
    }

    /// Whether the link is open.
    pub fn is_open(&self) -> bool {
        self.link.as_ref().is_some_and(|l| l.is_open())
    }

    /// Horizontal offset for the current reading.
    pub fn offset(&self) -> f64 {
        normalize_reading(self.raw, self.config.calibration) * self.config.max_distance
    }

    /// Read one line and update `raw`.
    ///
    /// Timeouts and malformed lines keep the previous reading.
    fn poll(&mut self) -> Result<(), RigError> {
        let Some(link) = self.link.as_mut().filter(|l| l.is_open()) else {
            return Ok(());
        };

        let line = match link.read_line() {
            Ok(line) => line,
            Err(e @ LinkError::Timeout { .. }) => {
                self.diagnostics.timeouts += 1;
                debug!("{}", e);
                return Ok(());
            }
            Err(e) if !e.is_fatal() => {
                self.diagnostics.parse_errors += 1;
                warn!("Discarding sensor data: {}", e);
                return Ok(());
            }
            Err(e) => return Err(e.into()),
        };
        self.diagnostics.lines_read += 1;

        match parse_reading(&line) {
            Ok(value) => self.raw = value,
            Err(e) => {
                self.diagnostics.parse_errors += 1;
                warn!("Discarding sensor data: {}", e);
            }
        }
        Ok(())
    }

    fn status(&self) -> DistanceStatus {
        DistanceStatus {
            raw: self.raw,
            normalized: normalize_reading(self.raw, self.config.calibration),
            position: self.position,
        }
    }
}

/// Factory registered under `"distance"`.
pub fn create_component(config: &RigConfig) -> Result<Box<dyn Component>, RigError> {
    let section = config
        .distance
        .clone()
        .ok_or_else(|| RigError::ConfigError("missing [distance] section".to_string()))?;
    section.validate()?;
    Ok(Box::new(DistanceReader::new(section)))
}

impl Component for DistanceReader {
    fn name(&self) -> &'static str {
        DISTANCE_COMPONENT
    }

    fn start(&mut self, opener: &dyn LinkOpener) -> Result<(), RigError> {
        let settings = self.config.serial_settings();
        info!("Starting distance reader on {}", settings);

        self.link = Some(opener.open(&settings)?);
        self.position = self.config.start_position;
        self.velocity = Vec2::ZERO;

        info!(
            "Distance reader started (calibration={}, max_distance={})",
            self.config.calibration, self.config.max_distance
        );
        Ok(())
    }

    fn tick(&mut self, _frame: &FrameInput, dt: Duration) -> Result<ComponentStatus, RigError> {
        self.diagnostics.ticks += 1;
        self.poll()?;

        let dt = dt.as_secs_f64();
        let target = self.config.start_position + Vec2::new(self.offset(), 0.0);
        self.position = smooth_damp(
            self.position,
            target,
            &mut self.velocity,
            self.config.smooth_time * dt,
            dt,
        );

        Ok(ComponentStatus::Distance(self.status()))
    }

    fn shutdown(&mut self) -> Result<(), RigError> {
        if self.shut_down {
            return Ok(());
        }
        self.shut_down = true;
        info!("Shutting down distance reader");

        if let Some(mut link) = self.link.take() {
            if link.is_open() {
                link.close()?;
            }
        }
        Ok(())
    }

    fn diagnostics(&self) -> ComponentDiagnostics {
        self.diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{LoopbackOpener, LoopbackStream};

    const FRAME: Duration = Duration::from_millis(20);

    fn started(calibration: i32) -> (DistanceReader, LoopbackStream) {
        let opener = LoopbackOpener::new();
        let handle = opener.stream("sensor0");
        let mut config = DistanceConfig::with_port("sensor0");
        config.calibration = calibration;
        config.max_distance = 15.0;
        config.read_timeout_ms = 1;
        let mut reader = DistanceReader::new(config);
        reader.start(&opener).unwrap();
        (reader, handle)
    }

    fn tick(reader: &mut DistanceReader) -> DistanceStatus {
        *reader
            .tick(&FrameInput::default(), FRAME)
            .unwrap()
            .as_distance()
            .unwrap()
    }

    #[test]
    fn over_range_reading_is_full_scale() {
        let (mut reader, handle) = started(100);
        handle.inject(b"120\r\n");
        let status = tick(&mut reader);
        assert_eq!(status.raw, 120);
        assert_eq!(status.normalized, 1.0);
        assert_eq!(reader.offset(), 15.0);
    }

    #[test]
    fn object_converges_on_offset() {
        let (mut reader, handle) = started(100);
        handle.inject(b"50\n");
        let mut status = tick(&mut reader);
        assert!(status.position.x > 0.0 && status.position.x < 7.5);
        for _ in 0..2000 {
            status = tick(&mut reader);
        }
        assert!((status.position.x - 7.5).abs() < 1e-3);
        assert_eq!(status.position.y, 0.0);
    }

    #[test]
    fn timeout_keeps_previous_reading() {
        let (mut reader, handle) = started(100);
        handle.inject(b"40\n");
        tick(&mut reader);
        let status = tick(&mut reader);
        assert_eq!(status.raw, 40);
        assert_eq!(reader.diagnostics().timeouts, 1);
        assert_eq!(reader.diagnostics().lines_read, 1);
    }

    #[test]
    fn malformed_line_keeps_previous_reading() {
        let (mut reader, handle) = started(100);
        handle.inject(b"40\nforty\n");
        tick(&mut reader);
        let status = tick(&mut reader);
        assert_eq!(status.raw, 40);
        assert_eq!(reader.diagnostics().parse_errors, 1);
    }

    #[test]
    fn disconnect_while_reading_is_fatal() {
        let (mut reader, handle) = started(100);
        handle.inject(b"40\n");
        tick(&mut reader);

        handle.set_fail_reads(true);
        let err = reader.tick(&FrameInput::default(), FRAME).unwrap_err();
        assert!(matches!(err, RigError::Link(LinkError::Disconnected { .. })));
        assert_eq!(reader.diagnostics().parse_errors, 0);

        reader.shutdown().unwrap();
        assert!(!reader.is_open());
    }

    #[test]
    fn zero_calibration_pins_object_at_start() {
        let (mut reader, handle) = started(0);
        handle.inject(b"75\n");
        let status = tick(&mut reader);
        assert_eq!(status.normalized, 0.0);
        assert_eq!(status.position, Vec2::ZERO);
    }

    #[test]
    fn unopened_reader_still_ticks() {
        let mut reader = DistanceReader::new(DistanceConfig::with_port("never"));
        let status = tick(&mut reader);
        assert_eq!(status.raw, 0);
        assert!(!reader.is_open());
        reader.shutdown().unwrap();
    }

    #[test]
    fn shutdown_closes_once() {
        let (mut reader, _handle) = started(100);
        assert!(reader.is_open());
        reader.shutdown().unwrap();
        reader.shutdown().unwrap();
        assert!(!reader.is_open());
        // Closed reader keeps ticking on its last reading.
        assert_eq!(tick(&mut reader).raw, 0);
    }
}
