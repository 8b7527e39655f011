//! Simulated microcontroller.
//!
//! Stands in for both boards when running with `--simulate`:
//! - angle lines written by the host move a virtual servo
//! - every read delivers the next sample of a triangle-wave distance,
//!   CRLF terminated like an Arduino `Serial.println`

use rig_common::rig::config::SimulationConfig;
use rig_common::serial::protocol::parse_reading;
use rig_common::serial::{
    LineLink, LineStream, LinkError, LinkOpener, SerialLink, SerialSettings,
};
use std::collections::VecDeque;
use std::io::{self, Read, Write};
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// Byte-level model of the servo / sensor board.
#[derive(Debug)]
pub struct SimulatedMcu {
    /// Peak distance
    distance_max: i32,
    /// Change per emitted sample
    distance_step: i32,
    /// Next distance to emit
    distance: i32,
    /// Direction of the triangle wave (+1 / -1)
    direction: i32,
    /// Bytes of the sample being delivered
    tx: VecDeque<u8>,
    /// Partial command line from the host
    rx: Vec<u8>,
    /// Last angle commanded by the host
    servo_angle: Option<u8>,
}

impl SimulatedMcu {
    /// Create a board whose distance sweeps `0..=distance_max` by `distance_step`.
    pub fn new(config: &SimulationConfig) -> Self {
        let distance_max = config.distance_max.max(1);
        Self {
            distance_max,
            distance_step: config.distance_step.clamp(1, distance_max),
            distance: 0,
            direction: 1,
            tx: VecDeque::new(),
            rx: Vec::new(),
            servo_angle: None,
        }
    }

    #[cfg(test)]
    fn servo_angle(&self) -> Option<u8> {
        self.servo_angle
    }

    fn next_sample(&mut self) -> i32 {
        let sample = self.distance;
        let next = self.distance + self.direction * self.distance_step;
        if next > self.distance_max || next < 0 {
            self.direction = -self.direction;
        }
        self.distance = (self.distance + self.direction * self.distance_step)
            .clamp(0, self.distance_max);
        sample
    }

    fn apply_command(&mut self, line: &[u8]) {
        let text = String::from_utf8_lossy(line);
        match parse_reading(&text) {
            Ok(angle) if (0..=180).contains(&angle) => {
                let angle = angle as u8;
                if self.servo_angle != Some(angle) {
                    trace!("Simulated servo -> {}°", angle);
                }
                self.servo_angle = Some(angle);
            }
            Ok(angle) => warn!("Simulated servo ignored out-of-range angle {}", angle),
            Err(e) => warn!("Simulated servo ignored command: {}", e),
        }
    }
}

impl Read for SimulatedMcu {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.tx.is_empty() {
            let sample = self.next_sample();
            self.tx.extend(format!("{sample}\r\n").bytes());
        }
        let n = buf.len().min(self.tx.len());
        for (slot, byte) in buf.iter_mut().zip(self.tx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for SimulatedMcu {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for &byte in buf {
            if byte == b'\n' {
                let line = std::mem::take(&mut self.rx);
                self.apply_command(&line);
            } else {
                self.rx.push(byte);
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl LineStream for SimulatedMcu {
    fn set_window(&mut self, _window: Duration) -> io::Result<()> {
        Ok(())
    }
}

// Closing the link drops the board; report where the virtual servo ended up.
impl Drop for SimulatedMcu {
    fn drop(&mut self) {
        match self.servo_angle {
            Some(angle) => info!("Simulated servo parked at {}°", angle),
            None => debug!("Simulated board released without servo commands"),
        }
    }
}

/// Opener backing every port with a fresh [`SimulatedMcu`].
#[derive(Debug, Clone, Default)]
pub struct SimulatedOpener {
    config: SimulationConfig,
}

impl SimulatedOpener {
    /// Create an opener using the `[simulation]` section.
    pub fn new(config: SimulationConfig) -> Self {
        Self { config }
    }
}

impl LinkOpener for SimulatedOpener {
    fn open(&self, settings: &SerialSettings) -> Result<Box<dyn SerialLink>, LinkError> {
        debug!("Opened simulated link {}", settings);
        Ok(Box::new(LineLink::new(
            settings.port.clone(),
            SimulatedMcu::new(&self.config),
            settings.timeout,
        )))
    }
}
