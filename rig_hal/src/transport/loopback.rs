//! In-memory loopback transport.
//!
//! A `LoopbackStream` behaves like a serial adapter with TX jumpered to RX:
//! every byte written can be read back. Clones share the same buffer, so a
//! test can keep one handle while a component owns the link.

use parking_lot::Mutex;
use rig_common::serial::{
    LineLink, LineStream, LinkError, LinkOpener, SerialLink, SerialSettings,
};
use std::collections::{HashMap, HashSet, VecDeque};
use std::io::{self, Read, Write};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Default)]
struct LoopbackState {
    /// Bytes waiting to be read
    buffer: VecDeque<u8>,
    /// Simulate an unplugged adapter on write
    fail_writes: bool,
    /// Simulate an unplugged adapter on read
    fail_reads: bool,
    /// Total bytes accepted by `write`
    bytes_written: u64,
}

/// Shared in-memory byte pipe.
#[derive(Debug, Clone, Default)]
pub struct LoopbackStream {
    state: Arc<Mutex<LoopbackState>>,
}

impl LoopbackStream {
    /// Create an empty pipe.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes as if the device had sent them.
    pub fn inject(&self, bytes: &[u8]) {
        self.state.lock().buffer.extend(bytes.iter().copied());
    }

    /// Take every byte currently queued.
    pub fn drain(&self) -> Vec<u8> {
        self.state.lock().buffer.drain(..).collect()
    }

    /// Take the queued bytes as text lines (terminators removed).
    pub fn drain_lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.drain())
            .lines()
            .map(str::to_string)
            .collect()
    }

    /// Make subsequent writes fail with a broken pipe.
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    /// Make subsequent reads fail as if the adapter was unplugged.
    pub fn set_fail_reads(&self, fail: bool) {
        self.state.lock().fail_reads = fail;
    }

    /// Total bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.state.lock().bytes_written
    }
}

impl Read for LoopbackStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        if state.fail_reads {
            return Err(io::Error::from(io::ErrorKind::ConnectionReset));
        }
        if state.buffer.is_empty() {
            return Err(io::Error::from(io::ErrorKind::TimedOut));
        }
        let n = buf.len().min(state.buffer.len());
        for (slot, byte) in buf.iter_mut().zip(state.buffer.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }
}

impl Write for LoopbackStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        if state.fail_writes {
            return Err(io::Error::from(io::ErrorKind::BrokenPipe));
        }
        state.buffer.extend(buf.iter().copied());
        state.bytes_written += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// Reads and writes never block, so there is no window to narrow.
impl LineStream for LoopbackStream {
    fn set_window(&mut self, _window: Duration) -> io::Result<()> {
        Ok(())
    }
}

/// Opener handing out loopback links, one pipe per port name.
#[derive(Debug, Default)]
pub struct LoopbackOpener {
    streams: Mutex<HashMap<String, LoopbackStream>>,
    refused: HashSet<String>,
}

impl LoopbackOpener {
    /// Opener that accepts every port.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `open` fail for `port`, as if the device were missing.
    pub fn refuse(mut self, port: impl Into<String>) -> Self {
        self.refused.insert(port.into());
        self
    }

    /// Handle on the pipe behind `port`, created on first use.
    ///
    /// Taking the handle before the component opens the port lets a test
    /// queue readings up front.
    pub fn stream(&self, port: &str) -> LoopbackStream {
        self.streams
            .lock()
            .entry(port.to_string())
            .or_default()
            .clone()
    }
}

impl LinkOpener for LoopbackOpener {
    fn open(&self, settings: &SerialSettings) -> Result<Box<dyn SerialLink>, LinkError> {
        if self.refused.contains(&settings.port) {
            return Err(LinkError::Connection {
                port: settings.port.clone(),
                reason: "refused by loopback opener".to_string(),
            });
        }

        let stream = self.stream(&settings.port);
        debug!("Opened loopback link {}", settings);
        Ok(Box::new(LineLink::new(
            settings.port.clone(),
            stream,
            settings.timeout,
        )))
    }
}
