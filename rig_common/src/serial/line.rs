//! Newline framing over a byte stream.
//!
//! `LineLink` turns any [`LineStream`] into a [`SerialLink`]. Partial
//! lines are buffered across `read_line` calls, so a line split over two read
//! windows is not lost.

use super::link::{LinkError, SerialLink};
use std::io::{self, ErrorKind, Read, Write};
use std::time::{Duration, Instant};
use tracing::trace;

/// Line terminator written after every message.
pub const LINE_TERMINATOR: u8 = b'\n';

/// Size of a single read from the underlying stream.
const READ_CHUNK: usize = 64;

/// Longest line accepted before the receive buffer is discarded.
const MAX_LINE_LEN: usize = 256;

/// Byte stream whose blocking operations can be bounded.
///
/// `read_line` narrows the window before every read so that a line trickling
/// in byte by byte still respects the overall deadline.
pub trait LineStream: Read + Write + Send {
    /// Bound the next blocking read or write to at most `window`.
    fn set_window(&mut self, window: Duration) -> io::Result<()>;
}

/// [`SerialLink`] over an arbitrary byte stream.
pub struct LineLink<S> {
    /// Port name for diagnostics
    port: String,
    /// Underlying stream; `None` once closed
    stream: Option<S>,
    /// Bytes received but not yet returned as a line
    rx: Vec<u8>,
    /// Overall deadline of one `read_line`
    read_timeout: Duration,
}

impl<S: LineStream> LineLink<S> {
    /// Wrap an already opened stream.
    pub fn new(port: impl Into<String>, stream: S, read_timeout: Duration) -> Self {
        Self {
            port: port.into(),
            stream: Some(stream),
            rx: Vec::with_capacity(MAX_LINE_LEN),
            read_timeout,
        }
    }

    /// Number of buffered bytes that do not yet form a complete line.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    fn take_line(&mut self) -> Option<String> {
        let end = self.rx.iter().position(|&b| b == LINE_TERMINATOR)?;
        let raw: Vec<u8> = self.rx.drain(..=end).collect();
        let body = &raw[..end];
        let body = body.strip_suffix(b"\r").unwrap_or(body);
        Some(String::from_utf8_lossy(body).into_owned())
    }
}

impl<S: LineStream> SerialLink for LineLink<S> {
    fn port_name(&self) -> &str {
        &self.port
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn write_line(&mut self, line: &str) -> Result<(), LinkError> {
        let stream = self.stream.as_mut().ok_or(LinkError::Closed)?;
        let port = &self.port;
        let timeout = self.read_timeout;

        let mut frame = Vec::with_capacity(line.len() + 1);
        frame.extend_from_slice(line.as_bytes());
        frame.push(LINE_TERMINATOR);

        stream
            .set_window(timeout)
            .and_then(|_| stream.write_all(&frame))
            .and_then(|_| stream.flush())
            .map_err(|e| LinkError::from_io(port, &e, timeout))?;

        trace!("{} <- {:?}", self.port, line);
        Ok(())
    }

    fn read_line(&mut self) -> Result<String, LinkError> {
        if self.stream.is_none() {
            return Err(LinkError::Closed);
        }

        let deadline = Instant::now() + self.read_timeout;
        let mut chunk = [0u8; READ_CHUNK];

        loop {
            if let Some(line) = self.take_line() {
                trace!("{} -> {:?}", self.port, line);
                return Ok(line);
            }

            if self.rx.len() > MAX_LINE_LEN {
                let discarded = self.rx.len();
                self.rx.clear();
                return Err(LinkError::Parse {
                    line: String::new(),
                    reason: format!("no terminator within {discarded} bytes"),
                });
            }

            let now = Instant::now();
            if now >= deadline {
                return Err(LinkError::Timeout {
                    port: self.port.clone(),
                    timeout: self.read_timeout,
                });
            }

            let Some(stream) = self.stream.as_mut() else {
                return Err(LinkError::Closed);
            };

            if let Err(e) = stream.set_window(deadline - now) {
                return Err(LinkError::from_io(&self.port, &e, self.read_timeout));
            }

            match stream.read(&mut chunk) {
                Ok(0) => {
                    return Err(LinkError::Disconnected {
                        port: self.port.clone(),
                        reason: "end of stream".to_string(),
                    });
                }
                Ok(n) => self.rx.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(LinkError::from_io(&self.port, &e, self.read_timeout)),
            }
        }
    }

    fn close(&mut self) -> Result<(), LinkError> {
        if let Some(mut stream) = self.stream.take() {
            self.rx.clear();
            // Dropping the stream releases the device.
            stream
                .flush()
                .map_err(|e| LinkError::from_io(&self.port, &e, self.read_timeout))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Stream that serves scripted read results and records writes.
    #[derive(Default)]
    struct Script {
        reads: VecDeque<io::Result<Vec<u8>>>,
        written: Vec<u8>,
    }

    impl LineStream for Script {
        fn set_window(&mut self, _window: Duration) -> io::Result<()> {
            Ok(())
        }
    }

    impl Read for Script {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.reads.pop_front() {
                Some(Ok(bytes)) => {
                    buf[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                Some(Err(e)) => Err(e),
                None => Err(io::Error::from(io::ErrorKind::TimedOut)),
            }
        }
    }

    impl Write for Script {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    /// Device that needs `per_byte` to produce each byte and never ends a line.
    struct Trickle {
        per_byte: Duration,
        window: Duration,
        windows: Vec<Duration>,
    }

    impl LineStream for Trickle {
        fn set_window(&mut self, window: Duration) -> io::Result<()> {
            self.window = window;
            self.windows.push(window);
            Ok(())
        }
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.window < self.per_byte {
                std::thread::sleep(self.window);
                return Err(io::Error::from(io::ErrorKind::TimedOut));
            }
            std::thread::sleep(self.per_byte);
            buf[0] = b'7';
            Ok(1)
        }
    }

    impl Write for Trickle {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn link(reads: Vec<io::Result<Vec<u8>>>) -> LineLink<Script> {
        let script = Script {
            reads: reads.into(),
            written: Vec::new(),
        };
        LineLink::new("test", script, Duration::from_millis(50))
    }

    #[test]
    fn write_appends_terminator() {
        let mut l = link(vec![]);
        l.write_line("90").unwrap();
        assert_eq!(l.stream.as_ref().unwrap().written, b"90\n");
    }

    #[test]
    fn reassembles_split_lines_and_strips_cr() {
        let mut l = link(vec![Ok(b"12".to_vec()), Ok(b"0\r\n4".to_vec()), Ok(b"2\n".to_vec())]);
        assert_eq!(l.read_line().unwrap(), "120");
        assert_eq!(l.pending(), 1);
        assert_eq!(l.read_line().unwrap(), "42");
    }

    #[test]
    fn partial_line_survives_a_timeout() {
        let mut l = link(vec![Ok(b"7".to_vec())]);
        assert!(matches!(l.read_line(), Err(LinkError::Timeout { .. })));
        l.stream.as_mut().unwrap().reads.push_back(Ok(b"5\n".to_vec()));
        assert_eq!(l.read_line().unwrap(), "75");
    }

    #[test]
    fn slow_stream_is_bounded_by_the_read_deadline() {
        let timeout = Duration::from_millis(50);
        let trickle = Trickle {
            per_byte: Duration::from_millis(40),
            window: timeout,
            windows: Vec::new(),
        };
        let mut l = LineLink::new("slow", trickle, timeout);

        let started = Instant::now();
        let result = l.read_line();
        let elapsed = started.elapsed();

        assert!(matches!(result, Err(LinkError::Timeout { .. })));
        assert_eq!(l.pending(), 1);
        assert!(elapsed < Duration::from_millis(75), "took {elapsed:?}");

        // The second read only gets what is left of the deadline.
        let windows = &l.stream.as_ref().unwrap().windows;
        assert_eq!(windows.len(), 2);
        assert!(windows[0] <= timeout);
        assert!(windows[1] <= timeout - Duration::from_millis(40));
    }

    #[test]
    fn end_of_stream_is_a_disconnect() {
        let mut l = link(vec![Ok(Vec::new())]);
        assert!(matches!(l.read_line(), Err(LinkError::Disconnected { .. })));
    }

    #[test]
    fn interrupted_reads_are_retried() {
        let mut l = link(vec![
            Err(io::Error::from(io::ErrorKind::Interrupted)),
            Ok(b"3\n".to_vec()),
        ]);
        assert_eq!(l.read_line().unwrap(), "3");
    }

    #[test]
    fn runaway_line_is_discarded() {
        let reads = (0..6).map(|_| Ok(vec![b'9'; READ_CHUNK])).collect();
        let mut l = link(reads);
        assert!(matches!(l.read_line(), Err(LinkError::Parse { .. })));
        assert_eq!(l.pending(), 0);
    }

    #[test]
    fn closed_link_rejects_io_and_close_is_idempotent() {
        let mut l = link(vec![]);
        l.close().unwrap();
        l.close().unwrap();
        assert!(!l.is_open());
        assert!(matches!(l.write_line("1"), Err(LinkError::Closed)));
        assert!(matches!(l.read_line(), Err(LinkError::Closed)));
    }
}
