//! Serial link trait and error types.

use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Error types for serial link operations.
#[derive(Debug, Clone, Error)]
pub enum LinkError {
    /// Port could not be opened (missing device, permissions, bad settings)
    #[error("Cannot open serial port {port}: {reason}")]
    Connection {
        /// Port name as configured
        port: String,
        /// Transport-level reason
        reason: String,
    },

    /// No complete line arrived within the read window
    #[error("No data from {port} within {timeout:?}")]
    Timeout {
        /// Port name
        port: String,
        /// Read window that elapsed
        timeout: Duration,
    },

    /// A line arrived but did not match the protocol
    #[error("Malformed line {line:?}: {reason}")]
    Parse {
        /// Offending line, terminator stripped
        line: String,
        /// Why it was rejected
        reason: String,
    },

    /// Operation on a link that was never opened or is already closed
    #[error("Serial link is closed")]
    Closed,

    /// Device went away mid-session
    #[error("Serial port {port} disconnected: {reason}")]
    Disconnected {
        /// Port name
        port: String,
        /// Transport-level reason
        reason: String,
    },

    /// Any other I/O failure
    #[error("Serial I/O error: {0}")]
    Io(String),
}

impl LinkError {
    /// Whether the error should stop the host loop.
    ///
    /// Timeouts and malformed lines only cost one reading; everything else
    /// means the link can no longer be trusted.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, LinkError::Timeout { .. } | LinkError::Parse { .. })
    }

    /// Classify an I/O error raised by the underlying stream of `port`.
    pub fn from_io(port: &str, err: &std::io::Error, timeout: Duration) -> Self {
        use std::io::ErrorKind;

        match err.kind() {
            ErrorKind::TimedOut | ErrorKind::WouldBlock => LinkError::Timeout {
                port: port.to_string(),
                timeout,
            },
            ErrorKind::BrokenPipe
            | ErrorKind::NotConnected
            | ErrorKind::UnexpectedEof
            | ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted => LinkError::Disconnected {
                port: port.to_string(),
                reason: err.to_string(),
            },
            _ => LinkError::Io(format!("{port}: {err}")),
        }
    }
}

/// Address and timing of one serial connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    /// Device path or name, e.g. `/dev/ttyUSB0` or `COM9`
    pub port: String,
    /// Baud rate
    pub baud_rate: u32,
    /// Read window for `read_line` and per-operation timeout of the device
    pub timeout: Duration,
}

impl SerialSettings {
    /// Create settings for `port` at `baud_rate` with the given timeout.
    pub fn new(port: impl Into<String>, baud_rate: u32, timeout: Duration) -> Self {
        Self {
            port: port.into(),
            baud_rate,
            timeout,
        }
    }
}

impl fmt::Display for SerialSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.port, self.baud_rate)
    }
}

/// Line-oriented serial connection owned by exactly one component.
///
/// Every message is ASCII text terminated by `\n`. Implementations must be
/// open before any read or write; both fail with [`LinkError::Closed`]
/// afterwards.
pub trait SerialLink: Send {
    /// Port name this link was opened on.
    fn port_name(&self) -> &str;

    /// Whether the link is open.
    fn is_open(&self) -> bool;

    /// Send `line` followed by the line terminator.
    fn write_line(&mut self, line: &str) -> Result<(), LinkError>;

    /// Block until one complete line arrives or the read window elapses.
    ///
    /// The terminator and a trailing `\r` are stripped.
    fn read_line(&mut self) -> Result<String, LinkError>;

    /// Close the link. Closing a closed link is a no-op.
    fn close(&mut self) -> Result<(), LinkError>;
}

/// Opens serial links.
///
/// The host decides which transport backs the components (real device,
/// simulator, loopback) by handing them an opener.
pub trait LinkOpener {
    /// Open a link with the given settings.
    fn open(&self, settings: &SerialSettings) -> Result<Box<dyn SerialLink>, LinkError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Error, ErrorKind};

    const WINDOW: Duration = Duration::from_millis(50);

    #[test]
    fn timeouts_and_parse_errors_are_not_fatal() {
        let timeout = LinkError::Timeout {
            port: "p".into(),
            timeout: WINDOW,
        };
        let parse = LinkError::Parse {
            line: "abc".into(),
            reason: "invalid digit".into(),
        };
        assert!(!timeout.is_fatal());
        assert!(!parse.is_fatal());
        assert!(LinkError::Closed.is_fatal());
        assert!(LinkError::Io("x".into()).is_fatal());
    }

    #[test]
    fn io_errors_are_classified() {
        let e = LinkError::from_io("p", &Error::from(ErrorKind::TimedOut), WINDOW);
        assert!(matches!(e, LinkError::Timeout { .. }));

        let e = LinkError::from_io("p", &Error::from(ErrorKind::BrokenPipe), WINDOW);
        assert!(matches!(e, LinkError::Disconnected { .. }));

        let e = LinkError::from_io("p", &Error::from(ErrorKind::InvalidData), WINDOW);
        assert!(matches!(e, LinkError::Io(_)));
    }

    #[test]
    fn settings_display() {
        let s = SerialSettings::new("COM9", 9600, WINDOW);
        assert_eq!(s.to_string(), "COM9@9600");
    }

    #[test]
    fn error_messages_name_the_port() {
        let e = LinkError::Connection {
            port: "/dev/ttyUSB0".into(),
            reason: "No such file or directory".into(),
        };
        assert!(e.to_string().contains("/dev/ttyUSB0"));
    }
}
