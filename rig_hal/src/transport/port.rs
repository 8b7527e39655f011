//! Hardware serial ports.

use rig_common::serial::{
    LineLink, LineStream, LinkError, LinkOpener, SerialLink, SerialSettings,
};
use serialport::{ClearBuffer, SerialPort, SerialPortType};
use std::io::{self, Read, Write};
use std::time::Duration;
use tracing::{info, warn};

/// Open device handle; each blocking call uses the port timeout.
struct PortStream(Box<dyn SerialPort>);

impl Read for PortStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.0.read(buf)
    }
}

impl Write for PortStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl LineStream for PortStream {
    fn set_window(&mut self, window: Duration) -> io::Result<()> {
        if self.0.timeout() != window {
            self.0.set_timeout(window)?;
        }
        Ok(())
    }
}

/// Opens real serial devices.
#[derive(Debug, Default, Clone, Copy)]
pub struct PortOpener;

impl LinkOpener for PortOpener {
    fn open(&self, settings: &SerialSettings) -> Result<Box<dyn SerialLink>, LinkError> {
        let port = serialport::new(&settings.port, settings.baud_rate)
            .timeout(settings.timeout)
            .open()
            .map_err(|e| LinkError::Connection {
                port: settings.port.clone(),
                reason: e.to_string(),
            })?;

        // Drop whatever the MCU printed before we attached.
        if let Err(e) = port.clear(ClearBuffer::Input) {
            warn!("Could not flush input of {}: {}", settings.port, e);
        }

        info!("Opened serial port {} (timeout {:?})", settings, settings.timeout);
        Ok(Box::new(LineLink::new(
            settings.port.clone(),
            PortStream(port),
            settings.timeout,
        )))
    }
}

/// Describe the serial devices visible on this machine, one line each.
pub fn list_ports() -> Result<Vec<String>, LinkError> {
    let ports = serialport::available_ports().map_err(|e| LinkError::Io(e.to_string()))?;

    Ok(ports
        .into_iter()
        .map(|p| match p.port_type {
            SerialPortType::UsbPort(usb) => format!(
                "{} (USB {:04x}:{:04x} {})",
                p.port_name,
                usb.vid,
                usb.pid,
                usb.product.unwrap_or_default()
            ),
            SerialPortType::BluetoothPort => format!("{} (Bluetooth)", p.port_name),
            SerialPortType::PciPort => format!("{} (PCI)", p.port_name),
            SerialPortType::Unknown => p.port_name,
        })
        .collect())
}
