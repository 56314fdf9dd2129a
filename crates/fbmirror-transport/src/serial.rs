use std::io::{Read, Write};
use std::time::Duration;

use serialport::{ClearBuffer, SerialPort, SerialPortType};
use tracing::debug;

use crate::discovery::DeviceDescriptor;
use crate::error::{Result, TransportError};
use crate::traits::{Link, LinkOpener, PortEnumerator};

/// Baud rate the device firmware streams at.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Default bound on a single blocking read or write.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(1);

/// A serial port opened through the `serialport` crate.
pub struct SerialLink {
    port: Box<dyn SerialPort>,
    address: String,
}

impl SerialLink {
    /// Wrap an already opened port.
    pub fn new(port: Box<dyn SerialPort>, address: impl Into<String>) -> Self {
        Self {
            port,
            address: address.into(),
        }
    }
}

impl Read for SerialLink {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.port.read(buf)
    }
}

impl Write for SerialLink {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.port.flush()
    }
}

impl Link for SerialLink {
    fn bytes_to_read(&self) -> Result<u32> {
        self.port.bytes_to_read().map_err(Into::into)
    }

    fn clear_buffers(&self) -> Result<()> {
        self.port.clear(ClearBuffer::All).map_err(Into::into)
    }
}

impl std::fmt::Debug for SerialLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialLink")
            .field("address", &self.address)
            .finish()
    }
}

/// Opens real serial ports (8N1, no flow control).
#[derive(Debug, Clone)]
pub struct SerialOpener {
    timeout: Duration,
}

impl SerialOpener {
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_IO_TIMEOUT)
    }

    /// Use an explicit per-operation I/O timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Default for SerialOpener {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkOpener for SerialOpener {
    fn open(&self, address: &str, baud_rate: u32) -> Result<Box<dyn Link>> {
        let port = serialport::new(address, baud_rate)
            .timeout(self.timeout)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .open()
            .map_err(|err| TransportError::Open {
                address: address.to_string(),
                source: err.into(),
            })?;
        debug!(address, baud_rate, "opened serial port");
        Ok(Box::new(SerialLink::new(port, address)))
    }
}

/// Enumerates the host's serial ports.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemPorts;

impl PortEnumerator for SystemPorts {
    fn ports(&self) -> Result<Vec<DeviceDescriptor>> {
        let ports = serialport::available_ports()
            .map_err(|err| TransportError::Enumerate(err.to_string()))?;
        Ok(ports
            .into_iter()
            .map(|info| DeviceDescriptor::new(info.port_name, describe_port_type(&info.port_type)))
            .collect())
    }
}

/// Human-readable description for a port, in the spirit of what OS device
/// managers show ("Silicon Labs CP2102 USB to UART Bridge Controller").
pub fn describe_port_type(port_type: &SerialPortType) -> String {
    match port_type {
        SerialPortType::UsbPort(usb) => {
            let parts: Vec<&str> = [usb.manufacturer.as_deref(), usb.product.as_deref()]
                .into_iter()
                .flatten()
                .filter(|part| !part.is_empty())
                .collect();
            if parts.is_empty() {
                format!("USB device {:04x}:{:04x}", usb.vid, usb.pid)
            } else {
                parts.join(" ")
            }
        }
        SerialPortType::PciPort => "PCI serial port".to_string(),
        SerialPortType::BluetoothPort => "Bluetooth serial port".to_string(),
        #[allow(unreachable_patterns)]
        _ => "n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_usb_ports_have_fixed_labels() {
        assert_eq!(describe_port_type(&SerialPortType::PciPort), "PCI serial port");
        assert_eq!(
            describe_port_type(&SerialPortType::BluetoothPort),
            "Bluetooth serial port"
        );
        assert_eq!(describe_port_type(&SerialPortType::Unknown), "n/a");
    }

    #[test]
    fn opening_missing_port_reports_address() {
        let opener = SerialOpener::with_timeout(Duration::from_millis(10));
        match opener.open("/dev/fbmirror-does-not-exist", DEFAULT_BAUD_RATE) {
            Err(TransportError::Open { address, .. }) => {
                assert_eq!(address, "/dev/fbmirror-does-not-exist");
            }
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("opening a missing port should fail"),
        }
    }
}
