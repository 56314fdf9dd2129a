use std::io::{Read, Write};

use crate::discovery::DeviceDescriptor;
use crate::error::Result;

/// An open, byte-oriented link to the display device.
///
/// Reads are expected to be bounded: callers poll [`Link::bytes_to_read`]
/// and only read what is already buffered by the OS, so a read never waits
/// on the device for longer than the port's configured timeout.
pub trait Link: Read + Write + Send {
    /// Number of bytes already received and waiting to be read.
    fn bytes_to_read(&self) -> Result<u32>;

    /// Discard anything pending in both the OS input and output buffers.
    fn clear_buffers(&self) -> Result<()>;
}

/// Opens links by address.
pub trait LinkOpener: Send + Sync {
    /// Open the port at `address` at the given baud rate.
    fn open(&self, address: &str, baud_rate: u32) -> Result<Box<dyn Link>>;
}

/// Lists the serial ports currently visible to the host.
pub trait PortEnumerator: Send + Sync {
    /// Current ports, in platform enumeration order.
    fn ports(&self) -> Result<Vec<DeviceDescriptor>>;
}

impl<T: LinkOpener + ?Sized> LinkOpener for std::sync::Arc<T> {
    fn open(&self, address: &str, baud_rate: u32) -> Result<Box<dyn Link>> {
        (**self).open(address, baud_rate)
    }
}

impl<T: PortEnumerator + ?Sized> PortEnumerator for std::sync::Arc<T> {
    fn ports(&self) -> Result<Vec<DeviceDescriptor>> {
        (**self).ports()
    }
}
