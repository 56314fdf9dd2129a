//! Serial link abstraction and device discovery.
//!
//! This is the lowest layer of fbmirror. It knows how to find a likely
//! display device among the host's serial ports and how to open one, and
//! exposes both through small traits so the layers above can run against
//! in-memory fakes:
//! - [`Link`]: an open, byte-oriented link to the device
//! - [`LinkOpener`]: opens a [`Link`] for an address and baud rate
//! - [`PortEnumerator`]: lists the ports currently visible to the host

pub mod discovery;
pub mod error;
pub mod serial;
pub mod traits;

pub use discovery::{
    find_device, DeviceDescriptor, MatchReason, PlatformPatterns, PortDiscovery, CHIP_KEYWORDS,
};
pub use error::{Result, TransportError};
pub use serial::{SerialLink, SerialOpener, SystemPorts, DEFAULT_BAUD_RATE};
pub use traits::{Link, LinkOpener, PortEnumerator};
