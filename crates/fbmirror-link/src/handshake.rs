//! Mirroring commands sent host to device.
//!
//! Neither command is acknowledged. `MIRROR_OFF` in particular is best
//! effort: if the link is already gone it never reaches the device, and
//! the device simply keeps streaming until it is reset or reconnected.

use tracing::debug;

use crate::connection::Connection;
use crate::error::Result;

/// Enables framebuffer streaming.
pub const MIRROR_ON: &[u8] = b"MIRROR_ON\n";

/// Disables framebuffer streaming.
pub const MIRROR_OFF: &[u8] = b"MIRROR_OFF\n";

/// Drop stale buffered bytes, then ask the device to start streaming.
pub fn enable_mirroring(connection: &Connection) -> Result<()> {
    connection.clear_buffers()?;
    connection.write_command(MIRROR_ON)?;
    debug!(address = %connection.address(), "mirroring enabled");
    Ok(())
}

/// Ask the device to stop streaming.
pub fn disable_mirroring(connection: &Connection) -> Result<()> {
    connection.write_command(MIRROR_OFF)?;
    debug!(address = %connection.address(), "mirroring disabled");
    Ok(())
}
