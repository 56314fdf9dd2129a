//! Connection lifecycle and frame delivery for the display link.
//!
//! This is the "just works" layer. A [`MirrorSession`] runs two loops on
//! their own threads:
//! - [`ConnectionManager`] finds the device, opens it, enables mirroring and
//!   reconnects after failures
//! - [`FramePump`] reads whatever the open link has buffered, decodes frames
//!   and pushes them into a drop-oldest [`FrameQueue`](fbmirror_frame::FrameQueue)
//!
//! The two loops share the current connection through a [`LinkSlot`]. Both
//! stop when the shared [`RunSignal`] is cleared.

pub mod connection;
pub mod error;
pub mod handshake;
pub mod manager;
pub mod pump;
pub mod session;
pub mod signal;
pub mod status;

pub use connection::{Connection, LinkSlot};
pub use error::{LinkError, Result};
pub use handshake::{disable_mirroring, enable_mirroring, MIRROR_OFF, MIRROR_ON};
pub use manager::{ConnectionManager, LinkConfig};
pub use pump::{FramePump, PumpConfig};
pub use session::{MirrorSession, SessionConfig};
pub use signal::RunSignal;
pub use status::{ConnectionState, LinkStatus, StatusSnapshot};
