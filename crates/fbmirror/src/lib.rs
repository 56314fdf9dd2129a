//! Mirror an embedded device's monochrome display over a serial link.
//!
//! # Crate Structure
//!
//! - [`transport`]: serial link abstraction and device discovery
//! - [`frame`]: `<FB>` stream decoding, frame queue and pixel addressing
//! - [`link`]: connection lifecycle, frame pump and session (behind `link` feature)

/// Re-export transport types.
pub mod transport {
    pub use fbmirror_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use fbmirror_frame::*;
}

/// Re-export link types (requires `link` feature).
#[cfg(feature = "link")]
pub mod link {
    pub use fbmirror_link::*;
}
