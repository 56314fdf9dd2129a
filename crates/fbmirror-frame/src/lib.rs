//! Delimiter-framed framebuffer decoding.
//!
//! The device streams its display buffer as:
//! - the ASCII start marker `<FB>`
//! - a 2-byte little-endian payload length
//! - the payload (1 bit per pixel, page layout)
//! - the ASCII end marker `</FB>`
//!
//! The link is noisy, so decoding is tolerant: junk between frames is
//! skipped, malformed frames are dropped, and the scratch buffer is bounded.
//! Decoded frames are handed to the renderer through a [`FrameQueue`] that
//! keeps only the most recent ones.

#[cfg(feature = "async")]
pub mod async_codec;
pub mod codec;
pub mod decoder;
pub mod display;
pub mod error;
pub mod queue;
pub mod reader;

#[cfg(feature = "async")]
pub use async_codec::MirrorCodec;
pub use codec::{encode_frame, Frame, END_MARKER, LENGTH_PREFIX_SIZE, START_MARKER};
pub use decoder::{DecoderConfig, DecoderStats, FrameDecoder};
pub use display::{DisplayGeometry, Framebuffer};
pub use error::{FrameError, Result};
pub use queue::{FrameQueue, DEFAULT_QUEUE_CAPACITY};
pub use reader::FrameReader;
