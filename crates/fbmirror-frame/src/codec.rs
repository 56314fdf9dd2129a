use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// Marker that opens a frame on the wire.
pub const START_MARKER: &[u8] = b"<FB>";

/// Marker that closes a frame on the wire.
pub const END_MARKER: &[u8] = b"</FB>";

/// Size of the little-endian payload length that follows the start marker.
pub const LENGTH_PREFIX_SIZE: usize = 2;

/// One decoded framebuffer payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Raw framebuffer bytes (declared length already verified).
    pub payload: Bytes,
}

impl Frame {
    /// Create a new frame.
    pub fn new(payload: impl Into<Bytes>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.payload.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// The total wire size of this frame (markers + length + payload).
    pub fn wire_size(&self) -> usize {
        START_MARKER.len() + LENGTH_PREFIX_SIZE + self.payload.len() + END_MARKER.len()
    }
}

/// Encode a payload into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────┬───────────┬──────────────────┬──────────┐
/// │ "<FB>"   │ Length    │ Payload          │ "</FB>"  │
/// │ (4B)     │ (2B LE)   │ (Length bytes)   │ (5B)     │
/// └──────────┴───────────┴──────────────────┴──────────┘
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > u16::MAX as usize {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: u16::MAX as usize,
        });
    }
    dst.reserve(START_MARKER.len() + LENGTH_PREFIX_SIZE + payload.len() + END_MARKER.len());
    dst.put_slice(START_MARKER);
    dst.put_u16_le(payload.len() as u16);
    dst.put_slice(payload);
    dst.put_slice(END_MARKER);
    Ok(())
}

/// Why a delimited candidate was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Malformed {
    /// Fewer bytes between the markers than the length prefix needs.
    TooShort { len: usize },
    /// Declared payload length differs from the bytes actually present.
    LengthMismatch { declared: usize, actual: usize },
}

/// Pull the next delimited candidate out of `buf`.
///
/// Returns `None` when the buffer holds no start marker followed by an end
/// marker; nothing is consumed in that case. Otherwise everything up to and
/// including the end marker is consumed, whether or not the candidate turns
/// out to be a valid frame.
pub(crate) fn take_candidate(buf: &mut BytesMut) -> Option<std::result::Result<Frame, Malformed>> {
    let start = find(buf, START_MARKER)?;
    let body_start = start + START_MARKER.len();
    let body_len = find(&buf[body_start..], END_MARKER)?;

    buf.advance(body_start);
    let body = buf.split_to(body_len).freeze();
    buf.advance(END_MARKER.len());

    Some(validate(body))
}

fn validate(body: Bytes) -> std::result::Result<Frame, Malformed> {
    if body.len() < LENGTH_PREFIX_SIZE {
        return Err(Malformed::TooShort { len: body.len() });
    }

    let declared = u16::from_le_bytes([body[0], body[1]]) as usize;
    let payload = body.slice(LENGTH_PREFIX_SIZE..);
    if payload.len() != declared {
        return Err(Malformed::LengthMismatch {
            declared,
            actual: payload.len(),
        });
    }

    Ok(Frame { payload })
}

pub(crate) fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
