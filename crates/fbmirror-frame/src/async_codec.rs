//! `tokio_util::codec` adapter for async byte sources.

use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use crate::codec::{encode_frame, Frame};
use crate::decoder::{DecoderConfig, FrameDecoder};
use crate::error::FrameError;

/// Frame codec with the same semantics as [`FrameDecoder`].
///
/// `FramedRead` owns the read buffer, so the codec runs the decoder over
/// that buffer in place.
#[derive(Debug, Default)]
pub struct MirrorCodec {
    decoder: FrameDecoder,
}

impl MirrorCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: DecoderConfig) -> Self {
        Self {
            decoder: FrameDecoder::with_config(config),
        }
    }
}

impl Decoder for MirrorCodec {
    type Item = Frame;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        if !src.is_empty() {
            let incoming = src.split();
            self.decoder.push_bytes(&incoming);
        }
        if let Some(frame) = self.decoder.next_frame() {
            return Ok(Some(frame));
        }
        self.decoder.enforce_ceiling();
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Frame>, FrameError> {
        // Trailing partial frames are dropped rather than reported.
        let frame = self.decode(src)?;
        if frame.is_none() {
            self.decoder.reset();
        }
        Ok(frame)
    }
}

impl Encoder<Frame> for MirrorCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), FrameError> {
        encode_frame(item.payload.as_ref(), dst)
    }
}
