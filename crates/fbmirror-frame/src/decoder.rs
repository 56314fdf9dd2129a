use bytes::{Buf, BytesMut};
use tracing::{debug, trace};

use crate::codec::{take_candidate, Frame, Malformed};

/// Default ceiling on buffered, not-yet-framed bytes.
pub const DEFAULT_MAX_BUFFERED: usize = 4096;

/// Default number of trailing bytes kept when the ceiling is exceeded.
pub const DEFAULT_RETAINED_TAIL: usize = 2048;

/// Configuration for [`FrameDecoder`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Buffered bytes allowed after a decoding pass. Default: 4096.
    pub max_buffered: usize,
    /// Bytes kept (most recent) once `max_buffered` is exceeded. Default: 2048.
    /// Clamped to `max_buffered`.
    pub retained_tail: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_buffered: DEFAULT_MAX_BUFFERED,
            retained_tail: DEFAULT_RETAINED_TAIL,
        }
    }
}

/// Running counters, for diagnostics only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecoderStats {
    /// Valid frames extracted.
    pub frames: u64,
    /// Delimited candidates dropped by validation.
    pub malformed: u64,
    /// Times the buffer was cut back to its tail.
    pub truncations: u64,
    /// Bytes dropped by truncation.
    pub bytes_discarded: u64,
}

/// Incremental decoder for the `<FB>`…`</FB>` stream.
///
/// Bytes go in as they arrive, in chunks of any size; complete frames come
/// out in stream order. Nothing here ever fails: malformed candidates are
/// dropped and decoding carries on with the bytes after them.
#[derive(Debug)]
pub struct FrameDecoder {
    buf: BytesMut,
    config: DecoderConfig,
    stats: DecoderStats,
}

impl FrameDecoder {
    /// Create a decoder with default configuration.
    pub fn new() -> Self {
        Self::with_config(DecoderConfig::default())
    }

    /// Create a decoder with explicit configuration.
    pub fn with_config(mut config: DecoderConfig) -> Self {
        config.retained_tail = config.retained_tail.min(config.max_buffered);
        Self {
            buf: BytesMut::with_capacity(config.max_buffered),
            config,
            stats: DecoderStats::default(),
        }
    }

    /// Append `data` and hand every frame it completes to `deliver`, oldest
    /// first. The buffer is bounded by the configured ceiling on return.
    pub fn feed<F: FnMut(Frame)>(&mut self, data: &[u8], mut deliver: F) {
        self.push_bytes(data);
        while let Some(frame) = self.next_frame() {
            deliver(frame);
        }
        self.enforce_ceiling();
    }

    /// Convenience form of [`feed`](Self::feed) that collects the frames.
    pub fn decode(&mut self, data: &[u8]) -> Vec<Frame> {
        let mut frames = Vec::new();
        self.feed(data, |frame| frames.push(frame));
        frames
    }

    /// Append raw bytes without decoding.
    pub fn push_bytes(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Extract the next valid frame already present in the buffer.
    ///
    /// Malformed candidates are consumed and skipped.
    pub fn next_frame(&mut self) -> Option<Frame> {
        loop {
            match take_candidate(&mut self.buf)? {
                Ok(frame) => {
                    self.stats.frames += 1;
                    return Some(frame);
                }
                Err(malformed) => {
                    self.stats.malformed += 1;
                    match malformed {
                        Malformed::TooShort { len } => {
                            trace!(len, "dropping frame candidate shorter than length prefix");
                        }
                        Malformed::LengthMismatch { declared, actual } => {
                            trace!(declared, actual, "dropping frame with length mismatch");
                        }
                    }
                }
            }
        }
    }

    /// Cut the buffer back to its tail window if it is over the ceiling.
    pub fn enforce_ceiling(&mut self) {
        if self.buf.len() <= self.config.max_buffered {
            return;
        }
        let excess = self.buf.len() - self.config.retained_tail;
        self.buf.advance(excess);
        self.stats.truncations += 1;
        self.stats.bytes_discarded += excess as u64;
        debug!(
            discarded = excess,
            kept = self.buf.len(),
            "frame buffer over ceiling, keeping tail"
        );
    }

    /// Drop everything buffered (e.g. when switching to a new connection).
    pub fn reset(&mut self) {
        self.buf.clear();
    }

    /// Bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::*;
    use crate::codec::encode_frame;

    fn wire(payloads: &[&[u8]], filler: &[u8]) -> Vec<u8> {
        let mut buf = BytesMut::new();
        for payload in payloads {
            buf.extend_from_slice(filler);
            encode_frame(payload, &mut buf).unwrap();
        }
        buf.extend_from_slice(filler);
        buf.to_vec()
    }

    #[test]
    fn decodes_documented_example() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode(b"junk<FB>\x02\x00\xff\x00</FB>tail");
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload.as_ref(), &[0xFF, 0x00]);
        assert_eq!(decoder.buffered(), 4);
    }

    #[test]
    fn rejects_declared_length_mismatch() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode(b"<FB>\x05\x00\x01\x02</FB>");
        assert!(frames.is_empty());
        assert_eq!(decoder.stats().malformed, 1);
        assert_eq!(decoder.buffered(), 0);
    }

    #[test]
    fn resumes_after_malformed_frame() {
        let mut decoder = FrameDecoder::new();
        let mut stream = b"<FB>\x05\x00\x01\x02</FB>".to_vec();
        stream.extend(wire(&[&b"ok"[..]], b""));
        let frames = decoder.decode(&stream);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload.as_ref(), b"ok");
    }

    #[test]
    fn frames_with_filler_keep_order() {
        let payloads: Vec<Vec<u8>> = (0..20u8).map(|i| vec![i; (i as usize) * 3]).collect();
        let refs: Vec<&[u8]> = payloads.iter().map(Vec::as_slice).collect();
        let stream = wire(&refs, b"\x00noise FB> </F \xfe");

        let mut decoder = FrameDecoder::new();
        let frames = decoder.decode(&stream);

        let got: Vec<&[u8]> = frames.iter().map(|f| f.payload.as_ref()).collect();
        assert_eq!(got, refs);
    }

    #[test]
    fn byte_at_a_time_matches_bulk() {
        let stream = wire(&[&b"one"[..], &b"two"[..], &b"three"[..]], b"..");
        let mut decoder = FrameDecoder::new();
        let mut frames = Vec::new();
        for byte in &stream {
            decoder.feed(std::slice::from_ref(byte), |f| frames.push(f));
        }
        let got: Vec<&[u8]> = frames.iter().map(|f| f.payload.as_ref()).collect();
        assert_eq!(got, vec![&b"one"[..], &b"two"[..], &b"three"[..]]);
    }

    #[test]
    fn full_size_display_frame() {
        let payload = vec![0xA5; 128 * 64 / 8];
        let stream = wire(&[payload.as_slice()], b"");
        let mut decoder = FrameDecoder::new();
        let mut frames = Vec::new();
        for chunk in stream.chunks(61) {
            decoder.feed(chunk, |f| frames.push(f));
        }
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].len(), 1024);
    }

    #[test]
    fn buffer_bounded_without_end_marker() {
        let mut decoder = FrameDecoder::new();
        decoder.feed(b"<FB>\x00\x10", |_| panic!("no frame expected"));
        for i in 0..10_000u32 {
            let chunk = [(i % 251) as u8; 37];
            decoder.feed(&chunk, |_| panic!("no frame expected"));
            assert!(decoder.buffered() <= DEFAULT_MAX_BUFFERED);
        }
        assert!(decoder.stats().truncations > 0);
    }

    #[test]
    fn oversized_chunk_is_cut_to_tail() {
        let mut decoder = FrameDecoder::new();
        decoder.feed(&vec![b'x'; 10_000], |_| {});
        assert_eq!(decoder.buffered(), DEFAULT_RETAINED_TAIL);
        assert_eq!(decoder.stats().bytes_discarded, 10_000 - 2048);
    }

    #[test]
    fn frame_completed_by_large_chunk_is_not_lost_to_truncation() {
        let mut decoder = FrameDecoder::new();
        let mut stream = vec![b'.'; 5000];
        stream.extend(wire(&[&b"late"[..]], b""));
        let frames = decoder.decode(&stream);
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].payload.as_ref(), b"late");
    }

    #[test]
    fn tail_is_clamped_to_ceiling() {
        let decoder = FrameDecoder::with_config(DecoderConfig {
            max_buffered: 16,
            retained_tail: 64,
        });
        assert_eq!(decoder.config().retained_tail, 16);
    }

    #[test]
    fn reset_drops_partial_frame() {
        let mut decoder = FrameDecoder::new();
        decoder.feed(b"<FB>\x02\x00\x01", |_| {});
        decoder.reset();
        let frames = decoder.decode(b"\x02</FB>");
        assert!(frames.is_empty());
        assert_eq!(decoder.stats().frames, 0);
    }
}
