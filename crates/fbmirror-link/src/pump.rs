use std::sync::Arc;
use std::time::Duration;

use fbmirror_frame::{DecoderConfig, FrameDecoder, FrameQueue};
use tracing::{debug, warn};

use crate::connection::LinkSlot;
use crate::signal::RunSignal;

/// Configuration for [`FramePump`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PumpConfig {
    /// Wait after a poll that found no bytes. Default: 10ms.
    pub poll_interval: Duration,
    /// Wait while there is no open connection. Default: 500ms.
    pub idle_interval: Duration,
    /// Wait after a read error closed the connection. Default: 2s.
    pub error_backoff: Duration,
    /// Largest single read. Default: 4096.
    pub read_chunk: usize,
    pub decoder: DecoderConfig,
}

impl Default for PumpConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            idle_interval: Duration::from_millis(500),
            error_backoff: Duration::from_secs(2),
            read_chunk: 4096,
            decoder: DecoderConfig::default(),
        }
    }
}

/// Reads from the current connection, decodes frames and queues them.
///
/// A read error is not retried here: the connection is closed and the
/// connection manager notices on its next check. Buffered partial frames
/// are dropped whenever a different connection shows up.
#[derive(Debug)]
pub struct FramePump {
    slot: Arc<LinkSlot>,
    queue: Arc<FrameQueue>,
    decoder: FrameDecoder,
    config: PumpConfig,
    scratch: Vec<u8>,
    connection_id: Option<u64>,
}

impl FramePump {
    pub fn new(slot: Arc<LinkSlot>, queue: Arc<FrameQueue>, config: PumpConfig) -> Self {
        Self {
            slot,
            queue,
            decoder: FrameDecoder::with_config(config.decoder),
            scratch: vec![0u8; config.read_chunk.max(1)],
            config,
            connection_id: None,
        }
    }

    /// Run until `signal` is cleared.
    pub fn run(&mut self, signal: &RunSignal) {
        debug!("frame pump started");
        while signal.is_running() {
            let wait = self.poll_once();
            if !signal.sleep(wait) {
                break;
            }
        }
        debug!(stats = ?self.decoder.stats(), "frame pump stopped");
    }

    /// One read and decode pass. Returns how long to wait before the next.
    pub fn poll_once(&mut self) -> Duration {
        let Some(connection) = self.slot.acquire() else {
            return self.config.idle_interval;
        };

        if self.connection_id != Some(connection.id()) {
            if self.decoder.buffered() > 0 {
                debug!(
                    dropped = self.decoder.buffered(),
                    "new connection, dropping partial input"
                );
            }
            self.decoder.reset();
            self.connection_id = Some(connection.id());
        }

        match connection.read_available(&mut self.scratch) {
            Ok(0) => self.config.poll_interval,
            Ok(n) => {
                let queue = &self.queue;
                self.decoder.feed(&self.scratch[..n], |frame| {
                    queue.push(frame);
                });
                Duration::ZERO
            }
            Err(err) => {
                warn!(address = %connection.address(), error = %err, "read failed, closing link");
                connection.close();
                self.config.error_backoff
            }
        }
    }

    pub fn decoder(&self) -> &FrameDecoder {
        &self.decoder
    }

    pub fn queue(&self) -> &Arc<FrameQueue> {
        &self.queue
    }
}
