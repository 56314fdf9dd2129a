use std::sync::Arc;
use std::time::Duration;

use fbmirror_transport::{LinkOpener, PortDiscovery, PortEnumerator, DEFAULT_BAUD_RATE};
use tracing::{debug, info, trace, warn};

use crate::connection::{Connection, LinkSlot};
use crate::error::{LinkError, Result};
use crate::handshake::{disable_mirroring, enable_mirroring};
use crate::signal::RunSignal;
use crate::status::{ConnectionState, LinkStatus};

/// Delay before retrying after a miss or a failure.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(2);
/// Pause between opening the port and talking to the device.
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_millis(500);
/// How often a live connection is checked.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(1);
/// Time allowed for `MIRROR_OFF` to drain before the port is closed.
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_millis(100);

/// Configuration for [`ConnectionManager`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    /// Explicit port address. Skips discovery when set.
    pub port: Option<String>,
    pub baud_rate: u32,
    pub reconnect_delay: Duration,
    pub settle_delay: Duration,
    pub check_interval: Duration,
    pub shutdown_grace: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            settle_delay: DEFAULT_SETTLE_DELAY,
            check_interval: DEFAULT_CHECK_INTERVAL,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

/// Owns the connection lifecycle.
///
/// `Disconnected -> Connecting -> Connected -> Disconnected -> ...` until the
/// run signal is cleared. Link failures never escape: they are logged,
/// the handle is released and the next attempt waits `reconnect_delay`.
pub struct ConnectionManager<O, E> {
    opener: O,
    discovery: PortDiscovery<E>,
    config: LinkConfig,
    slot: Arc<LinkSlot>,
    status: LinkStatus,
}

impl<O: LinkOpener, E: PortEnumerator> ConnectionManager<O, E> {
    pub fn new(opener: O, discovery: PortDiscovery<E>, config: LinkConfig) -> Self {
        Self {
            opener,
            discovery,
            config,
            slot: Arc::new(LinkSlot::new()),
            status: LinkStatus::new(),
        }
    }

    /// Slot holding the current connection, shared with readers.
    pub fn slot(&self) -> Arc<LinkSlot> {
        Arc::clone(&self.slot)
    }

    pub fn status(&self) -> LinkStatus {
        self.status.clone()
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Run the lifecycle loop until `signal` is cleared.
    ///
    /// Does not send `MIRROR_OFF`; call [`shutdown`](Self::shutdown) after.
    pub fn run(&self, signal: &RunSignal) {
        debug!("connection manager started");
        while signal.is_running() {
            let wait = self.step(signal);
            if !signal.sleep(wait) {
                break;
            }
        }
        debug!("connection manager stopped");
    }

    /// One pass of the state machine. Returns how long to wait before the
    /// next pass.
    pub fn step(&self, signal: &RunSignal) -> Duration {
        if self.slot.is_open() {
            return self.config.check_interval;
        }

        if self.status.state() == ConnectionState::Connected {
            warn!(
                address = self.status.address().as_deref().unwrap_or("?"),
                "connection lost"
            );
        }
        self.slot.close();
        self.status.set_disconnected();

        let Some(address) = self.target() else {
            trace!("no device found, retrying");
            return self.config.reconnect_delay;
        };

        match self.connect(&address, signal) {
            Ok(()) => self.config.check_interval,
            Err(LinkError::Cancelled) => {
                self.status.set_disconnected();
                Duration::ZERO
            }
            Err(err) => {
                warn!(address = %address, error = %err, "connection attempt failed");
                self.status.set_disconnected();
                self.config.reconnect_delay
            }
        }
    }

    /// Best-effort `MIRROR_OFF`, then release the connection.
    pub fn shutdown(&self) {
        if let Some(connection) = self.slot.acquire() {
            match disable_mirroring(&connection) {
                Ok(()) => std::thread::sleep(self.config.shutdown_grace),
                Err(err) => debug!(error = %err, "MIRROR_OFF not delivered"),
            }
        }
        self.slot.close();
        self.status.set_disconnected();
        debug!("connection manager shut down");
    }

    fn target(&self) -> Option<String> {
        if let Some(port) = &self.config.port {
            return Some(port.clone());
        }
        self.discovery.find_device().map(|device| device.address)
    }

    fn connect(&self, address: &str, signal: &RunSignal) -> Result<()> {
        self.status.set_connecting(address);
        let link = self.opener.open(address, self.config.baud_rate)?;
        // Not yet in the slot: dropping it on any early return releases the port.
        let connection = Connection::new(address, link);

        if !signal.sleep(self.config.settle_delay) {
            return Err(LinkError::Cancelled);
        }
        enable_mirroring(&connection)?;

        self.slot.install(connection);
        self.status.set_connected(true);
        info!(address = %address, baud = self.config.baud_rate, "connected");
        Ok(())
    }
}

impl<O, E> std::fmt::Debug for ConnectionManager<O, E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("config", &self.config)
            .field("slot", &self.slot)
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}
