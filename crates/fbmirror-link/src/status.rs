use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Lifecycle state of the device link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl ConnectionState {
    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time copy of the link status.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatusSnapshot {
    pub state: ConnectionState,
    /// Configured, discovered or last attempted address.
    pub address: Option<String>,
    /// Whether `MIRROR_ON` was sent on the current connection.
    pub mirroring: bool,
}

impl StatusSnapshot {
    pub fn connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }
}

/// Shared, read-mostly status handle.
///
/// Written by the connection manager, read by whatever displays status.
#[derive(Debug, Clone, Default)]
pub struct LinkStatus {
    inner: Arc<Mutex<StatusSnapshot>>,
}

impl LinkStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StatusSnapshot {
        self.lock().clone()
    }

    pub fn state(&self) -> ConnectionState {
        self.lock().state
    }

    pub fn connected(&self) -> bool {
        self.lock().connected()
    }

    pub fn mirroring(&self) -> bool {
        self.lock().mirroring
    }

    pub fn address(&self) -> Option<String> {
        self.lock().address.clone()
    }

    pub(crate) fn set_connecting(&self, address: &str) {
        let mut status = self.lock();
        status.state = ConnectionState::Connecting;
        status.address = Some(address.to_string());
        status.mirroring = false;
    }

    pub(crate) fn set_connected(&self, mirroring: bool) {
        let mut status = self.lock();
        status.state = ConnectionState::Connected;
        status.mirroring = mirroring;
    }

    /// The address is kept so it can still be shown while searching.
    pub(crate) fn set_disconnected(&self) {
        let mut status = self.lock();
        status.state = ConnectionState::Disconnected;
        status.mirroring = false;
    }

    fn lock(&self) -> MutexGuard<'_, StatusSnapshot> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
