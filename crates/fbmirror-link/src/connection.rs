use std::fmt;
use std::io::{ErrorKind, Read, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use fbmirror_transport::Link;
use tracing::debug;

use crate::error::{LinkError, Result};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// One open link to the device.
///
/// The handle sits behind its own lock so a read can never overlap a close.
/// [`Connection::close`] takes the handle out and drops it immediately,
/// even while other threads still hold an `Arc<Connection>`.
pub struct Connection {
    id: u64,
    address: String,
    link: Mutex<Option<Box<dyn Link>>>,
    open: AtomicBool,
}

impl Connection {
    pub fn new(address: impl Into<String>, link: Box<dyn Link>) -> Self {
        Self {
            id: NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed),
            address: address.into(),
            link: Mutex::new(Some(link)),
            open: AtomicBool::new(true),
        }
    }

    /// Process-unique id; a reconnect always yields a new id.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Read whatever the OS has already buffered, up to `buf.len()` bytes.
    ///
    /// Returns `Ok(0)` when nothing is waiting. Timeouts and interrupts
    /// also count as "nothing waiting".
    pub fn read_available(&self, buf: &mut [u8]) -> Result<usize> {
        let mut guard = self.lock_link();
        let link = self.live(&mut guard)?;

        let pending = link.bytes_to_read()? as usize;
        if pending == 0 || buf.is_empty() {
            return Ok(0);
        }
        let want = pending.min(buf.len());
        match link.read(&mut buf[..want]) {
            Ok(n) => Ok(n),
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::Interrupted | ErrorKind::TimedOut | ErrorKind::WouldBlock
                ) =>
            {
                Ok(0)
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Write a complete command and flush it.
    pub fn write_command(&self, command: &[u8]) -> Result<()> {
        let mut guard = self.lock_link();
        let link = self.live(&mut guard)?;
        link.write_all(command)?;
        link.flush()?;
        Ok(())
    }

    /// Discard pending input and output on the link.
    pub fn clear_buffers(&self) -> Result<()> {
        let mut guard = self.lock_link();
        let link = self.live(&mut guard)?;
        link.clear_buffers()?;
        Ok(())
    }

    /// Mark closed and release the handle. Idempotent.
    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
        let released = self.lock_link().take();
        if released.is_some() {
            debug!(id = self.id, address = %self.address, "connection closed");
        }
    }

    fn live<'g>(
        &self,
        guard: &'g mut MutexGuard<'_, Option<Box<dyn Link>>>,
    ) -> Result<&'g mut Box<dyn Link>> {
        if !self.is_open() {
            return Err(LinkError::Closed);
        }
        guard.as_mut().ok_or(LinkError::Closed)
    }

    fn lock_link(&self) -> MutexGuard<'_, Option<Box<dyn Link>>> {
        self.link.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("address", &self.address)
            .field("open", &self.is_open())
            .finish()
    }
}

/// Holder of the single current connection.
///
/// Installing, closing and open-checks all go through one lock. Readers
/// take an `Arc` out per attempt and do their I/O without holding it.
#[derive(Debug, Default)]
pub struct LinkSlot {
    current: Mutex<Option<Arc<Connection>>>,
}

impl LinkSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `connection` current, closing whatever was there before.
    pub fn install(&self, connection: Connection) -> Arc<Connection> {
        let connection = Arc::new(connection);
        let mut current = self.lock();
        if let Some(previous) = current.replace(Arc::clone(&connection)) {
            previous.close();
        }
        connection
    }

    /// The current connection, if it is still open.
    pub fn acquire(&self) -> Option<Arc<Connection>> {
        self.lock().as_ref().filter(|conn| conn.is_open()).cloned()
    }

    pub fn is_open(&self) -> bool {
        self.lock().as_ref().is_some_and(|conn| conn.is_open())
    }

    /// Close and forget the current connection, if any.
    pub fn close(&self) {
        if let Some(connection) = self.lock().take() {
            connection.close();
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<Connection>>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for LinkSlot {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::VecDeque;
    use std::io::{self, Read, Write};

    use super::*;

    /// Shared state of an in-memory device. Each `connect` yields a handle
    /// that counts as live until dropped.
    #[derive(Clone, Default)]
    pub(crate) struct MemoryDevice {
        state: Arc<Mutex<DeviceState>>,
    }

    #[derive(Default)]
    struct DeviceState {
        incoming: VecDeque<u8>,
        written: Vec<u8>,
        live: usize,
        broken: bool,
    }

    impl MemoryDevice {
        pub fn connect(&self) -> Box<dyn Link> {
            self.state.lock().unwrap().live += 1;
            Box::new(MemoryLink {
                device: self.clone(),
            })
        }

        pub fn feed(&self, bytes: &[u8]) {
            self.state.lock().unwrap().incoming.extend(bytes);
        }

        pub fn written(&self) -> Vec<u8> {
            self.state.lock().unwrap().written.clone()
        }

        pub fn live_handles(&self) -> usize {
            self.state.lock().unwrap().live
        }

        pub fn break_link(&self) {
            self.state.lock().unwrap().broken = true;
        }
    }

    struct MemoryLink {
        device: MemoryDevice,
    }

    impl MemoryLink {
        fn state(&self) -> MutexGuard<'_, DeviceState> {
            self.device.state.lock().unwrap()
        }
    }

    impl Read for MemoryLink {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            let mut state = self.state();
            if state.broken {
                return Err(io::Error::from(ErrorKind::BrokenPipe));
            }
            let n = buf.len().min(state.incoming.len());
            for (slot, byte) in buf.iter_mut().zip(state.incoming.drain(..n)) {
                *slot = byte;
            }
            Ok(n)
        }
    }

    impl Write for MemoryLink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            let mut state = self.state();
            if state.broken {
                return Err(io::Error::from(ErrorKind::BrokenPipe));
            }
            state.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl Link for MemoryLink {
        fn bytes_to_read(&self) -> fbmirror_transport::Result<u32> {
            let state = self.state();
            if state.broken {
                return Err(io::Error::from(ErrorKind::BrokenPipe).into());
            }
            Ok(state.incoming.len() as u32)
        }

        fn clear_buffers(&self) -> fbmirror_transport::Result<()> {
            self.state().incoming.clear();
            Ok(())
        }
    }

    impl Drop for MemoryLink {
        fn drop(&mut self) {
            self.state().live -= 1;
        }
    }

    #[test]
    fn read_available_is_bounded_by_pending_bytes() {
        let device = MemoryDevice::default();
        let conn = Connection::new("mem0", device.connect());

        let mut buf = [0u8; 16];
        assert_eq!(conn.read_available(&mut buf).unwrap(), 0);

        device.feed(b"abc");
        assert_eq!(conn.read_available(&mut buf).unwrap(), 3);
        assert_eq!(&buf[..3], b"abc");

        device.feed(&[7u8; 40]);
        assert_eq!(conn.read_available(&mut buf).unwrap(), 16);
    }

    #[test]
    fn close_releases_handle_even_with_outstanding_refs() {
        let device = MemoryDevice::default();
        let conn = Arc::new(Connection::new("mem0", device.connect()));
        let reader_ref = Arc::clone(&conn);
        assert_eq!(device.live_handles(), 1);

        conn.close();
        assert_eq!(device.live_handles(), 0);
        assert!(!reader_ref.is_open());

        let mut buf = [0u8; 4];
        assert!(matches!(
            reader_ref.read_available(&mut buf),
            Err(LinkError::Closed)
        ));
        assert!(matches!(
            reader_ref.write_command(b"x"),
            Err(LinkError::Closed)
        ));
        conn.close();
    }

    #[test]
    fn broken_link_surfaces_error() {
        let device = MemoryDevice::default();
        let conn = Connection::new("mem0", device.connect());
        device.break_link();
        let mut buf = [0u8; 4];
        assert!(conn.read_available(&mut buf).is_err());
    }

    #[test]
    fn write_command_reaches_device() {
        let device = MemoryDevice::default();
        let conn = Connection::new("mem0", device.connect());
        conn.write_command(b"PING\n").unwrap();
        assert_eq!(device.written(), b"PING\n");
    }

    #[test]
    fn connection_ids_are_unique() {
        let device = MemoryDevice::default();
        let a = Connection::new("mem0", device.connect());
        let b = Connection::new("mem0", device.connect());
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn slot_install_closes_previous() {
        let device = MemoryDevice::default();
        let slot = LinkSlot::new();

        let first = slot.install(Connection::new("mem0", device.connect()));
        let second = slot.install(Connection::new("mem0", device.connect()));

        assert!(!first.is_open());
        assert!(second.is_open());
        assert_eq!(device.live_handles(), 1);
        assert_eq!(slot.acquire().map(|c| c.id()), Some(second.id()));
    }

    #[test]
    fn slot_acquire_skips_closed_connection() {
        let device = MemoryDevice::default();
        let slot = LinkSlot::new();
        assert!(slot.acquire().is_none());

        let conn = slot.install(Connection::new("mem0", device.connect()));
        assert!(slot.is_open());
        conn.close();
        assert!(!slot.is_open());
        assert!(slot.acquire().is_none());
    }

    #[test]
    fn dropping_slot_releases_handle() {
        let device = MemoryDevice::default();
        {
            let slot = LinkSlot::new();
            slot.install(Connection::new("mem0", device.connect()));
            assert_eq!(device.live_handles(), 1);
        }
        assert_eq!(device.live_handles(), 0);
    }
}
