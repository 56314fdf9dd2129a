use std::sync::Arc;
use std::thread::{self, JoinHandle};

use fbmirror_frame::{FrameQueue, DEFAULT_QUEUE_CAPACITY};
use fbmirror_transport::{LinkOpener, PortDiscovery, PortEnumerator};
use tracing::{info, warn};

use crate::error::{LinkError, Result};
use crate::manager::{ConnectionManager, LinkConfig};
use crate::pump::{FramePump, PumpConfig};
use crate::signal::RunSignal;
use crate::status::LinkStatus;

/// Configuration for a [`MirrorSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    pub link: LinkConfig,
    pub pump: PumpConfig,
    pub queue_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            link: LinkConfig::default(),
            pump: PumpConfig::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// The connection manager and frame pump, each on its own thread.
///
/// Consumers pull frames from [`queue`](Self::queue) and read
/// [`status`](Self::status) on their own schedule. [`stop`](Self::stop)
/// (or drop) clears the run signal, joins both threads and then sends
/// `MIRROR_OFF` and releases the port.
pub struct MirrorSession<O: LinkOpener, E: PortEnumerator> {
    manager: Arc<ConnectionManager<O, E>>,
    queue: Arc<FrameQueue>,
    signal: RunSignal,
    workers: Vec<JoinHandle<()>>,
    stopped: bool,
}

impl<O, E> MirrorSession<O, E>
where
    O: LinkOpener + 'static,
    E: PortEnumerator + 'static,
{
    /// Start both loops. They run until `signal` is cleared or the session
    /// is stopped.
    pub fn start(
        opener: O,
        discovery: PortDiscovery<E>,
        config: SessionConfig,
        signal: RunSignal,
    ) -> Result<Self> {
        let queue = Arc::new(FrameQueue::new(config.queue_capacity));
        let manager = Arc::new(ConnectionManager::new(opener, discovery, config.link));
        let mut pump = FramePump::new(manager.slot(), Arc::clone(&queue), config.pump);

        let mut session = Self {
            manager,
            queue,
            signal,
            workers: Vec::with_capacity(2),
            stopped: false,
        };

        let manager_worker = {
            let manager = Arc::clone(&session.manager);
            let signal = session.signal.clone();
            spawn("fbmirror-link", move || manager.run(&signal))?
        };
        session.workers.push(manager_worker);

        // On failure `session` drops here, which stops the manager thread.
        let pump_worker = {
            let signal = session.signal.clone();
            spawn("fbmirror-pump", move || pump.run(&signal))?
        };
        session.workers.push(pump_worker);

        info!(
            port = session.manager.config().port.as_deref().unwrap_or("auto"),
            "mirror session started"
        );
        Ok(session)
    }
}

impl<O: LinkOpener, E: PortEnumerator> MirrorSession<O, E> {
    /// Frames decoded so far, newest last.
    pub fn queue(&self) -> Arc<FrameQueue> {
        Arc::clone(&self.queue)
    }

    pub fn status(&self) -> LinkStatus {
        self.manager.status()
    }

    pub fn signal(&self) -> RunSignal {
        self.signal.clone()
    }

    /// Stop both loops, then disable mirroring and release the port.
    /// Idempotent.
    pub fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        self.signal.stop();
        for worker in self.workers.drain(..) {
            let name = worker.thread().name().unwrap_or("worker").to_string();
            if worker.join().is_err() {
                warn!(thread = %name, "worker thread panicked");
            }
        }
        self.manager.shutdown();
        info!("mirror session stopped");
    }
}

impl<O: LinkOpener, E: PortEnumerator> Drop for MirrorSession<O, E> {
    fn drop(&mut self) {
        self.stop();
    }
}

fn spawn<F>(name: &'static str, body: F) -> Result<JoinHandle<()>>
where
    F: FnOnce() + Send + 'static,
{
    thread::Builder::new()
        .name(name.to_string())
        .spawn(body)
        .map_err(|source| LinkError::Spawn { name, source })
}
