use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Granularity at which sleeping loops notice a stop request.
const POLL_SLICE: Duration = Duration::from_millis(50);

/// Process-wide "keep running" flag shared by every loop.
///
/// Clones share the same flag. Clearing it makes each loop exit at its next
/// iteration boundary; sleeps go through [`RunSignal::sleep`] so the latency
/// of a stop request is bounded by [`POLL_SLICE`].
#[derive(Debug, Clone)]
pub struct RunSignal {
    running: Arc<AtomicBool>,
}

impl RunSignal {
    /// A new signal in the running state.
    pub fn new() -> Self {
        Self::from_flag(Arc::new(AtomicBool::new(true)))
    }

    /// Wrap an existing flag (e.g. one shared with a Ctrl-C handler).
    pub fn from_flag(running: Arc<AtomicBool>) -> Self {
        Self { running }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ask every loop holding this signal to stop.
    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// The underlying flag.
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    /// Sleep for `duration`, waking early if the signal is cleared.
    ///
    /// Returns whether the signal is still running afterwards.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        while self.is_running() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep((deadline - now).min(POLL_SLICE));
        }
        self.is_running()
    }
}

impl Default for RunSignal {
    fn default() -> Self {
        Self::new()
    }
}
