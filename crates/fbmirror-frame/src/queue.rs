use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::codec::Frame;

/// Default number of frames held between decoder and renderer.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10;

/// Bounded hand-off between the decoder and the renderer.
///
/// The producer never waits: pushing into a full queue evicts the oldest
/// frame. The consumer only ever wants the newest display state, so it
/// drains everything and keeps the last frame.
#[derive(Debug)]
pub struct FrameQueue {
    frames: Mutex<VecDeque<Frame>>,
    capacity: usize,
    evicted: AtomicU64,
}

impl FrameQueue {
    /// Create a queue holding at most `capacity` frames (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            evicted: AtomicU64::new(0),
        }
    }

    /// Insert a frame, evicting the oldest one if the queue is full.
    ///
    /// Returns the evicted frame, if any.
    pub fn push(&self, frame: Frame) -> Option<Frame> {
        let mut frames = self.lock();
        let evicted = if frames.len() >= self.capacity {
            self.evicted.fetch_add(1, Ordering::Relaxed);
            frames.pop_front()
        } else {
            None
        };
        frames.push_back(frame);
        evicted
    }

    /// Remove every queued frame and return the most recent one.
    pub fn drain_latest(&self) -> Option<Frame> {
        let mut frames = self.lock();
        let latest = frames.pop_back();
        frames.clear();
        latest
    }

    /// Queued frames, oldest first, without removing them.
    pub fn snapshot(&self) -> Vec<Frame> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Frames dropped by drop-oldest eviction so far.
    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<Frame>> {
        // A panicking holder cannot leave the deque half-updated.
        self.frames.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FrameQueue {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_CAPACITY)
    }
}
