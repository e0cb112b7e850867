//! Event delivery contexts.
//!
//! Store callbacks arrive on whatever thread the backend resolves on.
//! The dispatcher is the seam that decides where subscriber callbacks
//! actually run: inline on the resolving thread, or queued onto a
//! channel that a designated thread (typically the UI thread) drains.

use std::sync::mpsc;
use std::sync::Mutex;
use std::time::Duration;

/// A unit of event delivery, ready to run on the target context.
pub type Thunk = Box<dyn FnOnce() + Send + 'static>;

/// Marshals event delivery onto an execution context.
///
/// Every outward-facing event goes through exactly one `dispatch` call,
/// so swapping the dispatcher re-homes all subscriber callbacks at once.
pub trait EventDispatcher: Send + Sync {
    fn dispatch(&self, thunk: Thunk);
}

/// Runs delivery immediately on the calling thread.
///
/// This is the default: events fire synchronously from whatever thread
/// the backend resolved on.
#[derive(Debug, Default)]
pub struct InlineDispatcher;

impl InlineDispatcher {
    pub fn new() -> Self {
        Self
    }
}

impl EventDispatcher for InlineDispatcher {
    fn dispatch(&self, thunk: Thunk) {
        thunk();
    }
}

/// Queues delivery for a thread of the host's choosing.
///
/// Backend threads enqueue; the owning thread calls [`run_pending`]
/// (or [`run_one`]) to deliver. Delivery order is enqueue order.
///
/// [`run_pending`]: QueuedDispatcher::run_pending
/// [`run_one`]: QueuedDispatcher::run_one
#[derive(Debug)]
pub struct QueuedDispatcher {
    tx: mpsc::Sender<Thunk>,
    rx: Mutex<mpsc::Receiver<Thunk>>,
}

impl QueuedDispatcher {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            tx,
            rx: Mutex::new(rx),
        }
    }

    /// Deliver everything queued so far. Returns the number delivered.
    pub fn run_pending(&self) -> usize {
        let rx = self.rx.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        let mut delivered = 0;
        while let Ok(thunk) = rx.try_recv() {
            thunk();
            delivered += 1;
        }
        delivered
    }

    /// Block up to `timeout` for one queued delivery.
    pub fn run_one(&self, timeout: Duration) -> bool {
        let thunk = {
            let rx = self.rx.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            rx.recv_timeout(timeout).ok()
        };
        match thunk {
            Some(thunk) => {
                thunk();
                true
            }
            None => false,
        }
    }
}

impl Default for QueuedDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl EventDispatcher for QueuedDispatcher {
    fn dispatch(&self, thunk: Thunk) {
        // A send can only fail if the receiver half is gone, which
        // cannot happen while `self` is alive.
        let _ = self.tx.send(thunk);
    }
}
