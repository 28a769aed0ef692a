use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;

/// A single-slot mode-switch signal. Backed by `watch` rather than a bare
/// `mpsc` of capacity 1 because `watch` coalesces redundant fires for free —
/// exactly the "at-most-one-pending-signal" shape join/restart need.
#[derive(Clone)]
pub struct ModeSignal {
    tx: watch::Sender<u64>,
}

impl ModeSignal {
    pub fn channel() -> (Self, watch::Receiver<u64>) {
        let (tx, rx) = watch::channel(0);
        (Self { tx }, rx)
    }

    pub fn fire(&self) {
        let _ = self.tx.send(self.tx.borrow().wrapping_add(1));
    }
}

/// Shared authority on which regime the scheduler is in. Only the timer
/// loop ever writes it; the event loop only reads it to decide whether a
/// discovery event should cut join mode short.
#[derive(Clone)]
pub struct ModeState(Arc<AtomicBool>);

impl ModeState {
    pub fn new_join() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_join(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn set_join(&self, join: bool) {
        self.0.store(join, Ordering::SeqCst);
    }
}
