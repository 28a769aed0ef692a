//! The process's single root cancellation source (spec §5: "one root
//! cancellation source"). Adapted from the shape of the teacher's
//! `lib/better-shutdown`: a `Notify`-backed broadcaster with a cheap,
//! `Arc`-clonable waiter handle. Unlike `better-shutdown` this does not
//! chase a benchmark-tuned fast path (no `arrayvec`, no custom waker
//! bookkeeping) — this signal fires at most once per process lifetime, so a
//! plain `tokio::sync::Notify` is the right tool.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

#[derive(Clone)]
pub struct ShutdownController {
    inner: Arc<Inner>,
}

struct Inner {
    notify: Notify,
    fired: AtomicBool,
}

impl Default for ShutdownController {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownController {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Inner {
                notify: Notify::new(),
                fired: AtomicBool::new(false),
            }),
        }
    }

    /// Fires shutdown for every waiter. Idempotent: calling this more than
    /// once has no additional effect.
    pub fn shutdown(&self) {
        if self.inner.fired.swap(true, Ordering::SeqCst) {
            return;
        }
        tracing::info!("shutdown signal raised");
        self.inner.notify.notify_waiters();
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.fired.load(Ordering::SeqCst)
    }

    /// A handle tasks can `.await` to observe shutdown. Resolves immediately
    /// if shutdown already fired before this call.
    pub async fn wait(&self) {
        // Register interest before checking the flag: `notify_waiters` only
        // wakes futures already polled at the time it's called, so checking
        // the flag first would race a `shutdown()` landing in between.
        let notified = self.inner.notify.notified();
        if self.is_shutdown() {
            return;
        }
        notified.await;
    }
}
