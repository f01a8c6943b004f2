//! Run-wide cancellation signal
//!
//! Cloned into every topic task. Once triggered it stays triggered; topic
//! loops poll `is_triggered` between rounds and sleeping tasks race their
//! sleep against `cancelled()`.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::Notify;

#[derive(Debug, Default)]
struct Inner {
    flag: AtomicBool,
    notify: Notify,
}

#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    inner: Arc<Inner>,
}

impl ShutdownSignal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal shutdown. Idempotent.
    pub fn trigger(&self) {
        self.inner.flag.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
        log::debug!("Shutdown signaled");
    }

    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Resolves once `trigger` has been called (immediately if it already was).
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_triggered() {
                return;
            }
            notified.await;
        }
    }

    /// Sleep for `duration` unless shutdown arrives first.
    ///
    /// Returns false when the sleep was cut short.
    pub async fn sleep(&self, duration: Duration) -> bool {
        if duration.is_zero() {
            return !self.is_triggered();
        }
        tokio::select! {
            () = tokio::time::sleep(duration) => !self.is_triggered(),
            () = self.cancelled() => false,
        }
    }
}
