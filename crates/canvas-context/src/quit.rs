//! Session-wide shutdown signal.
//!
//! Generalizes `core_input::AsyncInputShutdown` from a single-shot `notify_one` (one
//! task, one shutdown) to a broadcast any number of observers can wait on: the
//! reader task, the user task, and the session's own teardown all need to learn
//! about shutdown independently, and none of them should race to be "the" listener.
//!
//! Lives in this crate rather than `canvas-session` so [`DrawContext`](crate::DrawContext)
//! can fire it directly when resource id allocation is exhausted, without a circular
//! dependency on the session crate that owns the transport.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

#[derive(Clone)]
pub struct QuitSignal {
    notify: Arc<Notify>,
    signaled: Arc<AtomicBool>,
}

impl QuitSignal {
    pub fn new() -> Self {
        Self {
            notify: Arc::new(Notify::new()),
            signaled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Fire the signal for every current and future waiter. Idempotent: signaling
    /// twice is a no-op the second time.
    pub fn signal(&self) {
        if !self.signaled.swap(true, Ordering::SeqCst) {
            self.notify.notify_waiters();
        }
    }

    pub fn is_signaled(&self) -> bool {
        self.signaled.load(Ordering::SeqCst)
    }

    /// Resolves immediately if already signaled, otherwise waits for the next
    /// `signal()` call.
    pub async fn wait(&self) {
        if self.is_signaled() {
            return;
        }
        let notified = self.notify.notified();
        // Re-check after registering interest to close the race where `signal()`
        // landed between the first check and `notified()` being constructed.
        if self.is_signaled() {
            return;
        }
        notified.await;
    }
}

impl Default for QuitSignal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn wait_resolves_after_signal() {
        let quit = QuitSignal::new();
        let waiter = quit.clone();
        let handle = tokio::spawn(async move {
            waiter.wait().await;
        });
        tokio::task::yield_now().await;
        quit.signal();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn wait_returns_immediately_if_already_signaled() {
        let quit = QuitSignal::new();
        quit.signal();
        tokio::time::timeout(std::time::Duration::from_millis(50), quit.wait())
            .await
            .expect("wait should not block once already signaled");
    }

    #[tokio::test]
    async fn signal_is_idempotent() {
        let quit = QuitSignal::new();
        quit.signal();
        quit.signal();
        assert!(quit.is_signaled());
    }
}
