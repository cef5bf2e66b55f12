//! Cooperative cancellation shared by the walker, workers, and readers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

/// A cheaply cloneable cancellation token.
///
/// Triggering is idempotent; every cooperating task observes the flag at
/// its next check and exits. An optional deadline turns the token into a
/// timeout: once the deadline passes, `is_cancelled` flips the flag and
/// reports true from then on.
#[derive(Clone, Debug, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    deadline: OnceLock<Instant>,
}

impl CancelToken {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms the timeout. Only the first call has any effect.
    pub fn set_deadline(&self, timeout: Duration) {
        let _ = self.inner.deadline.set(Instant::now() + timeout);
    }

    /// Signals cancellation to all holders of this token.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
    }

    /// Returns true once cancelled or past the deadline.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        if self.inner.cancelled.load(Ordering::Acquire) {
            return true;
        }
        if let Some(deadline) = self.inner.deadline.get() {
            if Instant::now() >= *deadline {
                self.cancel();
                return true;
            }
        }
        false
    }
}
