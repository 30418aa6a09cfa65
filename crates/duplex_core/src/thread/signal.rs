//! Cooperative stop flag with an interruptible sleep.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

struct SignalInner {
    stop: AtomicBool,
    lock: Mutex<()>,
    wake: Condvar,
}

/// Shared "should stop" flag for one worker thread.
///
/// Cloning is cheap; every clone observes the same flag. Requesting a stop
/// never blocks and can be done from any thread, any number of times.
#[derive(Clone)]
pub struct StopSignal {
    inner: Arc<SignalInner>,
}

impl StopSignal {
    /// Creates a signal in the "keep running" state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SignalInner {
                stop: AtomicBool::new(false),
                lock: Mutex::new(()),
                wake: Condvar::new(),
            }),
        }
    }

    /// Returns true once a stop has been requested.
    #[inline]
    #[must_use]
    pub fn should_stop(&self) -> bool {
        self.inner.stop.load(Ordering::Acquire)
    }

    /// Requests a cooperative stop and wakes any [`sleep`](Self::sleep) in progress.
    pub fn request_stop(&self) {
        self.inner.stop.store(true, Ordering::Release);
        let _guard = self.inner.lock.lock();
        self.inner.wake.notify_all();
    }

    /// Clears the flag before a fresh start.
    pub(crate) fn reset(&self) {
        self.inner.stop.store(false, Ordering::Release);
    }

    /// Sleeps for `duration` or until a stop is requested, whichever comes first.
    ///
    /// Returns true if the sleep ended because of a stop request.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        let mut guard = self.inner.lock.lock();
        while !self.should_stop() {
            if self.inner.wake.wait_until(&mut guard, deadline).timed_out() {
                break;
            }
        }
        self.should_stop()
    }
}

impl Default for StopSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for StopSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StopSignal")
            .field("should_stop", &self.should_stop())
            .finish()
    }
}
