//! # Worker Thread
//!
//! Owns one OS thread running a [`ThreadBody`].
//!
//! ```text
//!   idle ──start()──> running ──stop()──> stopping ──loop observes flag──> idle
//!                        │                                   ▲
//!                        └──── run() errors / panics ────────┘  (logged, not propagated)
//! ```
//!
//! The body is shared with the thread through an `Arc`, so statistics it keeps
//! in atomics can be read from the owning side while the loop runs.
//!
//! ## Shutdown on drop
//!
//! Dropping a running `WorkerThread` requests a stop and waits up to the
//! configured shutdown timeout. If the loop never observes the stop flag the
//! thread is detached and left running: it is abandoned, not killed, and may
//! still be executing when the process exits.

use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use super::signal::StopSignal;
use crate::error::{CoreError, CoreResult};
use crate::queue::panic_message;

/// Default bounded join used when a running thread is dropped.
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_millis(5000);

/// Loop body executed by a [`WorkerThread`].
///
/// `run` must poll [`StopSignal::should_stop`] and return once it is set.
pub trait ThreadBody: Send + Sync + 'static {
    /// The thread's main loop.
    ///
    /// # Errors
    ///
    /// An error ends the thread. It is logged by the thread entry and never
    /// reaches callers of `stop` or `wait_for_completion`.
    fn run(&self, stop: &StopSignal) -> CoreResult<()>;

    /// Called on the new thread right before [`run`](Self::run).
    fn on_thread_start(&self) {}

    /// Called on the thread right after [`run`](Self::run) returns.
    fn on_thread_end(&self) {}
}

/// One named OS thread with cooperative stop and bounded join.
pub struct WorkerThread<B: ThreadBody> {
    name: String,
    body: Arc<B>,
    stop: StopSignal,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
    /// Disconnects when the thread entry returns.
    exited: Option<Receiver<()>>,
    shutdown_timeout: Duration,
}

impl<B: ThreadBody> WorkerThread<B> {
    /// Creates an idle thread. Nothing is spawned until [`start`](Self::start).
    pub fn new(name: impl Into<String>, body: B) -> Self {
        Self {
            name: name.into(),
            body: Arc::new(body),
            stop: StopSignal::new(),
            running: Arc::new(AtomicBool::new(false)),
            handle: None,
            exited: None,
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Sets how long dropping a running thread waits for it.
    #[must_use]
    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Spawns the thread.
    ///
    /// Returns false if the thread is already running or the OS refused to
    /// spawn it. Both cases are logged.
    pub fn start(&mut self) -> bool {
        self.try_start().is_ok()
    }

    /// Spawns the thread, reporting why it could not.
    ///
    /// # Errors
    ///
    /// [`CoreError::AlreadyRunning`] if a previous start is still running,
    /// [`CoreError::Spawn`] if the OS could not create the thread.
    pub fn try_start(&mut self) -> CoreResult<()> {
        if self.is_running() {
            tracing::warn!(thread = %self.name, "start rejected: already running");
            return Err(CoreError::AlreadyRunning {
                thread: self.name.clone(),
            });
        }

        // A previous run has already cleared its running flag; reap it so only
        // one native handle is ever outstanding.
        self.reap();

        self.stop.reset();
        self.running.store(true, Ordering::SeqCst);

        let (exit_tx, exit_rx) = crossbeam_channel::bounded::<()>(0);
        let name = self.name.clone();
        let body = Arc::clone(&self.body);
        let stop = self.stop.clone();
        let running = Arc::clone(&self.running);

        let spawned = thread::Builder::new()
            .name(self.name.clone())
            .spawn(move || thread_entry(&name, body.as_ref(), &stop, &running, exit_tx));

        match spawned {
            Ok(handle) => {
                tracing::debug!(thread = %self.name, id = ?handle.thread().id(), "thread spawned");
                self.handle = Some(handle);
                self.exited = Some(exit_rx);
                Ok(())
            }
            Err(source) => {
                self.running.store(false, Ordering::SeqCst);
                tracing::error!(thread = %self.name, error = %source, "failed to spawn thread");
                Err(CoreError::Spawn {
                    thread: self.name.clone(),
                    source,
                })
            }
        }
    }

    /// Requests a cooperative stop. Does not block.
    pub fn stop(&self) {
        self.stop.request_stop();
    }

    /// A clone of the stop flag, for stopping this thread from elsewhere.
    #[must_use]
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    /// Waits for the thread function to return.
    ///
    /// A zero `timeout` waits indefinitely. Otherwise returns false if the
    /// thread is still running when the timeout elapses. Returns true
    /// immediately if the thread was never started.
    pub fn wait_for_completion(&mut self, timeout: Duration) -> bool {
        let Some(exited) = self.exited.as_ref() else {
            return true;
        };

        if !timeout.is_zero() {
            match exited.recv_timeout(timeout) {
                Err(RecvTimeoutError::Timeout) => {
                    tracing::debug!(thread = %self.name, ?timeout, "wait for completion timed out");
                    return false;
                }
                Ok(()) | Err(RecvTimeoutError::Disconnected) => {}
            }
        }

        self.reap();
        true
    }

    /// True between a successful start and the loop returning.
    #[inline]
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Name given at construction; also the OS thread name.
    #[must_use]
    pub fn thread_name(&self) -> &str {
        &self.name
    }

    /// Id of the native thread, if one has been spawned and not yet joined.
    #[must_use]
    pub fn thread_id(&self) -> Option<ThreadId> {
        self.handle.as_ref().map(|h| h.thread().id())
    }

    /// The loop body, for reading its statistics.
    #[must_use]
    pub fn body(&self) -> &B {
        &self.body
    }

    /// Joins the native thread if any. Blocks until it returns.
    fn reap(&mut self) {
        self.exited = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!(thread = %self.name, "thread entry panicked outside its guard");
            }
        }
    }
}

impl<B: ThreadBody> Drop for WorkerThread<B> {
    fn drop(&mut self) {
        if !self.is_running() {
            self.reap();
            return;
        }

        self.stop();
        if !self.wait_for_completion(self.shutdown_timeout) {
            tracing::warn!(
                thread = %self.name,
                timeout = ?self.shutdown_timeout,
                "thread ignored stop request; abandoning it"
            );
            // Detach: dropping the handle leaves the OS thread running.
            self.handle.take();
            self.exited.take();
        }
    }
}

impl<B: ThreadBody> std::fmt::Debug for WorkerThread<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerThread")
            .field("name", &self.name)
            .field("running", &self.is_running())
            .field("thread_id", &self.thread_id())
            .finish_non_exhaustive()
    }
}

/// Runs on the spawned thread. Nothing escapes it.
fn thread_entry<B: ThreadBody>(
    name: &str,
    body: &B,
    stop: &StopSignal,
    running: &AtomicBool,
    exit_tx: Sender<()>,
) {
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        body.on_thread_start();
        let result = body.run(stop);
        body.on_thread_end();
        result
    }));

    match outcome {
        Ok(Ok(())) if stop.should_stop() => {
            tracing::debug!(thread = name, "thread exited on stop request");
        }
        Ok(Ok(())) => {
            tracing::warn!(thread = name, "thread loop returned without a stop request");
        }
        Ok(Err(error)) => {
            tracing::error!(thread = name, %error, "thread loop failed");
        }
        Err(payload) => {
            tracing::error!(
                thread = name,
                reason = panic_message(payload.as_ref()),
                "thread loop panicked"
            );
        }
    }

    running.store(false, Ordering::SeqCst);
    drop(exit_tx);
}
