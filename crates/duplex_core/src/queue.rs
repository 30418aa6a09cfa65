//! # Command Queue
//!
//! Thread-safe FIFO of [`Command`]s. Any number of producers enqueue; exactly
//! one consumer drains, once per tick.
//!
//! ## Swap, then drain
//!
//! ```text
//!   Producer 1 ──┐
//!   Producer 2 ──┼──> [ pending: VecDeque ]  <── lock held for push / swap only
//!   Producer N ──┘            │
//!                             │ mem::take (O(1))
//!                             ▼
//!                     [ local batch ] ──> execute in order (no lock held)
//! ```
//!
//! Producers keep enqueueing while a slow batch executes, and the lock is
//! never held across user code.
//!
//! Each command runs inside its own unwind boundary. A panicking command is
//! logged and counted; the rest of the batch still runs.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::command::{Command, NamedCommand};

/// Outcome of one [`CommandQueue::process_commands`] call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DrainReport {
    /// Commands that ran to completion.
    pub executed: usize,
    /// Commands that panicked.
    pub faulted: usize,
}

impl DrainReport {
    /// Total commands taken from the queue.
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.executed + self.faulted
    }
}

/// Lifetime counters for a queue.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Commands ever enqueued.
    pub enqueued: u64,
    /// Commands that executed without panicking.
    pub executed: u64,
    /// Commands that panicked.
    pub faulted: u64,
    /// Commands discarded by [`CommandQueue::flush`].
    pub flushed: u64,
}

/// FIFO handoff from the framework thread to the renderer thread.
///
/// Unbounded: `enqueue_command` never blocks and never fails.
pub struct CommandQueue {
    pending: Mutex<VecDeque<Box<dyn Command>>>,
    enqueued: AtomicU64,
    executed: AtomicU64,
    faulted: AtomicU64,
    flushed: AtomicU64,
}

impl CommandQueue {
    /// Creates an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(VecDeque::new()),
            enqueued: AtomicU64::new(0),
            executed: AtomicU64::new(0),
            faulted: AtomicU64::new(0),
            flushed: AtomicU64::new(0),
        }
    }

    /// Takes ownership of `command` and appends it to the tail.
    pub fn enqueue_command(&self, command: Box<dyn Command>) {
        self.pending.lock().push_back(command);
        self.enqueued.fetch_add(1, Ordering::Relaxed);
    }

    /// Enqueues a closure under a diagnostic name.
    pub fn enqueue<F>(&self, name: &'static str, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.enqueue_command(Box::new(NamedCommand::new(name, action)));
    }

    /// Executes every command pending at the moment of the call, in enqueue order.
    ///
    /// Must only be called from the single consuming thread. Commands enqueued
    /// while the batch runs are left for the next call.
    pub fn process_commands(&self) -> DrainReport {
        let batch = std::mem::take(&mut *self.pending.lock());

        let mut report = DrainReport::default();
        for command in batch {
            let name = command.name();
            match panic::catch_unwind(AssertUnwindSafe(move || command.execute())) {
                Ok(()) => report.executed += 1,
                Err(payload) => {
                    report.faulted += 1;
                    tracing::error!(
                        command = name,
                        reason = panic_message(payload.as_ref()),
                        "render command panicked; continuing batch"
                    );
                }
            }
        }

        self.executed.fetch_add(report.executed as u64, Ordering::Relaxed);
        self.faulted.fetch_add(report.faulted as u64, Ordering::Relaxed);
        report
    }

    /// Number of commands waiting. Stale as soon as it returns.
    #[must_use]
    pub fn pending_command_count(&self) -> usize {
        self.pending.lock().len()
    }

    /// Drops every pending command without executing it. Returns how many were dropped.
    ///
    /// Meant for teardown, not for the steady-state tick.
    pub fn flush(&self) -> usize {
        let discarded = std::mem::take(&mut *self.pending.lock());
        let count = discarded.len();
        // Dropped outside the lock: a command's captures may have their own Drop.
        drop(discarded);
        self.flushed.fetch_add(count as u64, Ordering::Relaxed);
        if count > 0 {
            tracing::debug!(discarded = count, "flushed render command queue");
        }
        count
    }

    /// Lifetime counters.
    #[must_use]
    pub fn stats(&self) -> QueueStats {
        QueueStats {
            enqueued: self.enqueued.load(Ordering::Relaxed),
            executed: self.executed.load(Ordering::Relaxed),
            faulted: self.faulted.load(Ordering::Relaxed),
            flushed: self.flushed.load(Ordering::Relaxed),
        }
    }
}

impl Default for CommandQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CommandQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandQueue")
            .field("pending", &self.pending_command_count())
            .field("stats", &self.stats())
            .finish()
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}
