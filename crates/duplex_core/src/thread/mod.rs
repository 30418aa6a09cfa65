//! # Worker Threads
//!
//! ```text
//! Thread 1 (Framework):  mutates components, enqueues commands
//! Thread 2 (Renderer):   drains commands, owns the scene
//! ```
//!
//! Both are [`WorkerThread`]s: one OS thread each, stopped cooperatively
//! through a [`StopSignal`] and joined with a bounded wait.

mod signal;
mod worker;

pub use signal::StopSignal;
pub use worker::{ThreadBody, WorkerThread, DEFAULT_SHUTDOWN_TIMEOUT};
