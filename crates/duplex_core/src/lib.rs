//! # DUPLEX Core
//!
//! Threading primitives for the two-thread engine:
//!
//! - [`WorkerThread`]: one OS thread with cooperative stop and bounded join
//! - [`CommandQueue`]: swap-then-drain FIFO of one-shot [`Command`]s
//! - [`run_paced`]: fixed-rate loop helper with [`FrameStats`]
//! - [`ComponentId`]: the key joining framework components to render proxies
//! - [`EngineConfig`]: TOML configuration for both loops
//!
//! ## Example
//!
//! ```rust,ignore
//! use duplex_core::CommandQueue;
//!
//! let queue = CommandQueue::new();
//! queue.enqueue("Hello", || println!("runs on the renderer thread"));
//! queue.process_commands();
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod command;
pub mod config;
pub mod error;
pub mod frame;
pub mod id;
pub mod queue;
pub mod thread;

pub use command::{Command, NamedCommand};
pub use config::{EngineConfig, RequestConfig, ThreadConfig};
pub use error::{CoreError, CoreResult};
pub use frame::{run_paced, FrameStats, FrameTick};
pub use id::ComponentId;
pub use queue::{CommandQueue, DrainReport, QueueStats};
pub use thread::{StopSignal, ThreadBody, WorkerThread, DEFAULT_SHUTDOWN_TIMEOUT};
