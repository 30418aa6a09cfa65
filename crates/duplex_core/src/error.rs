//! # Core Error Types
//!
//! Errors that can occur while starting threads, loading configuration
//! or submitting work across the thread boundary.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur in the core runtime.
#[derive(Error, Debug)]
pub enum CoreError {
    /// `start` was called on a thread that is still running.
    #[error("thread `{thread}` is already running")]
    AlreadyRunning {
        /// Name of the thread.
        thread: String,
    },

    /// The operating system refused to create the thread.
    #[error("failed to spawn thread `{thread}`: {source}")]
    Spawn {
        /// Name of the thread.
        thread: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// Invalid configuration value or malformed TOML.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Configuration file could not be read.
    #[error("failed to read configuration `{}`: {source}", path.display())]
    ConfigIo {
        /// Path that was being read.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A bounded request channel is full.
    #[error("request queue full (capacity {capacity})")]
    RequestQueueFull {
        /// Capacity of the channel.
        capacity: usize,
    },

    /// The receiving side of a channel is gone.
    #[error("receiver disconnected")]
    Disconnected,
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::AlreadyRunning {
            thread: "RendererThread".to_string(),
        };
        assert_eq!(err.to_string(), "thread `RendererThread` is already running");

        let err = CoreError::RequestQueueFull { capacity: 8 };
        assert_eq!(err.to_string(), "request queue full (capacity 8)");
    }

    #[test]
    fn test_spawn_error_keeps_source() {
        use std::error::Error as _;

        let err = CoreError::Spawn {
            thread: "FrameworkThread".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "no threads left"),
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("no threads left"));
    }
}
