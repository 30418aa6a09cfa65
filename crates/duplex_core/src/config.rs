//! # Engine Configuration
//!
//! Loaded once at startup from TOML. Every field has a default, so an empty
//! file (or no file at all) yields a runnable engine.
//!
//! ```toml
//! [framework]
//! target_fps = 60
//! shutdown_timeout_ms = 5000
//! stats_log_interval = 100
//!
//! [renderer]
//! target_fps = 60
//!
//! [requests]
//! capacity = 1024
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{CoreError, CoreResult};

/// Settings for one worker loop.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ThreadConfig {
    /// Target frames per second. `0` runs the loop unthrottled.
    pub target_fps: u32,
    /// How long dropping a running thread waits for it to exit (ms).
    pub shutdown_timeout_ms: u64,
    /// Log loop statistics every N frames. `0` disables the log.
    pub stats_log_interval: u64,
}

impl Default for ThreadConfig {
    fn default() -> Self {
        Self {
            target_fps: 60,
            shutdown_timeout_ms: 5000,
            stats_log_interval: 100,
        }
    }
}

impl ThreadConfig {
    /// Duration of one frame, or `None` when unthrottled.
    #[must_use]
    pub fn frame_interval(&self) -> Option<Duration> {
        if self.target_fps == 0 {
            None
        } else {
            Some(Duration::from_secs_f64(1.0 / f64::from(self.target_fps)))
        }
    }

    /// Bounded join timeout used when a running thread is dropped.
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }

    fn validate(&self, section: &str) -> CoreResult<()> {
        if self.shutdown_timeout_ms == 0 {
            return Err(CoreError::Config(format!(
                "{section}.shutdown_timeout_ms must be greater than zero"
            )));
        }
        Ok(())
    }
}

/// Settings for the app → framework request channel.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    /// Maximum queued requests before `submit` reports the channel full.
    pub capacity: usize,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self { capacity: 1024 }
    }
}

/// Top-level configuration for both engine threads.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Producer (framework) loop.
    pub framework: ThreadConfig,
    /// Consumer (renderer) loop.
    pub renderer: ThreadConfig,
    /// Request channel into the framework thread.
    pub requests: RequestConfig,
}

impl EngineConfig {
    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] for malformed TOML or invalid values.
    pub fn from_toml_str(text: &str) -> CoreResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| CoreError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ConfigIo`] if the file cannot be read, or
    /// [`CoreError::Config`] if its contents are invalid.
    pub fn load(path: impl AsRef<Path>) -> CoreResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CoreError::ConfigIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] naming the offending field.
    pub fn validate(&self) -> CoreResult<()> {
        self.framework.validate("framework")?;
        self.renderer.validate("renderer")?;
        if self.requests.capacity == 0 {
            return Err(CoreError::Config(
                "requests.capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
