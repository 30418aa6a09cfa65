//! # Engine
//!
//! Owns the shared [`RenderContext`] and both worker threads.
//!
//! ## Startup
//!
//! Framework first, then renderer. If the renderer cannot start, the
//! framework thread is stopped again so the engine is left idle.
//!
//! ## Shutdown
//!
//! ```text
//! 1. stop + join framework   (its components drop → "remove" commands)
//! 2. stop + join renderer    (final drain executes those removals)
//! 3. flush leftover commands (only non-zero if a thread was abandoned)
//! 4. clear the scene
//! ```

use duplex_core::{CoreError, CoreResult, EngineConfig};
use duplex_framework::{framework_thread, ComponentSet, FrameworkThread};
use duplex_render::{renderer_thread, RenderContext, RendererThread};
use tracing::{info, warn};

/// What [`Engine::shutdown`] observed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// Framework thread exited within its timeout.
    pub framework_joined: bool,
    /// Renderer thread exited within its timeout.
    pub renderer_joined: bool,
    /// Commands discarded without running.
    pub flushed_commands: usize,
    /// Proxies still in the scene at the end.
    pub cleared_primitives: usize,
}

impl ShutdownReport {
    /// True when both threads joined and nothing was left behind.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.framework_joined
            && self.renderer_joined
            && self.flushed_commands == 0
            && self.cleared_primitives == 0
    }
}

/// Two-thread engine host.
pub struct Engine {
    config: EngineConfig,
    context: RenderContext,
    framework: FrameworkThread,
    renderer: RendererThread,
}

impl Engine {
    /// Builds an idle engine.
    ///
    /// # Errors
    ///
    /// Returns a config error if `config` fails validation.
    pub fn new(config: EngineConfig) -> CoreResult<Self> {
        config.validate()?;
        let context = RenderContext::new();
        let framework = framework_thread(context.clone(), &config.framework, &config.requests);
        let renderer = renderer_thread(context.clone(), &config.renderer);
        Ok(Self {
            config,
            context,
            framework,
            renderer,
        })
    }

    /// Starts the framework thread, then the renderer thread.
    ///
    /// # Errors
    ///
    /// Returns the first start failure. A renderer failure stops the
    /// framework thread again before returning.
    pub fn start(&mut self) -> CoreResult<()> {
        self.framework.try_start()?;

        if let Err(err) = self.renderer.try_start() {
            warn!(error = %err, "Renderer failed to start; rolling back framework");
            self.framework.stop();
            self.framework
                .wait_for_completion(self.config.framework.shutdown_timeout());
            return Err(err);
        }

        info!("Engine started");
        Ok(())
    }

    /// Queues `request` to run against the framework's components.
    ///
    /// # Errors
    ///
    /// [`CoreError::Disconnected`] when the framework thread is not running
    /// (never started, shut down, or ended by a failed request), and
    /// [`CoreError::RequestQueueFull`] when the request channel is full.
    pub fn submit<F>(&self, request: F) -> CoreResult<()>
    where
        F: FnOnce(&mut ComponentSet) + Send + 'static,
    {
        if !self.framework.is_running() {
            return Err(CoreError::Disconnected);
        }
        self.framework.body().submit(request)
    }

    /// Stops both threads in order and tears down render state.
    pub fn shutdown(&mut self) -> ShutdownReport {
        self.framework.stop();
        let framework_joined = self
            .framework
            .wait_for_completion(self.config.framework.shutdown_timeout());

        self.renderer.stop();
        let renderer_joined = self
            .renderer
            .wait_for_completion(self.config.renderer.shutdown_timeout());

        let report = ShutdownReport {
            framework_joined,
            renderer_joined,
            flushed_commands: self.context.queue().flush(),
            cleared_primitives: self.context.scene().clear(),
        };

        if report.is_clean() {
            info!("Engine shut down cleanly");
        } else {
            warn!(?report, "Engine shut down with leftovers");
        }
        report
    }

    /// True while either thread is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.framework.is_running() || self.renderer.is_running()
    }

    /// Shared queue and scene.
    #[inline]
    #[must_use]
    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    /// Configuration the engine was built with.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Framework worker thread.
    #[inline]
    #[must_use]
    pub fn framework(&self) -> &FrameworkThread {
        &self.framework
    }

    /// Renderer worker thread.
    #[inline]
    #[must_use]
    pub fn renderer(&self) -> &RendererThread {
        &self.renderer
    }

    /// Framework frames so far.
    #[must_use]
    pub fn framework_frame_count(&self) -> u64 {
        self.framework.body().frame_count()
    }

    /// Renderer frames so far.
    #[must_use]
    pub fn render_frame_count(&self) -> u64 {
        self.renderer.body().render_frame_count()
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if self.is_running() {
            self.shutdown();
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("framework", &self.framework)
            .field("renderer", &self.renderer)
            .field("context", &self.context)
            .finish()
    }
}
