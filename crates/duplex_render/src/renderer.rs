//! # Renderer Loop
//!
//! The consumer thread. Once per frame:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ 1. queue.process_commands()  (scene mutation)│
//! │ 2. scene.reap_invalid()                      │
//! │ 3. scene.draw_list()         (draw_data)     │
//! │ 4. every N frames: log statistics            │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! When the loop exits, commands still pending are drained one last time on
//! the renderer thread so removals enqueued during shutdown are not lost.

use std::sync::atomic::{AtomicUsize, Ordering};

use duplex_core::{
    run_paced, CoreResult, DrainReport, FrameStats, FrameTick, StopSignal, ThreadBody, ThreadConfig,
    WorkerThread,
};
use tracing::{debug, info, trace};

use crate::context::RenderContext;

/// Thread name given to the renderer's OS thread.
pub const RENDERER_THREAD_NAME: &str = "RenderThread";

/// Renderer worker thread.
pub type RendererThread = WorkerThread<RendererLoop>;

/// Body of the consumer thread.
#[derive(Debug)]
pub struct RendererLoop {
    context: RenderContext,
    config: ThreadConfig,
    stats: FrameStats,
    last_draw_count: AtomicUsize,
}

impl RendererLoop {
    /// Creates a loop consuming `context` at the rate given by `config`.
    #[must_use]
    pub fn new(context: RenderContext, config: ThreadConfig) -> Self {
        Self {
            context,
            config,
            stats: FrameStats::new(),
            last_draw_count: AtomicUsize::new(0),
        }
    }

    /// Frames rendered so far.
    #[inline]
    #[must_use]
    pub fn render_frame_count(&self) -> u64 {
        self.stats.frame_count()
    }

    /// Mean frame time in milliseconds.
    #[inline]
    #[must_use]
    pub fn average_render_time_ms(&self) -> f64 {
        self.stats.average_frame_time_ms()
    }

    /// Proxies drawn in the most recent frame.
    #[inline]
    #[must_use]
    pub fn last_draw_count(&self) -> usize {
        self.last_draw_count.load(Ordering::Relaxed)
    }

    /// Shared context this loop consumes.
    #[must_use]
    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    /// Runs one frame's worth of work.
    pub fn render_frame(&self, tick: FrameTick) -> DrainReport {
        let report = self.context.queue().process_commands();
        let reaped = self.context.scene().reap_invalid();
        let draw_list = self.context.scene().draw_list();
        self.last_draw_count.store(draw_list.len(), Ordering::Relaxed);

        trace!(
            frame = tick.frame,
            delta_time = tick.delta_time,
            executed = report.executed,
            faulted = report.faulted,
            reaped,
            drawn = draw_list.len(),
            "render frame"
        );

        if tick.completes_interval(self.config.stats_log_interval) {
            info!(
                frames = tick.frame + 1,
                avg_ms = self.average_render_time_ms(),
                primitives = self.context.scene().primitive_count(),
                pending = self.context.queue().pending_command_count(),
                "Render loop statistics"
            );
        }

        report
    }
}

impl ThreadBody for RendererLoop {
    fn run(&self, stop: &StopSignal) -> CoreResult<()> {
        run_paced(stop, self.config.frame_interval(), &self.stats, |tick| {
            self.render_frame(tick);
            Ok(())
        })
    }

    fn on_thread_start(&self) {
        info!(
            thread = ?std::thread::current().id(),
            target_fps = self.config.target_fps,
            "Render thread started"
        );
    }

    fn on_thread_end(&self) {
        let last = self.context.queue().process_commands();
        if last.total() > 0 {
            debug!(executed = last.executed, faulted = last.faulted, "Final render drain");
        }
        info!(
            thread = ?std::thread::current().id(),
            frames = self.render_frame_count(),
            avg_ms = self.average_render_time_ms(),
            "Render thread ended"
        );
    }
}

/// Builds the renderer thread for `context` (not yet started).
#[must_use]
pub fn renderer_thread(context: RenderContext, config: &ThreadConfig) -> RendererThread {
    WorkerThread::new(RENDERER_THREAD_NAME, RendererLoop::new(context, config.clone()))
        .with_shutdown_timeout(config.shutdown_timeout())
}
