//! # Framework Loop
//!
//! The producer thread. It owns a [`ComponentSet`] that lives and dies on
//! the thread; other threads hand it work as requests.
//!
//! ```text
//!   app thread ──submit(request)──► [bounded channel] ──┐
//!                                                      ▼
//!   framework tick:  1. run every pending request against the set
//!                    2. sync_render_state()  ──► render command queue
//!                    3. every N frames: log statistics
//! ```
//!
//! When the loop exits the set is dropped, which unregisters every component
//! still registered. The resulting removals are picked up by the renderer.

use std::sync::atomic::{AtomicUsize, Ordering};

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use duplex_core::{
    run_paced, CoreError, CoreResult, FrameStats, FrameTick, RequestConfig, StopSignal, ThreadBody,
    ThreadConfig, WorkerThread,
};
use duplex_render::RenderContext;
use tracing::{debug, info, trace, warn};

use crate::component_set::ComponentSet;

/// Thread name given to the framework's OS thread.
pub const FRAMEWORK_THREAD_NAME: &str = "FrameworkThread";

/// Work executed on the framework thread against its components.
pub type FrameworkRequest = Box<dyn FnOnce(&mut ComponentSet) + Send>;

/// Framework worker thread.
pub type FrameworkThread = WorkerThread<FrameworkLoop>;

/// Body of the producer thread.
#[derive(Debug)]
pub struct FrameworkLoop {
    context: RenderContext,
    config: ThreadConfig,
    stats: FrameStats,
    component_count: AtomicUsize,
    capacity: usize,
    request_tx: Sender<FrameworkRequest>,
    request_rx: Receiver<FrameworkRequest>,
}

impl FrameworkLoop {
    /// Creates a loop producing into `context`.
    #[must_use]
    pub fn new(context: RenderContext, config: ThreadConfig, requests: &RequestConfig) -> Self {
        let (request_tx, request_rx) = bounded(requests.capacity);
        Self {
            context,
            config,
            stats: FrameStats::new(),
            component_count: AtomicUsize::new(0),
            capacity: requests.capacity,
            request_tx,
            request_rx,
        }
    }

    /// Queues `request` to run on the framework thread at the start of its next tick.
    ///
    /// Requests run in submission order. Requests still queued when the loop
    /// exits are dropped without running.
    ///
    /// # Errors
    ///
    /// [`CoreError::RequestQueueFull`] when the channel is at capacity.
    pub fn submit<F>(&self, request: F) -> CoreResult<()>
    where
        F: FnOnce(&mut ComponentSet) + Send + 'static,
    {
        self.request_tx
            .try_send(Box::new(request))
            .map_err(|err| match err {
                TrySendError::Full(_) => CoreError::RequestQueueFull {
                    capacity: self.capacity,
                },
                TrySendError::Disconnected(_) => CoreError::Disconnected,
            })
    }

    /// Requests waiting for the next tick.
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.request_rx.len()
    }

    /// Frames ticked so far.
    #[inline]
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.stats.frame_count()
    }

    /// Mean frame time in milliseconds.
    #[inline]
    #[must_use]
    pub fn average_frame_time_ms(&self) -> f64 {
        self.stats.average_frame_time_ms()
    }

    /// Components alive at the end of the most recent tick.
    #[inline]
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.component_count.load(Ordering::Relaxed)
    }

    /// Runs one tick against `components`. Returns the number of render updates enqueued.
    pub fn tick(&self, components: &mut ComponentSet, tick: FrameTick) -> usize {
        let mut handled = 0usize;
        for request in self.request_rx.try_iter() {
            request(components);
            handled += 1;
        }

        let synced = components.sync_render_state();
        self.component_count.store(components.len(), Ordering::Relaxed);

        trace!(
            frame = tick.frame,
            delta_time = tick.delta_time,
            requests = handled,
            synced,
            "framework tick"
        );

        if tick.completes_interval(self.config.stats_log_interval) {
            info!(
                frames = tick.frame + 1,
                delta_ms = tick.delta_time * 1000.0,
                components = components.len(),
                "Framework loop statistics"
            );
        }

        synced
    }
}

impl ThreadBody for FrameworkLoop {
    fn run(&self, stop: &StopSignal) -> CoreResult<()> {
        let mut components = ComponentSet::new(self.context.clone());

        let result = run_paced(stop, self.config.frame_interval(), &self.stats, |tick| {
            self.tick(&mut components, tick);
            Ok(())
        });

        let live = components.len();
        drop(components);
        self.component_count.store(0, Ordering::Relaxed);
        if live > 0 {
            debug!(components = live, "Dropped framework components on exit");
        }

        let abandoned = self.request_rx.try_iter().count();
        if abandoned > 0 {
            warn!(requests = abandoned, "Framework requests dropped on exit");
        }

        result
    }

    fn on_thread_start(&self) {
        info!(
            thread = ?std::thread::current().id(),
            target_fps = self.config.target_fps,
            "Framework thread started"
        );
    }

    fn on_thread_end(&self) {
        info!(
            thread = ?std::thread::current().id(),
            frames = self.frame_count(),
            avg_ms = self.average_frame_time_ms(),
            "Framework thread ended"
        );
    }
}

/// Builds the framework thread for `context` (not yet started).
#[must_use]
pub fn framework_thread(
    context: RenderContext,
    config: &ThreadConfig,
    requests: &RequestConfig,
) -> FrameworkThread {
    WorkerThread::new(
        FRAMEWORK_THREAD_NAME,
        FrameworkLoop::new(context, config.clone(), requests),
    )
    .with_shutdown_timeout(config.shutdown_timeout())
}
