//! # Render Context
//!
//! The one queue and one scene shared by both engine threads, built once by
//! the host and handed to each side explicitly.
//!
//! The `enqueue_*` helpers are the only way the framework side touches the
//! scene: each wraps a scene mutation in a named command that the renderer
//! executes on its next drain.

use std::sync::Arc;

use duplex_core::{CommandQueue, ComponentId};

use crate::proxy::{ProxyUpdate, SceneProxy};
use crate::scene::Scene;

/// Shared handles to the command queue and the render scene.
#[derive(Clone, Debug, Default)]
pub struct RenderContext {
    queue: Arc<CommandQueue>,
    scene: Arc<Scene>,
}

impl RenderContext {
    /// Fresh queue and empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Framework→renderer command queue.
    #[inline]
    #[must_use]
    pub fn queue(&self) -> &Arc<CommandQueue> {
        &self.queue
    }

    /// Render scene.
    #[inline]
    #[must_use]
    pub fn scene(&self) -> &Arc<Scene> {
        &self.scene
    }

    /// Queues insertion of `proxy` under `id`.
    pub fn enqueue_add_primitive(&self, id: ComponentId, proxy: Box<dyn SceneProxy>) {
        let scene = Arc::clone(&self.scene);
        self.queue
            .enqueue("add_primitive", move || scene.add_primitive(id, proxy));
    }

    /// Queues removal of the proxy for `id`.
    pub fn enqueue_remove_primitive(&self, id: ComponentId) {
        let scene = Arc::clone(&self.scene);
        self.queue
            .enqueue("remove_primitive", move || scene.remove_primitive(id));
    }

    /// Queues a re-sync of the proxy for `id`, applying `update` first if given.
    pub fn enqueue_update_primitive(&self, id: ComponentId, update: Option<ProxyUpdate>) {
        let scene = Arc::clone(&self.scene);
        self.queue
            .enqueue("update_primitive", move || scene.apply_update(id, update));
    }
}
