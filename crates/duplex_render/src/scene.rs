//! # Render Scene
//!
//! Registry of live proxies keyed by the id of the component they mirror.
//!
//! ```text
//!   framework thread                 renderer thread
//!   ────────────────                 ───────────────
//!   enqueue(add/update/remove) ──►   process_commands()
//!                                      └─► Scene::{add,update,remove}_primitive
//!                                    draw_list()
//! ```
//!
//! Every method takes the scene lock, so any thread may call any method, but
//! in a running engine mutation happens on the renderer thread only, through
//! commands. Proxies that leave the map are dropped after the lock is released,
//! and proxy updates run with the lock released.

use std::collections::HashMap;

use duplex_core::ComponentId;
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::proxy::{DrawData, ProxyUpdate, SceneProxy};

/// Id-keyed proxy store owned by the renderer.
///
/// A slot is `None` while its proxy is checked out by [`Scene::apply_update`].
#[derive(Default)]
pub struct Scene {
    primitives: Mutex<HashMap<ComponentId, Option<Box<dyn SceneProxy>>>>,
}

impl Scene {
    /// Creates an empty scene.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `proxy` under `id`, replacing (and dropping) any previous proxy.
    pub fn add_primitive(&self, id: ComponentId, proxy: Box<dyn SceneProxy>) {
        let replaced = self.primitives.lock().insert(id, Some(proxy));
        if replaced.is_some() {
            debug!(component = %id, "Replaced existing scene proxy");
        }
        drop(replaced);
    }

    /// Removes and drops the proxy for `id`. Absent ids are ignored.
    pub fn remove_primitive(&self, id: ComponentId) {
        let removed = self.primitives.lock().remove(&id);
        if removed.is_none() {
            debug!(component = %id, "Remove for unknown scene proxy ignored");
        }
        drop(removed);
    }

    /// Calls [`SceneProxy::update_data`] on the proxy for `id`, if present and valid.
    pub fn update_primitive(&self, id: ComponentId) {
        self.apply_update(id, None);
    }

    /// Applies a staged update, then re-synchronizes the proxy.
    ///
    /// The proxy is checked out of the map and the lock released while
    /// `update` and [`SceneProxy::update_data`] run, so either may call back
    /// into the scene. It goes back into its slot afterwards unless the slot
    /// was removed or refilled in the meantime, in which case it is dropped.
    ///
    /// Absent, invalid, and already checked-out proxies are ignored; the
    /// update is dropped unapplied.
    pub fn apply_update(&self, id: ComponentId, update: Option<ProxyUpdate>) {
        let checked_out = self
            .primitives
            .lock()
            .get_mut(&id)
            .filter(|slot| matches!(slot, Some(proxy) if proxy.is_valid()))
            .and_then(Option::take);
        let Some(mut proxy) = checked_out else {
            debug!(component = %id, "Update for missing or invalid scene proxy ignored");
            return;
        };

        if let Some(update) = update {
            update(&mut *proxy);
        }
        proxy.update_data();

        let stale = match self.primitives.lock().get_mut(&id) {
            Some(slot @ None) => {
                *slot = Some(proxy);
                None
            }
            _ => Some(proxy),
        };
        if stale.is_some() {
            debug!(component = %id, "Scene proxy changed during update; dropping updated copy");
        }
    }

    /// Runs `f` against the valid proxy for `id`.
    ///
    /// The scene lock is held for the duration of `f`, so the borrow cannot
    /// outlive a concurrent removal and `f` must not call back into the scene.
    /// Invalid proxies are treated as absent.
    pub fn with_primitive<R>(&self, id: ComponentId, f: impl FnOnce(&dyn SceneProxy) -> R) -> Option<R> {
        let primitives = self.primitives.lock();
        primitives
            .get(&id)
            .and_then(Option::as_ref)
            .filter(|proxy| proxy.is_valid())
            .map(|proxy| f(&**proxy))
    }

    /// True when a proxy (valid or not) is stored under `id`.
    #[must_use]
    pub fn contains(&self, id: ComponentId) -> bool {
        self.primitives.lock().contains_key(&id)
    }

    /// Number of stored proxies, including ones marked invalid.
    #[must_use]
    pub fn primitive_count(&self) -> usize {
        self.primitives.lock().len()
    }

    /// Flags the proxy for `id` invalid. Returns false if absent or checked out.
    pub fn mark_invalid(&self, id: ComponentId) -> bool {
        match self.primitives.lock().get_mut(&id).and_then(Option::as_mut) {
            Some(proxy) => {
                proxy.mark_invalid();
                true
            }
            None => false,
        }
    }

    /// Drops every proxy marked invalid. Returns how many were removed.
    pub fn reap_invalid(&self) -> usize {
        let reaped: Vec<Box<dyn SceneProxy>> = {
            let mut primitives = self.primitives.lock();
            let dead: Vec<ComponentId> = primitives
                .iter()
                .filter(|(_, slot)| matches!(slot, Some(proxy) if !proxy.is_valid()))
                .map(|(id, _)| *id)
                .collect();
            dead.iter()
                .filter_map(|id| primitives.remove(id).flatten())
                .collect()
        };
        if !reaped.is_empty() {
            debug!(count = reaped.len(), "Reaped invalid scene proxies");
        }
        reaped.len()
    }

    /// Draw data for every valid proxy, ordered by component id.
    #[must_use]
    pub fn draw_list(&self) -> Vec<DrawData> {
        let mut list: Vec<DrawData> = self
            .primitives
            .lock()
            .values()
            .flatten()
            .filter(|proxy| proxy.is_valid())
            .map(|proxy| proxy.draw_data())
            .collect();
        list.sort_by_key(|data| data.component_id);
        list
    }

    /// Drops every proxy. Returns how many were dropped.
    pub fn clear(&self) -> usize {
        let drained = std::mem::take(&mut *self.primitives.lock());
        if !drained.is_empty() {
            warn!(count = drained.len(), "Clearing scene with live proxies");
        }
        drained.len()
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("primitive_count", &self.primitive_count())
            .finish()
    }
}
