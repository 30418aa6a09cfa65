//! # Component Set
//!
//! Owner of every live mapping component on the framework thread. The set
//! never leaves that thread; other threads reach it through requests
//! executed by the [`FrameworkLoop`](crate::FrameworkLoop).

use std::collections::BTreeMap;

use duplex_core::ComponentId;
use duplex_render::RenderContext;
use tracing::debug;

use crate::mapping::MappingComponent;

/// Id-keyed store of boxed mapping components.
///
/// Dropping the set unregisters every component through
/// [`MappingComponent::unregister_component`] before dropping it.
pub struct ComponentSet {
    context: RenderContext,
    components: BTreeMap<ComponentId, Box<dyn MappingComponent>>,
}

impl ComponentSet {
    /// Empty set whose components publish into `context`.
    #[must_use]
    pub fn new(context: RenderContext) -> Self {
        Self {
            context,
            components: BTreeMap::new(),
        }
    }

    /// Context new components should be built with.
    #[inline]
    #[must_use]
    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    /// Registers `component` and takes ownership of it. Returns its id.
    pub fn spawn<C: MappingComponent>(&mut self, mut component: C) -> ComponentId {
        let id = component.component_id();
        component.register_component();
        self.components.insert(id, Box::new(component));
        debug!(component_id = %id, total = self.components.len(), "Component spawned");
        id
    }

    /// Unregisters and drops the component for `id`. Returns false if absent.
    pub fn despawn(&mut self, id: ComponentId) -> bool {
        match self.components.remove(&id) {
            Some(mut component) => {
                component.unregister_component();
                debug!(component_id = %id, total = self.components.len(), "Component despawned");
                true
            }
            None => false,
        }
    }

    /// Mutable access to the component for `id` if it is a `T`.
    pub fn get_mut<T: MappingComponent>(&mut self, id: ComponentId) -> Option<&mut T> {
        self.components.get_mut(&id)?.downcast_mut::<T>()
    }

    /// Shared access to the component for `id` if it is a `T`.
    #[must_use]
    pub fn get<T: MappingComponent>(&self, id: ComponentId) -> Option<&T> {
        self.components.get(&id)?.downcast_ref::<T>()
    }

    /// True when a component with `id` is owned by the set.
    #[must_use]
    pub fn contains(&self, id: ComponentId) -> bool {
        self.components.contains_key(&id)
    }

    /// Number of owned components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// True when the set owns no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Pushes render updates for every registered dirty component, in id order.
    ///
    /// Returns how many update commands were enqueued.
    pub fn sync_render_state(&mut self) -> usize {
        self.components
            .values_mut()
            .map(|component| component.sync_render_state())
            .filter(|&synced| synced)
            .count()
    }

    /// Unregisters and drops every component.
    pub fn clear(&mut self) {
        for (_, mut component) in std::mem::take(&mut self.components) {
            component.unregister_component();
        }
    }
}

impl Drop for ComponentSet {
    fn drop(&mut self) {
        self.clear();
    }
}

impl std::fmt::Debug for ComponentSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentSet")
            .field("len", &self.components.len())
            .finish_non_exhaustive()
    }
}
