//! # Mapping Components
//!
//! A mapping component is a framework-side object with a render-side shadow.
//!
//! ```text
//!                register_component()
//!   Unregistered ─────────────────────► Registered
//!        ▲        (proxy built, "add"       │
//!        │         command enqueued)        │
//!        └──────────────────────────────────┘
//!                unregister_component() / drop
//!                ("remove" command enqueued)
//! ```
//!
//! Both transitions are idempotent. The state flips on the framework side
//! as soon as the command is enqueued; the scene catches up on the next
//! renderer drain.

use duplex_core::ComponentId;
use duplex_render::{AsAny, ProxyUpdate, RenderContext, SceneProxy};
use tracing::debug;

/// Registration bookkeeping embedded in every mapping component.
///
/// Dropping a registered state enqueues the removal of its proxy, so a
/// component that is dropped without unregistering never leaves a proxy
/// behind in the scene.
#[derive(Debug)]
pub struct MappingState {
    id: ComponentId,
    context: RenderContext,
    registered: bool,
    render_state_dirty: bool,
}

impl MappingState {
    /// Allocates a fresh component id; starts unregistered and clean.
    #[must_use]
    pub fn new(context: RenderContext) -> Self {
        Self {
            id: ComponentId::allocate(),
            context,
            registered: false,
            render_state_dirty: false,
        }
    }

    /// Process-unique id of the owning component.
    #[inline]
    #[must_use]
    pub fn component_id(&self) -> ComponentId {
        self.id
    }

    /// Context the component publishes into.
    #[inline]
    #[must_use]
    pub fn context(&self) -> &RenderContext {
        &self.context
    }

    /// Whether the proxy has been published.
    #[inline]
    #[must_use]
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// Whether render-relevant state changed since the last sync.
    #[inline]
    #[must_use]
    pub fn is_render_state_dirty(&self) -> bool {
        self.render_state_dirty
    }

    fn publish(&mut self, proxy: Box<dyn SceneProxy>) {
        self.context.enqueue_add_primitive(self.id, proxy);
        self.registered = true;
    }

    /// Enqueues the removal of the proxy if one is published. Returns true
    /// if a remove command was enqueued.
    ///
    /// Overrides of [`MappingComponent::unregister_component`] finish by
    /// calling this.
    pub fn retract(&mut self) -> bool {
        if !self.registered {
            return false;
        }
        self.context.enqueue_remove_primitive(self.id);
        self.registered = false;
        true
    }
}

impl Drop for MappingState {
    fn drop(&mut self) {
        if self.retract() {
            debug!(component_id = %self.id, "Unregistered on drop");
        }
    }
}

/// Framework-side component that mirrors itself into the render scene.
///
/// Implementors embed a [`MappingState`] and supply the proxy factory. The
/// registration protocol and dirty tracking are provided.
pub trait MappingComponent: AsAny {
    /// Embedded registration state.
    fn mapping(&self) -> &MappingState;

    /// Embedded registration state, mutably.
    fn mapping_mut(&mut self) -> &mut MappingState;

    /// Builds the render-side proxy. Runs on the framework thread and must not
    /// touch shared state. `None` means "nothing to render".
    fn create_scene_proxy(&self) -> Option<Box<dyn SceneProxy>>;

    /// Snapshot of dirty state to stage on the existing proxy.
    fn create_proxy_update(&self) -> Option<ProxyUpdate> {
        None
    }

    /// Id shared with this component's proxy.
    fn component_id(&self) -> ComponentId {
        self.mapping().component_id()
    }

    /// Whether the proxy has been published.
    fn is_registered(&self) -> bool {
        self.mapping().is_registered()
    }

    /// Publishes a new proxy to the scene.
    ///
    /// Returns true if an add command was enqueued. Already registered, or a
    /// factory that yields no proxy, leaves the state unchanged.
    fn register_component(&mut self) -> bool {
        if self.is_registered() {
            return false;
        }
        let Some(proxy) = self.create_scene_proxy() else {
            debug!(component_id = %self.component_id(), "No scene proxy; staying unregistered");
            return false;
        };
        self.mapping_mut().publish(proxy);
        debug!(component_id = %self.component_id(), "Component registered");
        true
    }

    /// Retracts the proxy from the scene.
    ///
    /// Returns true if a remove command was enqueued. A [`ComponentSet`]
    /// calls this for every component it despawns, clears, or drops, so
    /// overrides run on those paths. A component dropped on its own is
    /// retracted by its [`MappingState`] directly.
    ///
    /// [`ComponentSet`]: crate::ComponentSet
    fn unregister_component(&mut self) -> bool {
        let retracted = self.mapping_mut().retract();
        if retracted {
            debug!(component_id = %self.component_id(), "Component unregistered");
        }
        retracted
    }

    /// Flags render-relevant state as changed.
    fn mark_render_state_dirty(&mut self) {
        self.mapping_mut().render_state_dirty = true;
    }

    /// Clears the dirty flag.
    fn clear_render_state_dirty(&mut self) {
        self.mapping_mut().render_state_dirty = false;
    }

    /// Whether render-relevant state changed since the last sync.
    fn is_render_state_dirty(&self) -> bool {
        self.mapping().is_render_state_dirty()
    }

    /// Pushes dirty state to the proxy and clears the flag.
    ///
    /// Returns true if an update command was enqueued. Unregistered
    /// components keep their dirty flag until they are registered and synced.
    fn sync_render_state(&mut self) -> bool {
        if !self.is_registered() || !self.is_render_state_dirty() {
            return false;
        }
        let update = self.create_proxy_update();
        let state = self.mapping_mut();
        state.context.enqueue_update_primitive(state.id, update);
        state.render_state_dirty = false;
        true
    }
}

impl dyn MappingComponent {
    /// Downcasts to a concrete component type.
    #[must_use]
    pub fn downcast_ref<T: MappingComponent>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Downcasts to a concrete component type, mutably.
    pub fn downcast_mut<T: MappingComponent>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::SwitchableComponent;
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let context = RenderContext::new();
        let a = SwitchableComponent::new(context.clone());
        let b = SwitchableComponent::new(context);
        assert_ne!(a.component_id(), b.component_id());
        assert!(b.component_id() > a.component_id());
    }

    #[test]
    fn test_register_is_idempotent() {
        let context = RenderContext::new();
        let mut component = SwitchableComponent::new(context.clone());

        assert!(component.register_component());
        assert!(!component.register_component());
        assert!(component.is_registered());
        assert_eq!(context.queue().pending_command_count(), 1);

        context.queue().process_commands();
        assert_eq!(context.scene().primitive_count(), 1);
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let context = RenderContext::new();
        let mut component = SwitchableComponent::new(context.clone());
        component.register_component();
        context.queue().process_commands();

        assert!(component.unregister_component());
        assert!(!component.unregister_component());
        assert!(!component.is_registered());
        assert_eq!(context.queue().pending_command_count(), 1);

        context.queue().process_commands();
        assert_eq!(context.scene().primitive_count(), 0);
        assert!(context.scene().with_primitive(component.component_id(), |_| ()).is_none());
    }

    #[test]
    fn test_unregister_before_register_is_noop() {
        let context = RenderContext::new();
        let mut component = SwitchableComponent::new(context.clone());
        assert!(!component.unregister_component());
        assert_eq!(context.queue().pending_command_count(), 0);
    }

    #[test]
    fn test_no_proxy_stays_unregistered() {
        let context = RenderContext::new();
        let mut component = SwitchableComponent::new(context.clone());
        component.renders = false;

        assert!(!component.register_component());
        assert!(!component.is_registered());
        assert_eq!(context.queue().pending_command_count(), 0);
    }

    #[test]
    fn test_dirty_flag() {
        let context = RenderContext::new();
        let mut component = SwitchableComponent::new(context);
        assert!(!component.is_render_state_dirty());

        component.mark_render_state_dirty();
        component.mark_render_state_dirty();
        assert!(component.is_render_state_dirty());

        component.clear_render_state_dirty();
        assert!(!component.is_render_state_dirty());
    }

    #[test]
    fn test_sync_only_when_registered_and_dirty() {
        let context = RenderContext::new();
        let mut component = SwitchableComponent::new(context.clone());

        component.mark_render_state_dirty();
        assert!(!component.sync_render_state());
        assert!(component.is_render_state_dirty());

        component.register_component();
        assert!(component.sync_render_state());
        assert!(!component.is_render_state_dirty());
        assert!(!component.sync_render_state());

        // add + update
        assert_eq!(context.queue().process_commands().executed, 2);
    }

    #[test]
    fn test_drop_unregisters() {
        let context = RenderContext::new();
        let mut component = SwitchableComponent::new(context.clone());
        let id = component.component_id();
        component.register_component();
        context.queue().process_commands();
        assert!(context.scene().contains(id));

        drop(component);
        assert_eq!(context.queue().pending_command_count(), 1);
        context.queue().process_commands();
        assert!(!context.scene().contains(id));
    }

    #[test]
    fn test_drop_unregistered_enqueues_nothing() {
        let context = RenderContext::new();
        drop(SwitchableComponent::new(context.clone()));
        assert_eq!(context.queue().pending_command_count(), 0);
    }

    #[test]
    fn test_downcast() {
        let context = RenderContext::new();
        let mut boxed: Box<dyn MappingComponent> = Box::new(SwitchableComponent::new(context));
        assert!(boxed.downcast_ref::<SwitchableComponent>().is_some());
        boxed.downcast_mut::<SwitchableComponent>().unwrap().renders = false;
        assert!(!boxed.register_component());
    }
}
