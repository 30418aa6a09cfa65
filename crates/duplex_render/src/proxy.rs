//! # Scene Proxies
//!
//! A proxy is the renderer's private shadow of a framework component. It is
//! built on the framework thread, moved into a command, and from then on owned
//! by the [`Scene`](crate::Scene) and touched only by the renderer thread.
//!
//! Proxies carry render data only. They never point back at the component
//! that created them; fresh data arrives as an owned [`ProxyUpdate`].

use std::any::Any;

use duplex_core::ComponentId;
use tracing::warn;

/// Snapshot applied to a proxy on the renderer thread.
///
/// Built on the framework thread from owned data, then moved across inside a
/// command. It is applied right before [`SceneProxy::update_data`], outside
/// the scene lock, so it may read the scene through a captured context.
pub type ProxyUpdate = Box<dyn FnOnce(&mut (dyn SceneProxy + 'static)) + Send>;

/// Boxes a closure as a [`ProxyUpdate`].
pub fn proxy_update<F>(update: F) -> ProxyUpdate
where
    F: FnOnce(&mut (dyn SceneProxy + 'static)) + Send + 'static,
{
    Box::new(update)
}

/// Builds a [`ProxyUpdate`] that only runs if the proxy is a `T`.
///
/// A proxy of another type is left untouched and the mismatch is logged.
pub fn typed_update<T, F>(update: F) -> ProxyUpdate
where
    T: SceneProxy,
    F: FnOnce(&mut T) + Send + 'static,
{
    proxy_update(move |proxy| {
        let id = proxy.component_id();
        match proxy.downcast_mut::<T>() {
            Some(concrete) => update(concrete),
            None => warn!(
                component = %id,
                expected = std::any::type_name::<T>(),
                "Proxy update skipped: proxy type mismatch"
            ),
        }
    })
}

/// What the renderer needs to draw one proxy this frame.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DrawData {
    /// Component the proxy mirrors.
    pub component_id: ComponentId,
    /// Human-readable resource name (mesh name, for instance).
    pub label: String,
    /// Bumped each time the proxy re-synchronizes.
    pub revision: u64,
}

/// State every proxy carries: its owner id and a validity flag.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProxyBase {
    component_id: ComponentId,
    valid: bool,
}

impl ProxyBase {
    /// Valid base for `component_id`.
    #[must_use]
    pub const fn new(component_id: ComponentId) -> Self {
        Self {
            component_id,
            valid: true,
        }
    }

    /// Owning component.
    #[inline]
    #[must_use]
    pub const fn component_id(&self) -> ComponentId {
        self.component_id
    }

    /// False once marked invalid.
    #[inline]
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        self.valid
    }

    /// Marks the proxy for reaping.
    pub fn mark_invalid(&mut self) {
        self.valid = false;
    }
}

/// Upcast helper so proxies can be downcast to their concrete type.
pub trait AsAny: Any {
    /// `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
    /// `self` as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Render-side shadow object.
pub trait SceneProxy: AsAny + Send {
    /// Shared id/validity state.
    fn base(&self) -> &ProxyBase;

    /// Mutable shared state.
    fn base_mut(&mut self) -> &mut ProxyBase;

    /// Re-synchronizes render data from whatever was last staged. Renderer thread only.
    fn update_data(&mut self) {}

    /// Data needed to draw this proxy. Renderer thread only.
    fn draw_data(&self) -> DrawData;

    /// Component this proxy mirrors.
    fn component_id(&self) -> ComponentId {
        self.base().component_id()
    }

    /// False once marked invalid; invalid proxies are skipped and later reaped.
    fn is_valid(&self) -> bool {
        self.base().is_valid()
    }

    /// Marks the proxy invalid without freeing it.
    fn mark_invalid(&mut self) {
        self.base_mut().mark_invalid();
    }
}

impl<'a> dyn SceneProxy + 'a {
    /// Downcasts to a concrete proxy type.
    #[must_use]
    pub fn downcast_ref<T: SceneProxy>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Downcasts to a concrete proxy type, mutably.
    pub fn downcast_mut<T: SceneProxy>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

impl std::fmt::Debug for dyn SceneProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneProxy")
            .field("component_id", &self.component_id())
            .field("valid", &self.is_valid())
            .finish_non_exhaustive()
    }
}
