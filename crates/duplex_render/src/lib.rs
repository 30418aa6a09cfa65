//! # DUPLEX Render
//!
//! Consumer side of the engine:
//!
//! - [`Scene`]: `ComponentId → Box<dyn SceneProxy>` table
//! - [`SceneProxy`]: render-owned shadow of a framework component
//! - [`RenderContext`]: the shared queue + scene, with `enqueue_*` helpers
//! - [`RendererLoop`]: per-frame drain, reap and draw-list collection
//!
//! Nothing in this crate knows about framework components. Proxies arrive
//! by value inside commands and are owned by the scene from then on.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod context;
pub mod proxy;
pub mod renderer;
pub mod scene;

pub use context::RenderContext;
pub use proxy::{proxy_update, typed_update, AsAny, DrawData, ProxyBase, ProxyUpdate, SceneProxy};
pub use renderer::{renderer_thread, RendererLoop, RendererThread, RENDERER_THREAD_NAME};
pub use scene::Scene;
