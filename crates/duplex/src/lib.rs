//! # DUPLEX
//!
//! Two-thread engine host.
//!
//! ```text
//! ┌──────────────────────┐   CommandQueue (FIFO)   ┌──────────────────────┐
//! │   FRAMEWORK THREAD   │ ──────────────────────► │   RENDERER THREAD    │
//! │                      │   add / update / remove │                      │
//! │  ComponentSet        │                         │  Scene               │
//! │   └ MappingComponent │                         │   └ SceneProxy       │
//! └──────────▲───────────┘                         └──────────────────────┘
//!            │ submit(request)
//!      app / main thread
//! ```
//!
//! The two sides share nothing but the [`RenderContext`](duplex_render::RenderContext):
//! components push commands, the renderer drains them once per frame.

pub mod engine;

pub use duplex_core as core;
pub use duplex_framework as framework;
pub use duplex_render as render;

pub use engine::{Engine, ShutdownReport};
