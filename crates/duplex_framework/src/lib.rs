//! # DUPLEX Framework
//!
//! Producer side of the engine: components that publish render-side proxies
//! through the command queue, and the thread that owns them.
//!
//! ## Example
//!
//! ```rust,ignore
//! use duplex_framework::{MappingComponent, StaticMeshMapping};
//! use duplex_render::RenderContext;
//!
//! let context = RenderContext::new();
//! let mut mesh = StaticMeshMapping::new(context.clone(), "Cube");
//! mesh.register_component();          // enqueues "add primitive"
//! context.queue().process_commands(); // renderer side
//! assert_eq!(context.scene().primitive_count(), 1);
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]

pub mod component_set;
pub mod framework;
pub mod mapping;
pub mod static_mesh;

pub use component_set::ComponentSet;
pub use framework::{
    framework_thread, FrameworkLoop, FrameworkRequest, FrameworkThread, FRAMEWORK_THREAD_NAME,
};
pub use mapping::{MappingComponent, MappingState};
pub use static_mesh::{MeshSceneProxy, StaticMeshMapping};
