//! Static mesh component and its scene proxy.

use duplex_core::ComponentId;
use duplex_render::{typed_update, DrawData, ProxyBase, ProxyUpdate, RenderContext, SceneProxy};
use tracing::trace;

use crate::mapping::{MappingComponent, MappingState};

/// Render-side shadow of a [`StaticMeshMapping`].
#[derive(Debug)]
pub struct MeshSceneProxy {
    base: ProxyBase,
    mesh_name: String,
    pending_name: Option<String>,
    revision: u64,
}

impl MeshSceneProxy {
    /// Proxy for `component_id` drawing `mesh_name`.
    #[must_use]
    pub fn new(component_id: ComponentId, mesh_name: impl Into<String>) -> Self {
        Self {
            base: ProxyBase::new(component_id),
            mesh_name: mesh_name.into(),
            pending_name: None,
            revision: 0,
        }
    }

    /// Mesh currently drawn.
    #[must_use]
    pub fn mesh_name(&self) -> &str {
        &self.mesh_name
    }

    /// Number of completed re-syncs.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Stages a new mesh name; takes effect on the next [`SceneProxy::update_data`].
    pub fn stage_mesh_name(&mut self, name: String) {
        self.pending_name = Some(name);
    }
}

impl SceneProxy for MeshSceneProxy {
    fn base(&self) -> &ProxyBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ProxyBase {
        &mut self.base
    }

    fn update_data(&mut self) {
        if let Some(name) = self.pending_name.take() {
            self.mesh_name = name;
        }
        self.revision += 1;
        trace!(
            component_id = %self.component_id(),
            mesh = %self.mesh_name,
            revision = self.revision,
            "Mesh proxy updated"
        );
    }

    fn draw_data(&self) -> DrawData {
        DrawData {
            component_id: self.component_id(),
            label: self.mesh_name.clone(),
            revision: self.revision,
        }
    }
}

/// Framework component that renders a named mesh.
#[derive(Debug)]
pub struct StaticMeshMapping {
    mapping: MappingState,
    mesh_name: String,
}

impl StaticMeshMapping {
    /// Unregistered component publishing into `context`.
    #[must_use]
    pub fn new(context: RenderContext, mesh_name: impl Into<String>) -> Self {
        Self {
            mapping: MappingState::new(context),
            mesh_name: mesh_name.into(),
        }
    }

    /// Current mesh name on the framework side.
    #[must_use]
    pub fn mesh_name(&self) -> &str {
        &self.mesh_name
    }

    /// Changes the mesh and marks render state dirty.
    pub fn set_mesh_name(&mut self, mesh_name: impl Into<String>) {
        self.mesh_name = mesh_name.into();
        self.mark_render_state_dirty();
    }
}

impl MappingComponent for StaticMeshMapping {
    fn mapping(&self) -> &MappingState {
        &self.mapping
    }

    fn mapping_mut(&mut self) -> &mut MappingState {
        &mut self.mapping
    }

    fn create_scene_proxy(&self) -> Option<Box<dyn SceneProxy>> {
        Some(Box::new(MeshSceneProxy::new(self.component_id(), self.mesh_name.clone())))
    }

    fn create_proxy_update(&self) -> Option<ProxyUpdate> {
        let name = self.mesh_name.clone();
        Some(typed_update(move |proxy: &mut MeshSceneProxy| proxy.stage_mesh_name(name)))
    }
}
