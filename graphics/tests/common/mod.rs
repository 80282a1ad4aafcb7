//! Shared fixtures for the cache integration tests.

#![allow(dead_code)]

use meshdraw_core::mesh::generators::{generate_cube, generate_grid};
use meshdraw_core::mesh::{EditState, SourceMesh, UvLayer};
use meshdraw_core::object::{SceneObject, ToolSettings};
use meshdraw_graphics::{
    BatchHandle, BatchKind, DrawContext, MeshCacheSystem, PassReport, PreservationRegistry,
};

/// Route cache logging to the test output.
pub fn init_logging() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

/// A cache system, a registry and the tool settings every pass reads.
pub struct TestContext {
    pub system: MeshCacheSystem,
    pub registry: PreservationRegistry,
    pub tools: ToolSettings,
}

impl TestContext {
    pub fn new() -> Self {
        init_logging();
        Self {
            system: MeshCacheSystem::default(),
            registry: PreservationRegistry::new(),
            tools: ToolSettings::default(),
        }
    }

    pub fn get(&mut self, kind: BatchKind, mesh: &SourceMesh) -> BatchHandle {
        self.system.get_batch(kind, None, mesh, &mut self.registry)
    }

    pub fn get_for(
        &mut self,
        kind: BatchKind,
        object: &SceneObject,
        mesh: &SourceMesh,
    ) -> BatchHandle {
        self.system
            .get_batch(kind, Some(object), mesh, &mut self.registry)
    }

    /// One reconciliation pass for a standalone mesh.
    pub fn pass(&mut self, mesh: &SourceMesh) -> PassReport {
        let ctx = DrawContext::new(mesh, &self.tools);
        self.system.create_requested(ctx, &mut self.registry)
    }

    /// One reconciliation pass for an evaluated mesh drawn by `object`.
    pub fn pass_evaluated(
        &mut self,
        object: &SceneObject,
        evaluated: &SourceMesh,
        original: &SourceMesh,
    ) -> PassReport {
        let ctx = DrawContext::new(evaluated, &self.tools)
            .with_object(object)
            .with_original(original);
        self.system.create_requested(ctx, &mut self.registry)
    }
}

/// Cube in edit mode, wrapping the edit mesh directly.
pub fn edit_cube() -> SourceMesh {
    generate_cube(1.0).with_edit_state(EditState::default())
}

/// 3x1 grid with two UV layers (the first active) and one material per face.
pub fn two_uv_three_material_grid() -> SourceMesh {
    let grid = generate_grid(3, 1, 1.0);
    let shifted = grid.uv_layers()[0]
        .uvs
        .iter()
        .map(|[u, v]| [u * 0.5, v * 0.5])
        .collect();
    grid.with_uv_layer(UvLayer::new("Lightmap", shifted))
        .with_materials(vec![2, 0, 1], 3)
}
