//! Per-mesh batch cache.

use std::collections::HashMap;

use meshdraw_core::MeshId;
use meshdraw_core::mesh::SourceMesh;

use crate::batch::BatchHandle;

use super::extract::{AreaTotals, MaterialRange, WeightState};
use super::flags::{BatchFlags, BatchKind};
use super::store::BufferStore;

/// Shading layers a surface batch may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShadingLayers {
    /// Bitmask of UV layer indices.
    pub uv: u32,
    pub tangents: bool,
    pub orco: bool,
}

impl ShadingLayers {
    pub fn union(self, other: Self) -> Self {
        Self {
            uv: self.uv | other.uv,
            tangents: self.tangents || other.tangents,
            orco: self.orco || other.orco,
        }
    }

    /// Whether every layer of `other` is in `self`.
    pub fn contains(self, other: Self) -> bool {
        self.uv & other.uv == other.uv
            && (self.tangents || !other.tangents)
            && (self.orco || !other.orco)
    }

    pub fn is_empty(self) -> bool {
        self == Self::default()
    }
}

/// Shading layers in use, requested since the last pass, and seen over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ShadingUsage {
    /// Layers the current shading buffers were built with.
    pub used: ShadingLayers,
    /// Layers requested since the last pass.
    pub needed: ShadingLayers,
    /// Layers requested since the last unused-shading check.
    pub used_over_time: ShadingLayers,
}

/// Cached batches and buffers of one mesh instance.
#[derive(Debug)]
pub struct MeshBatchCache {
    mesh: MeshId,
    original: MeshId,
    pub(crate) is_dirty: bool,
    pub(crate) is_editmode: bool,
    pub(crate) is_uvsyncsel: bool,
    pub(crate) mat_len: u32,
    pub(crate) store: BufferStore,
    pub(crate) slots: HashMap<BatchKind, BatchHandle>,
    pub(crate) per_material: Vec<BatchHandle>,
    pub(crate) material_ranges: Vec<MaterialRange>,
    pub(crate) requested: BatchFlags,
    pub(crate) ready: BatchFlags,
    pub(crate) weight_state: WeightState,
    pub(crate) shading: ShadingUsage,
    pub(crate) area_totals: Option<AreaTotals>,
    pub(crate) last_match: u64,
}

impl MeshBatchCache {
    pub fn new(mesh: &SourceMesh) -> Self {
        let mat_len = mesh.material_count();
        let slots = BatchKind::ALL
            .into_iter()
            .filter(|kind| *kind != BatchKind::SurfacePerMaterial)
            .map(|kind| (kind, BatchHandle::new()))
            .collect();
        Self {
            mesh: mesh.id(),
            original: mesh.original_id(),
            is_dirty: false,
            is_editmode: mesh.is_editmode(),
            is_uvsyncsel: false,
            mat_len,
            store: BufferStore::new(),
            slots,
            per_material: (0..mat_len).map(|_| BatchHandle::new()).collect(),
            material_ranges: Vec::new(),
            requested: BatchFlags::empty(),
            ready: BatchFlags::empty(),
            weight_state: WeightState::default(),
            shading: ShadingUsage::default(),
            area_totals: None,
            last_match: 0,
        }
    }

    #[inline]
    pub fn mesh_id(&self) -> MeshId {
        self.mesh
    }

    #[inline]
    pub fn original_id(&self) -> MeshId {
        self.original
    }

    /// Whether this cache still describes `mesh` (same edit state, same material count, not dirty).
    pub fn is_valid_for(&self, mesh: &SourceMesh) -> bool {
        !self.is_dirty
            && self.is_editmode == mesh.is_editmode()
            && self.mat_len == mesh.material_count()
    }

    /// Slot of a table-driven kind. [`BatchKind::SurfacePerMaterial`] maps to material 0.
    ///
    /// Meshes always have at least one material slot, so material 0 is owned by this cache.
    pub fn slot(&self, kind: BatchKind) -> BatchHandle {
        if kind == BatchKind::SurfacePerMaterial {
            return self.per_material.first().cloned().unwrap_or_default();
        }
        self.slots.get(&kind).cloned().unwrap_or_default()
    }

    pub fn per_material(&self) -> &[BatchHandle] {
        &self.per_material
    }

    /// Index sub-range of each material inside the shared triangle buffer.
    pub fn material_ranges(&self) -> &[MaterialRange] {
        &self.material_ranges
    }

    pub fn requested(&self) -> BatchFlags {
        self.requested
    }

    pub fn ready(&self) -> BatchFlags {
        self.ready
    }

    pub fn is_dirty(&self) -> bool {
        self.is_dirty
    }

    pub fn is_editmode(&self) -> bool {
        self.is_editmode
    }

    pub fn material_count(&self) -> u32 {
        self.mat_len
    }

    pub fn store(&self) -> &BufferStore {
        &self.store
    }

    pub fn weight_state(&self) -> &WeightState {
        &self.weight_state
    }

    pub fn shading(&self) -> ShadingUsage {
        self.shading
    }

    /// Mark `flags` requested. Setting a bit twice is a no-op.
    pub(crate) fn request(&mut self, flags: BatchFlags) {
        self.requested |= flags;
    }

    /// Release every buffer and clear every slot.
    pub(crate) fn clear(&mut self) {
        self.store.clear();
        for handle in self.slots.values().chain(&self.per_material) {
            handle.clear();
        }
        self.material_ranges.clear();
        self.ready = BatchFlags::empty();
    }
}

impl Drop for MeshBatchCache {
    fn drop(&mut self) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use meshdraw_core::mesh::EditState;
    use meshdraw_core::mesh::generators::generate_grid;

    use super::*;

    #[test]
    fn test_new_cache_has_slots() {
        let mesh = generate_grid(2, 1, 1.0).with_materials(vec![0, 1], 2);
        let cache = MeshBatchCache::new(&mesh);
        assert_eq!(cache.slots.len(), BatchKind::COUNT - 1);
        assert_eq!(cache.per_material().len(), 2);
        assert!(cache.slot(BatchKind::SurfacePerMaterial).same_slot(&cache.per_material()[0]));
        assert!(cache.requested().is_empty());
    }

    #[test]
    fn test_materialless_mesh_keeps_per_material_slot() {
        let mesh = generate_grid(1, 1, 1.0).with_materials(Vec::new(), 0);
        let cache = MeshBatchCache::new(&mesh);
        assert_eq!(cache.per_material().len(), 1);
        assert!(cache.slot(BatchKind::SurfacePerMaterial).same_slot(&cache.per_material()[0]));
    }

    #[test]
    fn test_validity_follows_mesh() {
        let mesh = generate_grid(1, 1, 1.0);
        let mut cache = MeshBatchCache::new(&mesh);
        assert!(cache.is_valid_for(&mesh));

        let edit = mesh.clone().with_edit_state(EditState::default());
        assert!(!cache.is_valid_for(&edit));
        let more_materials = mesh.clone().with_materials(vec![0], 3);
        assert!(!cache.is_valid_for(&more_materials));

        cache.is_dirty = true;
        assert!(!cache.is_valid_for(&mesh));
    }

    #[test]
    fn test_shading_layers() {
        let a = ShadingLayers { uv: 0b01, ..Default::default() };
        let b = ShadingLayers { uv: 0b10, tangents: true, orco: false };
        let both = a.union(b);
        assert!(both.contains(a) && both.contains(b));
        assert!(!a.contains(b));
        assert!(ShadingLayers::default().is_empty());
    }
}
