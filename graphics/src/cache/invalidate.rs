//! Dirty categories and what each one discards.
//!
//! Each [`DirtyCategory`] maps to a fixed set of buffer kinds. Discarding a
//! buffer clears every batch slot that references it, across all three
//! buffer lists, and drops the slot's ready bit. Slots are cleared by
//! dropping their reference; draw callers holding the old batch keep it.

use std::collections::HashSet;

use crate::resources::BufferId;

use super::buffers::{IboKind, VboKind};
use super::flags::{BatchFlags, BatchKind};
use super::mesh_cache::{MeshBatchCache, ShadingLayers};

/// What changed on a mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirtyCategory {
    /// Element selection changed.
    Select,
    /// Paint-mode face mask changed.
    SelectPaint,
    /// Topology or any attribute changed; the cache is rebuilt wholesale.
    All,
    /// Shading layers (UVs, tangents, orco) changed.
    Shading,
    /// UV coordinates changed.
    UvEditAll,
    /// UV selection changed.
    UvEditSelect,
    /// Data behind the externally requested batches changed.
    Custom,
}

/// Buffer kinds discarded by one category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscardSet {
    pub vbos: &'static [VboKind],
    pub ibos: &'static [IboKind],
}

const EDIT_UV_IBOS: &[IboKind] = &[
    IboKind::EditUvTris,
    IboKind::EditUvLines,
    IboKind::EditUvPoints,
    IboKind::EditUvFaceDots,
    IboKind::UvLines,
    IboKind::UvTris,
];

const SELECT: DiscardSet = DiscardSet {
    vbos: &[
        VboKind::EditData,
        VboKind::FaceDotNormal,
        VboKind::EditUvData,
        VboKind::FaceDotEditUvData,
    ],
    ibos: EDIT_UV_IBOS,
};

const SELECT_PAINT: DiscardSet = DiscardSet {
    vbos: &[VboKind::PaintOverlayFlag],
    ibos: &[IboKind::LinesPaintMask],
};

const SHADING: DiscardSet = DiscardSet {
    vbos: &[
        VboKind::Uvs,
        VboKind::Tangents,
        VboKind::Orco,
        VboKind::EditUvStretchAngle,
        VboKind::EditUvStretchArea,
        VboKind::EditUvData,
        VboKind::FaceDotUv,
        VboKind::FaceDotEditUvData,
    ],
    ibos: EDIT_UV_IBOS,
};

const UV_EDIT_ALL: DiscardSet = DiscardSet {
    vbos: &[
        VboKind::EditUvStretchAngle,
        VboKind::EditUvStretchArea,
        VboKind::Uvs,
        VboKind::EditUvData,
        VboKind::FaceDotUv,
        VboKind::FaceDotEditUvData,
    ],
    ibos: EDIT_UV_IBOS,
};

const UV_EDIT_SELECT: DiscardSet = DiscardSet {
    vbos: &[VboKind::EditUvData, VboKind::FaceDotEditUvData],
    ibos: EDIT_UV_IBOS,
};

const CUSTOM: DiscardSet = DiscardSet {
    vbos: &[VboKind::Position, VboKind::CornerNormal],
    ibos: &[IboKind::Tris, IboKind::Lines, IboKind::Points],
};

const NOTHING: DiscardSet = DiscardSet { vbos: &[], ibos: &[] };

/// Shading buffers dropped by the unused-shading timeout.
pub(crate) const SHADING_VBOS: &[VboKind] = &[VboKind::Uvs, VboKind::Tangents, VboKind::Orco];

impl DirtyCategory {
    pub const ALL: [DirtyCategory; 7] = [
        Self::Select,
        Self::SelectPaint,
        Self::All,
        Self::Shading,
        Self::UvEditAll,
        Self::UvEditSelect,
        Self::Custom,
    ];

    /// Buffers discarded directly. [`All`](Self::All) discards nothing
    /// itself, it marks the cache dirty instead.
    pub fn discard_set(self) -> DiscardSet {
        match self {
            Self::Select => SELECT,
            Self::SelectPaint => SELECT_PAINT,
            Self::All => NOTHING,
            Self::Shading => SHADING,
            Self::UvEditAll => UV_EDIT_ALL,
            Self::UvEditSelect => UV_EDIT_SELECT,
            Self::Custom => CUSTOM,
        }
    }

    /// Whether custom subscriptions must be requested again afterwards.
    pub fn resubscribes_custom(self) -> bool {
        matches!(self, Self::All | Self::Custom)
    }
}

/// What a discard removed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscardReport {
    /// Buffers released across all lists.
    pub buffers: usize,
    /// Batch kinds whose slots were cleared.
    pub batches: BatchFlags,
}

/// Remove the given kinds from every buffer list and clear the batches using them.
pub fn discard_buffers(
    cache: &mut MeshBatchCache,
    vbos: &[VboKind],
    ibos: &[IboKind],
) -> DiscardReport {
    let ids = cache.store.collect_ids(vbos, ibos);
    let mut report = DiscardReport {
        buffers: ids.len(),
        ..Default::default()
    };
    if ids.is_empty() {
        return report;
    }

    for (&kind, handle) in &cache.slots {
        if slot_references(handle, &ids) {
            handle.clear();
            report.batches |= kind.flag();
        }
    }
    if cache.per_material.iter().any(|h| slot_references(h, &ids)) {
        for handle in &cache.per_material {
            handle.clear();
        }
        report.batches |= BatchFlags::SURFACE_PER_MATERIAL;
    }
    cache.ready.remove(report.batches);

    for &kind in vbos {
        cache.store.remove_vbo(kind);
    }
    for &kind in ibos {
        cache.store.remove_ibo(kind);
    }
    log::trace!(
        "{}: discarded {} buffers, cleared {:?}",
        cache.mesh_id(),
        report.buffers,
        report.batches
    );
    report
}

fn slot_references(handle: &crate::batch::BatchHandle, ids: &HashSet<BufferId>) -> bool {
    handle.built().is_some_and(|batch| batch.references(ids))
}

/// Apply `category` to one cache.
pub fn apply(cache: &mut MeshBatchCache, category: DirtyCategory) -> DiscardReport {
    let set = category.discard_set();
    let mut report = discard_buffers(cache, set.vbos, set.ibos);

    match category {
        DirtyCategory::All => {
            cache.is_dirty = true;
            report.batches |= clear_custom(cache);
        }
        DirtyCategory::Custom => {
            report.batches |= clear_custom(cache);
        }
        DirtyCategory::Shading => {
            cache.shading.used = ShadingLayers::default();
            cache.area_totals = None;
        }
        DirtyCategory::UvEditAll => {
            cache.shading.used.uv = 0;
            cache.area_totals = None;
        }
        DirtyCategory::Select
        | DirtyCategory::SelectPaint
        | DirtyCategory::UvEditSelect => {}
    }
    report
}

/// Drop custom batches and ready bits; previously requested custom kinds stay requested.
fn clear_custom(cache: &mut MeshBatchCache) -> BatchFlags {
    let custom = cache.requested & BatchFlags::CUSTOM;
    for kind in BatchFlags::CUSTOM.kinds() {
        cache.slot(kind).clear();
    }
    cache.ready.remove(BatchFlags::CUSTOM);
    cache.requested |= custom;
    BatchFlags::CUSTOM
}

/// Kinds whose built batch depends on `vbo` according to the requirement table.
pub fn dependents_of_vbo(vbo: VboKind) -> BatchFlags {
    let mut flags: BatchFlags = super::requirements::requirements()
        .iter()
        .filter(|req| req.vbos.contains(&vbo))
        .map(|req| req.kind)
        .collect();
    if super::requirements::PER_MATERIAL_VBOS.contains(&vbo) {
        flags |= BatchKind::SurfacePerMaterial.flag();
    }
    flags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_keeps_geometry() {
        let set = DirtyCategory::Select.discard_set();
        assert!(!set.vbos.contains(&VboKind::Position));
        assert!(!set.vbos.contains(&VboKind::CornerNormal));
        assert!(!set.ibos.contains(&IboKind::Tris));
    }

    #[test]
    fn test_select_does_not_touch_surface() {
        let set = DirtyCategory::Select.discard_set();
        for vbo in set.vbos {
            let dependents = dependents_of_vbo(*vbo);
            assert!(!dependents.intersects(BatchFlags::SURFACE_ALL), "{vbo:?}");
        }
    }

    #[test]
    fn test_only_all_discards_nothing_directly() {
        for category in DirtyCategory::ALL {
            let set = category.discard_set();
            let empty = set.vbos.is_empty() && set.ibos.is_empty();
            assert_eq!(empty, category == DirtyCategory::All, "{category:?}");
        }
    }

    #[test]
    fn test_custom_categories_resubscribe() {
        assert!(DirtyCategory::All.resubscribes_custom());
        assert!(DirtyCategory::Custom.resubscribes_custom());
        assert!(!DirtyCategory::Select.resubscribes_custom());
    }

    #[test]
    fn test_custom_discard_hits_custom_batches() {
        let set = DirtyCategory::Custom.discard_set();
        let mut hit = BatchFlags::empty();
        for vbo in set.vbos {
            hit |= dependents_of_vbo(*vbo);
        }
        assert!(hit.contains(BatchFlags::CUSTOM));
    }
}
