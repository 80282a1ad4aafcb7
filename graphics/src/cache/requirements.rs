//! Declarative batch requirement table.
//!
//! Each batch kind is described as data: its topology, the buffer list it
//! draws from, its index source and the vertex buffers it needs. The pass
//! reads this table instead of branching per kind, and tests can walk it
//! exhaustively.
//!
//! [`BatchKind::SurfacePerMaterial`] is not in the table: it produces one batch
//! per material and is built separately.

use meshdraw_core::mesh::{PrimitiveTopology, SourceMesh};

use crate::error::CacheError;

use super::buffers::{BufferListKind, IboKind, VboKind};
use super::flags::BatchKind;

/// Which buffer list a batch draws from, before resolving against the current meshes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListRole {
    Final,
    /// The edit cage when one exists, otherwise the final mesh.
    EditCage,
    /// The unevaluated edit mesh in edit mode, otherwise the final mesh.
    UvCage,
}

/// Where a batch gets its index buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndexSource {
    /// Non-indexed: draws every element of the first vertex stream.
    None,
    Fixed(IboKind),
    /// Selection-filtered triangles when faces are selectable, all triangles otherwise.
    FaceSelection { selectable: IboKind, all: IboKind },
}

impl IndexSource {
    pub fn resolve(self, faces_selectable: bool) -> Option<IboKind> {
        match self {
            Self::None => None,
            Self::Fixed(kind) => Some(kind),
            Self::FaceSelection { selectable, all } => {
                Some(if faces_selectable { selectable } else { all })
            }
        }
    }
}

/// Condition under which an edit overlay can be built from the evaluated mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditGate {
    Always,
    /// Only in edit mode, and only when evaluated elements map back to the edit mesh.
    RequiresMapping,
    /// Outside edit mode always; in edit mode only with a valid mapping.
    RequiresMappingInEditMode,
}

impl EditGate {
    pub fn allows(self, mesh: &SourceMesh) -> bool {
        let edit = mesh.edit_state();
        match self {
            Self::Always => true,
            Self::RequiresMapping => edit.is_some_and(|e| e.mapping_valid),
            Self::RequiresMappingInEditMode => edit.is_none_or(|e| e.mapping_valid),
        }
    }
}

/// Static description of one batch kind.
#[derive(Debug, Clone, Copy)]
pub struct BatchRequirement {
    pub kind: BatchKind,
    pub topology: PrimitiveTopology,
    pub list: ListRole,
    pub index: IndexSource,
    /// Vertex buffers that must exist and be non-empty.
    pub vbos: &'static [VboKind],
    /// Attach the shading streams (UVs, tangents, orco) that are currently in use.
    pub uv_stream: bool,
    pub edit_gate: EditGate,
}

/// Resolves [`ListRole`]s for one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListResolution {
    pub has_cage: bool,
    pub has_uv_cage: bool,
}

impl ListResolution {
    pub fn resolve(self, role: ListRole) -> BufferListKind {
        match role {
            ListRole::Final => BufferListKind::Final,
            ListRole::EditCage if self.has_cage => BufferListKind::Cage,
            ListRole::UvCage if self.has_uv_cage => BufferListKind::UvCage,
            ListRole::EditCage | ListRole::UvCage => BufferListKind::Final,
        }
    }
}

use EditGate::{Always, RequiresMapping, RequiresMappingInEditMode as MappedInEdit};
use IboKind as I;
use ListRole::{EditCage, Final, UvCage};
use PrimitiveTopology::{LineList, LineListAdjacency, PointList, TriangleList};
use VboKind as V;

const fn row(
    kind: BatchKind,
    topology: PrimitiveTopology,
    list: ListRole,
    index: IndexSource,
    vbos: &'static [VboKind],
) -> BatchRequirement {
    BatchRequirement {
        kind,
        topology,
        list,
        index,
        vbos,
        uv_stream: false,
        edit_gate: Always,
    }
}

const fn gated(mut req: BatchRequirement, gate: EditGate) -> BatchRequirement {
    req.edit_gate = gate;
    req
}

const fn shaded(mut req: BatchRequirement) -> BatchRequirement {
    req.uv_stream = true;
    req
}

const fn fixed(kind: IboKind) -> IndexSource {
    IndexSource::Fixed(kind)
}

const POS_NOR: &[VboKind] = &[V::Position, V::CornerNormal];

static REQUIREMENTS: [BatchRequirement; BatchKind::COUNT - 1] = [
    shaded(row(BatchKind::Surface, TriangleList, Final, fixed(I::Tris), POS_NOR)),
    row(
        BatchKind::SurfaceWeights,
        TriangleList,
        Final,
        fixed(I::Tris),
        &[V::Position, V::CornerNormal, V::VertexGroupWeight],
    ),
    row(
        BatchKind::PaintOverlaySurface,
        TriangleList,
        Final,
        fixed(I::Tris),
        &[V::Position, V::PaintOverlayFlag],
    ),
    row(
        BatchKind::ViewerAttributeOverlay,
        TriangleList,
        Final,
        fixed(I::Tris),
        &[V::Position, V::AttrViewer],
    ),
    row(
        BatchKind::SculptOverlays,
        TriangleList,
        Final,
        fixed(I::Tris),
        &[V::Position, V::SculptData],
    ),
    row(BatchKind::AllVerts, PointList, Final, fixed(I::Points), POS_NOR),
    row(
        BatchKind::PaintOverlayVerts,
        PointList,
        Final,
        fixed(I::Points),
        &[V::Position, V::CornerNormal, V::PaintOverlayFlag],
    ),
    row(BatchKind::AllEdges, LineList, Final, fixed(I::Lines), POS_NOR),
    row(BatchKind::LooseEdges, LineList, Final, fixed(I::LinesLoose), POS_NOR),
    row(
        BatchKind::EdgeDetection,
        LineListAdjacency,
        Final,
        fixed(I::LinesAdjacency),
        &[V::Position],
    ),
    row(
        BatchKind::WireEdges,
        LineList,
        Final,
        fixed(I::Lines),
        &[V::Position, V::CornerNormal, V::EdgeFactor],
    ),
    row(
        BatchKind::PaintOverlayWireLoops,
        LineList,
        Final,
        fixed(I::LinesPaintMask),
        &[V::Position, V::CornerNormal, V::PaintOverlayFlag],
    ),
    row(BatchKind::WireLoopsAllUvs, LineList, Final, fixed(I::AllUvLines), &[V::Uvs]),
    row(BatchKind::WireLoopsUvs, LineList, Final, fixed(I::UvLines), &[V::Uvs]),
    row(
        BatchKind::WireLoopsEditUvs,
        LineList,
        UvCage,
        fixed(I::EditUvLines),
        &[V::Uvs, V::EditUvData],
    ),
    row(
        BatchKind::UvFaces,
        TriangleList,
        Final,
        IndexSource::FaceSelection {
            selectable: I::EditUvTris,
            all: I::UvTris,
        },
        &[V::Uvs],
    ),
    gated(
        row(
            BatchKind::EditMeshAnalysis,
            TriangleList,
            Final,
            fixed(I::Tris),
            &[V::Position, V::MeshAnalysis],
        ),
        RequiresMapping,
    ),
    gated(
        row(
            BatchKind::EditTriangles,
            TriangleList,
            EditCage,
            fixed(I::Tris),
            &[V::Position, V::EditData],
        ),
        MappedInEdit,
    ),
    gated(
        row(
            BatchKind::EditVertices,
            PointList,
            EditCage,
            fixed(I::Points),
            &[V::Position, V::EditData],
        ),
        MappedInEdit,
    ),
    gated(
        row(
            BatchKind::EditEdges,
            LineList,
            EditCage,
            fixed(I::Lines),
            &[V::Position, V::EditData],
        ),
        MappedInEdit,
    ),
    gated(
        row(
            BatchKind::EditVertexNormals,
            PointList,
            EditCage,
            fixed(I::Points),
            &[V::Position, V::VertexNormal],
        ),
        MappedInEdit,
    ),
    gated(
        row(BatchKind::EditLoopNormals, PointList, EditCage, fixed(I::Tris), POS_NOR),
        MappedInEdit,
    ),
    gated(
        row(
            BatchKind::EditFaceDots,
            PointList,
            EditCage,
            fixed(I::FaceDots),
            &[V::FaceDotPosition, V::FaceDotNormal],
        ),
        MappedInEdit,
    ),
    gated(
        row(
            BatchKind::EditSkinRoots,
            PointList,
            EditCage,
            IndexSource::None,
            &[V::SkinRoots],
        ),
        MappedInEdit,
    ),
    gated(
        row(
            BatchKind::EditSelectionVerts,
            PointList,
            EditCage,
            fixed(I::Points),
            &[V::Position, V::IndexVert],
        ),
        MappedInEdit,
    ),
    gated(
        row(
            BatchKind::EditSelectionEdges,
            LineList,
            EditCage,
            fixed(I::Lines),
            &[V::Position, V::IndexEdge],
        ),
        MappedInEdit,
    ),
    gated(
        row(
            BatchKind::EditSelectionFaces,
            TriangleList,
            EditCage,
            fixed(I::Tris),
            &[V::Position, V::IndexFace],
        ),
        MappedInEdit,
    ),
    gated(
        row(
            BatchKind::EditSelectionFaceDots,
            PointList,
            EditCage,
            fixed(I::FaceDots),
            &[V::FaceDotPosition, V::IndexFaceDot],
        ),
        MappedInEdit,
    ),
    row(
        BatchKind::EditUvFaces,
        TriangleList,
        UvCage,
        fixed(I::EditUvTris),
        &[V::Uvs, V::EditUvData],
    ),
    row(
        BatchKind::EditUvFacesStretchArea,
        TriangleList,
        UvCage,
        fixed(I::EditUvTris),
        &[V::Uvs, V::EditUvData, V::EditUvStretchArea],
    ),
    row(
        BatchKind::EditUvFacesStretchAngle,
        TriangleList,
        UvCage,
        fixed(I::EditUvTris),
        &[V::Uvs, V::EditUvData, V::EditUvStretchAngle],
    ),
    row(
        BatchKind::EditUvEdges,
        LineList,
        UvCage,
        fixed(I::EditUvLines),
        &[V::Uvs, V::EditUvData],
    ),
    row(
        BatchKind::EditUvVerts,
        PointList,
        UvCage,
        fixed(I::EditUvPoints),
        &[V::Uvs, V::EditUvData],
    ),
    row(
        BatchKind::EditUvFaceDots,
        PointList,
        UvCage,
        fixed(I::EditUvFaceDots),
        &[V::FaceDotUv, V::FaceDotEditUvData],
    ),
    row(BatchKind::CustomTriangles, TriangleList, Final, fixed(I::Tris), POS_NOR),
    row(BatchKind::CustomEdges, LineList, Final, fixed(I::Lines), POS_NOR),
    row(BatchKind::CustomVertices, PointList, Final, fixed(I::Points), POS_NOR),
];

/// Look up the requirement row of `kind`.
///
/// A missing row is a programming error: callers assert in debug builds and
/// degrade to a dummy batch in release builds.
pub fn requirement(kind: BatchKind) -> Result<&'static BatchRequirement, CacheError> {
    REQUIREMENTS
        .iter()
        .find(|req| req.kind == kind)
        .ok_or(CacheError::UndefinedRequirement(kind))
}

/// Every row of the table.
pub fn requirements() -> &'static [BatchRequirement] {
    &REQUIREMENTS
}

/// Vertex buffers the per-material surface batches need.
pub const PER_MATERIAL_VBOS: &[VboKind] = POS_NOR;

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use meshdraw_core::mesh::EditState;
    use meshdraw_core::mesh::generators::generate_cube;

    use super::*;

    #[test]
    fn test_every_kind_has_exactly_one_row() {
        for kind in BatchKind::ALL {
            let rows = requirements().iter().filter(|r| r.kind == kind).count();
            let expected = usize::from(kind != BatchKind::SurfacePerMaterial);
            assert_eq!(rows, expected, "{kind:?}");
        }
    }

    #[test]
    fn test_per_material_has_no_row() {
        assert_eq!(
            requirement(BatchKind::SurfacePerMaterial).unwrap_err(),
            CacheError::UndefinedRequirement(BatchKind::SurfacePerMaterial)
        );
    }

    #[test]
    fn test_rows_are_well_formed() {
        for req in requirements() {
            assert!(!req.vbos.is_empty(), "{:?}", req.kind);
            let unique: HashSet<_> = req.vbos.iter().collect();
            assert_eq!(unique.len(), req.vbos.len(), "{:?}", req.kind);
        }
    }

    #[test]
    fn test_custom_rows_use_position_and_normal() {
        for kind in [
            BatchKind::CustomTriangles,
            BatchKind::CustomEdges,
            BatchKind::CustomVertices,
        ] {
            let req = requirement(kind).unwrap();
            assert_eq!(req.vbos, &[VboKind::Position, VboKind::CornerNormal]);
            assert_eq!(req.list, ListRole::Final);
        }
    }

    #[test]
    fn test_list_resolution() {
        let plain = ListResolution::default();
        assert_eq!(plain.resolve(ListRole::EditCage), BufferListKind::Final);
        assert_eq!(plain.resolve(ListRole::UvCage), BufferListKind::Final);

        let edit = ListResolution {
            has_cage: true,
            has_uv_cage: true,
        };
        assert_eq!(edit.resolve(ListRole::EditCage), BufferListKind::Cage);
        assert_eq!(edit.resolve(ListRole::UvCage), BufferListKind::UvCage);
        assert_eq!(edit.resolve(ListRole::Final), BufferListKind::Final);
    }

    #[test]
    fn test_edit_gates() {
        let object_mode = generate_cube(1.0);
        let mapped = generate_cube(1.0).with_edit_state(EditState::default());
        let unmapped = generate_cube(1.0).with_edit_state(EditState {
            is_original: false,
            mapping_valid: false,
        });

        assert!(!EditGate::RequiresMapping.allows(&object_mode));
        assert!(EditGate::RequiresMapping.allows(&mapped));
        assert!(EditGate::RequiresMappingInEditMode.allows(&object_mode));
        assert!(!EditGate::RequiresMappingInEditMode.allows(&unmapped));
        assert!(EditGate::Always.allows(&unmapped));
    }

    #[test]
    fn test_face_selection_index() {
        let source = IndexSource::FaceSelection {
            selectable: IboKind::EditUvTris,
            all: IboKind::UvTris,
        };
        assert_eq!(source.resolve(true), Some(IboKind::EditUvTris));
        assert_eq!(source.resolve(false), Some(IboKind::UvTris));
        assert_eq!(IndexSource::None.resolve(true), None);
    }
}
