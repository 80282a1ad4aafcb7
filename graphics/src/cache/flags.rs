//! Batch kinds and the requested/ready bit sets.
//!
//! Every named batch a mesh cache can hold has one [`BatchKind`] and one bit
//! in [`BatchFlags`]. A cache keeps two flag sets: *requested* (some consumer
//! asked for the batch) and *ready* (the slot holds a built batch). A pass
//! only builds `requested & !ready`.

use bitflags::bitflags;

/// Named batch kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BatchKind {
    Surface,
    /// One batch per material slot, sharing the triangle index buffer.
    SurfacePerMaterial,
    SurfaceWeights,
    PaintOverlaySurface,
    ViewerAttributeOverlay,
    SculptOverlays,
    AllVerts,
    PaintOverlayVerts,
    AllEdges,
    LooseEdges,
    EdgeDetection,
    WireEdges,
    PaintOverlayWireLoops,
    WireLoopsAllUvs,
    WireLoopsUvs,
    WireLoopsEditUvs,
    UvFaces,
    EditMeshAnalysis,
    EditTriangles,
    EditVertices,
    EditEdges,
    EditVertexNormals,
    EditLoopNormals,
    EditFaceDots,
    EditSkinRoots,
    EditSelectionVerts,
    EditSelectionEdges,
    EditSelectionFaces,
    EditSelectionFaceDots,
    EditUvFaces,
    EditUvFacesStretchArea,
    EditUvFacesStretchAngle,
    EditUvEdges,
    EditUvVerts,
    EditUvFaceDots,
    CustomTriangles,
    CustomEdges,
    CustomVertices,
}

impl BatchKind {
    pub const COUNT: usize = 38;

    pub const ALL: [BatchKind; Self::COUNT] = [
        Self::Surface,
        Self::SurfacePerMaterial,
        Self::SurfaceWeights,
        Self::PaintOverlaySurface,
        Self::ViewerAttributeOverlay,
        Self::SculptOverlays,
        Self::AllVerts,
        Self::PaintOverlayVerts,
        Self::AllEdges,
        Self::LooseEdges,
        Self::EdgeDetection,
        Self::WireEdges,
        Self::PaintOverlayWireLoops,
        Self::WireLoopsAllUvs,
        Self::WireLoopsUvs,
        Self::WireLoopsEditUvs,
        Self::UvFaces,
        Self::EditMeshAnalysis,
        Self::EditTriangles,
        Self::EditVertices,
        Self::EditEdges,
        Self::EditVertexNormals,
        Self::EditLoopNormals,
        Self::EditFaceDots,
        Self::EditSkinRoots,
        Self::EditSelectionVerts,
        Self::EditSelectionEdges,
        Self::EditSelectionFaces,
        Self::EditSelectionFaceDots,
        Self::EditUvFaces,
        Self::EditUvFacesStretchArea,
        Self::EditUvFacesStretchAngle,
        Self::EditUvEdges,
        Self::EditUvVerts,
        Self::EditUvFaceDots,
        Self::CustomTriangles,
        Self::CustomEdges,
        Self::CustomVertices,
    ];

    /// The single bit for this kind.
    #[inline]
    pub const fn flag(self) -> BatchFlags {
        BatchFlags::from_bits_retain(1 << self as u64)
    }

    /// Kinds requested by external tooling and kept alive by the preservation registry.
    #[inline]
    pub fn is_custom(self) -> bool {
        BatchFlags::CUSTOM.contains(self.flag())
    }
}

bitflags! {
    /// One bit per [`BatchKind`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BatchFlags: u64 {
        const SURFACE = 1 << BatchKind::Surface as u64;
        const SURFACE_PER_MATERIAL = 1 << BatchKind::SurfacePerMaterial as u64;
        const SURFACE_WEIGHTS = 1 << BatchKind::SurfaceWeights as u64;
        const PAINT_OVERLAY_SURFACE = 1 << BatchKind::PaintOverlaySurface as u64;
        const VIEWER_ATTRIBUTE_OVERLAY = 1 << BatchKind::ViewerAttributeOverlay as u64;
        const SCULPT_OVERLAYS = 1 << BatchKind::SculptOverlays as u64;
        const ALL_VERTS = 1 << BatchKind::AllVerts as u64;
        const PAINT_OVERLAY_VERTS = 1 << BatchKind::PaintOverlayVerts as u64;
        const ALL_EDGES = 1 << BatchKind::AllEdges as u64;
        const LOOSE_EDGES = 1 << BatchKind::LooseEdges as u64;
        const EDGE_DETECTION = 1 << BatchKind::EdgeDetection as u64;
        const WIRE_EDGES = 1 << BatchKind::WireEdges as u64;
        const PAINT_OVERLAY_WIRE_LOOPS = 1 << BatchKind::PaintOverlayWireLoops as u64;
        const WIRE_LOOPS_ALL_UVS = 1 << BatchKind::WireLoopsAllUvs as u64;
        const WIRE_LOOPS_UVS = 1 << BatchKind::WireLoopsUvs as u64;
        const WIRE_LOOPS_EDIT_UVS = 1 << BatchKind::WireLoopsEditUvs as u64;
        const UV_FACES = 1 << BatchKind::UvFaces as u64;
        const EDIT_MESH_ANALYSIS = 1 << BatchKind::EditMeshAnalysis as u64;
        const EDIT_TRIANGLES = 1 << BatchKind::EditTriangles as u64;
        const EDIT_VERTICES = 1 << BatchKind::EditVertices as u64;
        const EDIT_EDGES = 1 << BatchKind::EditEdges as u64;
        const EDIT_VERTEX_NORMALS = 1 << BatchKind::EditVertexNormals as u64;
        const EDIT_LOOP_NORMALS = 1 << BatchKind::EditLoopNormals as u64;
        const EDIT_FACE_DOTS = 1 << BatchKind::EditFaceDots as u64;
        const EDIT_SKIN_ROOTS = 1 << BatchKind::EditSkinRoots as u64;
        const EDIT_SELECTION_VERTS = 1 << BatchKind::EditSelectionVerts as u64;
        const EDIT_SELECTION_EDGES = 1 << BatchKind::EditSelectionEdges as u64;
        const EDIT_SELECTION_FACES = 1 << BatchKind::EditSelectionFaces as u64;
        const EDIT_SELECTION_FACE_DOTS = 1 << BatchKind::EditSelectionFaceDots as u64;
        const EDIT_UV_FACES = 1 << BatchKind::EditUvFaces as u64;
        const EDIT_UV_FACES_STRETCH_AREA = 1 << BatchKind::EditUvFacesStretchArea as u64;
        const EDIT_UV_FACES_STRETCH_ANGLE = 1 << BatchKind::EditUvFacesStretchAngle as u64;
        const EDIT_UV_EDGES = 1 << BatchKind::EditUvEdges as u64;
        const EDIT_UV_VERTS = 1 << BatchKind::EditUvVerts as u64;
        const EDIT_UV_FACE_DOTS = 1 << BatchKind::EditUvFaceDots as u64;
        const CUSTOM_TRIANGLES = 1 << BatchKind::CustomTriangles as u64;
        const CUSTOM_EDGES = 1 << BatchKind::CustomEdges as u64;
        const CUSTOM_VERTICES = 1 << BatchKind::CustomVertices as u64;

        /// Batches that carry shading streams (UVs, tangents, orco).
        const SURFACE_ALL = Self::SURFACE.bits() | Self::SURFACE_PER_MATERIAL.bits();

        /// UV editor batches drawn from the UV cage.
        const EDIT_UV = Self::EDIT_UV_FACES.bits()
            | Self::EDIT_UV_FACES_STRETCH_AREA.bits()
            | Self::EDIT_UV_FACES_STRETCH_ANGLE.bits()
            | Self::EDIT_UV_EDGES.bits()
            | Self::EDIT_UV_VERTS.bits()
            | Self::EDIT_UV_FACE_DOTS.bits()
            | Self::WIRE_LOOPS_EDIT_UVS.bits();

        /// Batches requested by external tooling.
        const CUSTOM = Self::CUSTOM_TRIANGLES.bits()
            | Self::CUSTOM_EDGES.bits()
            | Self::CUSTOM_VERTICES.bits();

        /// Batches that need the active UV layer.
        const UV_DEPENDENT = Self::EDIT_UV.bits()
            | Self::WIRE_LOOPS_ALL_UVS.bits()
            | Self::WIRE_LOOPS_UVS.bits()
            | Self::UV_FACES.bits();
    }
}

impl Default for BatchFlags {
    fn default() -> Self {
        Self::empty()
    }
}

impl BatchFlags {
    /// Iterate the kinds whose bits are set, in declaration order.
    pub fn kinds(self) -> impl Iterator<Item = BatchKind> {
        BatchKind::ALL
            .into_iter()
            .filter(move |kind| self.contains(kind.flag()))
    }
}

impl From<BatchKind> for BatchFlags {
    fn from(kind: BatchKind) -> Self {
        kind.flag()
    }
}

impl FromIterator<BatchKind> for BatchFlags {
    fn from_iter<I: IntoIterator<Item = BatchKind>>(iter: I) -> Self {
        iter.into_iter()
            .fold(BatchFlags::empty(), |acc, kind| acc | kind.flag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_bit_per_kind() {
        let all: BatchFlags = BatchKind::ALL.into_iter().collect();
        assert_eq!(all.bits().count_ones() as usize, BatchKind::COUNT);
        for (i, kind) in BatchKind::ALL.into_iter().enumerate() {
            assert_eq!(kind as usize, i);
            assert_eq!(kind.flag().bits(), 1 << i);
        }
    }

    #[test]
    fn test_kinds_roundtrip() {
        let flags = BatchFlags::SURFACE | BatchFlags::CUSTOM_EDGES;
        let kinds: Vec<_> = flags.kinds().collect();
        assert_eq!(kinds, vec![BatchKind::Surface, BatchKind::CustomEdges]);
    }

    #[test]
    fn test_groups() {
        assert!(BatchKind::CustomVertices.is_custom());
        assert!(!BatchKind::Surface.is_custom());
        assert_eq!(BatchFlags::CUSTOM.kinds().count(), 3);
        assert!(BatchFlags::UV_DEPENDENT.contains(BatchFlags::EDIT_UV));
        assert!(!BatchFlags::UV_DEPENDENT.intersects(BatchFlags::SURFACE_ALL));
    }

    #[test]
    fn test_setting_a_bit_twice_is_idempotent() {
        let mut requested = BatchFlags::empty();
        requested |= BatchKind::Surface.flag();
        let once = requested;
        requested |= BatchKind::Surface.flag();
        assert_eq!(requested, once);
    }
}
