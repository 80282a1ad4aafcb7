//! Buffer kinds held by the buffer store.
//!
//! Corner-domain vertex buffers share one "render vertex" domain laid out as
//! `[corners..., loose edge verts (2 per loose edge)..., loose verts...]`, so
//! every corner-domain buffer can be bound together with any index buffer
//! built over that domain. Face-dot buffers have one element per face.

use crate::types::VertexFormat;

/// Vertex buffer kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum VboKind {
    Position,
    CornerNormal,
    VertexNormal,
    /// All used UV layers, interleaved per render vertex.
    Uvs,
    Tangents,
    Orco,
    /// Packed edit flags: vertex, edge, face, crease.
    EditData,
    EditUvData,
    EditUvStretchArea,
    EditUvStretchAngle,
    FaceDotPosition,
    FaceDotNormal,
    FaceDotUv,
    FaceDotEditUvData,
    VertexGroupWeight,
    PaintOverlayFlag,
    AttrViewer,
    EdgeFactor,
    MeshAnalysis,
    /// One element per skin root vertex (position + radius).
    SkinRoots,
    SculptData,
    IndexVert,
    IndexEdge,
    IndexFace,
    IndexFaceDot,
}

impl VboKind {
    pub const ALL: [VboKind; 25] = [
        Self::Position,
        Self::CornerNormal,
        Self::VertexNormal,
        Self::Uvs,
        Self::Tangents,
        Self::Orco,
        Self::EditData,
        Self::EditUvData,
        Self::EditUvStretchArea,
        Self::EditUvStretchAngle,
        Self::FaceDotPosition,
        Self::FaceDotNormal,
        Self::FaceDotUv,
        Self::FaceDotEditUvData,
        Self::VertexGroupWeight,
        Self::PaintOverlayFlag,
        Self::AttrViewer,
        Self::EdgeFactor,
        Self::MeshAnalysis,
        Self::SkinRoots,
        Self::SculptData,
        Self::IndexVert,
        Self::IndexEdge,
        Self::IndexFace,
        Self::IndexFaceDot,
    ];

    /// Element format of one layer of this buffer.
    pub const fn format(self) -> VertexFormat {
        match self {
            Self::Position
            | Self::CornerNormal
            | Self::VertexNormal
            | Self::Orco
            | Self::FaceDotPosition => VertexFormat::Float32x3,
            Self::Uvs | Self::FaceDotUv | Self::EditUvStretchAngle => VertexFormat::Float32x2,
            Self::Tangents | Self::FaceDotNormal | Self::SkinRoots | Self::SculptData => {
                VertexFormat::Float32x4
            }
            Self::EditData | Self::EditUvData | Self::FaceDotEditUvData => VertexFormat::Uint8x4,
            Self::EditUvStretchArea
            | Self::VertexGroupWeight
            | Self::PaintOverlayFlag
            | Self::AttrViewer
            | Self::EdgeFactor
            | Self::MeshAnalysis => VertexFormat::Float32,
            Self::IndexVert | Self::IndexEdge | Self::IndexFace | Self::IndexFaceDot => {
                VertexFormat::Uint32
            }
        }
    }

    /// Buffers with one element per face instead of per render vertex.
    pub const fn is_face_dot(self) -> bool {
        matches!(
            self,
            Self::FaceDotPosition
                | Self::FaceDotNormal
                | Self::FaceDotUv
                | Self::FaceDotEditUvData
                | Self::IndexFaceDot
        )
    }
}

/// Index buffer kinds. All index buffers hold `u32` indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IboKind {
    /// Visible triangles, sorted by material.
    Tris,
    Lines,
    LinesLoose,
    LinesAdjacency,
    LinesPaintMask,
    Points,
    FaceDots,
    EditUvTris,
    EditUvLines,
    EditUvPoints,
    EditUvFaceDots,
    UvTris,
    UvLines,
    AllUvLines,
}

impl IboKind {
    pub const ALL: [IboKind; 14] = [
        Self::Tris,
        Self::Lines,
        Self::LinesLoose,
        Self::LinesAdjacency,
        Self::LinesPaintMask,
        Self::Points,
        Self::FaceDots,
        Self::EditUvTris,
        Self::EditUvLines,
        Self::EditUvPoints,
        Self::EditUvFaceDots,
        Self::UvTris,
        Self::UvLines,
        Self::AllUvLines,
    ];
}

/// Which mesh a buffer list is extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BufferListKind {
    /// The final evaluated mesh.
    Final,
    /// The deform-only cage shown in edit mode.
    Cage,
    /// The unevaluated edit mesh used by the UV editor.
    UvCage,
}

impl BufferListKind {
    pub const ALL: [BufferListKind; 3] = [Self::Final, Self::Cage, Self::UvCage];

    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::Final => 0,
            Self::Cage => 1,
            Self::UvCage => 2,
        }
    }
}

/// What a buffer holds: a vertex stream or an index list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferSlot {
    Vertex(VboKind),
    Index(IboKind),
}

impl BufferSlot {
    pub fn is_index(self) -> bool {
        matches!(self, Self::Index(_))
    }
}
