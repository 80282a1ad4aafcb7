//! Buffer extraction: turning source mesh attributes into buffer contents.
//!
//! Every extractor returns `None` when the data it needs does not exist on
//! the mesh (no UV layer, no vertex groups, no viewer attribute, ...). The
//! pass then installs dummy batches for everything that needed the buffer.
//!
//! Per-element fills run on the rayon pool once they reach
//! [`CacheSettings::parallel_threshold`] elements; everything else here is
//! plain sequential code on the calling thread.

mod edit;
mod geometry;
mod indices;
mod uv;
mod weights;

use meshdraw_core::mesh::SourceMesh;
use meshdraw_core::object::{SceneObject, ToolSettings};
use meshdraw_core::profiling::profile_scope;
use rayon::prelude::*;

use crate::resources::Buffer;

use super::buffers::{BufferListKind, IboKind, VboKind};
use super::settings::CacheSettings;

pub use indices::{FaceSorted, MaterialRange, is_manifold};
pub use uv::AreaTotals;
pub use weights::{WeightFlags, WeightState};

/// Everything an extractor may read.
#[derive(Clone, Copy)]
pub struct ExtractContext<'a> {
    pub mesh: &'a SourceMesh,
    pub object: Option<&'a SceneObject>,
    pub settings: &'a CacheSettings,
    pub tool_settings: &'a ToolSettings,
    pub weight_state: &'a WeightState,
    /// Bitmask of UV layer indices the UV buffer must contain.
    pub uv_layers_used: u32,
    pub area_totals: Option<AreaTotals>,
    pub is_editmode: bool,
    pub is_paint_mode: bool,
    pub list: BufferListKind,
}

impl<'a> ExtractContext<'a> {
    /// Context with default state for `mesh`, as used by standalone extraction.
    pub fn new(
        mesh: &'a SourceMesh,
        settings: &'a CacheSettings,
        tool_settings: &'a ToolSettings,
        weight_state: &'a WeightState,
    ) -> Self {
        Self {
            mesh,
            object: None,
            settings,
            tool_settings,
            weight_state,
            uv_layers_used: 0,
            area_totals: None,
            is_editmode: mesh.is_editmode(),
            is_paint_mode: false,
            list: BufferListKind::Final,
        }
    }

    pub fn with_uv_layers(mut self, mask: u32) -> Self {
        self.uv_layers_used = mask;
        self
    }

    /// Whether a face is drawn at all. Hidden faces are only skipped in edit mode.
    #[inline]
    pub(crate) fn face_visible(&self, face: usize) -> bool {
        !(self.is_editmode && self.mesh.selection().is_face_hidden(face as u32))
    }

    #[inline]
    pub(crate) fn vert_visible(&self, vert: u32) -> bool {
        !(self.is_editmode && self.mesh.selection().is_vert_hidden(vert))
    }

    /// Map `f` over `0..len`, on the rayon pool for large element counts.
    pub(crate) fn fill<T, F>(&self, len: usize, f: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send,
    {
        if len >= self.settings.parallel_threshold {
            (0..len).into_par_iter().map(f).collect()
        } else {
            (0..len).map(f).collect()
        }
    }
}

/// The corner-domain vertex layout shared by all render-vertex buffers:
/// `[corners..., loose edge verts (2 per loose edge)..., loose verts...]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderVerts {
    pub corners: usize,
    pub loose_edges: usize,
    pub loose_verts: usize,
}

/// What one render vertex stands for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderVert {
    Corner(usize),
    /// One end (0 or 1) of a loose edge.
    LooseEdgeEnd { edge: u32, end: usize },
    LooseVert(u32),
}

impl RenderVerts {
    pub fn of(mesh: &SourceMesh) -> Self {
        Self {
            corners: mesh.corner_count(),
            loose_edges: mesh.loose_edges().len(),
            loose_verts: mesh.loose_verts().len(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.corners + 2 * self.loose_edges + self.loose_verts
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn loose_edge_start(&self) -> usize {
        self.corners
    }

    #[inline]
    pub fn loose_vert_start(&self) -> usize {
        self.corners + 2 * self.loose_edges
    }

    pub fn source(&self, mesh: &SourceMesh, rv: usize) -> RenderVert {
        if rv < self.corners {
            RenderVert::Corner(rv)
        } else if rv < self.loose_vert_start() {
            let i = rv - self.corners;
            RenderVert::LooseEdgeEnd {
                edge: mesh.loose_edges()[i / 2],
                end: i % 2,
            }
        } else {
            RenderVert::LooseVert(mesh.loose_verts()[rv - self.loose_vert_start()])
        }
    }
}

impl RenderVert {
    /// Mesh vertex this render vertex draws.
    pub fn vertex(self, mesh: &SourceMesh) -> u32 {
        match self {
            Self::Corner(c) => mesh.corner_verts()[c],
            Self::LooseEdgeEnd { edge, end } => mesh.edges()[edge as usize][end],
            Self::LooseVert(v) => v,
        }
    }

    /// Edge leaving this render vertex, if any.
    pub fn edge(self, mesh: &SourceMesh) -> Option<u32> {
        match self {
            Self::Corner(c) => Some(mesh.corner_edges()[c]),
            Self::LooseEdgeEnd { edge, .. } => Some(edge),
            Self::LooseVert(_) => None,
        }
    }

    /// Face owning this render vertex, if any.
    pub fn face(self, mesh: &SourceMesh) -> Option<usize> {
        match self {
            Self::Corner(c) => Some(mesh.corner_face(c)),
            _ => None,
        }
    }
}

/// Build the contents of one vertex buffer.
pub fn extract_vbo(kind: VboKind, ctx: &ExtractContext<'_>) -> Option<Buffer> {
    profile_scope!("extract_vbo");
    log::trace!("extracting {:?} for {} ({:?})", kind, ctx.mesh.id(), ctx.list);
    match kind {
        VboKind::Position => Some(geometry::positions(ctx)),
        VboKind::CornerNormal => Some(geometry::corner_normals(ctx)),
        VboKind::VertexNormal => Some(geometry::vertex_normals(ctx)),
        VboKind::Orco => geometry::orco(ctx),
        VboKind::Tangents => uv::tangents(ctx),
        VboKind::Uvs => uv::uvs(ctx),
        VboKind::EditUvData => uv::edit_uv_data(ctx),
        VboKind::EditUvStretchArea => uv::stretch_area(ctx),
        VboKind::EditUvStretchAngle => uv::stretch_angle(ctx),
        VboKind::FaceDotUv => uv::face_dot_uvs(ctx),
        VboKind::FaceDotEditUvData => uv::face_dot_edit_uv_data(ctx),
        VboKind::EditData => Some(edit::edit_data(ctx)),
        VboKind::FaceDotPosition => Some(edit::face_dot_positions(ctx)),
        VboKind::FaceDotNormal => Some(edit::face_dot_normals(ctx)),
        VboKind::PaintOverlayFlag => Some(edit::paint_overlay_flags(ctx)),
        VboKind::AttrViewer => geometry::viewer_attribute(ctx),
        VboKind::EdgeFactor => Some(edit::edge_factors(ctx)),
        VboKind::MeshAnalysis => Some(edit::mesh_analysis(ctx)),
        VboKind::SkinRoots => edit::skin_roots(ctx),
        VboKind::SculptData => geometry::sculpt_data(ctx),
        VboKind::IndexVert | VboKind::IndexEdge | VboKind::IndexFace => {
            Some(edit::selection_ids(kind, ctx))
        }
        VboKind::IndexFaceDot => Some(edit::face_dot_ids(ctx)),
        VboKind::VertexGroupWeight => weights::vertex_group_weights(ctx),
    }
}

/// Build the contents of one index buffer.
///
/// [`IboKind::Tris`] is built from a fresh [`FaceSorted`]; the buffer store
/// builds it through [`FaceSorted::tris_buffer`] instead so it can keep the
/// material ranges.
pub fn extract_ibo(kind: IboKind, ctx: &ExtractContext<'_>) -> Option<Buffer> {
    profile_scope!("extract_ibo");
    log::trace!("extracting {:?} for {} ({:?})", kind, ctx.mesh.id(), ctx.list);
    let indices = match kind {
        IboKind::Tris => return Some(FaceSorted::build(ctx).tris_buffer()),
        IboKind::Lines => indices::lines(ctx, true),
        IboKind::LinesLoose => indices::loose_lines(ctx),
        IboKind::LinesAdjacency => indices::lines_adjacency(ctx),
        IboKind::LinesPaintMask => indices::lines_paint_mask(ctx),
        IboKind::Points => indices::points(ctx),
        IboKind::FaceDots => indices::face_dots(ctx, |face| ctx.face_visible(face)),
        IboKind::EditUvTris => indices::uv_tris(ctx, |face| uv::edit_uv_face(ctx, face)),
        IboKind::EditUvLines => indices::uv_lines(ctx, |face| uv::edit_uv_face(ctx, face)),
        IboKind::EditUvPoints => indices::uv_points(ctx, |face| uv::edit_uv_face(ctx, face)),
        IboKind::EditUvFaceDots => indices::face_dots(ctx, |face| uv::edit_uv_face(ctx, face)),
        IboKind::UvTris => indices::uv_tris(ctx, |face| ctx.face_visible(face)),
        IboKind::UvLines => indices::uv_lines(ctx, |face| ctx.face_visible(face)),
        IboKind::AllUvLines => indices::uv_lines(ctx, |_| true),
    };
    Some(Buffer::indices(kind, &indices))
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub struct Fixture {
        pub settings: CacheSettings,
        pub tools: ToolSettings,
        pub weights: WeightState,
    }

    impl Fixture {
        pub fn new() -> Self {
            Self {
                settings: CacheSettings::default(),
                tools: ToolSettings::default(),
                weights: WeightState::default(),
            }
        }

        pub fn ctx<'a>(&'a self, mesh: &'a SourceMesh) -> ExtractContext<'a> {
            ExtractContext::new(mesh, &self.settings, &self.tools, &self.weights)
        }
    }
}

#[cfg(test)]
mod tests {
    use meshdraw_core::mesh::generators::{generate_cube, generate_grid};
    use meshdraw_core::mesh::SourceMesh;

    use super::test_support::Fixture;
    use super::*;

    fn mixed_mesh() -> SourceMesh {
        let mut positions = generate_grid(1, 1, 1.0).positions().to_vec();
        positions.extend([[2.0, 0.0, 0.0], [3.0, 0.0, 0.0], [9.0, 9.0, 9.0]]);
        SourceMesh::from_polygons(positions, &[&[0, 1, 3, 2]]).with_loose_edges(&[[4, 5]])
    }

    #[test]
    fn test_render_vert_domain() {
        let mesh = mixed_mesh();
        let rv = RenderVerts::of(&mesh);
        assert_eq!(rv.len(), 4 + 2 + 1);
        assert_eq!(rv.source(&mesh, 2), RenderVert::Corner(2));
        assert_eq!(
            rv.source(&mesh, 5),
            RenderVert::LooseEdgeEnd { edge: 4, end: 1 }
        );
        assert_eq!(rv.source(&mesh, 6), RenderVert::LooseVert(6));
        assert_eq!(rv.source(&mesh, 5).vertex(&mesh), 5);
        assert_eq!(rv.source(&mesh, 6).edge(&mesh), None);
    }

    #[test]
    fn test_every_vbo_matches_domain() {
        let fixture = Fixture::new();
        let mesh = generate_cube(1.0);
        let ctx = fixture.ctx(&mesh).with_uv_layers(1);
        let render_verts = RenderVerts::of(&mesh).len() as u32;

        for kind in VboKind::ALL {
            let Some(buffer) = extract_vbo(kind, &ctx) else {
                continue;
            };
            let expected = if kind.is_face_dot() {
                mesh.face_count() as u32
            } else if kind == VboKind::SkinRoots {
                continue;
            } else {
                render_verts
            };
            assert_eq!(buffer.len(), expected, "{kind:?}");
        }
    }

    #[test]
    fn test_missing_data_yields_none() {
        let fixture = Fixture::new();
        let mesh = generate_cube(1.0);
        let ctx = fixture.ctx(&mesh);

        assert!(extract_vbo(VboKind::Uvs, &ctx).is_none());
        assert!(extract_vbo(VboKind::VertexGroupWeight, &ctx).is_none());
        assert!(extract_vbo(VboKind::AttrViewer, &ctx).is_none());
        assert!(extract_vbo(VboKind::SkinRoots, &ctx).is_none());
        assert!(extract_vbo(VboKind::SculptData, &ctx).is_none());
        assert!(extract_vbo(VboKind::Orco, &ctx).is_none());
    }

    #[test]
    fn test_parallel_fill_matches_sequential() {
        let mut fixture = Fixture::new();
        let mesh = generate_grid(8, 8, 1.0);
        let sequential = extract_vbo(VboKind::CornerNormal, &fixture.ctx(&mesh)).unwrap();

        fixture.settings.parallel_threshold = 1;
        let parallel = extract_vbo(VboKind::CornerNormal, &fixture.ctx(&mesh)).unwrap();
        assert_eq!(sequential.bytes(), parallel.bytes());
    }
}
