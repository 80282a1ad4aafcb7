//! Index buffer contents over the render-vertex domain.

use meshdraw_core::mesh::SourceMesh;

use crate::cache::IboKind;
use crate::resources::Buffer;

use super::{ExtractContext, RenderVerts};

/// Index range of one material inside the shared triangle buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MaterialRange {
    /// First index (not triangle) of the range.
    pub start: u32,
    /// Number of indices.
    pub count: u32,
}

/// Visible triangles grouped by material.
///
/// Materials are laid out in ascending slot order and triangles keep their
/// original order inside a material, so the same mesh always produces the
/// same ranges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaceSorted {
    /// Triangle indices (into `corner_tris`) in draw order.
    pub tri_order: Vec<u32>,
    /// One range per material slot.
    pub ranges: Vec<MaterialRange>,
    corner_tris: Vec<[u32; 3]>,
}

impl FaceSorted {
    pub fn build(ctx: &ExtractContext<'_>) -> Self {
        let mesh = ctx.mesh;
        let mat_len = mesh.material_count() as usize;
        let tri_faces = mesh.corner_tri_faces();

        let mut counts = vec![0u32; mat_len];
        let visible: Vec<bool> = tri_faces
            .iter()
            .map(|&face| ctx.face_visible(face as usize))
            .collect();
        for (tri, &face) in tri_faces.iter().enumerate() {
            if visible[tri] {
                counts[material_slot(mesh, face as usize, mat_len)] += 1;
            }
        }

        let mut ranges = Vec::with_capacity(mat_len);
        let mut offsets = Vec::with_capacity(mat_len);
        let mut next = 0u32;
        for &count in &counts {
            ranges.push(MaterialRange {
                start: next * 3,
                count: count * 3,
            });
            offsets.push(next);
            next += count;
        }

        let mut tri_order = vec![0u32; next as usize];
        for (tri, &face) in tri_faces.iter().enumerate() {
            if visible[tri] {
                let slot = &mut offsets[material_slot(mesh, face as usize, mat_len)];
                tri_order[*slot as usize] = tri as u32;
                *slot += 1;
            }
        }

        Self {
            tri_order,
            ranges,
            corner_tris: mesh.corner_tris().to_vec(),
        }
    }

    /// Index buffer with the triangles in material order.
    pub fn tris_buffer(&self) -> Buffer {
        let indices: Vec<u32> = self
            .tri_order
            .iter()
            .flat_map(|&tri| self.corner_tris[tri as usize])
            .collect();
        Buffer::indices(IboKind::Tris, &indices)
    }

    pub fn range(&self, material: usize) -> MaterialRange {
        self.ranges.get(material).copied().unwrap_or_default()
    }

    pub fn material_count(&self) -> usize {
        self.ranges.len()
    }
}

/// Out-of-range material indices are drawn with the last slot.
fn material_slot(mesh: &SourceMesh, face: usize, mat_len: usize) -> usize {
    (mesh.face_material(face) as usize).min(mat_len - 1)
}

/// Corners using each edge (as the edge leaving the corner), per edge.
pub(crate) fn edge_corner_users(mesh: &SourceMesh) -> Vec<Vec<u32>> {
    let mut users = vec![Vec::new(); mesh.edge_count()];
    for (corner, &edge) in mesh.corner_edges().iter().enumerate() {
        users[edge as usize].push(corner as u32);
    }
    users
}

/// Whether every face edge is shared by exactly two faces.
pub fn is_manifold(mesh: &SourceMesh) -> bool {
    let loose = mesh.loose_edges().len();
    edge_corner_users(mesh)
        .iter()
        .take(mesh.edge_count() - loose)
        .all(|users| users.len() == 2)
}

fn prev_corner(mesh: &SourceMesh, corner: usize) -> usize {
    let range = mesh.face_corners(mesh.corner_face(corner));
    if corner == range.start { range.end - 1 } else { corner - 1 }
}

fn next_corner(mesh: &SourceMesh, corner: usize) -> usize {
    let range = mesh.face_corners(mesh.corner_face(corner));
    if corner + 1 == range.end { range.start } else { corner + 1 }
}

/// One line per unique edge of visible faces, then loose edges when `with_loose`.
pub(super) fn lines(ctx: &ExtractContext<'_>, with_loose: bool) -> Vec<u32> {
    let mesh = ctx.mesh;
    let mut seen = vec![false; mesh.edge_count()];
    let mut out = Vec::new();
    for face in 0..mesh.face_count() {
        if !ctx.face_visible(face) {
            continue;
        }
        for corner in mesh.face_corners(face) {
            let edge = mesh.corner_edges()[corner] as usize;
            if !std::mem::replace(&mut seen[edge], true) {
                out.extend([corner as u32, next_corner(mesh, corner) as u32]);
            }
        }
    }
    if with_loose {
        out.extend(loose_lines(ctx));
    }
    out
}

pub(super) fn loose_lines(ctx: &ExtractContext<'_>) -> Vec<u32> {
    let mesh = ctx.mesh;
    let domain = RenderVerts::of(mesh);
    let start = domain.loose_edge_start() as u32;
    let mut out = Vec::with_capacity(2 * domain.loose_edges);
    for (i, &edge) in mesh.loose_edges().iter().enumerate() {
        let [a, b] = mesh.edges()[edge as usize];
        if ctx.vert_visible(a) && ctx.vert_visible(b) {
            let rv = start + 2 * i as u32;
            out.extend([rv, rv + 1]);
        }
    }
    out
}

/// Lines with adjacency: `[opposite in face A, v1, v2, opposite in face B]`.
/// Boundary edges repeat face A's opposite corner.
pub(super) fn lines_adjacency(ctx: &ExtractContext<'_>) -> Vec<u32> {
    let mesh = ctx.mesh;
    let mut out = Vec::new();
    for users in edge_corner_users(mesh) {
        let Some(&a) = users.first() else {
            continue;
        };
        let a = a as usize;
        if !ctx.face_visible(mesh.corner_face(a)) {
            continue;
        }
        let opposite_a = prev_corner(mesh, a);
        let opposite_b = users
            .get(1)
            .map_or(opposite_a, |&b| prev_corner(mesh, b as usize));
        out.extend([
            opposite_a as u32,
            a as u32,
            next_corner(mesh, a) as u32,
            opposite_b as u32,
        ]);
    }
    out
}

/// Unique edges of faces selected by the paint mask.
pub(super) fn lines_paint_mask(ctx: &ExtractContext<'_>) -> Vec<u32> {
    let mesh = ctx.mesh;
    let mut seen = vec![false; mesh.edge_count()];
    let mut out = Vec::new();
    for face in 0..mesh.face_count() {
        if !mesh.is_face_paint_masked(face) || mesh.selection().is_face_hidden(face as u32) {
            continue;
        }
        for corner in mesh.face_corners(face) {
            let edge = mesh.corner_edges()[corner] as usize;
            if !std::mem::replace(&mut seen[edge], true) {
                out.extend([corner as u32, next_corner(mesh, corner) as u32]);
            }
        }
    }
    out
}

/// One render vertex per visible mesh vertex.
pub(super) fn points(ctx: &ExtractContext<'_>) -> Vec<u32> {
    let mesh = ctx.mesh;
    let domain = RenderVerts::of(mesh);
    let mut seen = vec![false; mesh.vert_count()];
    let mut out = Vec::with_capacity(mesh.vert_count());
    for rv in 0..domain.len() {
        let source = domain.source(mesh, rv);
        if let Some(face) = source.face(mesh)
            && !ctx.face_visible(face)
        {
            continue;
        }
        let vert = source.vertex(mesh);
        if ctx.vert_visible(vert) && !std::mem::replace(&mut seen[vert as usize], true) {
            out.push(rv as u32);
        }
    }
    out
}

pub(super) fn face_dots(ctx: &ExtractContext<'_>, include: impl Fn(usize) -> bool) -> Vec<u32> {
    (0..ctx.mesh.face_count())
        .filter(|&face| include(face))
        .map(|face| face as u32)
        .collect()
}

pub(super) fn uv_tris(ctx: &ExtractContext<'_>, include: impl Fn(usize) -> bool) -> Vec<u32> {
    let mesh = ctx.mesh;
    mesh.corner_tris()
        .iter()
        .zip(mesh.corner_tri_faces())
        .filter(|(_, face)| include(**face as usize))
        .flat_map(|(tri, _)| *tri)
        .collect()
}

/// UV edges are per face: every corner emits its own edge, shared mesh edges are not merged.
pub(super) fn uv_lines(ctx: &ExtractContext<'_>, include: impl Fn(usize) -> bool) -> Vec<u32> {
    let mesh = ctx.mesh;
    let mut out = Vec::new();
    for face in (0..mesh.face_count()).filter(|&f| include(f)) {
        for corner in mesh.face_corners(face) {
            out.extend([corner as u32, next_corner(mesh, corner) as u32]);
        }
    }
    out
}

pub(super) fn uv_points(ctx: &ExtractContext<'_>, include: impl Fn(usize) -> bool) -> Vec<u32> {
    let mesh = ctx.mesh;
    (0..mesh.face_count())
        .filter(|&f| include(f))
        .flat_map(|face| mesh.face_corners(face).map(|c| c as u32))
        .collect()
}
