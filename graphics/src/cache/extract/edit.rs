//! Edit-mode overlays, selection ids and paint overlays.

use bitflags::bitflags;
use meshdraw_core::math::{Vec3, vec3};

use crate::cache::{BufferSlot, VboKind};
use crate::resources::Buffer;

use super::geometry::face_normals;
use super::indices::edge_corner_users;
use super::{ExtractContext, RenderVert, RenderVerts};

bitflags! {
    /// Element state packed into one byte per element of `EditData`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EditFlags: u8 {
        const SELECTED = 1 << 0;
        const ACTIVE = 1 << 1;
        const HIDDEN = 1 << 2;
        const SEAM = 1 << 3;
        const SHARP = 1 << 4;
        const LOOSE = 1 << 5;
    }
}

/// `[vertex flags, edge flags, face flags, crease]` per render vertex.
pub(super) fn edit_data(ctx: &ExtractContext<'_>) -> Buffer {
    let mesh = ctx.mesh;
    let selection = mesh.selection();
    let marks = mesh.edge_marks();
    let domain = RenderVerts::of(mesh);
    let data = ctx.fill(domain.len(), |rv| {
        let source = domain.source(mesh, rv);
        let vert = source.vertex(mesh);
        let mut vflags = EditFlags::empty();
        vflags.set(EditFlags::SELECTED, selection.is_vert_selected(vert));
        vflags.set(EditFlags::ACTIVE, selection.active_vert == Some(vert));
        vflags.set(EditFlags::HIDDEN, selection.is_vert_hidden(vert));
        vflags.set(EditFlags::LOOSE, !matches!(source, RenderVert::Corner(_)));

        let mut eflags = EditFlags::empty();
        let mut crease = 0u8;
        if let Some(edge) = source.edge(mesh) {
            eflags.set(EditFlags::SELECTED, selection.is_edge_selected(edge));
            eflags.set(EditFlags::ACTIVE, selection.active_edge == Some(edge));
            eflags.set(EditFlags::SEAM, marks.is_seam(edge));
            eflags.set(EditFlags::SHARP, marks.is_sharp(edge));
            crease = (marks.crease(edge).clamp(0.0, 1.0) * 255.0) as u8;
        }

        let mut fflags = EditFlags::empty();
        if let Some(face) = source.face(mesh) {
            let face = face as u32;
            fflags.set(EditFlags::SELECTED, selection.is_face_selected(face));
            fflags.set(EditFlags::ACTIVE, selection.active_face == Some(face));
            fflags.set(EditFlags::HIDDEN, selection.is_face_hidden(face));
        }
        [vflags.bits(), eflags.bits(), fflags.bits(), crease]
    });
    Buffer::from_elements(BufferSlot::Vertex(VboKind::EditData), &data)
}

fn face_center(ctx: &ExtractContext<'_>, face: usize) -> Vec3 {
    let mesh = ctx.mesh;
    let corners = mesh.face_corners(face);
    let n = corners.len() as f32;
    corners.fold(Vec3::zeros(), |acc, c| {
        acc + vec3(mesh.positions()[mesh.corner_verts()[c] as usize])
    }) / n
}

pub(super) fn face_dot_positions(ctx: &ExtractContext<'_>) -> Buffer {
    let data = ctx.fill(ctx.mesh.face_count(), |face| {
        let p = face_center(ctx, face);
        [p.x, p.y, p.z]
    });
    Buffer::from_elements(BufferSlot::Vertex(VboKind::FaceDotPosition), &data)
}

/// Face normal with the selection state in `w` (1.0 selected, 0.0 otherwise).
pub(super) fn face_dot_normals(ctx: &ExtractContext<'_>) -> Buffer {
    let mesh = ctx.mesh;
    let normals = face_normals(mesh);
    let data = ctx.fill(mesh.face_count(), |face| {
        let n = normals[face];
        let selected = mesh.selection().is_face_selected(face as u32);
        [n.x, n.y, n.z, if selected { 1.0 } else { 0.0 }]
    });
    Buffer::from_elements(BufferSlot::Vertex(VboKind::FaceDotNormal), &data)
}

/// 1.0 for masked (selected) paint faces, 0.0 otherwise, -1.0 for hidden faces.
/// Loose elements use the vertex selection.
pub(super) fn paint_overlay_flags(ctx: &ExtractContext<'_>) -> Buffer {
    let mesh = ctx.mesh;
    let selection = mesh.selection();
    let domain = RenderVerts::of(mesh);
    let data = ctx.fill(domain.len(), |rv| {
        let source = domain.source(mesh, rv);
        match source.face(mesh) {
            Some(face) if selection.is_face_hidden(face as u32) => -1.0f32,
            Some(face) => f32::from(u8::from(mesh.is_face_paint_masked(face))),
            None => f32::from(u8::from(selection.is_vert_selected(source.vertex(mesh)))),
        }
    });
    Buffer::from_elements(BufferSlot::Vertex(VboKind::PaintOverlayFlag), &data)
}

/// Wireframe visibility factor per edge: 1.0 for boundary, sharp and loose
/// edges, otherwise growing with the angle between the two faces.
pub(super) fn edge_factors(ctx: &ExtractContext<'_>) -> Buffer {
    let mesh = ctx.mesh;
    let normals = face_normals(mesh);
    let users = edge_corner_users(mesh);
    let edge_factor: Vec<f32> = (0..mesh.edge_count())
        .map(|edge| {
            if mesh.edge_marks().is_sharp(edge as u32) {
                return 1.0;
            }
            match users[edge].as_slice() {
                [a, b] => {
                    let na = normals[mesh.corner_face(*a as usize)];
                    let nb = normals[mesh.corner_face(*b as usize)];
                    (1.0 - na.dot(&nb)).clamp(0.0, 1.0)
                }
                _ => 1.0,
            }
        })
        .collect();

    let domain = RenderVerts::of(mesh);
    let data = ctx.fill(domain.len(), |rv| {
        domain
            .source(mesh, rv)
            .edge(mesh)
            .map_or(1.0, |e| edge_factor[e as usize])
    });
    Buffer::from_elements(BufferSlot::Vertex(VboKind::EdgeFactor), &data)
}

/// Overhang factor per face in `[0, 1]` (1.0 facing straight down); -1.0 for loose elements.
pub(super) fn mesh_analysis(ctx: &ExtractContext<'_>) -> Buffer {
    let mesh = ctx.mesh;
    let normals = face_normals(mesh);
    let domain = RenderVerts::of(mesh);
    let data = ctx.fill(domain.len(), |rv| match domain.source(mesh, rv).face(mesh) {
        Some(face) => ((1.0 - normals[face].z) * 0.5).clamp(0.0, 1.0),
        None => -1.0f32,
    });
    Buffer::from_elements(BufferSlot::Vertex(VboKind::MeshAnalysis), &data)
}

/// One `[x, y, z, radius]` element per skin root vertex.
pub(super) fn skin_roots(ctx: &ExtractContext<'_>) -> Option<Buffer> {
    let mesh = ctx.mesh;
    let roots = mesh.skin_roots()?;
    let data: Vec<[f32; 4]> = roots
        .iter()
        .enumerate()
        .filter(|(_, root)| **root)
        .map(|(v, _)| {
            let [x, y, z] = mesh.positions()[v];
            [x, y, z, 1.0]
        })
        .collect();
    Some(Buffer::from_elements(
        BufferSlot::Vertex(VboKind::SkinRoots),
        &data,
    ))
}

/// Element index per render vertex for selection picking. `u32::MAX` where
/// the element does not exist (loose vertices have no edge or face).
pub(super) fn selection_ids(kind: VboKind, ctx: &ExtractContext<'_>) -> Buffer {
    let mesh = ctx.mesh;
    let domain = RenderVerts::of(mesh);
    let data = ctx.fill(domain.len(), |rv| {
        let source = domain.source(mesh, rv);
        match kind {
            VboKind::IndexVert => source.vertex(mesh),
            VboKind::IndexEdge => source.edge(mesh).unwrap_or(u32::MAX),
            _ => source.face(mesh).map_or(u32::MAX, |f| f as u32),
        }
    });
    Buffer::from_elements(BufferSlot::Vertex(kind), &data)
}

pub(super) fn face_dot_ids(ctx: &ExtractContext<'_>) -> Buffer {
    let data = ctx.fill(ctx.mesh.face_count(), |face| face as u32);
    Buffer::from_elements(BufferSlot::Vertex(VboKind::IndexFaceDot), &data)
}

#[cfg(test)]
mod tests {
    use meshdraw_core::mesh::generators::{generate_cube, generate_grid, generate_loose_edges};

    use super::super::test_support::Fixture;
    use super::*;

    #[test]
    fn test_edit_data_packs_selection() {
        let fixture = Fixture::new();
        let mut mesh = generate_grid(1, 1, 1.0);
        mesh.selection_mut().vert_select = vec![true, false, false, false];
        mesh.selection_mut().face_select = vec![true];
        mesh.selection_mut().active_face = Some(0);

        let buffer = edit_data(&fixture.ctx(&mesh));
        let data = buffer.as_slice::<[u8; 4]>().unwrap();
        let first = data[0];
        assert!(EditFlags::from_bits_retain(first[0]).contains(EditFlags::SELECTED));
        assert!(
            EditFlags::from_bits_retain(first[2])
                .contains(EditFlags::SELECTED | EditFlags::ACTIVE)
        );
        assert!(!EditFlags::from_bits_retain(data[1][0]).contains(EditFlags::SELECTED));
    }

    #[test]
    fn test_loose_edges_are_flagged_loose() {
        let fixture = Fixture::new();
        let mesh = generate_loose_edges(2);
        let buffer = edit_data(&fixture.ctx(&mesh));
        assert_eq!(buffer.len(), 4);
        for flags in buffer.as_slice::<[u8; 4]>().unwrap() {
            assert!(EditFlags::from_bits_retain(flags[0]).contains(EditFlags::LOOSE));
        }
    }

    #[test]
    fn test_cube_edges_are_fully_visible() {
        let fixture = Fixture::new();
        let mesh = generate_cube(1.0);
        let buffer = edge_factors(&fixture.ctx(&mesh));
        for f in buffer.as_slice::<f32>().unwrap() {
            assert!((f - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_skin_roots_only_flagged() {
        let fixture = Fixture::new();
        let mesh = generate_cube(1.0).with_skin_roots(vec![
            true, false, false, false, false, false, false, true,
        ]);
        let buffer = skin_roots(&fixture.ctx(&mesh)).unwrap();
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn test_selection_ids_for_loose_verts() {
        let fixture = Fixture::new();
        let mut positions = generate_grid(1, 1, 1.0).positions().to_vec();
        positions.push([5.0, 5.0, 5.0]);
        let mesh =
            meshdraw_core::mesh::SourceMesh::from_polygons(positions, &[&[0, 1, 3, 2]]);
        let faces = selection_ids(VboKind::IndexFace, &fixture.ctx(&mesh));
        let ids = faces.as_slice::<u32>().unwrap();
        assert_eq!(ids, &[0, 0, 0, 0, u32::MAX]);
    }
}
