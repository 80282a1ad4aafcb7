//! Positions, normals and plain per-vertex attributes.

use meshdraw_core::math::{Vec3, corner_angle, face_normal, vec3};
use meshdraw_core::mesh::SourceMesh;

use crate::cache::{BufferSlot, VboKind};
use crate::resources::Buffer;

use super::{ExtractContext, RenderVert, RenderVerts};

pub(super) fn face_normals(mesh: &SourceMesh) -> Vec<Vec3> {
    (0..mesh.face_count())
        .map(|face| {
            let positions = mesh.positions();
            face_normal(
                mesh.face_corners(face)
                    .map(|c| positions[mesh.corner_verts()[c] as usize]),
            )
        })
        .collect()
}

/// Angle-weighted vertex normals. Vertices without faces get +Z.
pub(super) fn vertex_normal_table(mesh: &SourceMesh, face_normals: &[Vec3]) -> Vec<Vec3> {
    let positions = mesh.positions();
    let corner_verts = mesh.corner_verts();
    let mut normals = vec![Vec3::zeros(); mesh.vert_count()];
    for (face, normal) in face_normals.iter().enumerate() {
        let corners = mesh.face_corners(face);
        let (start, end) = (corners.start, corners.end);
        for c in corners {
            let prev = if c == start { end - 1 } else { c - 1 };
            let next = if c + 1 == end { start } else { c + 1 };
            let angle = corner_angle(
                vec3(positions[corner_verts[prev] as usize]),
                vec3(positions[corner_verts[c] as usize]),
                vec3(positions[corner_verts[next] as usize]),
            );
            normals[corner_verts[c] as usize] += normal * angle;
        }
    }
    normals
        .into_iter()
        .map(|n| n.try_normalize(f32::EPSILON).unwrap_or_else(Vec3::z))
        .collect()
}

pub(super) fn positions(ctx: &ExtractContext<'_>) -> Buffer {
    let mesh = ctx.mesh;
    let domain = RenderVerts::of(mesh);
    let data = ctx.fill(domain.len(), |rv| {
        mesh.positions()[domain.source(mesh, rv).vertex(mesh) as usize]
    });
    Buffer::from_elements(BufferSlot::Vertex(VboKind::Position), &data)
}

/// Smooth vertex normals, except corners touching a sharp edge which use the face normal.
pub(super) fn corner_normals(ctx: &ExtractContext<'_>) -> Buffer {
    let mesh = ctx.mesh;
    let domain = RenderVerts::of(mesh);
    let faces = face_normals(mesh);
    let verts = vertex_normal_table(mesh, &faces);
    let marks = mesh.edge_marks();
    let data = ctx.fill(domain.len(), |rv| {
        let source = domain.source(mesh, rv);
        let normal = match source {
            RenderVert::Corner(c) => {
                let face = mesh.corner_face(c);
                let corners = mesh.face_corners(face);
                let prev = if c == corners.start { corners.end - 1 } else { c - 1 };
                let sharp = marks.is_sharp(mesh.corner_edges()[c])
                    || marks.is_sharp(mesh.corner_edges()[prev]);
                if sharp {
                    faces[face]
                } else {
                    verts[mesh.corner_verts()[c] as usize]
                }
            }
            _ => verts[source.vertex(mesh) as usize],
        };
        [normal.x, normal.y, normal.z]
    });
    Buffer::from_elements(BufferSlot::Vertex(VboKind::CornerNormal), &data)
}

pub(super) fn vertex_normals(ctx: &ExtractContext<'_>) -> Buffer {
    let mesh = ctx.mesh;
    let domain = RenderVerts::of(mesh);
    let verts = vertex_normal_table(mesh, &face_normals(mesh));
    let data = ctx.fill(domain.len(), |rv| {
        let n = verts[domain.source(mesh, rv).vertex(mesh) as usize];
        [n.x, n.y, n.z]
    });
    Buffer::from_elements(BufferSlot::Vertex(VboKind::VertexNormal), &data)
}

pub(super) fn orco(ctx: &ExtractContext<'_>) -> Option<Buffer> {
    let mesh = ctx.mesh;
    let orco = mesh.orco()?;
    let domain = RenderVerts::of(mesh);
    let data = ctx.fill(domain.len(), |rv| {
        orco[domain.source(mesh, rv).vertex(mesh) as usize]
    });
    Some(Buffer::from_elements(BufferSlot::Vertex(VboKind::Orco), &data))
}

pub(super) fn viewer_attribute(ctx: &ExtractContext<'_>) -> Option<Buffer> {
    let mesh = ctx.mesh;
    let values = mesh.viewer_attribute()?;
    let domain = RenderVerts::of(mesh);
    let data = ctx.fill(domain.len(), |rv| {
        values[domain.source(mesh, rv).vertex(mesh) as usize]
    });
    Some(Buffer::from_elements(BufferSlot::Vertex(VboKind::AttrViewer), &data))
}

/// Sculpt mask plus a face-set color (white: no face sets are stored on the mesh).
pub(super) fn sculpt_data(ctx: &ExtractContext<'_>) -> Option<Buffer> {
    let mesh = ctx.mesh;
    let mask = mesh.sculpt_mask()?;
    let domain = RenderVerts::of(mesh);
    let data = ctx.fill(domain.len(), |rv| {
        [mask[domain.source(mesh, rv).vertex(mesh) as usize], 1.0, 1.0, 1.0]
    });
    Some(Buffer::from_elements(BufferSlot::Vertex(VboKind::SculptData), &data))
}

#[cfg(test)]
mod tests {
    use meshdraw_core::mesh::generators::{generate_cube, generate_grid};
    use meshdraw_core::mesh::EdgeMarks;

    use super::super::test_support::Fixture;
    use super::*;

    #[test]
    fn test_positions_follow_corners() {
        let fixture = Fixture::new();
        let mesh = generate_grid(1, 1, 2.0);
        let buffer = positions(&fixture.ctx(&mesh));
        let data = buffer.as_slice::<[f32; 3]>().unwrap();
        for (c, &v) in mesh.corner_verts().iter().enumerate() {
            assert_eq!(data[c], mesh.positions()[v as usize]);
        }
    }

    #[test]
    fn test_flat_grid_normals_point_up() {
        let fixture = Fixture::new();
        let mesh = generate_grid(2, 2, 1.0);
        let buffer = corner_normals(&fixture.ctx(&mesh));
        for n in buffer.as_slice::<[f32; 3]>().unwrap() {
            assert!((n[2] - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_sharp_edges_use_face_normals() {
        let fixture = Fixture::new();
        let cube = generate_cube(2.0);
        let sharp = cube.clone().with_edge_marks(EdgeMarks {
            sharp: vec![true; cube.edge_count()],
            ..Default::default()
        });
        let smooth_n = corner_normals(&fixture.ctx(&cube));
        let sharp_n = corner_normals(&fixture.ctx(&sharp));

        let first_smooth = smooth_n.as_slice::<[f32; 3]>().unwrap()[0];
        let first_sharp = sharp_n.as_slice::<[f32; 3]>().unwrap()[0];
        // -Z face, flat normal points straight down
        assert!((first_sharp[2] + 1.0).abs() < 1e-5);
        assert!(first_smooth[2] > -0.99);
    }
}
