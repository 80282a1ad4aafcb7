//! Mesh generators for common shapes.
//!
//! Every generator returns a valid [`SourceMesh`] with one UV layer named
//! `"UVMap"`, suitable as fixture data for the render cache.

use super::attributes::UvLayer;
use super::data::SourceMesh;

/// Name of the UV layer added by the generators.
pub const DEFAULT_UV_NAME: &str = "UVMap";

/// Generate a flat grid of `nx * ny` quads in the XY plane, centered on the origin.
pub fn generate_grid(nx: u32, ny: u32, size: f32) -> SourceMesh {
    let nx = nx.max(1);
    let ny = ny.max(1);
    let mut positions = Vec::with_capacity(((nx + 1) * (ny + 1)) as usize);
    for y in 0..=ny {
        for x in 0..=nx {
            positions.push([
                (x as f32 / nx as f32 - 0.5) * size,
                (y as f32 / ny as f32 - 0.5) * size,
                0.0,
            ]);
        }
    }

    let mut faces = Vec::with_capacity((nx * ny) as usize);
    for y in 0..ny {
        for x in 0..nx {
            let a = y * (nx + 1) + x;
            let b = a + 1;
            let c = b + nx + 1;
            let d = a + nx + 1;
            faces.push([a, b, c, d]);
        }
    }
    let face_refs: Vec<&[u32]> = faces.iter().map(|f| f.as_slice()).collect();

    let mesh = SourceMesh::from_polygons(positions, &face_refs);
    let uvs = mesh
        .corner_verts()
        .iter()
        .map(|&v| {
            let x = v % (nx + 1);
            let y = v / (nx + 1);
            [x as f32 / nx as f32, y as f32 / ny as f32]
        })
        .collect();
    mesh.with_uv_layer(UvLayer::new(DEFAULT_UV_NAME, uvs))
        .with_label("grid")
}

/// Generate an axis-aligned cube with 8 shared vertices and 6 quads.
///
/// Each face maps to the full UV square.
pub fn generate_cube(size: f32) -> SourceMesh {
    let h = size * 0.5;
    let positions = vec![
        [-h, -h, -h],
        [h, -h, -h],
        [h, h, -h],
        [-h, h, -h],
        [-h, -h, h],
        [h, -h, h],
        [h, h, h],
        [-h, h, h],
    ];
    let faces: [&[u32]; 6] = [
        &[0, 3, 2, 1], // -Z
        &[4, 5, 6, 7], // +Z
        &[0, 1, 5, 4], // -Y
        &[2, 3, 7, 6], // +Y
        &[1, 2, 6, 5], // +X
        &[3, 0, 4, 7], // -X
    ];
    let mesh = SourceMesh::from_polygons(positions, &faces);
    let square = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
    let uvs = (0..mesh.corner_count()).map(|c| square[c % 4]).collect();
    mesh.with_uv_layer(UvLayer::new(DEFAULT_UV_NAME, uvs))
        .with_label("cube")
}

/// Generate `n` disconnected line segments along X, with no faces.
///
/// The UV layer is present but empty since there are no corners.
pub fn generate_loose_edges(n: u32) -> SourceMesh {
    let mut positions = Vec::with_capacity(2 * n as usize);
    let mut edges = Vec::with_capacity(n as usize);
    for i in 0..n {
        let x = i as f32;
        positions.push([x, 0.0, 0.0]);
        positions.push([x, 1.0, 0.0]);
        edges.push([2 * i, 2 * i + 1]);
    }
    SourceMesh::from_polygons(positions, &[])
        .with_loose_edges(&edges)
        .with_uv_layer(UvLayer::new(DEFAULT_UV_NAME, Vec::new()))
        .with_label("loose_edges")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_counts() {
        let mesh = generate_grid(3, 2, 1.0);
        assert_eq!(mesh.vert_count(), 12);
        assert_eq!(mesh.face_count(), 6);
        assert_eq!(mesh.corner_count(), 24);
        assert_eq!(mesh.tri_count(), 12);
        assert_eq!(mesh.edge_count(), 3 * 3 + 4 * 2);
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_cube_is_closed() {
        let mesh = generate_cube(2.0);
        assert_eq!(mesh.vert_count(), 8);
        assert_eq!(mesh.edge_count(), 12);
        assert_eq!(mesh.face_count(), 6);
        assert!(mesh.loose_edges().is_empty());
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_loose_edges_have_no_faces() {
        let mesh = generate_loose_edges(3);
        assert_eq!(mesh.face_count(), 0);
        assert_eq!(mesh.loose_edges().len(), 3);
        assert!(mesh.loose_verts().is_empty());
        assert!(mesh.validate().is_ok());
    }
}
