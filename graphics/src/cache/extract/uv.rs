//! UV layers, tangents and UV editor overlays.

use bitflags::bitflags;
use meshdraw_core::math::{Vec2, corner_angle, triangle_area, uv_triangle_area, vec2, vec3};
use meshdraw_core::mesh::{SourceMesh, UvLayer};

use crate::cache::{BufferSlot, VboKind};
use crate::resources::Buffer;

use super::{ExtractContext, RenderVert, RenderVerts};

bitflags! {
    /// Per-corner UV editor state, packed into the first byte of `EditUvData`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct UvEditFlags: u8 {
        const UV_SELECTED = 1 << 0;
        const FACE_SELECTED = 1 << 1;
        const FACE_ACTIVE = 1 << 2;
        const EDGE_SELECTED = 1 << 3;
    }
}

/// Sum of 3D and UV face areas, used to normalize stretch display.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct AreaTotals {
    pub area: f32,
    pub uv_area: f32,
}

impl AreaTotals {
    /// Totals over all faces for the active UV layer. `None` without UVs.
    pub fn compute(mesh: &SourceMesh) -> Option<Self> {
        let layer = active_layer(mesh)?;
        let mut totals = Self::default();
        for face in 0..mesh.face_count() {
            let (area, uv_area) = face_areas(mesh, layer, face);
            totals.area += area;
            totals.uv_area += uv_area;
        }
        Some(totals)
    }
}

fn active_layer(mesh: &SourceMesh) -> Option<&UvLayer> {
    mesh.uv_layers().get(mesh.active_uv()?)
}

fn face_areas(mesh: &SourceMesh, layer: &UvLayer, face: usize) -> (f32, f32) {
    let positions = mesh.positions();
    let corners = mesh.face_corners(face);
    let first = corners.start;
    let mut area = 0.0;
    let mut uv_area = 0.0;
    for c in first + 1..corners.end.saturating_sub(1) {
        let [a, b, d] = [first, c, c + 1].map(|k| positions[mesh.corner_verts()[k] as usize]);
        area += triangle_area(a, b, d);
        uv_area += uv_triangle_area(layer.uvs[first], layer.uvs[c], layer.uvs[c + 1]);
    }
    (area, uv_area)
}

/// Layers selected by `mask` that exist on the mesh, ascending.
fn used_layers<'a>(mesh: &'a SourceMesh, mask: u32) -> Vec<&'a UvLayer> {
    mesh.uv_layers()
        .iter()
        .enumerate()
        .filter(|(i, _)| *i < 32 && mask & (1 << i) != 0)
        .map(|(_, layer)| layer)
        .collect()
}

/// Faces shown in the UV editor: visible, and selected unless selection is synced.
pub(super) fn edit_uv_face(ctx: &ExtractContext<'_>, face: usize) -> bool {
    ctx.face_visible(face)
        && (!ctx.is_editmode
            || ctx.tool_settings.uv_select_sync
            || ctx.mesh.selection().is_face_selected(face as u32))
}

/// All used UV layers interleaved per render vertex. Loose elements get `[0, 0]`.
pub(super) fn uvs(ctx: &ExtractContext<'_>) -> Option<Buffer> {
    let mesh = ctx.mesh;
    let layers = used_layers(mesh, ctx.uv_layers_used);
    if layers.is_empty() {
        return None;
    }
    let domain = RenderVerts::of(mesh);
    let per_vertex: Vec<Vec<[f32; 2]>> = ctx.fill(domain.len(), |rv| {
        layers
            .iter()
            .map(|layer| match domain.source(mesh, rv) {
                RenderVert::Corner(c) => layer.uvs[c],
                _ => [0.0, 0.0],
            })
            .collect()
    });
    let flat: Vec<[f32; 2]> = per_vertex.into_iter().flatten().collect();
    Some(Buffer::from_interleaved(
        BufferSlot::Vertex(VboKind::Uvs),
        &flat,
        layers.len(),
    ))
}

/// Per-face tangents from the first used UV layer, with the bitangent sign in `w`.
pub(super) fn tangents(ctx: &ExtractContext<'_>) -> Option<Buffer> {
    let mesh = ctx.mesh;
    let layer = *used_layers(mesh, ctx.uv_layers_used).first()?;
    let positions = mesh.positions();
    let face_tangents: Vec<[f32; 4]> = (0..mesh.face_count())
        .map(|face| {
            let corners = mesh.face_corners(face);
            let c = corners.start;
            let p = |k: usize| vec3(positions[mesh.corner_verts()[k] as usize]);
            let (e1, e2) = (p(c + 1) - p(c), p(c + 2) - p(c));
            let (d1, d2) = (
                vec2(layer.uvs[c + 1]) - vec2(layer.uvs[c]),
                vec2(layer.uvs[c + 2]) - vec2(layer.uvs[c]),
            );
            let det = d1.x * d2.y - d2.x * d1.y;
            if det.abs() <= f32::EPSILON {
                return [1.0, 0.0, 0.0, 1.0];
            }
            let t = (e1 * d2.y - e2 * d1.y) / det;
            let b = (e2 * d1.x - e1 * d2.x) / det;
            let n = e1.cross(&e2);
            let sign = if n.cross(&t).dot(&b) < 0.0 { -1.0 } else { 1.0 };
            let t = t.try_normalize(f32::EPSILON).unwrap_or_else(|| vec3([1.0, 0.0, 0.0]));
            [t.x, t.y, t.z, sign]
        })
        .collect();

    let domain = RenderVerts::of(mesh);
    let data = ctx.fill(domain.len(), |rv| match domain.source(mesh, rv) {
        RenderVert::Corner(c) => face_tangents[mesh.corner_face(c)],
        _ => [0.0; 4],
    });
    Some(Buffer::from_elements(BufferSlot::Vertex(VboKind::Tangents), &data))
}

fn corner_uv_flags(ctx: &ExtractContext<'_>, corner: usize) -> UvEditFlags {
    let mesh = ctx.mesh;
    let selection = mesh.selection();
    let face = mesh.corner_face(corner) as u32;
    let mut flags = UvEditFlags::empty();
    let uv_selected = if ctx.tool_settings.uv_select_sync {
        selection.is_vert_selected(mesh.corner_verts()[corner])
    } else {
        selection.is_uv_selected(corner as u32)
    };
    flags.set(UvEditFlags::UV_SELECTED, uv_selected);
    flags.set(UvEditFlags::FACE_SELECTED, selection.is_face_selected(face));
    flags.set(UvEditFlags::FACE_ACTIVE, selection.active_face == Some(face));
    flags.set(
        UvEditFlags::EDGE_SELECTED,
        selection.is_edge_selected(mesh.corner_edges()[corner]),
    );
    flags
}

pub(super) fn edit_uv_data(ctx: &ExtractContext<'_>) -> Option<Buffer> {
    let mesh = ctx.mesh;
    active_layer(mesh)?;
    let domain = RenderVerts::of(mesh);
    let data = ctx.fill(domain.len(), |rv| match domain.source(mesh, rv) {
        RenderVert::Corner(c) => [corner_uv_flags(ctx, c).bits(), 0, 0, 0],
        _ => [0u8; 4],
    });
    Some(Buffer::from_elements(BufferSlot::Vertex(VboKind::EditUvData), &data))
}

/// Ratio of a face's UV area share to its 3D area share (1.0: no stretch).
pub(super) fn stretch_area(ctx: &ExtractContext<'_>) -> Option<Buffer> {
    let mesh = ctx.mesh;
    let layer = active_layer(mesh)?;
    let totals = ctx.area_totals.or_else(|| AreaTotals::compute(mesh))?;
    let face_ratio: Vec<f32> = (0..mesh.face_count())
        .map(|face| {
            let (area, uv_area) = face_areas(mesh, layer, face);
            if totals.area <= 0.0 || totals.uv_area <= 0.0 || area <= 0.0 {
                return 0.0;
            }
            (uv_area / totals.uv_area) / (area / totals.area)
        })
        .collect();

    let domain = RenderVerts::of(mesh);
    let data = ctx.fill(domain.len(), |rv| match domain.source(mesh, rv) {
        RenderVert::Corner(c) => face_ratio[mesh.corner_face(c)],
        _ => 0.0,
    });
    Some(Buffer::from_elements(
        BufferSlot::Vertex(VboKind::EditUvStretchArea),
        &data,
    ))
}

/// UV-space and 3D corner angles, compared by the stretch shader.
pub(super) fn stretch_angle(ctx: &ExtractContext<'_>) -> Option<Buffer> {
    let mesh = ctx.mesh;
    let layer = active_layer(mesh)?;
    let positions = mesh.positions();
    let domain = RenderVerts::of(mesh);
    let data = ctx.fill(domain.len(), |rv| {
        let RenderVert::Corner(c) = domain.source(mesh, rv) else {
            return [0.0f32; 2];
        };
        let corners = mesh.face_corners(mesh.corner_face(c));
        let prev = if c == corners.start { corners.end - 1 } else { c - 1 };
        let next = if c + 1 == corners.end { corners.start } else { c + 1 };
        let uv3 = |k: usize| {
            let uv: Vec2 = vec2(layer.uvs[k]);
            vec3([uv.x, uv.y, 0.0])
        };
        let p = |k: usize| vec3(positions[mesh.corner_verts()[k] as usize]);
        [
            corner_angle(uv3(prev), uv3(c), uv3(next)),
            corner_angle(p(prev), p(c), p(next)),
        ]
    });
    Some(Buffer::from_elements(
        BufferSlot::Vertex(VboKind::EditUvStretchAngle),
        &data,
    ))
}

/// UV centroid of every face.
pub(super) fn face_dot_uvs(ctx: &ExtractContext<'_>) -> Option<Buffer> {
    let mesh = ctx.mesh;
    let layer = active_layer(mesh)?;
    let data = ctx.fill(mesh.face_count(), |face| {
        let corners = mesh.face_corners(face);
        let n = corners.len() as f32;
        let sum = corners.fold(Vec2::zeros(), |acc, c| acc + vec2(layer.uvs[c]));
        [sum.x / n, sum.y / n]
    });
    Some(Buffer::from_elements(BufferSlot::Vertex(VboKind::FaceDotUv), &data))
}

pub(super) fn face_dot_edit_uv_data(ctx: &ExtractContext<'_>) -> Option<Buffer> {
    let mesh = ctx.mesh;
    active_layer(mesh)?;
    let selection = mesh.selection();
    let data = ctx.fill(mesh.face_count(), |face| {
        let mut flags = UvEditFlags::empty();
        flags.set(
            UvEditFlags::FACE_SELECTED,
            selection.is_face_selected(face as u32),
        );
        flags.set(
            UvEditFlags::FACE_ACTIVE,
            selection.active_face == Some(face as u32),
        );
        [flags.bits(), 0u8, 0, 0]
    });
    Some(Buffer::from_elements(
        BufferSlot::Vertex(VboKind::FaceDotEditUvData),
        &data,
    ))
}

#[cfg(test)]
mod tests {
    use meshdraw_core::mesh::generators::generate_grid;
    use meshdraw_core::mesh::{EditState, UvLayer};

    use super::super::test_support::Fixture;
    use super::*;

    #[test]
    fn test_uvs_interleave_used_layers() {
        let fixture = Fixture::new();
        let grid = generate_grid(1, 1, 1.0);
        let second = UvLayer::new("second", vec![[0.5, 0.5]; grid.corner_count()]);
        let mesh = grid.with_uv_layer(second);

        let one = uvs(&fixture.ctx(&mesh).with_uv_layers(0b01)).unwrap();
        let both = uvs(&fixture.ctx(&mesh).with_uv_layers(0b11)).unwrap();
        assert_eq!(one.len(), 4);
        assert_eq!(both.len(), 4);
        assert_eq!(both.stride(), 2 * one.stride());
        assert_eq!(both.as_slice::<[f32; 2]>().unwrap()[1], [0.5, 0.5]);
    }

    #[test]
    fn test_mask_beyond_layers_is_none() {
        let fixture = Fixture::new();
        let mesh = generate_grid(1, 1, 1.0);
        assert!(uvs(&fixture.ctx(&mesh).with_uv_layers(0b100)).is_none());
    }

    #[test]
    fn test_uniform_grid_has_no_area_stretch() {
        let fixture = Fixture::new();
        let mesh = generate_grid(2, 2, 1.0);
        let buffer = stretch_area(&fixture.ctx(&mesh)).unwrap();
        for ratio in buffer.as_slice::<f32>().unwrap() {
            assert!((ratio - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_edit_uv_faces_follow_selection() {
        let fixture = Fixture::new();
        let mut mesh = generate_grid(2, 1, 1.0).with_edit_state(EditState::default());
        mesh.selection_mut().face_select = vec![true, false];
        let ctx = fixture.ctx(&mesh);
        assert!(edit_uv_face(&ctx, 0));
        assert!(!edit_uv_face(&ctx, 1));

        let mut synced = Fixture::new();
        synced.tools.uv_select_sync = true;
        assert!(edit_uv_face(&synced.ctx(&mesh), 1));
    }

    #[test]
    fn test_area_totals() {
        let mesh = generate_grid(2, 2, 2.0);
        let totals = AreaTotals::compute(&mesh).unwrap();
        assert!((totals.area - 4.0).abs() < 1e-4);
        assert!((totals.uv_area - 1.0).abs() < 1e-4);
    }
}
