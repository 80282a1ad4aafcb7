//! Source mesh data.
//!
//! This module provides:
//! - [`PrimitiveTopology`] - How vertices are assembled into primitives
//! - [`IndexFormat`] - Index data format (u16 or u32)
//! - [`SourceMesh`] - One mesh data-block instance (original or evaluated)
//! - [`MeshError`] - Validation errors for malformed meshes

use std::collections::{BTreeSet, HashMap};

use crate::id::MeshId;

use super::attributes::{EdgeMarks, EditState, SelectionLayers, UvLayer, VertexGroups};

/// Primitive topology describing how vertices are assembled into primitives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PrimitiveTopology {
    /// Each vertex is a separate point.
    PointList,
    /// Every two vertices form a line.
    LineList,
    /// Vertices form a connected strip of lines.
    LineStrip,
    /// Every four vertices form a line with its two neighbours (edge detection).
    LineListAdjacency,
    /// Every three vertices form a triangle.
    #[default]
    TriangleList,
    /// Vertices form a connected strip of triangles.
    TriangleStrip,
}

impl PrimitiveTopology {
    /// Get the number of vertices per primitive (for non-strip topologies).
    pub fn vertices_per_primitive(&self) -> Option<u32> {
        match self {
            Self::PointList => Some(1),
            Self::LineList => Some(2),
            Self::LineListAdjacency => Some(4),
            Self::TriangleList => Some(3),
            Self::LineStrip | Self::TriangleStrip => None,
        }
    }
}

/// Index format for indexed drawing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum IndexFormat {
    /// 16-bit unsigned integers (max 65535 vertices).
    Uint16,
    /// 32-bit unsigned integers.
    #[default]
    Uint32,
}

impl IndexFormat {
    /// Get the size in bytes of each index.
    pub fn size(&self) -> usize {
        match self {
            Self::Uint16 => 2,
            Self::Uint32 => 4,
        }
    }
}

/// Errors reported by [`SourceMesh::validate`].
#[derive(Debug, Clone, PartialEq)]
pub enum MeshError {
    /// A corner or edge references a vertex that does not exist.
    CornerOutOfRange { corner: usize, vertex: u32 },
    /// A face has fewer than three corners.
    FaceTooSmall { face: usize, corners: usize },
    /// An attribute layer does not match the size of its domain.
    AttributeLength {
        name: String,
        expected: usize,
        actual: usize,
    },
    /// A face references a material slot past the slot count.
    MaterialOutOfRange { face: usize, material: u32 },
}

impl std::fmt::Display for MeshError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CornerOutOfRange { corner, vertex } => {
                write!(f, "corner {corner} references missing vertex {vertex}")
            }
            Self::FaceTooSmall { face, corners } => {
                write!(f, "face {face} has only {corners} corners")
            }
            Self::AttributeLength {
                name,
                expected,
                actual,
            } => write!(
                f,
                "attribute '{name}' has {actual} elements, expected {expected}"
            ),
            Self::MaterialOutOfRange { face, material } => {
                write!(f, "face {face} uses missing material slot {material}")
            }
        }
    }
}

impl std::error::Error for MeshError {}

/// One mesh data-block instance.
///
/// Faces are stored as offsets into a flat corner array; each corner names a
/// vertex. Edges are derived from the faces at construction, extra edges that
/// belong to no face are kept as loose edges. Triangulation, corner-to-edge
/// mapping and loose element lists are derived data, recomputed whenever the
/// topology changes.
///
/// An evaluated copy keeps a link to the mesh it was evaluated from through
/// [`original_id`](Self::original_id).
#[derive(Clone)]
pub struct SourceMesh {
    id: MeshId,
    original: Option<MeshId>,
    positions: Vec<[f32; 3]>,
    edges: Vec<[u32; 2]>,
    face_offsets: Vec<u32>,
    corner_verts: Vec<u32>,
    material_indices: Vec<u32>,
    material_count: u32,
    uv_layers: Vec<UvLayer>,
    active_uv: Option<usize>,
    vertex_groups: VertexGroups,
    selection: SelectionLayers,
    edge_marks: EdgeMarks,
    paint_mask: Vec<bool>,
    viewer: Option<Vec<f32>>,
    skin_roots: Option<Vec<bool>>,
    sculpt_mask: Option<Vec<f32>>,
    orco: Option<Vec<[f32; 3]>>,
    edit: Option<EditState>,
    label: Option<String>,

    corner_edges: Vec<u32>,
    corner_tris: Vec<[u32; 3]>,
    tri_faces: Vec<u32>,
    loose_edges: Vec<u32>,
    loose_verts: Vec<u32>,
}

impl SourceMesh {
    /// Create an empty mesh (no points, no faces, one material slot).
    pub fn new() -> Self {
        Self {
            id: MeshId::next(),
            original: None,
            positions: Vec::new(),
            edges: Vec::new(),
            face_offsets: vec![0],
            corner_verts: Vec::new(),
            material_indices: Vec::new(),
            material_count: 1,
            uv_layers: Vec::new(),
            active_uv: None,
            vertex_groups: VertexGroups::default(),
            selection: SelectionLayers::default(),
            edge_marks: EdgeMarks::default(),
            paint_mask: Vec::new(),
            viewer: None,
            skin_roots: None,
            sculpt_mask: None,
            orco: None,
            edit: None,
            label: None,
            corner_edges: Vec::new(),
            corner_tris: Vec::new(),
            tri_faces: Vec::new(),
            loose_edges: Vec::new(),
            loose_verts: Vec::new(),
        }
    }

    /// Create a mesh from positions and polygons given as vertex loops.
    pub fn from_polygons(positions: Vec<[f32; 3]>, faces: &[&[u32]]) -> Self {
        let mut mesh = Self::new();
        mesh.positions = positions;
        for face in faces {
            mesh.corner_verts.extend_from_slice(face);
            mesh.face_offsets.push(mesh.corner_verts.len() as u32);
        }
        mesh.rebuild_topology(&[]);
        mesh
    }

    /// Add edges that belong to no face.
    pub fn with_loose_edges(mut self, edges: &[[u32; 2]]) -> Self {
        let mut extra = self.loose_edge_pairs();
        extra.extend_from_slice(edges);
        self.rebuild_topology(&extra);
        self
    }

    /// Set per-face material indices and the number of material slots.
    pub fn with_materials(mut self, indices: Vec<u32>, count: u32) -> Self {
        self.material_indices = indices;
        self.material_count = count.max(1);
        self
    }

    /// Append a UV layer. The first layer becomes active.
    pub fn with_uv_layer(mut self, layer: UvLayer) -> Self {
        self.uv_layers.push(layer);
        if self.active_uv.is_none() {
            self.active_uv = Some(0);
        }
        self
    }

    pub fn with_vertex_groups(mut self, groups: VertexGroups) -> Self {
        self.vertex_groups = groups;
        self
    }

    pub fn with_selection(mut self, selection: SelectionLayers) -> Self {
        self.selection = selection;
        self
    }

    pub fn with_edge_marks(mut self, marks: EdgeMarks) -> Self {
        self.edge_marks = marks;
        self
    }

    /// Per-face paint mask (face selection used by paint modes).
    pub fn with_paint_mask(mut self, mask: Vec<bool>) -> Self {
        self.paint_mask = mask;
        self
    }

    /// Per-vertex float attribute shown by the viewer overlay.
    pub fn with_viewer_attribute(mut self, values: Vec<f32>) -> Self {
        self.viewer = Some(values);
        self
    }

    pub fn with_skin_roots(mut self, roots: Vec<bool>) -> Self {
        self.skin_roots = Some(roots);
        self
    }

    pub fn with_sculpt_mask(mut self, mask: Vec<f32>) -> Self {
        self.sculpt_mask = Some(mask);
        self
    }

    /// Original (undeformed) coordinates per vertex.
    pub fn with_orco(mut self, orco: Vec<[f32; 3]>) -> Self {
        self.orco = Some(orco);
        self
    }

    /// Put the mesh in edit mode with the given wrapper state.
    pub fn with_edit_state(mut self, edit: EditState) -> Self {
        self.edit = Some(edit);
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Produce an evaluated copy: same data, fresh id, linked to this mesh's original.
    pub fn evaluated_copy(&self) -> Self {
        let mut copy = self.clone();
        copy.id = MeshId::next();
        copy.original = Some(self.original_id());
        copy
    }

    /// Replace all mesh content with `other`, keeping this mesh's identity.
    ///
    /// Used when an edit changes geometry in place; callers are expected to
    /// follow up with a full dirty tag on the render cache.
    pub fn replace_data(&mut self, other: SourceMesh) {
        let id = self.id;
        let original = self.original;
        *self = other;
        self.id = id;
        self.original = original;
    }

    /// Move vertex positions without changing topology.
    pub fn set_positions(&mut self, positions: Vec<[f32; 3]>) {
        debug_assert_eq!(positions.len(), self.positions.len());
        self.positions = positions;
    }

    pub fn set_edit_state(&mut self, edit: Option<EditState>) {
        self.edit = edit;
    }

    pub fn set_active_uv(&mut self, layer: Option<usize>) {
        self.active_uv = layer.filter(|l| *l < self.uv_layers.len());
    }

    pub fn selection_mut(&mut self) -> &mut SelectionLayers {
        &mut self.selection
    }

    pub fn vertex_groups_mut(&mut self) -> &mut VertexGroups {
        &mut self.vertex_groups
    }

    pub fn uv_layers_mut(&mut self) -> &mut Vec<UvLayer> {
        &mut self.uv_layers
    }

    pub fn paint_mask_mut(&mut self) -> &mut Vec<bool> {
        &mut self.paint_mask
    }

    // Accessors

    #[inline]
    pub fn id(&self) -> MeshId {
        self.id
    }

    /// Id of the original mesh (this mesh's own id when it is an original).
    #[inline]
    pub fn original_id(&self) -> MeshId {
        self.original.unwrap_or(self.id)
    }

    #[inline]
    pub fn is_evaluated(&self) -> bool {
        self.original.is_some()
    }

    #[inline]
    pub fn vert_count(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    #[inline]
    pub fn face_count(&self) -> usize {
        self.face_offsets.len() - 1
    }

    #[inline]
    pub fn corner_count(&self) -> usize {
        self.corner_verts.len()
    }

    #[inline]
    pub fn tri_count(&self) -> usize {
        self.corner_tris.len()
    }

    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    pub fn edges(&self) -> &[[u32; 2]] {
        &self.edges
    }

    pub fn corner_verts(&self) -> &[u32] {
        &self.corner_verts
    }

    /// Edge index of the edge leaving each corner towards the next corner of its face.
    pub fn corner_edges(&self) -> &[u32] {
        &self.corner_edges
    }

    /// Corner index range of a face.
    #[inline]
    pub fn face_corners(&self, face: usize) -> std::ops::Range<usize> {
        self.face_offsets[face] as usize..self.face_offsets[face + 1] as usize
    }

    /// Face that owns `corner`.
    pub fn corner_face(&self, corner: usize) -> usize {
        self.face_offsets.partition_point(|&o| o as usize <= corner) - 1
    }

    /// Edge indices around a face, in corner order.
    pub fn face_edges(&self, face: usize) -> &[u32] {
        &self.corner_edges[self.face_corners(face)]
    }

    /// Fan triangulation of every face, as corner indices.
    pub fn corner_tris(&self) -> &[[u32; 3]] {
        &self.corner_tris
    }

    /// Face of each triangle in [`corner_tris`](Self::corner_tris).
    pub fn corner_tri_faces(&self) -> &[u32] {
        &self.tri_faces
    }

    /// Edges not used by any face.
    pub fn loose_edges(&self) -> &[u32] {
        &self.loose_edges
    }

    /// Vertices not used by any edge.
    pub fn loose_verts(&self) -> &[u32] {
        &self.loose_verts
    }

    /// Material slot of a face (0 when no material indices are stored).
    #[inline]
    pub fn face_material(&self, face: usize) -> u32 {
        self.material_indices.get(face).copied().unwrap_or(0)
    }

    pub fn material_count(&self) -> u32 {
        self.material_count
    }

    /// Material slots actually used by faces, ascending.
    pub fn materials_used(&self) -> BTreeSet<u32> {
        (0..self.face_count()).map(|f| self.face_material(f)).collect()
    }

    pub fn uv_layers(&self) -> &[UvLayer] {
        &self.uv_layers
    }

    pub fn active_uv(&self) -> Option<usize> {
        self.active_uv
    }

    pub fn uv_layer_index(&self, name: &str) -> Option<usize> {
        self.uv_layers.iter().position(|l| l.name == name)
    }

    pub fn vertex_groups(&self) -> &VertexGroups {
        &self.vertex_groups
    }

    pub fn selection(&self) -> &SelectionLayers {
        &self.selection
    }

    pub fn edge_marks(&self) -> &EdgeMarks {
        &self.edge_marks
    }

    pub fn is_face_paint_masked(&self, face: usize) -> bool {
        self.paint_mask.get(face).copied().unwrap_or(false)
    }

    pub fn viewer_attribute(&self) -> Option<&[f32]> {
        self.viewer.as_deref()
    }

    pub fn skin_roots(&self) -> Option<&[bool]> {
        self.skin_roots.as_deref()
    }

    pub fn sculpt_mask(&self) -> Option<&[f32]> {
        self.sculpt_mask.as_deref()
    }

    pub fn orco(&self) -> Option<&[[f32; 3]]> {
        self.orco.as_deref()
    }

    pub fn edit_state(&self) -> Option<EditState> {
        self.edit
    }

    #[inline]
    pub fn is_editmode(&self) -> bool {
        self.edit.is_some()
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Check that every index and attribute layer matches the topology.
    pub fn validate(&self) -> Result<(), MeshError> {
        let verts = self.vert_count();
        for (corner, &v) in self.corner_verts.iter().enumerate() {
            if v as usize >= verts {
                return Err(MeshError::CornerOutOfRange { corner, vertex: v });
            }
        }
        for edge in &self.edges {
            if let Some(&v) = edge.iter().find(|&&v| v as usize >= verts) {
                return Err(MeshError::CornerOutOfRange {
                    corner: usize::MAX,
                    vertex: v,
                });
            }
        }
        for face in 0..self.face_count() {
            let corners = self.face_corners(face).len();
            if corners < 3 {
                return Err(MeshError::FaceTooSmall { face, corners });
            }
            let material = self.face_material(face);
            if material >= self.material_count {
                return Err(MeshError::MaterialOutOfRange { face, material });
            }
        }

        let corners = self.corner_count();
        for layer in &self.uv_layers {
            check_len(&layer.name, corners, layer.uvs.len())?;
        }
        if !self.material_indices.is_empty() {
            check_len("material_index", self.face_count(), self.material_indices.len())?;
        }
        if let Some(values) = &self.viewer {
            check_len("viewer", verts, values.len())?;
        }
        if let Some(roots) = &self.skin_roots {
            check_len("skin_root", verts, roots.len())?;
        }
        if let Some(mask) = &self.sculpt_mask {
            check_len("sculpt_mask", verts, mask.len())?;
        }
        if let Some(orco) = &self.orco {
            check_len("orco", verts, orco.len())?;
        }
        if self.vertex_groups.weight_table_len() > verts {
            return Err(MeshError::AttributeLength {
                name: "vertex_weights".into(),
                expected: verts,
                actual: self.vertex_groups.weight_table_len(),
            });
        }
        Ok(())
    }

    fn loose_edge_pairs(&self) -> Vec<[u32; 2]> {
        self.loose_edges
            .iter()
            .map(|&e| self.edges[e as usize])
            .collect()
    }

    /// Derive edges, corner edges, triangles and loose elements from faces.
    fn rebuild_topology(&mut self, extra_edges: &[[u32; 2]]) {
        let mut lookup: HashMap<(u32, u32), u32> = HashMap::new();
        let mut edges = Vec::new();
        let mut edge_index = |a: u32, b: u32, edges: &mut Vec<[u32; 2]>| -> u32 {
            let key = (a.min(b), a.max(b));
            *lookup.entry(key).or_insert_with(|| {
                edges.push([a, b]);
                (edges.len() - 1) as u32
            })
        };

        let mut corner_edges = vec![0; self.corner_verts.len()];
        let mut corner_tris = Vec::new();
        let mut tri_faces = Vec::new();
        for face in 0..self.face_offsets.len() - 1 {
            let range = self.face_offsets[face] as usize..self.face_offsets[face + 1] as usize;
            let start = range.start;
            let end = range.end;
            for corner in range {
                let next = if corner + 1 == end { start } else { corner + 1 };
                corner_edges[corner] =
                    edge_index(self.corner_verts[corner], self.corner_verts[next], &mut edges);
            }
            for i in start + 1..end.saturating_sub(1) {
                corner_tris.push([start as u32, i as u32, i as u32 + 1]);
                tri_faces.push(face as u32);
            }
        }
        let face_edge_count = edges.len();
        for &[a, b] in extra_edges {
            edge_index(a, b, &mut edges);
        }

        let mut vert_used = vec![false; self.positions.len()];
        for &[a, b] in &edges {
            for v in [a, b] {
                if let Some(used) = vert_used.get_mut(v as usize) {
                    *used = true;
                }
            }
        }

        self.loose_edges = (face_edge_count as u32..edges.len() as u32).collect();
        self.loose_verts = vert_used
            .iter()
            .enumerate()
            .filter(|(_, used)| !**used)
            .map(|(v, _)| v as u32)
            .collect();
        self.edges = edges;
        self.corner_edges = corner_edges;
        self.corner_tris = corner_tris;
        self.tri_faces = tri_faces;
    }
}

fn check_len(name: &str, expected: usize, actual: usize) -> Result<(), MeshError> {
    if expected == actual {
        Ok(())
    } else {
        Err(MeshError::AttributeLength {
            name: name.to_string(),
            expected,
            actual,
        })
    }
}

impl Default for SourceMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SourceMesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SourceMesh")
            .field("id", &self.id)
            .field("original", &self.original)
            .field("label", &self.label)
            .field("verts", &self.positions.len())
            .field("edges", &self.edges.len())
            .field("faces", &self.face_count())
            .field("materials", &self.material_count)
            .field("uv_layers", &self.uv_layers.len())
            .field("editmode", &self.edit.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> SourceMesh {
        SourceMesh::from_polygons(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.0],
            ],
            &[&[0, 1, 2, 3]],
        )
    }

    #[test]
    fn test_primitive_topology_vertices() {
        assert_eq!(
            PrimitiveTopology::PointList.vertices_per_primitive(),
            Some(1)
        );
        assert_eq!(
            PrimitiveTopology::LineListAdjacency.vertices_per_primitive(),
            Some(4)
        );
        assert_eq!(
            PrimitiveTopology::TriangleStrip.vertices_per_primitive(),
            None
        );
    }

    #[test]
    fn test_index_format_size() {
        assert_eq!(IndexFormat::Uint16.size(), 2);
        assert_eq!(IndexFormat::Uint32.size(), 4);
    }

    #[test]
    fn test_quad_topology() {
        let mesh = quad();
        assert_eq!(mesh.vert_count(), 4);
        assert_eq!(mesh.edge_count(), 4);
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.corner_count(), 4);
        assert_eq!(mesh.corner_tris(), &[[0, 1, 2], [0, 2, 3]]);
        assert_eq!(mesh.corner_tri_faces(), &[0, 0]);
        assert!(mesh.loose_edges().is_empty());
        assert!(mesh.loose_verts().is_empty());
        assert!(mesh.validate().is_ok());
    }

    #[test]
    fn test_shared_edges_are_deduplicated() {
        let mesh = SourceMesh::from_polygons(
            vec![[0.0; 3], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
            &[&[0, 1, 2], &[0, 2, 3]],
        );
        assert_eq!(mesh.edge_count(), 5);
        assert_eq!(mesh.corner_face(4), 1);
        assert_eq!(mesh.face_edges(1).len(), 3);
    }

    #[test]
    fn test_loose_elements() {
        let mut positions = quad().positions().to_vec();
        positions.push([2.0, 0.0, 0.0]);
        positions.push([3.0, 0.0, 0.0]);
        positions.push([5.0, 5.0, 5.0]);
        let mesh = SourceMesh::from_polygons(positions, &[&[0, 1, 2, 3]])
            .with_loose_edges(&[[4, 5]]);

        assert_eq!(mesh.edge_count(), 5);
        assert_eq!(mesh.loose_edges(), &[4]);
        assert_eq!(mesh.loose_verts(), &[6]);
    }

    #[test]
    fn test_validate_rejects_bad_corner() {
        let mesh = SourceMesh::from_polygons(vec![[0.0; 3]; 3], &[&[0, 1, 7]]);
        assert!(matches!(
            mesh.validate(),
            Err(MeshError::CornerOutOfRange { vertex: 7, .. })
        ));
    }

    #[test]
    fn test_validate_rejects_short_uv_layer() {
        let mesh = quad().with_uv_layer(UvLayer::new("uv", vec![[0.0, 0.0]; 3]));
        let err = mesh.validate().unwrap_err();
        assert!(err.to_string().contains("'uv'"));
    }

    #[test]
    fn test_evaluated_copy_links_original() {
        let original = quad();
        let evaluated = original.evaluated_copy();
        let again = evaluated.evaluated_copy();

        assert_ne!(evaluated.id(), original.id());
        assert_eq!(evaluated.original_id(), original.id());
        assert_eq!(again.original_id(), original.id());
        assert!(!original.is_evaluated());
    }

    #[test]
    fn test_replace_data_keeps_identity() {
        let mut mesh = SourceMesh::new();
        let id = mesh.id();
        mesh.replace_data(quad());
        assert_eq!(mesh.id(), id);
        assert_eq!(mesh.face_count(), 1);
    }

    #[test]
    fn test_materials_used() {
        let mesh = SourceMesh::from_polygons(
            vec![[0.0; 3]; 4],
            &[&[0, 1, 2], &[0, 2, 3]],
        )
        .with_materials(vec![2, 0], 3);
        assert_eq!(mesh.materials_used().into_iter().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn test_material_count_is_at_least_one() {
        assert_eq!(SourceMesh::new().material_count(), 1);
        let mesh = SourceMesh::new().with_materials(Vec::new(), 0);
        assert_eq!(mesh.material_count(), 1);
    }
}
