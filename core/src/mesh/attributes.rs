//! Attribute layers carried by a [`SourceMesh`](super::SourceMesh).
//!
//! All per-element layers are optional in spirit: an empty layer reads as
//! "all default" (unselected, visible, zero weight), so meshes only pay for
//! what they use.

/// A named per-corner UV layer.
#[derive(Debug, Clone, PartialEq)]
pub struct UvLayer {
    /// Layer name, unique within a mesh.
    pub name: String,
    /// One coordinate per face corner.
    pub uvs: Vec<[f32; 2]>,
}

impl UvLayer {
    pub fn new(name: impl Into<String>, uvs: Vec<[f32; 2]>) -> Self {
        Self {
            name: name.into(),
            uvs,
        }
    }
}

/// Deform vertex groups: names, per-vertex weights and the active group.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VertexGroups {
    names: Vec<String>,
    /// Sparse `(group, weight)` pairs per vertex.
    weights: Vec<Vec<(u32, f32)>>,
    active: Option<usize>,
}

impl VertexGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a group and return its index.
    pub fn add_group(&mut self, name: impl Into<String>) -> usize {
        self.names.push(name.into());
        if self.active.is_none() {
            self.active = Some(self.names.len() - 1);
        }
        self.names.len() - 1
    }

    /// Assign `weight` for `vertex` in `group`, growing the weight table as needed.
    pub fn set_weight(&mut self, vertex: u32, group: u32, weight: f32) {
        let vertex = vertex as usize;
        if self.weights.len() <= vertex {
            self.weights.resize_with(vertex + 1, Vec::new);
        }
        let entry = &mut self.weights[vertex];
        match entry.iter_mut().find(|(g, _)| *g == group) {
            Some((_, w)) => *w = weight,
            None => entry.push((group, weight)),
        }
    }

    /// Weight of `vertex` in `group`, zero when unassigned.
    pub fn weight(&self, vertex: u32, group: u32) -> f32 {
        self.weights
            .get(vertex as usize)
            .and_then(|w| w.iter().find(|(g, _)| *g == group))
            .map_or(0.0, |(_, w)| *w)
    }

    /// All `(group, weight)` pairs of a vertex.
    pub fn vertex_weights(&self, vertex: u32) -> &[(u32, f32)] {
        self.weights
            .get(vertex as usize)
            .map_or(&[], |w| w.as_slice())
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn active(&self) -> Option<usize> {
        self.active
    }

    pub fn set_active(&mut self, group: Option<usize>) {
        self.active = group.filter(|g| *g < self.names.len());
    }

    pub(crate) fn weight_table_len(&self) -> usize {
        self.weights.len()
    }
}

/// Selection and visibility state of mesh elements.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SelectionLayers {
    pub vert_select: Vec<bool>,
    pub edge_select: Vec<bool>,
    pub face_select: Vec<bool>,
    pub vert_hide: Vec<bool>,
    pub face_hide: Vec<bool>,
    /// Per-corner UV selection.
    pub uv_select: Vec<bool>,
    pub active_vert: Option<u32>,
    pub active_edge: Option<u32>,
    pub active_face: Option<u32>,
}

#[inline]
fn flag(layer: &[bool], index: u32) -> bool {
    layer.get(index as usize).copied().unwrap_or(false)
}

impl SelectionLayers {
    pub fn is_vert_selected(&self, v: u32) -> bool {
        flag(&self.vert_select, v)
    }

    pub fn is_edge_selected(&self, e: u32) -> bool {
        flag(&self.edge_select, e)
    }

    pub fn is_face_selected(&self, f: u32) -> bool {
        flag(&self.face_select, f)
    }

    pub fn is_vert_hidden(&self, v: u32) -> bool {
        flag(&self.vert_hide, v)
    }

    pub fn is_face_hidden(&self, f: u32) -> bool {
        flag(&self.face_hide, f)
    }

    pub fn is_uv_selected(&self, corner: u32) -> bool {
        flag(&self.uv_select, corner)
    }

    /// Select every face of a mesh with `face_count` faces.
    pub fn select_all_faces(&mut self, face_count: usize) {
        self.face_select = vec![true; face_count];
    }
}

/// Per-edge marks used by edit overlays.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeMarks {
    pub seam: Vec<bool>,
    pub sharp: Vec<bool>,
    /// Crease weight in `[0, 1]`.
    pub crease: Vec<f32>,
}

impl EdgeMarks {
    pub fn is_seam(&self, e: u32) -> bool {
        flag(&self.seam, e)
    }

    pub fn is_sharp(&self, e: u32) -> bool {
        flag(&self.sharp, e)
    }

    pub fn crease(&self, e: u32) -> f32 {
        self.crease.get(e as usize).copied().unwrap_or(0.0)
    }
}

/// Edit-mode wrapper state of an evaluated mesh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditState {
    /// The mesh wraps the original edit mesh directly (no modifiers applied).
    pub is_original: bool,
    /// Evaluated elements can be mapped back to edit-mesh elements.
    pub mapping_valid: bool,
}

impl Default for EditState {
    fn default() -> Self {
        Self {
            is_original: true,
            mapping_valid: true,
        }
    }
}
