//! Scene objects and the tool settings that affect how their meshes are drawn.

use crate::id::{MeshId, ObjectId};

/// Interaction mode of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ObjectMode {
    #[default]
    Object,
    Edit,
    Sculpt,
    VertexPaint,
    WeightPaint,
    TexturePaint,
}

impl ObjectMode {
    /// Modes that draw paint overlays (face masks, weights).
    pub fn is_paint(self) -> bool {
        matches!(
            self,
            Self::VertexPaint | Self::WeightPaint | Self::TexturePaint
        )
    }
}

/// How zero weights are highlighted in weight display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WeightAlertMode {
    #[default]
    None,
    /// Highlight vertices with zero weight in the active group.
    Active,
    /// Highlight vertices with zero weight in every group.
    All,
}

/// Scene-wide tool options consulted while building buffers.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ToolSettings {
    /// Paint several selected groups at once.
    pub multipaint: bool,
    pub auto_normalize: bool,
    /// Show weights relative to the unlocked groups.
    pub lock_relative: bool,
    pub weight_alert: WeightAlertMode,
    /// UV editor selection follows mesh selection.
    pub uv_select_sync: bool,
}

impl ToolSettings {
    pub fn with_multipaint(mut self, enabled: bool) -> Self {
        self.multipaint = enabled;
        self
    }

    pub fn with_auto_normalize(mut self, enabled: bool) -> Self {
        self.auto_normalize = enabled;
        self
    }

    pub fn with_lock_relative(mut self, enabled: bool) -> Self {
        self.lock_relative = enabled;
        self
    }

    pub fn with_weight_alert(mut self, mode: WeightAlertMode) -> Self {
        self.weight_alert = mode;
        self
    }

    pub fn with_uv_select_sync(mut self, enabled: bool) -> Self {
        self.uv_select_sync = enabled;
        self
    }
}

/// A user-facing object instancing a mesh.
///
/// Evaluated objects point back to the original object they were evaluated
/// from, the same way evaluated meshes do.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneObject {
    id: ObjectId,
    original: Option<ObjectId>,
    mesh: MeshId,
    pub mode: ObjectMode,
    /// Per vertex group: selected for multi-paint.
    pub group_selected: Vec<bool>,
    /// Per vertex group: locked against painting.
    pub group_locked: Vec<bool>,
    /// Per vertex group: deforming group (bound to a bone).
    pub group_deform: Vec<bool>,
    /// Paint modes only affect selected faces.
    pub face_selection_masking: bool,
}

impl SceneObject {
    pub fn new(mesh: MeshId) -> Self {
        Self {
            id: ObjectId::next(),
            original: None,
            mesh,
            mode: ObjectMode::Object,
            group_selected: Vec::new(),
            group_locked: Vec::new(),
            group_deform: Vec::new(),
            face_selection_masking: false,
        }
    }

    pub fn with_mode(mut self, mode: ObjectMode) -> Self {
        self.mode = mode;
        self
    }

    /// Evaluated copy of this object, drawing `mesh`.
    pub fn evaluated_copy(&self, mesh: MeshId) -> Self {
        let mut copy = self.clone();
        copy.id = ObjectId::next();
        copy.original = Some(self.original_id());
        copy.mesh = mesh;
        copy
    }

    #[inline]
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Id of the original, user-facing object.
    #[inline]
    pub fn original_id(&self) -> ObjectId {
        self.original.unwrap_or(self.id)
    }

    #[inline]
    pub fn mesh(&self) -> MeshId {
        self.mesh
    }

    pub fn is_group_selected(&self, group: usize) -> bool {
        self.group_selected.get(group).copied().unwrap_or(false)
    }

    pub fn is_group_locked(&self, group: usize) -> bool {
        self.group_locked.get(group).copied().unwrap_or(false)
    }

    pub fn is_group_deform(&self, group: usize) -> bool {
        self.group_deform.get(group).copied().unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluated_object_keeps_original() {
        let mesh = MeshId::next();
        let object = SceneObject::new(mesh).with_mode(ObjectMode::WeightPaint);
        let eval = object.evaluated_copy(MeshId::next());
        let eval2 = eval.evaluated_copy(MeshId::next());

        assert_eq!(eval.original_id(), object.id());
        assert_eq!(eval2.original_id(), object.id());
        assert_eq!(eval.mode, ObjectMode::WeightPaint);
        assert!(eval.mode.is_paint());
    }

    #[test]
    fn test_group_flags_default_false() {
        let object = SceneObject::new(MeshId::next());
        assert!(!object.is_group_selected(2));
        assert!(!object.is_group_locked(0));
    }
}
