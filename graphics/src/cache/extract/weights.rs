//! Vertex group weight display.

use bitflags::bitflags;
use meshdraw_core::mesh::SourceMesh;
use meshdraw_core::object::{SceneObject, ToolSettings, WeightAlertMode};

use crate::cache::{BufferSlot, VboKind};
use crate::resources::Buffer;

use super::{ExtractContext, RenderVerts};

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct WeightFlags: u8 {
        /// Show the combined weight of all selected groups.
        const MULTIPAINT = 1 << 0;
        const AUTO_NORMALIZE = 1 << 1;
        /// Show weights relative to the unlocked groups.
        const LOCK_RELATIVE = 1 << 2;
    }
}

/// Inputs of the weight buffer that live outside the mesh.
///
/// The cache keeps the state its weight buffer was built with and drops the
/// buffer when a freshly extracted state differs.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightState {
    pub active: Option<usize>,
    pub group_count: usize,
    pub flags: WeightFlags,
    pub alert: WeightAlertMode,
    /// Per group, selected for multi-paint.
    pub selected: Vec<bool>,
    /// Per group, locked against painting.
    pub locked: Vec<bool>,
}

impl Default for WeightState {
    fn default() -> Self {
        Self {
            active: None,
            group_count: 0,
            flags: WeightFlags::empty(),
            alert: WeightAlertMode::None,
            selected: Vec::new(),
            locked: Vec::new(),
        }
    }
}

impl WeightState {
    pub fn extract(
        object: Option<&SceneObject>,
        mesh: &SourceMesh,
        tools: &ToolSettings,
        paint_mode: bool,
    ) -> Self {
        let groups = mesh.vertex_groups();
        let group_count = groups.len();
        let per_group = |f: &dyn Fn(usize) -> bool| (0..group_count).map(f).collect::<Vec<_>>();
        let selected = object.map_or_else(Vec::new, |o| per_group(&|g| o.is_group_selected(g)));
        let locked = object.map_or_else(Vec::new, |o| per_group(&|g| o.is_group_locked(g)));

        let mut flags = WeightFlags::empty();
        let selected_count = selected.iter().filter(|s| **s).count();
        flags.set(
            WeightFlags::MULTIPAINT,
            tools.multipaint && paint_mode && selected_count > 1,
        );
        flags.set(WeightFlags::AUTO_NORMALIZE, tools.auto_normalize);
        flags.set(
            WeightFlags::LOCK_RELATIVE,
            tools.lock_relative && locked.iter().any(|l| *l),
        );

        Self {
            active: groups.active(),
            group_count,
            flags,
            alert: tools.weight_alert,
            selected,
            locked,
        }
    }

    fn is_selected(&self, group: u32) -> bool {
        self.selected.get(group as usize).copied().unwrap_or(false)
    }

    fn is_locked(&self, group: u32) -> bool {
        self.locked.get(group as usize).copied().unwrap_or(false)
    }

    /// Displayed weight of one vertex, or -1.0 when the alert highlights it.
    pub fn display_weight(&self, weights: &[(u32, f32)]) -> f32 {
        let shown = if self.flags.contains(WeightFlags::MULTIPAINT) {
            let (sum, count) = weights
                .iter()
                .filter(|(g, _)| self.is_selected(*g))
                .fold((0.0f32, 0u32), |(s, n), (_, w)| (s + w, n + 1));
            if self.flags.contains(WeightFlags::AUTO_NORMALIZE) || count == 0 {
                sum
            } else {
                sum / count as f32
            }
        } else {
            self.active
                .and_then(|a| weights.iter().find(|(g, _)| *g as usize == a))
                .map_or(0.0, |(_, w)| *w)
        };

        let shown = if self.flags.contains(WeightFlags::LOCK_RELATIVE) {
            let unlocked: f32 = weights
                .iter()
                .filter(|(g, _)| !self.is_locked(*g))
                .map(|(_, w)| w)
                .sum();
            if unlocked > f32::EPSILON { shown / unlocked } else { shown }
        } else {
            shown
        };

        let alert = match self.alert {
            WeightAlertMode::None => false,
            WeightAlertMode::Active => shown <= 0.0,
            WeightAlertMode::All => weights.iter().all(|(_, w)| *w <= 0.0),
        };
        if alert { -1.0 } else { shown.clamp(0.0, 1.0) }
    }
}

pub(super) fn vertex_group_weights(ctx: &ExtractContext<'_>) -> Option<Buffer> {
    let mesh = ctx.mesh;
    let groups = mesh.vertex_groups();
    if groups.is_empty() {
        return None;
    }
    let state = ctx.weight_state;
    let domain = RenderVerts::of(mesh);
    let data = ctx.fill(domain.len(), |rv| {
        let vert = domain.source(mesh, rv).vertex(mesh);
        state.display_weight(groups.vertex_weights(vert))
    });
    Some(Buffer::from_elements(
        BufferSlot::Vertex(VboKind::VertexGroupWeight),
        &data,
    ))
}
