//! Buffer store: the three parallel buffer lists of a mesh cache.
//!
//! Buffers are built on demand and shared with batches through `Arc`.
//! Removing a buffer marks it released and drops the store's reference; a
//! batch that still holds the buffer keeps the allocation alive but the
//! validity guard will refuse to draw it.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::Arc;

use crate::resources::{Buffer, BufferId};

use super::buffers::{BufferListKind, IboKind, VboKind};
use super::extract::{self, ExtractContext, FaceSorted};

/// Buffers built from one mesh (final, cage or UV cage).
#[derive(Debug, Default)]
pub struct BufferList {
    vbos: HashMap<VboKind, Arc<Buffer>>,
    ibos: HashMap<IboKind, Arc<Buffer>>,
    face_sorted: Option<FaceSorted>,
    is_manifold: Option<bool>,
}

impl BufferList {
    pub fn vbo(&self, kind: VboKind) -> Option<&Arc<Buffer>> {
        self.vbos.get(&kind)
    }

    pub fn ibo(&self, kind: IboKind) -> Option<&Arc<Buffer>> {
        self.ibos.get(&kind)
    }

    /// Material grouping of the triangle buffer, present once `Tris` was built.
    pub fn face_sorted(&self) -> Option<&FaceSorted> {
        self.face_sorted.as_ref()
    }

    /// Whether the adjacency buffer was built from a manifold mesh.
    pub fn is_manifold(&self) -> Option<bool> {
        self.is_manifold
    }

    pub fn len(&self) -> usize {
        self.vbos.len() + self.ibos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn remove_vbo(&mut self, kind: VboKind) -> Option<BufferId> {
        let buffer = self.vbos.remove(&kind)?;
        buffer.release();
        Some(buffer.id())
    }

    fn remove_ibo(&mut self, kind: IboKind) -> Option<BufferId> {
        let buffer = self.ibos.remove(&kind)?;
        buffer.release();
        match kind {
            IboKind::Tris => self.face_sorted = None,
            IboKind::LinesAdjacency => self.is_manifold = None,
            _ => {}
        }
        Some(buffer.id())
    }

    fn clear(&mut self) {
        for buffer in self.vbos.values().chain(self.ibos.values()) {
            buffer.release();
        }
        self.vbos.clear();
        self.ibos.clear();
        self.face_sorted = None;
        self.is_manifold = None;
    }
}

/// Outcome of one [`BufferStore::ensure`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnsureReport {
    pub built: usize,
    /// Requested buffers whose source data does not exist.
    pub missing: usize,
}

#[derive(Debug, Default)]
pub struct BufferStore {
    lists: [BufferList; 3],
}

impl BufferStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list(&self, kind: BufferListKind) -> &BufferList {
        &self.lists[kind.index()]
    }

    /// Build every requested buffer of `list` that is not present yet.
    ///
    /// A present buffer that was released outside the invalidator is rebuilt.
    pub fn ensure(
        &mut self,
        list: BufferListKind,
        vbos: &BTreeSet<VboKind>,
        ibos: &BTreeSet<IboKind>,
        ctx: &ExtractContext<'_>,
    ) -> EnsureReport {
        let target = &mut self.lists[list.index()];
        let mut report = EnsureReport::default();

        for &kind in vbos {
            match target.vbos.get(&kind) {
                Some(buffer) if !buffer.is_released() => continue,
                Some(buffer) => log::warn!("{list:?}: rebuilding released {kind:?} ({})", buffer.id()),
                None => {}
            }
            match extract::extract_vbo(kind, ctx) {
                Some(buffer) => {
                    target.vbos.insert(kind, Arc::new(buffer));
                    report.built += 1;
                }
                None => report.missing += 1,
            }
        }

        for &kind in ibos {
            match target.ibos.get(&kind) {
                Some(buffer) if !buffer.is_released() => continue,
                Some(buffer) => log::warn!("{list:?}: rebuilding released {kind:?} ({})", buffer.id()),
                None => {}
            }
            let buffer = match kind {
                IboKind::Tris => {
                    let sorted = FaceSorted::build(ctx);
                    let buffer = sorted.tris_buffer();
                    target.face_sorted = Some(sorted);
                    Some(buffer)
                }
                IboKind::LinesAdjacency => {
                    target.is_manifold = Some(extract::is_manifold(ctx.mesh));
                    extract::extract_ibo(kind, ctx)
                }
                _ => extract::extract_ibo(kind, ctx),
            };
            match buffer {
                Some(buffer) => {
                    target.ibos.insert(kind, Arc::new(buffer));
                    report.built += 1;
                }
                None => report.missing += 1,
            }
        }

        if report.built > 0 {
            log::trace!("{:?}: built {} buffers for {}", list, report.built, ctx.mesh.id());
        }
        report
    }

    /// Ids of the given kinds across all three lists.
    pub fn collect_ids(&self, vbos: &[VboKind], ibos: &[IboKind]) -> HashSet<BufferId> {
        let mut ids = HashSet::new();
        for list in &self.lists {
            ids.extend(vbos.iter().filter_map(|k| list.vbos.get(k)).map(|b| b.id()));
            ids.extend(ibos.iter().filter_map(|k| list.ibos.get(k)).map(|b| b.id()));
        }
        ids
    }

    /// Release and drop `kind` from every list.
    pub fn remove_vbo(&mut self, kind: VboKind) -> Vec<BufferId> {
        self.lists
            .iter_mut()
            .filter_map(|list| list.remove_vbo(kind))
            .collect()
    }

    pub fn remove_ibo(&mut self, kind: IboKind) -> Vec<BufferId> {
        self.lists
            .iter_mut()
            .filter_map(|list| list.remove_ibo(kind))
            .collect()
    }

    /// Release every buffer.
    pub fn clear(&mut self) {
        for list in &mut self.lists {
            list.clear();
        }
    }

    /// Total number of buffers across lists.
    pub fn len(&self) -> usize {
        self.lists.iter().map(BufferList::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
