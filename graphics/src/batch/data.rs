//! Batch definition: topology plus the buffers a draw call reads.
//!
//! A [`Batch`] contains one or more vertex streams and an optional index
//! binding. Buffers are shared with other batches through `Arc`; a batch never
//! owns its buffers exclusively.
//!
//! Per-material surface batches bind different sub-ranges of the same
//! triangle index buffer, which is why the index binding carries a range and
//! not just a buffer.

use std::collections::HashSet;
use std::sync::Arc;

use meshdraw_core::mesh::PrimitiveTopology;

use crate::cache::{BufferListKind, VboKind};
use crate::resources::{Buffer, BufferId};

/// A contiguous range of an index buffer.
#[derive(Debug, Clone)]
pub struct IndexBinding {
    pub buffer: Arc<Buffer>,
    /// First index of the range.
    pub start: u32,
    /// Number of indices in the range.
    pub count: u32,
}

impl IndexBinding {
    /// Bind the whole buffer.
    pub fn full(buffer: Arc<Buffer>) -> Self {
        let count = buffer.len();
        Self {
            buffer,
            start: 0,
            count,
        }
    }

    /// Bind `count` indices starting at `start`.
    pub fn range(buffer: Arc<Buffer>, start: u32, count: u32) -> Self {
        Self {
            buffer,
            start,
            count,
        }
    }
}

/// A draw batch.
///
/// Batches are immutable once built. Replacing a batch means installing a new
/// one in its cache slot.
///
/// # Example
///
/// ```ignore
/// let batch = Batch::new(
///     PrimitiveTopology::TriangleList,
///     BufferListKind::Final,
///     vec![positions, normals],
///     Some(IndexBinding::full(tris)),
/// );
/// assert_eq!(batch.vertex_count(), positions_len);
/// ```
pub struct Batch {
    topology: PrimitiveTopology,
    list: BufferListKind,
    vertex_streams: Vec<Arc<Buffer>>,
    index: Option<IndexBinding>,
    is_dummy: bool,
}

impl Batch {
    pub fn new(
        topology: PrimitiveTopology,
        list: BufferListKind,
        vertex_streams: Vec<Arc<Buffer>>,
        index: Option<IndexBinding>,
    ) -> Self {
        Self {
            topology,
            list,
            vertex_streams,
            index,
            is_dummy: false,
        }
    }

    /// A placeholder with a single zero-length vertex stream. Never drawable.
    pub fn dummy() -> Self {
        Self {
            topology: PrimitiveTopology::PointList,
            list: BufferListKind::Final,
            vertex_streams: vec![Arc::new(Buffer::empty(VboKind::Position))],
            index: None,
            is_dummy: true,
        }
    }

    #[inline]
    pub fn topology(&self) -> PrimitiveTopology {
        self.topology
    }

    /// The buffer list this batch draws from.
    #[inline]
    pub fn list(&self) -> BufferListKind {
        self.list
    }

    pub fn vertex_streams(&self) -> &[Arc<Buffer>] {
        &self.vertex_streams
    }

    /// Find a vertex stream by kind.
    pub fn vertex_stream(&self, kind: VboKind) -> Option<&Arc<Buffer>> {
        self.vertex_streams
            .iter()
            .find(|b| b.slot() == crate::cache::BufferSlot::Vertex(kind))
    }

    pub fn index(&self) -> Option<&IndexBinding> {
        self.index.as_ref()
    }

    #[inline]
    pub fn is_dummy(&self) -> bool {
        self.is_dummy
    }

    /// Vertex count of the first stream.
    pub fn vertex_count(&self) -> u32 {
        self.vertex_streams.first().map_or(0, |b| b.len())
    }

    /// Number of elements a draw call would process.
    pub fn element_count(&self) -> u32 {
        match &self.index {
            Some(binding) => binding.count,
            None => self.vertex_count(),
        }
    }

    /// Whether any buffer of this batch is in `ids`.
    pub fn references(&self, ids: &HashSet<BufferId>) -> bool {
        self.vertex_streams.iter().any(|b| ids.contains(&b.id()))
            || self.index.as_ref().is_some_and(|i| ids.contains(&i.buffer.id()))
    }

    /// Ids of every buffer this batch reads.
    pub fn buffer_ids(&self) -> impl Iterator<Item = BufferId> + '_ {
        self.vertex_streams
            .iter()
            .map(|b| b.id())
            .chain(self.index.as_ref().map(|i| i.buffer.id()))
    }
}

impl std::fmt::Debug for Batch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Batch")
            .field("topology", &self.topology)
            .field("list", &self.list)
            .field("vertex_streams", &self.vertex_streams.len())
            .field("vertex_count", &self.vertex_count())
            .field("index", &self.index.as_ref().map(|i| (i.start, i.count)))
            .field("is_dummy", &self.is_dummy)
            .finish()
    }
}

// Ensure Batch is Send + Sync
static_assertions::assert_impl_all!(Batch: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{BufferSlot, IboKind};

    fn positions(n: usize) -> Arc<Buffer> {
        Arc::new(Buffer::from_elements(
            BufferSlot::Vertex(VboKind::Position),
            &vec![[0.0f32; 3]; n],
        ))
    }

    #[test]
    fn test_dummy_batch() {
        let batch = Batch::dummy();
        assert!(batch.is_dummy());
        assert_eq!(batch.vertex_streams().len(), 1);
        assert_eq!(batch.vertex_count(), 0);
        assert!(batch.index().is_none());
    }

    #[test]
    fn test_indexed_batch_counts() {
        let tris = Arc::new(Buffer::indices(IboKind::Tris, &[0, 1, 2, 0, 2, 3]));
        let batch = Batch::new(
            PrimitiveTopology::TriangleList,
            BufferListKind::Final,
            vec![positions(4)],
            Some(IndexBinding::range(tris, 3, 3)),
        );
        assert_eq!(batch.vertex_count(), 4);
        assert_eq!(batch.element_count(), 3);
        assert!(!batch.is_dummy());
    }

    #[test]
    fn test_references() {
        let pos = positions(3);
        let other = positions(3);
        let batch = Batch::new(
            PrimitiveTopology::PointList,
            BufferListKind::Final,
            vec![pos.clone()],
            None,
        );
        assert!(batch.references(&HashSet::from([pos.id()])));
        assert!(!batch.references(&HashSet::from([other.id()])));
        assert_eq!(batch.buffer_ids().count(), 1);
        assert!(batch.vertex_stream(VboKind::Position).is_some());
        assert!(batch.vertex_stream(VboKind::Uvs).is_none());
    }
}
