//! GPU buffer resource.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::cache::{BufferSlot, IboKind, VboKind};
use crate::types::{BufferDescriptor, BufferUsage};

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// Unique identity of a [`Buffer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(u64);

impl BufferId {
    fn next() -> Self {
        Self(NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for BufferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "buffer#{}", self.0)
    }
}

/// A vertex or index buffer built from mesh data.
///
/// Buffers are shared by reference (`Arc<Buffer>`) between every batch that
/// reads them. Contents are immutable after creation and stored as 32-bit
/// words, which every vertex format and index type packs into.
///
/// When the buffer store discards a buffer it calls [`release`](Self::release).
/// The memory lives until the last batch drops its reference, but a released
/// buffer must not be drawn from; [`is_released`](Self::is_released) is the
/// validity flag the draw-time guard checks.
///
/// # Example
///
/// ```ignore
/// let positions = Buffer::from_elements(BufferSlot::Vertex(VboKind::Position), &points);
/// assert_eq!(positions.len(), points.len());
/// ```
pub struct Buffer {
    id: BufferId,
    slot: BufferSlot,
    descriptor: BufferDescriptor,
    words: Vec<u32>,
    len: u32,
    stride: u32,
    initialized: bool,
    released: AtomicBool,
}

impl Buffer {
    fn with_words(slot: BufferSlot, words: Vec<u32>, len: u32, stride: u32) -> Self {
        let usage = if slot.is_index() {
            BufferUsage::INDEX | BufferUsage::COPY_DST
        } else {
            BufferUsage::VERTEX | BufferUsage::COPY_DST
        };
        let size = len as u64 * stride as u64;
        Self {
            id: BufferId::next(),
            slot,
            descriptor: BufferDescriptor::new(size, usage).with_label(slot_label(slot)),
            words,
            len,
            stride,
            initialized: true,
            released: AtomicBool::new(false),
        }
    }

    /// Create a buffer with one element per item of `elements`.
    pub fn from_elements<T: bytemuck::Pod>(slot: BufferSlot, elements: &[T]) -> Self {
        Self::from_interleaved(slot, elements, 1)
    }

    /// Create a buffer where `per_element` consecutive items form one element.
    pub fn from_interleaved<T: bytemuck::Pod>(
        slot: BufferSlot,
        items: &[T],
        per_element: usize,
    ) -> Self {
        let bytes: &[u8] = bytemuck::cast_slice(items);
        let mut words = vec![0u32; bytes.len().div_ceil(4)];
        bytemuck::cast_slice_mut::<u32, u8>(&mut words)[..bytes.len()].copy_from_slice(bytes);
        let per_element = per_element.max(1);
        let stride = (std::mem::size_of::<T>() * per_element) as u32;
        Self::with_words(slot, words, (items.len() / per_element) as u32, stride)
    }

    /// Create an index buffer.
    pub fn indices(kind: IboKind, indices: &[u32]) -> Self {
        Self::with_words(
            BufferSlot::Index(kind),
            indices.to_vec(),
            indices.len() as u32,
            4,
        )
    }

    /// Create a zero-length vertex stream.
    pub fn empty(kind: VboKind) -> Self {
        Self::with_words(BufferSlot::Vertex(kind), Vec::new(), 0, kind.format().size())
    }

    /// Create a buffer that reports `len` elements but was never filled.
    pub fn uninitialized(slot: BufferSlot, len: u32, stride: u32) -> Self {
        let mut buffer = Self::with_words(slot, Vec::new(), len, stride);
        buffer.initialized = false;
        buffer
    }

    #[inline]
    pub fn id(&self) -> BufferId {
        self.id
    }

    #[inline]
    pub fn slot(&self) -> BufferSlot {
        self.slot
    }

    /// Get the buffer descriptor.
    pub fn descriptor(&self) -> &BufferDescriptor {
        &self.descriptor
    }

    /// Get the buffer size in bytes.
    pub fn size(&self) -> u64 {
        self.descriptor.size
    }

    /// Number of elements (vertices or indices).
    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bytes per element.
    #[inline]
    pub fn stride(&self) -> u32 {
        self.stride
    }

    #[inline]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    #[inline]
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Mark the buffer as discarded by its owner.
    pub fn release(&self) {
        self.released.store(true, Ordering::Release);
    }

    /// Raw contents.
    pub fn bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.words)
    }

    /// Contents of an index buffer. `None` for vertex buffers.
    pub fn as_u32_indices(&self) -> Option<&[u32]> {
        match self.slot {
            BufferSlot::Index(_) => Some(&self.words[..self.words.len().min(self.len as usize)]),
            BufferSlot::Vertex(_) => None,
        }
    }

    /// Reinterpret the contents as a slice of `T`.
    pub fn as_slice<T: bytemuck::Pod>(&self) -> Option<&[T]> {
        let bytes = self.bytes();
        let used = (self.len as usize * self.stride as usize).min(bytes.len());
        bytemuck::try_cast_slice(&bytes[..used]).ok()
    }
}

fn slot_label(slot: BufferSlot) -> String {
    match slot {
        BufferSlot::Vertex(kind) => format!("vbo.{kind:?}"),
        BufferSlot::Index(kind) => format!("ibo.{kind:?}"),
    }
}

impl std::fmt::Debug for Buffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffer")
            .field("id", &self.id)
            .field("slot", &self.slot)
            .field("len", &self.len)
            .field("stride", &self.stride)
            .field("released", &self.is_released())
            .finish()
    }
}

// Ensure Buffer is Send + Sync
static_assertions::assert_impl_all!(Buffer: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_debug() {
        let buffer = Buffer::from_elements(
            BufferSlot::Vertex(VboKind::Position),
            &[[0.0f32; 3]; 4],
        );
        let debug = format!("{:?}", buffer);
        assert!(debug.contains("Buffer"));
        assert!(debug.contains("Position"));
    }

    #[test]
    fn test_buffer_size() {
        let buffer = Buffer::from_elements(
            BufferSlot::Vertex(VboKind::Position),
            &[[1.0f32, 2.0, 3.0]; 10],
        );
        assert_eq!(buffer.len(), 10);
        assert_eq!(buffer.stride(), 12);
        assert_eq!(buffer.size(), 120);
        assert_eq!(buffer.as_slice::<[f32; 3]>().map(|s| s[9]), Some([1.0, 2.0, 3.0]));
    }

    #[test]
    fn test_interleaved_layers() {
        let uvs = [[0.0f32, 0.0], [1.0, 1.0], [0.5, 0.5], [0.25, 0.25]];
        let buffer = Buffer::from_interleaved(BufferSlot::Vertex(VboKind::Uvs), &uvs, 2);
        assert_eq!(buffer.len(), 2);
        assert_eq!(buffer.stride(), 16);
    }

    #[test]
    fn test_byte_elements_pack_into_words() {
        let flags = [[1u8, 2, 3, 4], [5, 6, 7, 8], [9, 10, 11, 12]];
        let buffer = Buffer::from_elements(BufferSlot::Vertex(VboKind::EditData), &flags);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.as_slice::<[u8; 4]>(), Some(&flags[..]));
    }

    #[test]
    fn test_release_flag() {
        let buffer = Buffer::indices(IboKind::Tris, &[0, 1, 2]);
        assert!(!buffer.is_released());
        buffer.release();
        assert!(buffer.is_released());
        assert_eq!(buffer.as_u32_indices(), Some(&[0, 1, 2][..]));
    }

    #[test]
    fn test_ids_unique_and_empty() {
        let a = Buffer::empty(VboKind::Position);
        let b = Buffer::empty(VboKind::Position);
        assert_ne!(a.id(), b.id());
        assert!(a.is_empty());
        assert!(a.is_initialized());
        assert!(!Buffer::uninitialized(BufferSlot::Index(IboKind::Tris), 3, 4).is_initialized());
    }
}
