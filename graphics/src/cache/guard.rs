//! Drawability checks run before a batch is handed to a draw caller.
//!
//! The primary check reads the explicit `released` flag on every buffer a
//! batch references. Probing the index range runs under `catch_unwind`; a
//! panic there (an index binding pointing past its buffer, for example) is
//! logged and reported as "not drawable" instead of unwinding into the render
//! loop.

use std::panic::{AssertUnwindSafe, catch_unwind};

use crate::batch::{Batch, BatchHandle};
use crate::error::CacheError;

/// Whether drawing `batch` would issue a non-empty draw from live buffers.
pub fn is_drawable(batch: &Batch) -> bool {
    if batch.is_dummy() {
        return false;
    }
    if ensure_live(batch).is_err() {
        return false;
    }
    let Some(first) = batch.vertex_streams().first() else {
        return false;
    };
    if first.is_empty() || !first.is_initialized() {
        return false;
    }
    match batch.index() {
        None => true,
        Some(binding) => {
            if binding.count == 0 || !binding.buffer.is_initialized() {
                return false;
            }
            check_index_range(batch)
        }
    }
}

/// [`is_drawable`] for whatever a slot currently holds. Empty slots are not drawable.
pub fn is_slot_drawable(handle: &BatchHandle) -> bool {
    handle.built().is_some_and(|batch| is_drawable(&batch))
}

/// Fail with the first released buffer a batch still references.
pub fn ensure_live(batch: &Batch) -> Result<(), CacheError> {
    let released = batch
        .vertex_streams()
        .iter()
        .chain(batch.index().map(|binding| &binding.buffer))
        .find(|buffer| buffer.is_released());
    match released {
        Some(buffer) => Err(CacheError::ReleasedBuffer(buffer.id())),
        None => Ok(()),
    }
}

fn check_index_range(batch: &Batch) -> bool {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        let Some(binding) = batch.index() else {
            return true;
        };
        let Some(indices) = binding.buffer.as_u32_indices() else {
            return false;
        };
        let start = binding.start as usize;
        let range = &indices[start..start + binding.count as usize];
        let vertex_count = batch.vertex_count();
        range.iter().all(|&i| i < vertex_count)
    }));
    match outcome {
        Ok(valid) => valid,
        Err(payload) => {
            let message = payload
                .downcast_ref::<&'static str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown fault".to_string());
            log::warn!("fault while probing batch {batch:?}: {message}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use meshdraw_core::mesh::PrimitiveTopology;

    use super::*;
    use crate::batch::IndexBinding;
    use crate::cache::{BufferListKind, BufferSlot, IboKind, VboKind};
    use crate::resources::Buffer;

    fn positions(n: usize) -> Arc<Buffer> {
        Arc::new(Buffer::from_elements(
            BufferSlot::Vertex(VboKind::Position),
            &vec![[0.0f32; 3]; n],
        ))
    }

    fn tris(index: Option<IndexBinding>, verts: Arc<Buffer>) -> Batch {
        Batch::new(
            PrimitiveTopology::TriangleList,
            BufferListKind::Final,
            vec![verts],
            index,
        )
    }

    #[test]
    fn test_valid_batch_is_drawable() {
        let ibo = Arc::new(Buffer::indices(IboKind::Tris, &[0, 1, 2]));
        let batch = tris(Some(IndexBinding::full(ibo)), positions(3));
        assert!(is_drawable(&batch));
        assert!(ensure_live(&batch).is_ok());
    }

    #[test]
    fn test_dummy_and_empty_slots_are_not_drawable() {
        assert!(!is_drawable(&Batch::dummy()));
        let handle = BatchHandle::new();
        assert!(!is_slot_drawable(&handle));
        handle.set_dummy();
        assert!(!is_slot_drawable(&handle));
    }

    #[test]
    fn test_zero_length_index_is_not_drawable() {
        let ibo = Arc::new(Buffer::indices(IboKind::Tris, &[]));
        let batch = tris(Some(IndexBinding::full(ibo)), positions(3));
        assert!(!is_drawable(&batch));
    }

    #[test]
    fn test_uninitialized_index_is_not_drawable() {
        let ibo = Arc::new(Buffer::uninitialized(BufferSlot::Index(IboKind::Tris), 3, 4));
        let batch = tris(Some(IndexBinding::full(ibo)), positions(3));
        assert!(!is_drawable(&batch));
    }

    #[test]
    fn test_released_buffer_is_reported() {
        let verts = positions(3);
        let batch = tris(None, verts.clone());
        verts.release();
        assert!(!is_drawable(&batch));
        assert_eq!(
            ensure_live(&batch),
            Err(CacheError::ReleasedBuffer(verts.id()))
        );
    }

    #[test]
    fn test_out_of_bounds_range_is_caught() {
        let ibo = Arc::new(Buffer::indices(IboKind::Tris, &[0, 1, 2]));
        let batch = tris(Some(IndexBinding::range(ibo, 3, 3)), positions(3));
        assert!(!is_drawable(&batch));
    }

    #[test]
    fn test_indices_past_vertex_count() {
        let ibo = Arc::new(Buffer::indices(IboKind::Tris, &[0, 1, 7]));
        let batch = tris(Some(IndexBinding::full(ibo)), positions(3));
        assert!(!is_drawable(&batch));
    }
}
