//! Batch slots owned by a mesh cache and the handles given to draw callers.

use std::sync::Arc;

use parking_lot::RwLock;

use super::data::Batch;

/// Contents of a batch slot.
#[derive(Debug, Clone, Default)]
pub enum SlotState {
    /// Nothing built yet, or cleared by a discard.
    #[default]
    Empty,
    /// The data for this batch does not exist; drawing it draws nothing.
    Dummy(Arc<Batch>),
    Built(Arc<Batch>),
}

/// A cheap, clone-able handle to a batch slot.
///
/// The handle is returned immediately by requests, before the batch exists.
/// Callers read [`current`](Self::current) at draw time; it never returns a
/// null batch. Clearing a slot only drops the slot's reference: a caller that
/// already holds the `Arc<Batch>` keeps a valid object for as long as it holds it.
#[derive(Clone, Default)]
pub struct BatchHandle {
    slot: Arc<RwLock<SlotState>>,
}

impl BatchHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// The current batch, or a fresh dummy when the slot is empty.
    pub fn current(&self) -> Arc<Batch> {
        match &*self.slot.read() {
            SlotState::Built(batch) | SlotState::Dummy(batch) => batch.clone(),
            SlotState::Empty => Arc::new(Batch::dummy()),
        }
    }

    /// The built batch, if the slot holds one.
    pub fn built(&self) -> Option<Arc<Batch>> {
        match &*self.slot.read() {
            SlotState::Built(batch) => Some(batch.clone()),
            _ => None,
        }
    }

    pub fn state(&self) -> SlotState {
        self.slot.read().clone()
    }

    pub fn is_empty(&self) -> bool {
        matches!(*self.slot.read(), SlotState::Empty)
    }

    pub fn is_built(&self) -> bool {
        matches!(*self.slot.read(), SlotState::Built(_))
    }

    pub fn is_dummy(&self) -> bool {
        matches!(*self.slot.read(), SlotState::Dummy(_))
    }

    pub fn set_built(&self, batch: Arc<Batch>) {
        *self.slot.write() = SlotState::Built(batch);
    }

    /// Install a dummy batch.
    pub fn set_dummy(&self) {
        *self.slot.write() = SlotState::Dummy(Arc::new(Batch::dummy()));
    }

    /// Drop the slot's reference to its batch.
    pub fn clear(&self) {
        *self.slot.write() = SlotState::Empty;
    }

    /// Whether both handles name the same slot.
    pub fn same_slot(&self, other: &BatchHandle) -> bool {
        Arc::ptr_eq(&self.slot, &other.slot)
    }
}

impl std::fmt::Debug for BatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match &*self.slot.read() {
            SlotState::Empty => "empty",
            SlotState::Dummy(_) => "dummy",
            SlotState::Built(_) => "built",
        };
        f.debug_struct("BatchHandle").field("state", &state).finish()
    }
}

static_assertions::assert_impl_all!(BatchHandle: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_slot_yields_dummy() {
        let handle = BatchHandle::new();
        assert!(handle.is_empty());
        assert!(handle.current().is_dummy());
        assert!(handle.built().is_none());
    }

    #[test]
    fn test_clear_keeps_outstanding_references() {
        let handle = BatchHandle::new();
        let batch = Arc::new(Batch::dummy());
        handle.set_built(batch.clone());
        let held = handle.current();

        handle.clear();
        assert!(handle.is_empty());
        assert!(Arc::ptr_eq(&held, &batch));
        assert_eq!(Arc::strong_count(&batch), 2);
    }

    #[test]
    fn test_clones_share_the_slot() {
        let a = BatchHandle::new();
        let b = a.clone();
        a.set_dummy();
        assert!(b.is_dummy());
        assert!(a.same_slot(&b));
        assert!(!a.same_slot(&BatchHandle::new()));
    }
}
