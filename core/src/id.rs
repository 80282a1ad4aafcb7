//! Identifiers for mesh data-blocks and scene objects.
//!
//! Ids are allocated from process-wide counters and never reused, so they can
//! be stored in side tables that outlive the values they name.

use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_MESH_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_OBJECT_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of one mesh data-block instance (original or evaluated).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshId(u64);

impl MeshId {
    /// Allocate a fresh, never-before-used id.
    pub fn next() -> Self {
        Self(NEXT_MESH_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value, for logging.
    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for MeshId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "mesh#{}", self.0)
    }
}

/// Identity of a scene object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u64);

impl ObjectId {
    /// Allocate a fresh, never-before-used id.
    pub fn next() -> Self {
        Self(NEXT_OBJECT_ID.fetch_add(1, Ordering::Relaxed))
    }

    #[inline]
    pub fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "object#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        let a = MeshId::next();
        let b = MeshId::next();
        assert_ne!(a, b);
        assert!(b > a);
    }

    #[test]
    fn test_id_display() {
        let id = ObjectId::next();
        assert_eq!(id.to_string(), format!("object#{}", id.raw()));
    }
}
