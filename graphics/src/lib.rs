//! # meshdraw graphics
//!
//! Draw batches derived from source meshes, cached per mesh instance.
//!
//! ## Overview
//!
//! This crate provides:
//! - [`Buffer`] - shared vertex/index buffers with an explicit release flag
//! - [`Batch`] / [`BatchHandle`] - draw batches and the slots that hold them
//! - [`MeshCacheSystem`] - request, build and invalidate batches per mesh
//! - [`PreservationRegistry`] - custom batch subscriptions that survive cache rebuilds
//!
//! ## Example
//!
//! ```ignore
//! use meshdraw_graphics::{BatchKind, DrawContext, MeshCacheSystem, PreservationRegistry};
//!
//! let mut system = MeshCacheSystem::default();
//! let mut registry = PreservationRegistry::new();
//! let surface = system.get_batch(BatchKind::Surface, None, &mesh, &mut registry);
//! system.create_requested(DrawContext::new(&mesh, &tools), &mut registry);
//! draw(surface.current());
//! ```

pub mod batch;
pub mod cache;
pub mod error;
pub mod resources;
pub mod types;

pub use batch::{Batch, BatchHandle, IndexBinding, SlotState};
pub use cache::{
    BatchFlags, BatchKind, BufferListKind, CacheSettings, DirtyCategory, DrawContext, IboKind,
    MeshBatchCache, MeshCacheSystem, PassReport, PreservationRegistry, StableKey,
    SubscriptionState, VboKind, is_drawable, is_slot_drawable,
};
pub use error::CacheError;
pub use resources::{Buffer, BufferId};
pub use types::{BufferDescriptor, BufferUsage, VertexFormat};

/// Graphics library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version once at startup.
pub fn init() {
    log::info!("meshdraw graphics v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_default_system_is_empty() {
        let system = MeshCacheSystem::default();
        assert_eq!(system.cache_count(), 0);
        assert_eq!(system.settings(), &CacheSettings::default());
    }
}
