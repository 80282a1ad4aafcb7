//! # meshdraw core
//!
//! CPU-side data for the meshdraw render cache: mesh and object ids, source
//! mesh attributes, scene objects with tool settings, and math helpers.

pub mod id;
pub mod math;
pub mod mesh;
pub mod object;
pub mod profiling;

pub use id::{MeshId, ObjectId};

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the library version once at startup.
pub fn init() {
    log::info!("meshdraw core v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
