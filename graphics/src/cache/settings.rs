//! Tunables for the mesh cache system.

/// Settings shared by every mesh cache of a [`MeshCacheSystem`](super::MeshCacheSystem).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheSettings {
    /// Below this material count every slot gets a per-material batch; at or
    /// above it only materials used by faces are built.
    pub material_request_threshold: u32,
    /// Ticks shading buffers may stay unused before they are freed.
    pub unused_shading_timeout: u64,
    /// Buffer fills with at least this many elements run on the rayon pool.
    pub parallel_threshold: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            material_request_threshold: 16,
            unused_shading_timeout: 20,
            parallel_threshold: 4096,
        }
    }
}

impl CacheSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_material_request_threshold(mut self, threshold: u32) -> Self {
        self.material_request_threshold = threshold;
        self
    }

    pub fn with_unused_shading_timeout(mut self, ticks: u64) -> Self {
        self.unused_shading_timeout = ticks;
        self
    }

    pub fn with_parallel_threshold(mut self, elements: usize) -> Self {
        self.parallel_threshold = elements;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = CacheSettings::default();
        assert_eq!(settings.material_request_threshold, 16);
        assert_eq!(settings.unused_shading_timeout, 20);
    }

    #[test]
    fn test_builder() {
        let settings = CacheSettings::new()
            .with_material_request_threshold(4)
            .with_parallel_threshold(1);
        assert_eq!(settings.material_request_threshold, 4);
        assert_eq!(settings.parallel_threshold, 1);
    }
}
