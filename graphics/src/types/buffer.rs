//! Buffer types and descriptors.

use bitflags::bitflags;

bitflags! {
    /// Usage flags for buffers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BufferUsage: u32 {
        /// Buffer can be used as a vertex buffer.
        const VERTEX = 1 << 0;
        /// Buffer can be used as an index buffer.
        const INDEX = 1 << 1;
        /// Buffer can be copied from.
        const COPY_SRC = 1 << 2;
        /// Buffer can be copied to.
        const COPY_DST = 1 << 3;
    }
}

impl Default for BufferUsage {
    fn default() -> Self {
        Self::empty()
    }
}

/// Descriptor for creating a buffer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct BufferDescriptor {
    /// Debug label for the buffer.
    pub label: Option<String>,
    /// Size in bytes.
    pub size: u64,
    /// Usage flags.
    pub usage: BufferUsage,
}

impl BufferDescriptor {
    /// Create a new buffer descriptor.
    pub fn new(size: u64, usage: BufferUsage) -> Self {
        Self {
            label: None,
            size,
            usage,
        }
    }

    /// Set the debug label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Per-element format of a vertex stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VertexFormat {
    Float32,
    Float32x2,
    Float32x3,
    Float32x4,
    /// Four packed bytes (flags, ids).
    Uint8x4,
    Uint32,
}

impl VertexFormat {
    /// Size of one element in bytes.
    pub const fn size(self) -> u32 {
        match self {
            Self::Float32 | Self::Uint8x4 | Self::Uint32 => 4,
            Self::Float32x2 => 8,
            Self::Float32x3 => 12,
            Self::Float32x4 => 16,
        }
    }

    /// Number of components per element.
    pub const fn components(self) -> u32 {
        match self {
            Self::Float32 | Self::Uint32 => 1,
            Self::Float32x2 => 2,
            Self::Float32x3 => 3,
            Self::Float32x4 | Self::Uint8x4 => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptor_builder() {
        let desc = BufferDescriptor::new(64, BufferUsage::VERTEX | BufferUsage::COPY_DST)
            .with_label("pos");
        assert_eq!(desc.size, 64);
        assert!(desc.usage.contains(BufferUsage::VERTEX));
        assert_eq!(desc.label.as_deref(), Some("pos"));
    }

    #[test]
    fn test_vertex_format_sizes() {
        assert_eq!(VertexFormat::Float32x3.size(), 12);
        assert_eq!(VertexFormat::Uint8x4.size(), 4);
        assert_eq!(VertexFormat::Uint8x4.components(), 4);
    }
}
