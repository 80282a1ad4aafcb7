//! Common types and descriptors for cache resources.

mod buffer;

pub use buffer::{BufferDescriptor, BufferUsage, VertexFormat};
