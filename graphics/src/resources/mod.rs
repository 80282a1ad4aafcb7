//! GPU resources.
//!
//! - [`Buffer`] - vertex or index buffer built from mesh data
//!
//! Buffers are reference-counted with [`Arc`] and shared across batches and
//! threads.
//!
//! [`Arc`]: std::sync::Arc

mod buffer;

pub use buffer::{Buffer, BufferId};
