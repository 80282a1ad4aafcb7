//! Batch types.
//!
//! - [`Batch`] - topology plus shared vertex/index buffers
//! - [`IndexBinding`] - an index buffer sub-range
//! - [`BatchHandle`] - clone-able handle to a cache-owned batch slot

mod data;
mod slot;

pub use data::{Batch, IndexBinding};
pub use slot::{BatchHandle, SlotState};
