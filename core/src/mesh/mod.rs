//! CPU-side mesh types and generators.
//!
//! - [`SourceMesh`] - mesh data-block instance: topology, attribute layers, edit state
//! - [`UvLayer`], [`VertexGroups`], [`SelectionLayers`], [`EdgeMarks`] - attribute layers
//! - Generators for fixture shapes (grid, cube, loose edges)
//!
//! These types are re-exported by `meshdraw-graphics` for convenience.

mod attributes;
mod data;
pub mod generators;

pub use attributes::{EdgeMarks, EditState, SelectionLayers, UvLayer, VertexGroups};
pub use data::{IndexFormat, MeshError, PrimitiveTopology, SourceMesh};
