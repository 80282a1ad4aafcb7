//! Render cache error types.

use std::fmt;

use meshdraw_core::MeshId;
use meshdraw_core::mesh::MeshError;

use crate::cache::BatchKind;
use crate::resources::BufferId;

/// Errors that can occur in the render cache.
///
/// None of these reach draw callers: drawing paths log them and fall back to
/// dummy batches.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheError {
    /// A batch kind has no row in the requirement table.
    UndefinedRequirement(BatchKind),
    /// No cache exists for the mesh.
    NoCache(MeshId),
    /// The mesh failed validation and cannot be extracted.
    MalformedMesh { mesh: MeshId, reason: MeshError },
    /// A batch still references a buffer that was released by the buffer store.
    ReleasedBuffer(BufferId),
    /// Only the first 32 UV layers can be carried by surface batches.
    UvLayerOutOfRange { mesh: MeshId, layer: usize },
}

impl fmt::Display for CacheError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UndefinedRequirement(kind) => {
                write!(f, "no buffer requirements defined for batch {kind:?}")
            }
            Self::NoCache(mesh) => write!(f, "no batch cache for {mesh}"),
            Self::MalformedMesh { mesh, reason } => write!(f, "malformed {mesh}: {reason}"),
            Self::ReleasedBuffer(id) => write!(f, "batch references released buffer {id}"),
            Self::UvLayerOutOfRange { mesh, layer } => {
                write!(f, "uv layer {layer} of {mesh} is out of range")
            }
        }
    }
}

impl std::error::Error for CacheError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::MalformedMesh { reason, .. } => Some(reason),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CacheError::UndefinedRequirement(BatchKind::SurfacePerMaterial);
        assert_eq!(
            err.to_string(),
            "no buffer requirements defined for batch SurfacePerMaterial"
        );

        let mesh = MeshId::next();
        let err = CacheError::NoCache(mesh);
        assert_eq!(err.to_string(), format!("no batch cache for {mesh}"));

        let err = CacheError::UvLayerOutOfRange { mesh, layer: 40 };
        assert_eq!(err.to_string(), format!("uv layer 40 of {mesh} is out of range"));
    }

    #[test]
    fn test_malformed_mesh_has_source() {
        use std::error::Error;

        let err = CacheError::MalformedMesh {
            mesh: MeshId::next(),
            reason: MeshError::FaceTooSmall {
                face: 0,
                corners: 2,
            },
        };
        assert!(err.source().is_some());
        assert!(err.to_string().contains("face 0 has only 2 corners"));
    }
}
