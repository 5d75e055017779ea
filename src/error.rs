use thiserror::Error;

use crate::topology::{BorderId, VertexId};

/// Top-level error type for the reconstruction core.
#[derive(Debug, Error)]
pub enum AfrontError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Topology(#[from] TopologyError),

    #[error(transparent)]
    Operation(#[from] OperationError),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("degenerate geometry: {0}")]
    Degenerate(String),

    #[error("triangulation failed: {0}")]
    Triangulation(String),
}

/// Errors related to the front bookkeeping structures.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    /// A vertex slot points at a pool entry that no longer resolves, or whose
    /// successor vertex is gone. The session cannot be trusted afterwards.
    #[error("dangling border reference {border:?} on vertex {vertex:?}")]
    DanglingBorderReference {
        vertex: Option<VertexId>,
        border: BorderId,
    },

    #[error("invalid topology: {0}")]
    InvalidTopology(String),
}

/// Errors related to reconstruction operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("operation failed: {0}")]
    Failed(String),
}

/// Convenience type alias for results using [`AfrontError`].
pub type Result<T> = std::result::Result<T, AfrontError>;
