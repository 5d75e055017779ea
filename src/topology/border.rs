use slotmap::SlotMap;

use crate::error::TopologyError;

use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Stable handle to a record in the [`BorderPool`].
    pub struct BorderId;
}

/// Opaque reference to a cell of the triangulation the candidates come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellId(pub usize);

/// An oriented edge of a triangulation cell, given by the local indices of
/// its endpoints. Only used as an identifying key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edge {
    /// The cell owning the edge.
    pub cell: CellId,
    /// Local index of the first endpoint.
    pub i: u8,
    /// Local index of the second endpoint.
    pub j: u8,
}

impl Edge {
    /// Creates a new edge key.
    #[must_use]
    pub fn new(cell: CellId, i: u8, j: u8) -> Self {
        Self { cell, i, j }
    }
}

/// An edge together with the local index of the cell facet it was seen through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IncidentFacet {
    /// The edge, as two local vertex indices of a cell.
    pub edge: Edge,
    /// Local index of the cell facet the edge was reached through.
    pub facet: u8,
}

impl IncidentFacet {
    /// Creates a new edge/facet pair.
    #[must_use]
    pub fn new(edge: Edge, facet: u8) -> Self {
        Self { edge, facet }
    }
}

/// What a border edge carries besides its endpoints.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderElt {
    /// Quality score of the facet that produced the edge (lower is better).
    pub score: f64,
    /// Where the edge came from in the triangulation.
    pub origin: IncidentFacet,
    /// Index of the growth front the edge belongs to.
    pub front: usize,
}

impl BorderElt {
    /// Creates a new border element.
    #[must_use]
    pub fn new(score: f64, origin: IncidentFacet, front: usize) -> Self {
        Self {
            score,
            origin,
            front,
        }
    }
}

/// A directed hop from a border vertex to one of its border neighbours.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BorderRecord {
    /// The other endpoint of the border edge.
    pub successor: VertexId,
    /// Score and origin shared by both directions of the edge.
    pub elt: BorderElt,
}

/// Append-only pool of border records owned by the reconstruction session.
///
/// Records are never removed or relocated, so a [`BorderId`] stays valid for
/// the lifetime of the pool. Vertices only hold handles into it.
#[derive(Debug, Default)]
pub struct BorderPool {
    records: SlotMap<BorderId, BorderRecord>,
}

impl BorderPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a record and returns its handle.
    pub fn push(&mut self, record: BorderRecord) -> BorderId {
        self.records.insert(record)
    }

    /// Resolves a handle.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::DanglingBorderReference`] if the handle does
    /// not belong to this pool.
    pub fn get(&self, id: BorderId) -> Result<&BorderRecord, TopologyError> {
        self.records
            .get(id)
            .ok_or(TopologyError::DanglingBorderReference {
                vertex: None,
                border: id,
            })
    }

    /// Number of records ever pushed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if no record was pushed yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
