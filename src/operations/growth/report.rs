use crate::operations::query::BorderLoop;
use crate::topology::{FacetId, IncidenceRequest, VertexId};

/// Why the growth loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// No admissible candidate, pending request or seed was left.
    Exhausted,
    /// The cancel flag was raised.
    Cancelled,
    /// The configured facet limit was reached.
    FacetLimit,
}

/// A recoverable structural problem found while growing.
#[derive(Debug, Clone, PartialEq)]
pub enum Diagnostic {
    /// `vertex` ended growth with requests still queued beside its two
    /// installed border edges.
    NonManifoldOverflow {
        vertex: VertexId,
        installed: Vec<(VertexId, VertexId)>,
        deferred: Vec<(VertexId, VertexId)>,
    },
    /// A deferred edge that no resolution pass could place.
    UnresolvedIncidenceRequest {
        vertex: VertexId,
        request: IncidenceRequest,
    },
}

/// Outcome of [`GrowFront`](super::GrowFront).
#[derive(Debug, Clone)]
pub struct Reconstruction {
    /// Accepted facets in acceptance order.
    pub facets: Vec<FacetId>,
    /// Number of seeds the growth started from.
    pub fronts: usize,
    /// Number of shells found by labeling.
    pub shells: usize,
    /// Border loops left once growth stopped.
    pub loops: Vec<BorderLoop>,
    /// Problems the growth detected but could not repair.
    pub diagnostics: Vec<Diagnostic>,
    /// Why the growth loop ended.
    pub stop: StopReason,
}

impl Reconstruction {
    /// Returns `true` if growth ran to exhaustion, every border loop closed
    /// and no request was left behind.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.stop == StopReason::Exhausted
            && self.diagnostics.is_empty()
            && self.loops.iter().all(|l| l.closed)
    }

    /// Border loops that did not close.
    pub fn open_loops(&self) -> impl Iterator<Item = &BorderLoop> {
        self.loops.iter().filter(|l| !l.closed)
    }
}
