use super::border::BorderElt;
use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Stable handle to an entry of the incidence request ledger.
    pub struct RequestId;
}

slotmap::new_key_type! {
    /// Stable handle to an entry of the interior edge ledger.
    pub struct InteriorId;
}

/// A candidate border edge deferred at a vertex that already has two.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncidenceRequest {
    /// The requested edge; the first endpoint is the deferring vertex.
    pub edge: (VertexId, VertexId),
    /// Border element the edge will carry once installed.
    pub elt: BorderElt,
    /// Candidate facet that produced the request, if the caller tracks one.
    /// Requests sharing a candidate are resolved together.
    pub candidate: Option<usize>,
}

impl IncidenceRequest {
    /// Creates a request for edge `(host, other)`.
    #[must_use]
    pub fn new(host: VertexId, other: VertexId, elt: BorderElt) -> Self {
        Self {
            edge: (host, other),
            elt,
            candidate: None,
        }
    }

    /// Tags the request with the candidate facet it came from.
    #[must_use]
    pub fn with_candidate(mut self, candidate: usize) -> Self {
        self.candidate = Some(candidate);
        self
    }

    /// The endpoint that is not `host`.
    #[must_use]
    pub fn other(&self, host: VertexId) -> VertexId {
        if self.edge.0 == host {
            self.edge.1
        } else {
            self.edge.0
        }
    }

    /// Quality score of the request (lower is better).
    #[must_use]
    pub fn score(&self) -> f64 {
        self.elt.score
    }
}
