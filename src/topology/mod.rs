pub mod border;
pub mod facet;
pub mod fan;
pub mod incidence;
pub mod ledger;
pub mod vertex;

pub use border::{BorderElt, BorderId, BorderPool, BorderRecord, CellId, Edge, IncidentFacet};
pub use facet::{FacetData, FacetId};
pub use fan::Fan;
pub use incidence::{IncidenceRequest, InteriorId, RequestId};
pub use ledger::{ChainPool, ChainRange};
pub use vertex::{Slot, SlotFill, VertexData, VertexId, UNVISITED};

use crate::error::TopologyError;
use crate::math::Point3;
use slotmap::SlotMap;

/// Result of offering a border edge to the store.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attach {
    /// The edge is on the border; one record per direction.
    Installed {
        forward: BorderId,
        backward: BorderId,
    },
    /// At least one endpoint already had two border edges. Nothing was
    /// installed; each listed endpoint received an incidence request.
    Deferred { at: Vec<VertexId> },
}

/// The reconstruction session: owns every vertex, the border element pool,
/// the incidence request ledger, the interior edge ledger and accepted facets.
///
/// Vertices reference pool entries through typed handles only. All mutation
/// of front state goes through this type so slots, marks and ledgers stay
/// consistent with each other.
#[derive(Debug, Default)]
pub struct FrontStore {
    vertices: SlotMap<VertexId, VertexData>,
    border: BorderPool,
    requests: ChainPool<RequestId, IncidenceRequest>,
    interior: ChainPool<InteriorId, VertexId>,
    facets: SlotMap<FacetId, FacetData>,
    next_id: usize,
}

impl FrontStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Vertex operations ---

    /// Inserts an unvisited vertex and returns its ID.
    pub fn add_vertex(&mut self, point: Point3) -> VertexId {
        let id = self.next_id;
        self.next_id += 1;
        self.vertices.insert(VertexData::new(point, id))
    }

    /// Returns a reference to the vertex data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn vertex(&self, id: VertexId) -> Result<&VertexData, TopologyError> {
        self.vertices
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))
    }

    fn vertex_mut(&mut self, id: VertexId) -> Result<&mut VertexData, TopologyError> {
        self.vertices
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))
    }

    /// All vertex IDs, duplicates included.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.vertices.keys()
    }

    /// Number of vertices in the store, duplicates included.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Creates a vertex at the position of `id` with a fresh identity.
    ///
    /// The duplicate starts unvisited: it never inherits the slots, the
    /// ledger runs or the post-mark of `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is not in the store.
    pub fn duplicate_vertex(&mut self, id: VertexId) -> Result<VertexId, TopologyError> {
        let data = self.vertex(id)?.duplicate(self.next_id);
        self.next_id += 1;
        Ok(self.vertices.insert(data))
    }

    /// Returns `v` to the unvisited state if everything it held was moved
    /// away or withdrawn. Returns `true` if it was reopened.
    pub(crate) fn reopen(&mut self, v: VertexId) -> Result<bool, TopologyError> {
        Ok(self.vertex_mut(v)?.reopen())
    }

    /// Labels a vertex with a shell index.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is not found.
    pub fn set_post_mark(&mut self, id: VertexId, label: usize) -> Result<(), TopologyError> {
        self.vertex_mut(id)?.set_post_mark(label);
        Ok(())
    }

    /// Forgets every shell label on vertices and facets.
    pub(crate) fn clear_labels(&mut self) {
        for vertex in self.vertices.values_mut() {
            vertex.clear_post_mark();
        }
        for facet in self.facets.values_mut() {
            facet.shell = None;
        }
    }

    // --- Border queries ---

    /// Resolves a border handle and checks that its successor still exists.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::DanglingBorderReference`] if either the
    /// record or its successor vertex is gone.
    pub fn border(&self, id: BorderId) -> Result<&BorderRecord, TopologyError> {
        let record = self.border.get(id)?;
        if !self.vertices.contains_key(record.successor) {
            return Err(TopologyError::DanglingBorderReference {
                vertex: Some(record.successor),
                border: id,
            });
        }
        Ok(record)
    }

    /// The border element pool. Records are never removed, so this also
    /// holds records of edges that have since closed.
    #[must_use]
    pub fn border_pool(&self) -> &BorderPool {
        &self.border
    }

    /// Slot A of `v`.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is not found.
    pub fn first_incident(&self, v: VertexId) -> Result<Option<BorderId>, TopologyError> {
        Ok(self.vertex(v)?.first_incident())
    }

    /// `true` if `v` has a slot leading to `w`.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is not found or a slot dangles.
    pub fn is_border_edge(&self, v: VertexId, w: VertexId) -> Result<bool, TopologyError> {
        self.vertex(v)?
            .is_border_edge(&self.border, w)
            .map_err(|e| on_vertex(e, v))
    }

    /// The slot of `v` leading to `w`.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is not found or a slot dangles.
    pub fn border_elt(&self, v: VertexId, w: VertexId) -> Result<Option<BorderId>, TopologyError> {
        self.vertex(v)?
            .border_elt(&self.border, w)
            .map_err(|e| on_vertex(e, v))
    }

    /// The slot of `v` grown by front `front`.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is not found or a slot dangles.
    pub fn next_on_border(
        &self,
        v: VertexId,
        front: usize,
    ) -> Result<Option<BorderId>, TopologyError> {
        self.vertex(v)?
            .next_on_border(&self.border, front)
            .map_err(|e| on_vertex(e, v))
    }

    /// One step along the border: the neighbour of `v` that is not `prev`.
    ///
    /// With `prev = None` this is the successor of slot A. Returns `None` at
    /// the end of an open path.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is not found or a slot dangles.
    pub fn next_along(
        &self,
        v: VertexId,
        prev: Option<VertexId>,
    ) -> Result<Option<VertexId>, TopologyError> {
        let vertex = self.vertex(v)?;
        for id in vertex.border_slots() {
            let successor = self.border(id).map_err(|e| on_vertex(e, v))?.successor;
            if Some(successor) != prev {
                return Ok(Some(successor));
            }
        }
        Ok(None)
    }

    /// The far endpoints of every border edge on `v`, in slot order.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is not found or a slot dangles.
    pub fn border_neighbors(&self, v: VertexId) -> Result<Vec<VertexId>, TopologyError> {
        self.vertex(v)?
            .border_slots()
            .map(|id| {
                self.border(id)
                    .map(|rec| rec.successor)
                    .map_err(|e| on_vertex(e, v))
            })
            .collect()
    }

    // --- Border updates ---

    /// Puts edge `(v, w)` on the border.
    ///
    /// If either endpoint already holds two border edges, nothing is
    /// installed and that endpoint gets an [`IncidenceRequest`] instead.
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint is missing or interior, if `v == w`,
    /// or if the edge is already on the border.
    pub fn attach_border_edge(
        &mut self,
        v: VertexId,
        w: VertexId,
        elt: BorderElt,
    ) -> Result<Attach, TopologyError> {
        if v == w {
            return Err(TopologyError::InvalidTopology(
                "border edge needs two distinct endpoints".into(),
            ));
        }
        let mut full = Vec::new();
        for host in [v, w] {
            let vertex = self.vertex(host)?;
            if !vertex.not_interior() {
                return Err(TopologyError::InvalidTopology(format!(
                    "vertex {} is interior",
                    vertex.id()
                )));
            }
            if vertex.filled_slots() == 2 {
                full.push(host);
            }
        }
        if self.is_border_edge(v, w)? {
            return Err(TopologyError::InvalidTopology(
                "edge is already on the border".into(),
            ));
        }

        if !full.is_empty() {
            for &host in &full {
                let other = if host == v { w } else { v };
                self.defer(host, IncidenceRequest::new(host, other, elt))?;
            }
            return Ok(Attach::Deferred { at: full });
        }

        let forward = self.border.push(BorderRecord { successor: w, elt });
        let backward = self.border.push(BorderRecord { successor: v, elt });
        for (host, record) in [(v, forward), (w, backward)] {
            let vertex = self.vertex_mut(host)?;
            match vertex.set_next_border_elt(record) {
                SlotFill::Filled(_) => vertex.inc_mark(),
                SlotFill::Overflow => {
                    return Err(TopologyError::InvalidTopology(format!(
                        "vertex {} overflowed after a free slot was checked",
                        vertex.id()
                    )))
                }
            }
        }
        Ok(Attach::Installed { forward, backward })
    }

    /// Takes edge `(v, w)` off the border on both endpoints.
    ///
    /// A vertex that loses a slot while requests wait on it releases all of
    /// them; they are returned so the caller can retry them against the new
    /// front.
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint is missing or `(v, w)` is not a border edge.
    pub fn detach_border_edge(
        &mut self,
        v: VertexId,
        w: VertexId,
    ) -> Result<Vec<IncidenceRequest>, TopologyError> {
        if !self.is_border_edge(v, w)? || !self.is_border_edge(w, v)? {
            return Err(TopologyError::InvalidTopology(
                "edge is not on the border".into(),
            ));
        }
        let mut released = Vec::new();
        for (host, other) in [(v, w), (w, v)] {
            let vertex = self
                .vertices
                .get_mut(host)
                .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))?;
            vertex
                .remove_border_elt(&self.border, other)
                .map_err(|e| on_vertex(e, host))?;
            vertex.dec_mark();
            let freed = self.requests.take(&mut vertex.requests);
            for _ in &freed {
                vertex.dec_mark();
            }
            if !vertex.not_interior() {
                vertex.delete_border();
            }
            released.extend(freed);
        }
        Ok(released)
    }

    // --- Incidence request ledger ---

    /// Queues `request` on `host`, counting it in the mark.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is missing or still has a free slot.
    pub fn defer(
        &mut self,
        host: VertexId,
        request: IncidenceRequest,
    ) -> Result<RequestId, TopologyError> {
        let vertex = self
            .vertices
            .get_mut(host)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))?;
        if vertex.filled_slots() < 2 {
            return Err(TopologyError::InvalidTopology(format!(
                "vertex {} has a free slot; requests are for full vertices",
                vertex.id()
            )));
        }
        vertex.inc_mark();
        Ok(self.requests.append(&mut vertex.requests, request))
    }

    /// Pending requests of `v` in arrival order.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is not found.
    pub fn requests(&self, v: VertexId) -> Result<Vec<IncidenceRequest>, TopologyError> {
        let vertex = self.vertex(v)?;
        Ok(self
            .requests
            .iter(vertex.requests)
            .map(|(_, request)| *request)
            .collect())
    }

    /// Pending requests of `v` with their ledger handles.
    pub(crate) fn request_entries(
        &self,
        v: VertexId,
    ) -> Result<Vec<(RequestId, IncidenceRequest)>, TopologyError> {
        let vertex = self.vertex(v)?;
        Ok(self
            .requests
            .iter(vertex.requests)
            .map(|(id, request)| (id, *request))
            .collect())
    }

    /// Drops the requests of `v` matching `pred` and uncounts them from its mark.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is not found.
    pub fn withdraw_requests(
        &mut self,
        v: VertexId,
        pred: impl Fn(&IncidenceRequest) -> bool,
    ) -> Result<Vec<IncidenceRequest>, TopologyError> {
        let vertex = self
            .vertices
            .get_mut(v)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))?;
        let removed = self.requests.retain(&mut vertex.requests, |_, r| !pred(r));
        for _ in &removed {
            vertex.dec_mark();
        }
        Ok(removed)
    }

    /// Drops the listed requests of `v`, returning them in arrival order.
    pub(crate) fn withdraw_request_ids(
        &mut self,
        v: VertexId,
        ids: &[RequestId],
    ) -> Result<Vec<IncidenceRequest>, TopologyError> {
        let vertex = self
            .vertices
            .get_mut(v)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))?;
        let removed = self
            .requests
            .retain(&mut vertex.requests, |id, _| !ids.contains(&id));
        for _ in &removed {
            vertex.dec_mark();
        }
        Ok(removed)
    }

    /// Drops the copy of an untagged `request` waiting on its other endpoint.
    ///
    /// An edge refused at both ends leaves one request per endpoint; once
    /// one of them is placed the other must go.
    pub(crate) fn withdraw_sibling(
        &mut self,
        request: &IncidenceRequest,
    ) -> Result<Vec<IncidenceRequest>, TopologyError> {
        if request.candidate.is_some() {
            return Ok(Vec::new());
        }
        let (host, other) = request.edge;
        self.withdraw_requests(other, |r| {
            r.candidate.is_none() && r.edge == (other, host) && r.elt == request.elt
        })
    }

    /// Vertices with at least one pending request.
    #[must_use]
    pub fn pending_vertices(&self) -> Vec<VertexId> {
        self.vertices
            .iter()
            .filter(|(_, vertex)| vertex.requests.is_some())
            .map(|(id, _)| id)
            .collect()
    }

    /// Total number of pending requests.
    #[must_use]
    pub fn pending_request_count(&self) -> usize {
        self.requests.len()
    }

    // --- Interior edge ledger ---

    /// Records `(v, w)` as interior (shared by two accepted facets).
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint is not found.
    pub fn add_interior_edge(&mut self, v: VertexId, w: VertexId) -> Result<(), TopologyError> {
        if self.is_interior_edge(v, w)? {
            return Ok(());
        }
        for (host, other) in [(v, w), (w, v)] {
            let vertex = self
                .vertices
                .get_mut(host)
                .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))?;
            self.interior.append(&mut vertex.interior, other);
        }
        Ok(())
    }

    /// `true` if `(v, w)` was recorded as interior.
    ///
    /// # Errors
    ///
    /// Returns an error if `v` is not found.
    pub fn is_interior_edge(&self, v: VertexId, w: VertexId) -> Result<bool, TopologyError> {
        let vertex = self.vertex(v)?;
        Ok(self.interior.iter(vertex.interior).any(|(_, &other)| other == w))
    }

    /// Far endpoints of the interior edges on `v`, in the order they closed.
    ///
    /// # Errors
    ///
    /// Returns an error if `v` is not found.
    pub fn interior_neighbors(&self, v: VertexId) -> Result<Vec<VertexId>, TopologyError> {
        let vertex = self.vertex(v)?;
        Ok(self
            .interior
            .iter(vertex.interior)
            .map(|(_, &other)| other)
            .collect())
    }

    // --- Facet operations ---

    /// Inserts an accepted facet and returns its ID.
    pub fn add_facet(&mut self, data: FacetData) -> FacetId {
        self.facets.insert(data)
    }

    /// Returns a reference to the facet data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the entity is not found in the store.
    pub fn facet(&self, id: FacetId) -> Result<&FacetData, TopologyError> {
        self.facets
            .get(id)
            .ok_or_else(|| TopologyError::EntityNotFound("facet".into()))
    }

    /// Labels facet `id` with shell `label`.
    pub(crate) fn set_facet_shell(&mut self, id: FacetId, label: usize) -> Result<(), TopologyError> {
        self.facets
            .get_mut(id)
            .ok_or_else(|| TopologyError::EntityNotFound("facet".into()))?
            .shell = Some(label);
        Ok(())
    }

    /// All accepted facets in insertion order.
    pub fn facets(&self) -> impl Iterator<Item = (FacetId, &FacetData)> {
        self.facets.iter()
    }

    /// Number of accepted facets.
    #[must_use]
    pub fn facet_count(&self) -> usize {
        self.facets.len()
    }
}

/// Undirected key for edge `(a, b)`.
pub(crate) fn edge_key(a: VertexId, b: VertexId) -> (VertexId, VertexId) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Attaches the vertex a dangling slot was read from.
fn on_vertex(err: TopologyError, v: VertexId) -> TopologyError {
    match err {
        TopologyError::DanglingBorderReference {
            vertex: None,
            border,
        } => TopologyError::DanglingBorderReference {
            vertex: Some(v),
            border,
        },
        other => other,
    }
}
