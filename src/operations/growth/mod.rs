//! Advancing-front growth over a set of scored candidate triangles.

mod admissibility;
mod report;

pub use report::{Diagnostic, Reconstruction, StopReason};

use std::cmp::Ordering as CmpOrdering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::{OperationError, Result};
use crate::operations::query::BorderLoops;
use crate::operations::{LabelShells, ResolveIncidence};
use crate::topology::{
    edge_key, Attach, BorderElt, CellId, Edge, FacetData, FacetId, FrontStore, IncidenceRequest,
    IncidentFacet, VertexId,
};

use admissibility::Verdict;

/// Local index pairs of the three edges of a candidate, in winding order.
const LOCAL_EDGES: [(u8, u8); 3] = [(0, 1), (1, 2), (2, 0)];

/// A scored triangle offered to the front by the triangulation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    /// Cell the triangle was taken from.
    pub cell: CellId,
    /// Local index of the triangle within its cell.
    pub facet: u8,
    /// Corners in the order the triangulation produced them.
    pub vertices: [VertexId; 3],
    /// Quality score (lower is better).
    pub score: f64,
}

impl Candidate {
    /// Creates a new candidate.
    #[must_use]
    pub fn new(cell: CellId, facet: u8, vertices: [VertexId; 3], score: f64) -> Self {
        Self {
            cell,
            facet,
            vertices,
            score,
        }
    }

    fn vertex(&self, local: u8) -> VertexId {
        self.vertices[usize::from(local)]
    }

    fn local_of(&self, v: VertexId) -> Option<u8> {
        (0u8..3).find(|&k| self.vertex(k) == v)
    }

    /// The three edges in winding order.
    #[must_use]
    pub fn edges(&self) -> [(VertexId, VertexId); 3] {
        LOCAL_EDGES.map(|(i, j)| (self.vertex(i), self.vertex(j)))
    }

    /// Orientation-free identity of the triangle.
    fn key(&self) -> [VertexId; 3] {
        let mut key = self.vertices;
        key.sort_unstable();
        key
    }

    /// The same triangle with `from` replaced by `to`.
    fn remapped(&self, from: VertexId, to: VertexId) -> Self {
        Self {
            vertices: self.vertices.map(|v| if v == from { to } else { v }),
            ..*self
        }
    }
}

/// Parameters controlling front growth.
#[derive(Debug, Clone, Copy)]
pub struct GrowthParams {
    /// Candidates scoring above this are never accepted.
    pub radius_ratio_bound: f64,
    /// Minimum opening angle (radians) between a candidate and the facet
    /// across a shared border edge.
    pub beta: f64,
    /// Split non-manifold vertices when growth stalls.
    pub resolve_non_manifold: bool,
    /// Duplicates one vertex may receive in a single resolution pass.
    pub max_duplicates: usize,
    /// Resolution passes allowed over the whole run.
    pub max_resolution_passes: usize,
    /// Stop after this many accepted facets.
    pub max_facets: Option<usize>,
}

impl Default for GrowthParams {
    fn default() -> Self {
        Self {
            radius_ratio_bound: 5.0,
            beta: std::f64::consts::FRAC_PI_6,
            resolve_non_manifold: true,
            max_duplicates: 1,
            max_resolution_passes: 4,
            max_facets: None,
        }
    }
}

/// Grows a surface from scored candidate triangles.
///
/// Candidates are taken best score first. A candidate joins the surface
/// when it shares a border edge with the front and every one of its
/// vertices keeps at most two border edges afterwards. One that would push a
/// vertex past two edges leaves incidence requests on that vertex instead;
/// when nothing else can grow, [`ResolveIncidence`] splits the vertex so the
/// two best edges keep it and the rest move to duplicates, and the candidate
/// is retried wherever it ended up. When no front can
/// advance, the best candidate with three unvisited vertices seeds a new
/// one.
pub struct GrowFront {
    candidates: Vec<Candidate>,
    params: GrowthParams,
    cancel: Option<Arc<AtomicBool>>,
}

impl GrowFront {
    /// Creates a growth run over `candidates` with default parameters.
    #[must_use]
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            params: GrowthParams::default(),
            cancel: None,
        }
    }

    /// Sets custom growth parameters.
    #[must_use]
    pub fn with_params(mut self, params: GrowthParams) -> Self {
        self.params = params;
        self
    }

    /// Checks `flag` between candidates and stops once it is set.
    #[must_use]
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Executes the growth.
    ///
    /// # Errors
    ///
    /// Returns [`OperationError::InvalidInput`] for unusable parameters, an
    /// error if a candidate names a vertex missing from `store`, and any
    /// topology error raised by the front bookkeeping. A dangling border
    /// reference aborts the run.
    pub fn execute(&self, store: &mut FrontStore) -> Result<Reconstruction> {
        if !(0.0..=std::f64::consts::PI).contains(&self.params.beta) {
            return Err(OperationError::InvalidInput(format!(
                "beta must lie in [0, pi], got {}",
                self.params.beta
            ))
            .into());
        }
        if self.params.radius_ratio_bound.is_nan() {
            return Err(
                OperationError::InvalidInput("radius ratio bound is NaN".into()).into(),
            );
        }
        for candidate in &self.candidates {
            for v in candidate.vertices {
                store.vertex(v)?;
            }
        }

        let mut growth = Growth::new(store, &self.params, &self.candidates);
        let stop = growth.run(self.cancel.as_deref())?;
        growth.finish(stop)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CandidateState {
    Open,
    Accepted,
    Discarded,
    /// Replaced by a copy using a duplicate vertex.
    Superseded,
}

/// Heap entry; lowest score pops first, ties by candidate index.
#[derive(Debug, Clone, Copy)]
struct Queued {
    score: f64,
    index: usize,
}

impl PartialEq for Queued {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == CmpOrdering::Equal
    }
}

impl Eq for Queued {}

impl PartialOrd for Queued {
    fn partial_cmp(&self, other: &Self) -> Option<CmpOrdering> {
        Some(self.cmp(other))
    }
}

impl Ord for Queued {
    fn cmp(&self, other: &Self) -> CmpOrdering {
        // Reversed for min-heap behavior
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| other.index.cmp(&self.index))
    }
}

struct Growth<'a> {
    store: &'a mut FrontStore,
    params: &'a GrowthParams,
    candidates: Vec<Candidate>,
    state: Vec<CandidateState>,
    queued: Vec<bool>,
    heap: BinaryHeap<Queued>,
    by_edge: HashMap<(VertexId, VertexId), Vec<usize>>,
    edge_facets: HashMap<(VertexId, VertexId), Vec<FacetId>>,
    accepted_keys: HashSet<[VertexId; 3]>,
    accepted: Vec<FacetId>,
    front: usize,
    fronts: usize,
}

impl<'a> Growth<'a> {
    fn new(store: &'a mut FrontStore, params: &'a GrowthParams, candidates: &[Candidate]) -> Self {
        let mut growth = Self {
            store,
            params,
            candidates: Vec::with_capacity(candidates.len()),
            state: Vec::with_capacity(candidates.len()),
            queued: Vec::with_capacity(candidates.len()),
            heap: BinaryHeap::new(),
            by_edge: HashMap::new(),
            edge_facets: HashMap::new(),
            accepted_keys: HashSet::new(),
            accepted: Vec::new(),
            front: 0,
            fronts: 0,
        };
        for &candidate in candidates {
            growth.register(candidate);
        }
        growth
    }

    fn register(&mut self, candidate: Candidate) -> usize {
        let index = self.candidates.len();
        for (x, y) in candidate.edges() {
            self.by_edge.entry(edge_key(x, y)).or_default().push(index);
        }
        self.candidates.push(candidate);
        self.state.push(CandidateState::Open);
        self.queued.push(false);
        index
    }

    fn push(&mut self, index: usize) {
        if self.state[index] == CandidateState::Open && !self.queued[index] {
            self.queued[index] = true;
            self.heap.push(Queued {
                score: self.candidates[index].score,
                index,
            });
        }
    }

    fn run(&mut self, cancel: Option<&AtomicBool>) -> Result<StopReason> {
        let mut passes = 0;
        loop {
            if cancel.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                tracing::debug!(facets = self.accepted.len(), "growth cancelled");
                return Ok(StopReason::Cancelled);
            }
            if self
                .params
                .max_facets
                .is_some_and(|max| self.accepted.len() >= max)
            {
                return Ok(StopReason::FacetLimit);
            }

            if let Some(Queued { index, .. }) = self.heap.pop() {
                self.queued[index] = false;
                if self.state[index] == CandidateState::Open {
                    self.step(index)?;
                }
                continue;
            }

            if self.params.resolve_non_manifold
                && passes < self.params.max_resolution_passes
                && !self.store.pending_vertices().is_empty()
            {
                passes += 1;
                if self.resolve_pass()? {
                    continue;
                }
            }

            match self.best_seed()? {
                Some(seed) => {
                    self.front = self.fronts;
                    self.fronts += 1;
                    tracing::debug!(front = self.front, candidate = seed, "starting a new front");
                    self.accept(seed, &[])?;
                }
                None => return Ok(StopReason::Exhausted),
            }
        }
    }

    fn step(&mut self, index: usize) -> Result<()> {
        match admissibility::judge(self, index, false)? {
            Verdict::Accept(shared) => self.accept(index, &shared)?,
            Verdict::Reject(reason) => {
                tracing::trace!(candidate = index, reason, "candidate rejected for now");
            }
            Verdict::Discard(reason) => {
                self.state[index] = CandidateState::Discarded;
                tracing::trace!(candidate = index, reason, "candidate discarded");
            }
            Verdict::Overflow(at) => self.defer(index, &at)?,
        }
        Ok(())
    }

    fn elt(&self, candidate: &Candidate, i: u8, j: u8) -> BorderElt {
        BorderElt::new(
            candidate.score,
            IncidentFacet::new(Edge::new(candidate.cell, i, j), candidate.facet),
            self.front,
        )
    }

    /// Queues the new edges of candidate `index` on each overflowing vertex.
    fn defer(&mut self, index: usize, at: &[VertexId]) -> Result<()> {
        let candidate = self.candidates[index];
        for &v in at {
            if self
                .store
                .requests(v)?
                .iter()
                .any(|r| r.candidate == Some(index))
            {
                continue;
            }
            for (i, j) in LOCAL_EDGES {
                let (x, y) = (candidate.vertex(i), candidate.vertex(j));
                if (x != v && y != v) || self.store.is_border_edge(x, y)? {
                    continue;
                }
                let other = if x == v { y } else { x };
                let request =
                    IncidenceRequest::new(v, other, self.elt(&candidate, i, j)).with_candidate(index);
                self.store.defer(v, request)?;
            }
        }
        tracing::debug!(candidate = index, vertices = ?at, "candidate deferred at non-manifold vertices");
        Ok(())
    }

    fn accept(&mut self, index: usize, shared: &[(VertexId, VertexId)]) -> Result<()> {
        let candidate = self.candidates[index];

        let mut vertices = candidate.vertices;
        if let Some(&(x, y)) = shared.first() {
            if let Some(&neighbor) = self.edge_facets.get(&edge_key(x, y)).and_then(|f| f.first()) {
                // Neighbours traverse a shared edge in opposite directions.
                if self.store.facet(neighbor)?.has_directed_edge(x, y) {
                    vertices.swap(1, 2);
                }
            }
        }
        let facet = self.store.add_facet(FacetData::new(
            vertices,
            candidate.score,
            (candidate.cell, candidate.facet),
        ));
        self.state[index] = CandidateState::Accepted;
        self.accepted_keys.insert(candidate.key());
        self.accepted.push(facet);

        for v in candidate.vertices {
            self.store
                .withdraw_requests(v, |r| r.candidate == Some(index))?;
        }

        let edges = self.store.facet(facet)?.edges();
        let mut released = Vec::new();
        let mut fresh = Vec::new();
        for (x, y) in edges {
            if self.store.is_border_edge(x, y)? {
                released.extend(self.store.detach_border_edge(x, y)?);
                self.store.add_interior_edge(x, y)?;
            } else {
                fresh.push((x, y));
            }
        }
        for &(x, y) in &fresh {
            let (Some(i), Some(j)) = (candidate.local_of(x), candidate.local_of(y)) else {
                continue;
            };
            let elt = self.elt(&candidate, i, j);
            if let Attach::Deferred { at } = self.store.attach_border_edge(x, y, elt)? {
                tracing::warn!(candidate = index, vertices = ?at, "edge of an accepted facet was deferred");
            }
        }
        for (x, y) in edges {
            self.edge_facets.entry(edge_key(x, y)).or_default().push(facet);
        }

        self.retry(released)?;
        for (x, y) in fresh {
            let adjacent = self.by_edge.get(&edge_key(x, y)).cloned().unwrap_or_default();
            for other in adjacent {
                self.push(other);
            }
        }
        tracing::debug!(
            candidate = index,
            front = self.front,
            score = candidate.score,
            "accepted facet"
        );
        Ok(())
    }

    /// Gives requests released by a closing border edge another chance.
    fn retry(&mut self, released: Vec<IncidenceRequest>) -> Result<()> {
        for request in released {
            if let Some(index) = request.candidate {
                self.push(index);
                continue;
            }
            let (x, y) = request.edge;
            if !self.store.vertex(x)?.not_interior()
                || !self.store.vertex(y)?.not_interior()
                || self.store.is_border_edge(x, y)?
            {
                tracing::trace!(?request, "dropping released request");
                continue;
            }
            if let Attach::Deferred { at } = self.store.attach_border_edge(x, y, request.elt)? {
                tracing::trace!(?request, vertices = ?at, "released request deferred again");
            }
        }
        Ok(())
    }

    /// Splits every vertex with pending requests. Returns `true` if the
    /// front changed.
    fn resolve_pass(&mut self) -> Result<bool> {
        let mut progress = false;
        for v in self.store.pending_vertices() {
            if self.store.requests(v)?.is_empty() {
                continue;
            }
            let resolution = ResolveIncidence::new(v)
                .max_duplicates(self.params.max_duplicates)
                .execute(self.store)?;
            if !resolution.moved.is_empty() {
                progress = true;
                self.rekey_facets()?;
            }
            for fan in &resolution.moved {
                for &w in &fan.border {
                    let adjacent =
                        self.by_edge.get(&edge_key(v, w)).cloned().unwrap_or_default();
                    for index in adjacent {
                        if self.state[index] != CandidateState::Open {
                            continue;
                        }
                        let moved = self.candidates[index].remapped(v, fan.duplicate);
                        self.state[index] = CandidateState::Superseded;
                        let retried = self.register(moved);
                        self.push(retried);
                    }
                }
            }
            progress |= !resolution.reinstated.is_empty() || !resolution.released.is_empty();
            self.retry(resolution.reinstated)?;
            self.retry(resolution.released)?;

            for group in resolution.hosted {
                progress = true;
                let Some(index) = group.candidate else {
                    continue;
                };
                if self.state[index] != CandidateState::Open {
                    continue;
                }
                let original = self.candidates[index];
                for w in original.vertices {
                    self.store
                        .withdraw_requests(w, |r| r.candidate == Some(index))?;
                }
                self.state[index] = CandidateState::Superseded;
                let retried = self.register(original.remapped(v, group.duplicate));
                self.push(retried);
                tracing::debug!(
                    candidate = index,
                    retried,
                    duplicate = ?group.duplicate,
                    "retrying candidate on a duplicate vertex"
                );
            }
        }
        Ok(progress)
    }

    /// Re-reads the corners of accepted facets after a fan moved.
    fn rekey_facets(&mut self) -> Result<()> {
        self.edge_facets.clear();
        for &facet in &self.accepted {
            let data = self.store.facet(facet)?;
            let mut key = data.vertices;
            key.sort_unstable();
            self.accepted_keys.insert(key);
            for (x, y) in data.edges() {
                self.edge_facets.entry(edge_key(x, y)).or_default().push(facet);
            }
        }
        Ok(())
    }

    fn best_seed(&mut self) -> Result<Option<usize>> {
        let mut order: Vec<usize> = (0..self.candidates.len())
            .filter(|&i| self.state[i] == CandidateState::Open)
            .collect();
        order.sort_by(|&a, &b| {
            self.candidates[a]
                .score
                .total_cmp(&self.candidates[b].score)
                .then(a.cmp(&b))
        });
        for index in order {
            match admissibility::judge(self, index, true)? {
                Verdict::Accept(_) => return Ok(Some(index)),
                Verdict::Discard(reason) => {
                    self.state[index] = CandidateState::Discarded;
                    tracing::trace!(candidate = index, reason, "candidate discarded");
                }
                Verdict::Reject(_) | Verdict::Overflow(_) => {}
            }
        }
        Ok(None)
    }

    fn finish(self, stop: StopReason) -> Result<Reconstruction> {
        let mut diagnostics = Vec::new();
        for v in self.store.pending_vertices() {
            let requests = self.store.requests(v)?;
            diagnostics.push(Diagnostic::NonManifoldOverflow {
                vertex: v,
                installed: self
                    .store
                    .border_neighbors(v)?
                    .into_iter()
                    .map(|w| (v, w))
                    .collect(),
                deferred: requests.iter().map(|r| r.edge).collect(),
            });
            for request in requests {
                diagnostics.push(Diagnostic::UnresolvedIncidenceRequest { vertex: v, request });
            }
        }
        for diagnostic in &diagnostics {
            tracing::warn!(?diagnostic, "front left a non-manifold vertex");
        }

        let loops = BorderLoops::new().execute(self.store)?;
        let shells = LabelShells::new().execute(self.store)?;
        tracing::debug!(
            facets = self.accepted.len(),
            fronts = self.fronts,
            shells,
            loops = loops.len(),
            ?stop,
            "growth finished"
        );
        Ok(Reconstruction {
            facets: self.accepted,
            fronts: self.fronts,
            shells,
            loops,
            diagnostics,
            stop,
        })
    }
}
