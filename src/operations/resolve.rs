use crate::error::Result;
use crate::topology::{
    Attach, BorderId, FacetId, Fan, FrontStore, IncidenceRequest, RequestId, VertexId,
};

/// Splits a non-manifold vertex so that it keeps its two best border edges.
///
/// The border edges installed on the vertex and its pending incidence
/// requests are ranked by score (lower is better, ties keep arrival order
/// with installed edges first). Entries that have to move together are
/// ranked as one unit by their best member:
///
/// * installed edges joined by a fan of accepted facets around the vertex;
/// * requests produced by the same candidate facet;
/// * each untagged request on its own.
///
/// Units are taken best first while they fit in the two slots of the vertex.
/// Every other unit gets one fresh duplicate vertex until the budget runs out:
///
/// * a losing fan moves to its duplicate with its facets and edges;
/// * an untagged request is installed as a border edge on its duplicate;
/// * a tagged group is handed back so the caller can retry its candidate
///   facet on the duplicate.
///
/// Winning requests are installed on the vertex itself, or handed back as
/// reinstated when tagged. If the budget cannot cover every losing fan, no
/// fan moves and installed edges keep their slots. Requests left over stay in
/// the ledger and are reported as unresolved, unless the vertex ended with a
/// free slot: then they are released to the caller.
pub struct ResolveIncidence {
    vertex: VertexId,
    max_duplicates: usize,
}

/// Requests moved onto one duplicate vertex.
#[derive(Debug, Clone)]
pub struct HostedGroup {
    /// The fresh vertex hosting the requests.
    pub duplicate: VertexId,
    /// Candidate facet shared by the requests, if any.
    pub candidate: Option<usize>,
    /// The requests, best first. Their first endpoint is still the original vertex.
    pub requests: Vec<IncidenceRequest>,
    /// For an untagged request, what happened when it was installed.
    pub attach: Option<Attach>,
}

/// A fan that lost its place on the original vertex.
#[derive(Debug, Clone)]
pub struct MovedFan {
    /// The fresh vertex now holding the fan.
    pub duplicate: VertexId,
    /// Accepted facets that now use the duplicate.
    pub facets: Vec<FacetId>,
    /// Far endpoints of the border edges that moved.
    pub border: Vec<VertexId>,
}

/// Outcome of [`ResolveIncidence`].
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// Border edges on the original vertex once resolution is done.
    pub kept: Vec<BorderId>,
    /// Installed edges that were outranked, with their facets.
    pub moved: Vec<MovedFan>,
    /// Tagged requests that won a slot on the original vertex. Their
    /// candidate can be retried as is.
    pub reinstated: Vec<IncidenceRequest>,
    /// Requests placed on duplicates.
    pub hosted: Vec<HostedGroup>,
    /// Requests still pending on the original vertex, best first.
    pub unresolved: Vec<IncidenceRequest>,
    /// Requests taken off the vertex because it ended with a free slot.
    /// Retry them like the requests released by
    /// [`FrontStore::detach_border_edge`].
    pub released: Vec<IncidenceRequest>,
}

impl Resolution {
    /// Returns `true` if nothing is left pending on the vertex.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.unresolved.is_empty()
    }
}

enum Unit {
    Installed {
        fan: Fan,
        border: Vec<VertexId>,
        score: f64,
    },
    Pending {
        candidate: Option<usize>,
        members: Vec<(RequestId, IncidenceRequest)>,
    },
}

impl Unit {
    fn score(&self) -> f64 {
        match self {
            Unit::Installed { score, .. } => *score,
            Unit::Pending { members, .. } => members
                .iter()
                .map(|(_, request)| request.score())
                .fold(f64::INFINITY, f64::min),
        }
    }

    /// Slots the unit takes on the vertex.
    fn size(&self) -> usize {
        match self {
            Unit::Installed { border, .. } => border.len(),
            Unit::Pending { members, .. } => members.len(),
        }
    }

    fn is_installed(&self) -> bool {
        matches!(self, Unit::Installed { .. })
    }
}

impl ResolveIncidence {
    /// Creates a resolution for `vertex` allowing one duplicate.
    #[must_use]
    pub fn new(vertex: VertexId) -> Self {
        Self {
            vertex,
            max_duplicates: 1,
        }
    }

    /// Sets how many duplicates this resolution may create.
    #[must_use]
    pub fn max_duplicates(mut self, max_duplicates: usize) -> Self {
        self.max_duplicates = max_duplicates;
        self
    }

    /// Executes the resolution.
    ///
    /// # Errors
    ///
    /// Returns an error if the vertex is unknown or its front state is
    /// inconsistent (dangling slots, a fan that does not fit its duplicate).
    pub fn execute(&self, store: &mut FrontStore) -> Result<Resolution> {
        let v = self.vertex;
        let mut resolution = Resolution::default();
        if store.request_entries(v)?.is_empty() {
            resolution.kept = store.vertex(v)?.border_slots().collect();
            return Ok(resolution);
        }

        let mut units = self.installed_units(store)?;
        for (candidate, members) in self.pending_groups(store)? {
            let blocked = candidate.is_none() && {
                let other = members[0].1.other(v);
                !store.vertex(other)?.not_interior()
            };
            if blocked {
                resolution
                    .unresolved
                    .extend(members.iter().map(|(_, request)| *request));
            } else {
                units.push(Unit::Pending { candidate, members });
            }
        }
        // Stable: equal scores keep arrival order.
        units.sort_by(|a, b| a.score().total_cmp(&b.score()));

        let mut stays = fill_slots(&units);
        let losing = units
            .iter()
            .zip(&stays)
            .filter(|(unit, stay)| unit.is_installed() && !**stay)
            .count();
        if losing > self.max_duplicates {
            tracing::debug!(
                vertex = ?v,
                losing,
                budget = self.max_duplicates,
                "not enough duplicates to move outranked fans; installed edges stay"
            );
            stays = pinned(&units);
        }

        let mut budget = self.max_duplicates;
        let mut winners = Vec::new();
        let mut losers = Vec::new();
        for (unit, stay) in units.into_iter().zip(stays) {
            match unit {
                Unit::Installed { .. } if stay => {}
                Unit::Installed { fan, border, .. } => {
                    let duplicate = store.duplicate_vertex(v)?;
                    store.relocate_fan(v, duplicate, &fan, &border)?;
                    budget -= 1;
                    tracing::debug!(
                        vertex = ?v,
                        ?duplicate,
                        facets = fan.facets.len(),
                        "moved an outranked fan to a duplicate vertex"
                    );
                    resolution.moved.push(MovedFan {
                        duplicate,
                        facets: fan.facets,
                        border,
                    });
                }
                Unit::Pending { candidate, members } if stay => {
                    winners.push((candidate, members));
                }
                Unit::Pending { candidate, members } => losers.push((candidate, members)),
            }
        }

        if !winners.is_empty() {
            let ids: Vec<RequestId> = winners
                .iter()
                .flat_map(|(_, members)| members.iter().map(|(id, _)| *id))
                .collect();
            let requests = store.withdraw_request_ids(v, &ids)?;
            store.reopen(v)?;
            for request in requests {
                if request.candidate.is_some() {
                    resolution.reinstated.push(request);
                    continue;
                }
                store.withdraw_sibling(&request)?;
                let other = request.other(v);
                if store.is_border_edge(v, other)? {
                    continue;
                }
                if let Attach::Deferred { at } = store.attach_border_edge(v, other, request.elt)? {
                    tracing::trace!(
                        vertex = ?v,
                        deferred = ?at,
                        "reinstated edge waits on its far end"
                    );
                }
            }
        }

        for (candidate, members) in losers {
            if budget == 0 {
                resolution
                    .unresolved
                    .extend(members.iter().map(|(_, request)| *request));
                continue;
            }
            budget -= 1;

            let ids: Vec<RequestId> = members.iter().map(|(id, _)| *id).collect();
            let mut requests = store.withdraw_request_ids(v, &ids)?;
            requests.sort_by(|a, b| a.score().total_cmp(&b.score()));
            let duplicate = store.duplicate_vertex(v)?;

            let attach = match (candidate, requests.first()) {
                (None, Some(request)) => {
                    store.withdraw_sibling(request)?;
                    let other = request.other(v);
                    Some(store.attach_border_edge(duplicate, other, request.elt)?)
                }
                _ => None,
            };
            tracing::debug!(
                vertex = ?v,
                ?duplicate,
                ?candidate,
                requests = requests.len(),
                "hosted deferred edges on a duplicate vertex"
            );
            resolution.hosted.push(HostedGroup {
                duplicate,
                candidate,
                requests,
                attach,
            });
        }

        let vertex = store.vertex(v)?;
        if vertex.filled_slots() < 2 && vertex.requests.is_some() {
            resolution.released = store.withdraw_requests(v, |_| true)?;
            resolution.unresolved.clear();
            tracing::debug!(
                vertex = ?v,
                released = resolution.released.len(),
                "vertex has a free slot again; released its requests"
            );
        }
        store.reopen(v)?;

        resolution
            .unresolved
            .sort_by(|a, b| a.score().total_cmp(&b.score()));
        if !resolution.unresolved.is_empty() {
            tracing::debug!(
                vertex = ?v,
                unresolved = resolution.unresolved.len(),
                "incidence requests left pending"
            );
        }
        resolution.kept = store.vertex(v)?.border_slots().collect();
        Ok(resolution)
    }

    /// Installed edges of the vertex, joined when one fan links them.
    fn installed_units(&self, store: &FrontStore) -> Result<Vec<Unit>> {
        let v = self.vertex;
        let mut slots = Vec::with_capacity(2);
        for id in store.vertex(v)?.border_slots() {
            let record = store.border(id)?;
            slots.push((record.successor, record.elt.score));
        }

        let mut units = Vec::with_capacity(2);
        let mut claimed: Vec<VertexId> = Vec::with_capacity(2);
        for &(w, score) in &slots {
            if claimed.contains(&w) {
                continue;
            }
            let fan = store.fan(v, w)?;
            let mut border = vec![w];
            let mut best = score;
            let partner = slots
                .iter()
                .find(|&&(other, _)| other != w && fan.end == Some(other));
            if let Some(&(other, other_score)) = partner {
                border.push(other);
                best = best.min(other_score);
            }
            claimed.extend(&border);
            units.push(Unit::Installed {
                fan,
                border,
                score: best,
            });
        }
        Ok(units)
    }

    /// Pending requests in arrival order, grouped by candidate tag.
    fn pending_groups(
        &self,
        store: &FrontStore,
    ) -> Result<Vec<(Option<usize>, Vec<(RequestId, IncidenceRequest)>)>> {
        let mut groups: Vec<(Option<usize>, Vec<(RequestId, IncidenceRequest)>)> = Vec::new();
        for (id, request) in store.request_entries(self.vertex)? {
            let existing = request
                .candidate
                .and_then(|c| groups.iter_mut().find(|(tag, _)| *tag == Some(c)));
            match existing {
                Some((_, members)) => members.push((id, request)),
                None => groups.push((request.candidate, vec![(id, request)])),
            }
        }
        Ok(groups)
    }
}

/// Takes units best first while they fit in two slots.
fn fill_slots(units: &[Unit]) -> Vec<bool> {
    let mut free = 2usize;
    units
        .iter()
        .map(|unit| {
            let fits = unit.size() <= free;
            if fits {
                free -= unit.size();
            }
            fits
        })
        .collect()
}

/// Keeps every installed unit, then fills what is left with requests.
fn pinned(units: &[Unit]) -> Vec<bool> {
    let installed: usize = units
        .iter()
        .filter(|unit| unit.is_installed())
        .map(Unit::size)
        .sum();
    let mut free = 2usize.saturating_sub(installed);
    units
        .iter()
        .map(|unit| {
            if unit.is_installed() {
                return true;
            }
            let fits = unit.size() <= free;
            if fits {
                free -= unit.size();
            }
            fits
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::query::CheckFront;
    use crate::topology::{BorderElt, CellId, Edge, FacetData, IncidentFacet};

    fn elt(score: f64) -> BorderElt {
        BorderElt::new(score, IncidentFacet::new(Edge::new(CellId(1), 0, 2), 1), 0)
    }

    fn store_with(n: usize) -> (FrontStore, Vec<VertexId>) {
        let mut store = FrontStore::new();
        let ids = (0..n)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let y = i as f64;
                store.add_vertex(Point3::new(0.0, y, 1.0))
            })
            .collect();
        (store, ids)
    }

    /// `v` holds edges to `a` (0.1) and `b` (0.2); `c` (0.7) and `d` (0.3)
    /// arrive afterwards, in that order.
    fn overflowing() -> (FrontStore, [VertexId; 5]) {
        let (mut store, ids) = store_with(5);
        let (v, a, b, c, d) = (ids[0], ids[1], ids[2], ids[3], ids[4]);
        let _ = store.attach_border_edge(v, a, elt(0.1)).unwrap();
        let _ = store.attach_border_edge(v, b, elt(0.2)).unwrap();
        let _ = store.attach_border_edge(v, c, elt(0.7)).unwrap();
        let _ = store.attach_border_edge(v, d, elt(0.3)).unwrap();
        (store, [v, a, b, c, d])
    }

    #[test]
    fn best_request_gets_the_duplicate() {
        let (mut store, [v, a, b, c, d]) = overflowing();
        assert_eq!(store.vertex(v).unwrap().number_of_incident_border(), 4);
        let before = store.vertex(v).unwrap().border_slots().collect::<Vec<_>>();

        let resolution = ResolveIncidence::new(v).execute(&mut store).unwrap();

        // Installed edges stay on v, untouched.
        assert_eq!(resolution.kept, before);
        assert!(store.is_border_edge(v, a).unwrap());
        assert!(store.is_border_edge(v, b).unwrap());

        // The 0.3 edge moved to a duplicate at the same position.
        assert_eq!(resolution.hosted.len(), 1);
        let hosted = &resolution.hosted[0];
        assert_eq!(hosted.requests[0].other(v), d);
        assert!(matches!(hosted.attach, Some(Attach::Installed { .. })));
        let dup = hosted.duplicate;
        assert_ne!(dup, v);
        assert_eq!(store.vertex(dup).unwrap().point, store.vertex(v).unwrap().point);
        assert!(store.is_border_edge(dup, d).unwrap());
        assert!(store.is_border_edge(d, dup).unwrap());
        assert!(!store.is_border_edge(d, v).unwrap());
        assert_eq!(store.vertex(dup).unwrap().number_of_incident_border(), 1);

        // The 0.7 edge is still waiting on v.
        assert!(!resolution.is_resolved());
        assert_eq!(resolution.unresolved.len(), 1);
        assert_eq!(resolution.unresolved[0].other(v), c);
        let pending = store.requests(v).unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].other(v), c);
        assert_eq!(store.vertex(v).unwrap().number_of_incident_border(), 3);
    }

    #[test]
    fn larger_budget_drains_the_ledger() {
        let (mut store, [v, _, _, c, d]) = overflowing();
        let resolution = ResolveIncidence::new(v)
            .max_duplicates(2)
            .execute(&mut store)
            .unwrap();
        assert!(resolution.is_resolved());
        let hosted: Vec<VertexId> = resolution
            .hosted
            .iter()
            .map(|g| g.requests[0].other(v))
            .collect();
        assert_eq!(hosted, vec![d, c]);
        assert_eq!(store.vertex(v).unwrap().number_of_incident_border(), 2);
        assert!(store.pending_vertices().is_empty());
    }

    #[test]
    fn equal_scores_keep_arrival_order() {
        let (mut store, ids) = store_with(5);
        let v = ids[0];
        let _ = store.attach_border_edge(v, ids[1], elt(0.1)).unwrap();
        let _ = store.attach_border_edge(v, ids[2], elt(0.1)).unwrap();
        let _ = store.attach_border_edge(v, ids[3], elt(0.5)).unwrap();
        let _ = store.attach_border_edge(v, ids[4], elt(0.5)).unwrap();

        let resolution = ResolveIncidence::new(v).execute(&mut store).unwrap();
        assert_eq!(resolution.hosted[0].requests[0].other(v), ids[3]);
        assert_eq!(resolution.unresolved[0].other(v), ids[4]);
    }

    #[test]
    fn tagged_requests_share_a_duplicate() {
        let (mut store, ids) = store_with(5);
        let v = ids[0];
        let _ = store.attach_border_edge(v, ids[1], elt(0.1)).unwrap();
        let _ = store.attach_border_edge(v, ids[2], elt(0.1)).unwrap();
        store
            .defer(v, IncidenceRequest::new(v, ids[3], elt(0.4)).with_candidate(9))
            .unwrap();
        store
            .defer(v, IncidenceRequest::new(v, ids[4], elt(0.4)).with_candidate(9))
            .unwrap();

        let resolution = ResolveIncidence::new(v).execute(&mut store).unwrap();
        assert_eq!(resolution.hosted.len(), 1);
        let group = &resolution.hosted[0];
        assert_eq!(group.candidate, Some(9));
        assert_eq!(group.requests.len(), 2);
        assert!(group.attach.is_none());
        // Tagged groups are left for the caller to grow; the duplicate is untouched.
        assert!(store.vertex(group.duplicate).unwrap().is_exterior());
        assert!(resolution.is_resolved());
        assert_eq!(store.vertex(v).unwrap().number_of_incident_border(), 2);
    }

    #[test]
    fn nothing_pending_is_a_no_op() {
        let (mut store, ids) = store_with(2);
        let _ = store.attach_border_edge(ids[0], ids[1], elt(0.1)).unwrap();
        let count = store.vertex_count();
        let resolution = ResolveIncidence::new(ids[0]).execute(&mut store).unwrap();
        assert!(resolution.hosted.is_empty());
        assert!(resolution.is_resolved());
        assert_eq!(resolution.kept.len(), 1);
        assert_eq!(store.vertex_count(), count);
    }

    #[test]
    fn zero_budget_reports_everything() {
        let (mut store, [v, ..]) = overflowing();
        let resolution = ResolveIncidence::new(v)
            .max_duplicates(0)
            .execute(&mut store)
            .unwrap();
        assert!(resolution.hosted.is_empty());
        assert_eq!(resolution.unresolved.len(), 2);
        assert!((resolution.unresolved[0].score() - 0.3).abs() < 1e-12);
        assert_eq!(store.requests(v).unwrap().len(), 2);
    }

    #[test]
    fn request_outranking_an_installed_edge_takes_its_slot() {
        let (mut store, ids) = store_with(4);
        let (v, a, b, c) = (ids[0], ids[1], ids[2], ids[3]);
        let _ = store.attach_border_edge(v, a, elt(0.5)).unwrap();
        let _ = store.attach_border_edge(v, b, elt(0.6)).unwrap();
        let _ = store.attach_border_edge(v, c, elt(0.1)).unwrap();

        let resolution = ResolveIncidence::new(v).execute(&mut store).unwrap();

        // The two best edges (0.1 and 0.5) stay on v.
        assert!(store.is_border_edge(v, c).unwrap());
        assert!(store.is_border_edge(c, v).unwrap());
        assert!(store.is_border_edge(v, a).unwrap());
        assert!(!store.is_border_edge(v, b).unwrap());
        assert_eq!(resolution.kept.len(), 2);
        assert_eq!(store.vertex(v).unwrap().number_of_incident_border(), 2);

        // The 0.6 edge moved to a duplicate.
        assert!(resolution.hosted.is_empty());
        assert_eq!(resolution.moved.len(), 1);
        let moved = &resolution.moved[0];
        assert_eq!(moved.border, vec![b]);
        assert!(moved.facets.is_empty());
        let dup = moved.duplicate;
        assert_eq!(store.vertex(dup).unwrap().point, store.vertex(v).unwrap().point);
        assert!(store.is_border_edge(dup, b).unwrap());
        assert!(store.is_border_edge(b, dup).unwrap());
        let moved_slot = store.border_elt(dup, b).unwrap().unwrap();
        assert!((store.border(moved_slot).unwrap().elt.score - 0.6).abs() < 1e-12);

        assert!(resolution.is_resolved());
        assert_eq!(store.pending_request_count(), 0);
        CheckFront::new().execute(&store).unwrap();
    }

    #[test]
    fn outranked_fan_moves_with_its_facets() {
        let (mut store, ids) = store_with(6);
        let (v, a, x, b, c, d) = (ids[0], ids[1], ids[2], ids[3], ids[4], ids[5]);
        let _ = store.attach_border_edge(v, a, elt(0.5)).unwrap();
        let _ = store.attach_border_edge(v, b, elt(0.6)).unwrap();
        store.add_interior_edge(v, x).unwrap();
        let f1 = store.add_facet(FacetData::new([v, a, x], 0.5, (CellId(0), 0)));
        let f2 = store.add_facet(FacetData::new([v, x, b], 0.6, (CellId(1), 0)));
        let _ = store.attach_border_edge(v, c, elt(0.1)).unwrap();
        let _ = store.attach_border_edge(v, d, elt(0.2)).unwrap();

        let resolution = ResolveIncidence::new(v).execute(&mut store).unwrap();

        assert_eq!(resolution.moved.len(), 1);
        let moved = &resolution.moved[0];
        let dup = moved.duplicate;
        assert_eq!(moved.facets, vec![f1, f2]);
        assert_eq!(moved.border, vec![a, b]);
        assert_eq!(store.facet(f1).unwrap().vertices, [dup, a, x]);
        assert_eq!(store.facet(f2).unwrap().vertices, [dup, x, b]);
        assert!(store.is_interior_edge(dup, x).unwrap());
        assert!(!store.is_interior_edge(v, x).unwrap());

        assert_eq!(store.border_neighbors(v).unwrap(), vec![c, d]);
        assert_eq!(store.border_neighbors(dup).unwrap(), vec![a, b]);
        assert_eq!(store.pending_request_count(), 0);
        CheckFront::new().execute(&store).unwrap();
    }

    #[test]
    fn short_budget_keeps_installed_edges() {
        let (mut store, ids) = store_with(4);
        let (v, a, b, c) = (ids[0], ids[1], ids[2], ids[3]);
        let _ = store.attach_border_edge(v, a, elt(0.5)).unwrap();
        let _ = store.attach_border_edge(v, b, elt(0.6)).unwrap();
        let _ = store.attach_border_edge(v, c, elt(0.1)).unwrap();

        let resolution = ResolveIncidence::new(v)
            .max_duplicates(0)
            .execute(&mut store)
            .unwrap();
        assert!(resolution.moved.is_empty());
        assert!(store.is_border_edge(v, a).unwrap());
        assert!(store.is_border_edge(v, b).unwrap());
        assert_eq!(resolution.unresolved.len(), 1);
        assert_eq!(resolution.unresolved[0].other(v), c);
        assert_eq!(store.requests(v).unwrap().len(), 1);
    }

    #[test]
    fn tagged_winner_is_handed_back() {
        let (mut store, ids) = store_with(6);
        let (v, a, b, c, d, e) = (ids[0], ids[1], ids[2], ids[3], ids[4], ids[5]);
        let _ = store.attach_border_edge(v, a, elt(0.5)).unwrap();
        let _ = store.attach_border_edge(v, b, elt(0.6)).unwrap();
        store
            .defer(v, IncidenceRequest::new(v, c, elt(0.1)).with_candidate(4))
            .unwrap();
        store
            .defer(v, IncidenceRequest::new(v, d, elt(0.1)).with_candidate(4))
            .unwrap();
        let _ = store.attach_border_edge(v, e, elt(0.7)).unwrap();

        let resolution = ResolveIncidence::new(v)
            .max_duplicates(2)
            .execute(&mut store)
            .unwrap();

        // Both bare edges moved out to make room for the candidate.
        assert_eq!(resolution.moved.len(), 2);
        assert_eq!(resolution.reinstated.len(), 2);
        assert!(resolution.reinstated.iter().all(|r| r.candidate == Some(4)));
        assert!(resolution.hosted.is_empty());

        // Nothing is left on v, so it is open for the candidate again and
        // the leftover request is released rather than kept waiting.
        assert!(store.vertex(v).unwrap().is_exterior());
        assert!(resolution.kept.is_empty());
        assert!(resolution.is_resolved());
        assert_eq!(resolution.released.len(), 1);
        assert_eq!(resolution.released[0].other(v), e);
        assert_eq!(store.pending_request_count(), 0);
        CheckFront::new().execute(&store).unwrap();
    }

    #[test]
    fn edge_refused_at_both_ends_is_placed_once() {
        let (mut store, ids) = store_with(6);
        let (v, a, b, w, c, d) = (ids[0], ids[1], ids[2], ids[3], ids[4], ids[5]);
        let _ = store.attach_border_edge(v, a, elt(0.1)).unwrap();
        let _ = store.attach_border_edge(v, b, elt(0.1)).unwrap();
        let _ = store.attach_border_edge(w, c, elt(0.1)).unwrap();
        let _ = store.attach_border_edge(w, d, elt(0.1)).unwrap();
        assert_eq!(
            store.attach_border_edge(v, w, elt(0.5)).unwrap(),
            Attach::Deferred { at: vec![v, w] }
        );
        assert_eq!(store.pending_request_count(), 2);

        let first = ResolveIncidence::new(v).execute(&mut store).unwrap();
        let v_dup = first.hosted[0].duplicate;
        // The copy waiting on w went with it; w still has no room.
        assert_eq!(first.hosted[0].attach, Some(Attach::Deferred { at: vec![w] }));
        assert_eq!(store.requests(w).unwrap().len(), 1);
        assert_eq!(store.requests(w).unwrap()[0].other(w), v_dup);
        assert_eq!(store.pending_request_count(), 1);

        let second = ResolveIncidence::new(w).execute(&mut store).unwrap();
        let w_dup = second.hosted[0].duplicate;
        assert!(matches!(second.hosted[0].attach, Some(Attach::Installed { .. })));

        assert_eq!(store.vertex_count(), 8);
        assert_eq!(store.pending_request_count(), 0);
        assert_eq!(store.border_neighbors(v_dup).unwrap(), vec![w_dup]);
        assert_eq!(store.border_neighbors(w_dup).unwrap(), vec![v_dup]);
        assert_eq!(store.border_neighbors(v).unwrap(), vec![a, b]);
        assert_eq!(store.border_neighbors(w).unwrap(), vec![c, d]);
        CheckFront::new().execute(&store).unwrap();
    }
}
