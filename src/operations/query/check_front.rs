use crate::error::{Result, TopologyError};
use crate::topology::FrontStore;

/// Validates the front bookkeeping of every vertex.
///
/// Checks that marks agree with filled slots and pending requests, that the
/// two slots of a vertex lead to different neighbours, that every border
/// edge is recorded on both endpoints and that every handle resolves.
pub struct CheckFront;

impl Default for CheckFront {
    fn default() -> Self {
        Self::new()
    }
}

impl CheckFront {
    /// Creates a new `CheckFront` query.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes the validation.
    ///
    /// # Errors
    ///
    /// Returns [`TopologyError::DanglingBorderReference`] for unresolved
    /// handles and [`TopologyError::InvalidTopology`] for any other violation.
    pub fn execute(&self, store: &FrontStore) -> Result<()> {
        for v in store.vertex_ids() {
            let vertex = store.vertex(v)?;
            let mark = vertex.number_of_incident_border();
            let slots = vertex.filled_slots();
            let pending = store.requests(v)?.len();
            let fail = |what: &str| -> Result<()> {
                Err(TopologyError::InvalidTopology(format!(
                    "vertex {}: {what} (mark {mark}, {slots} slots, {pending} pending)",
                    vertex.id()
                ))
                .into())
            };

            if mark <= 0 && (slots > 0 || pending > 0) {
                return fail("border state on a vertex off the border");
            }
            if mark > 0 && usize::try_from(mark).ok() != Some(slots + pending) {
                return fail("mark does not count slots and requests");
            }
            if pending > 0 && slots < 2 {
                return fail("requests on a vertex with a free slot");
            }

            let neighbors = store.border_neighbors(v)?;
            if neighbors.len() == 2 && neighbors[0] == neighbors[1] {
                return fail("both slots lead to the same neighbour");
            }
            for w in neighbors {
                if w == v {
                    return fail("border edge loops onto itself");
                }
                if !store.is_border_edge(w, v)? {
                    return fail("border edge missing on the far endpoint");
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::operations::ResolveIncidence;
    use crate::topology::{BorderElt, CellId, Edge, IncidentFacet, VertexId};

    fn elt(score: f64) -> BorderElt {
        BorderElt::new(score, IncidentFacet::new(Edge::new(CellId(0), 1, 2), 0), 0)
    }

    fn store_with(n: u32) -> (FrontStore, Vec<VertexId>) {
        let mut store = FrontStore::new();
        let ids = (0..n)
            .map(|i| store.add_vertex(Point3::new(f64::from(i), 1.0, 0.0)))
            .collect();
        (store, ids)
    }

    #[test]
    fn empty_and_fresh_stores_pass() {
        let (store, _) = store_with(3);
        CheckFront::new().execute(&store).unwrap();
    }

    #[test]
    fn invariants_hold_through_overflow_and_resolution() {
        let (mut store, ids) = store_with(6);
        let v = ids[0];
        for (k, &w) in ids[1..].iter().enumerate() {
            #[allow(clippy::cast_precision_loss)]
            let score = 0.1 * (k as f64 + 1.0);
            let _ = store.attach_border_edge(v, w, elt(score)).unwrap();
            CheckFront::new().execute(&store).unwrap();
        }
        assert_eq!(store.vertex(v).unwrap().number_of_incident_border(), 5);

        ResolveIncidence::new(v)
            .max_duplicates(2)
            .execute(&mut store)
            .unwrap();
        CheckFront::new().execute(&store).unwrap();

        let _ = store.detach_border_edge(v, ids[1]).unwrap();
        CheckFront::new().execute(&store).unwrap();
        assert!(store.pending_vertices().is_empty());
    }
}
