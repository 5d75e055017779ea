use std::collections::HashSet;

use crate::error::{Result, TopologyError};
use crate::topology::{FrontStore, VertexId};

/// A connected run of border edges.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BorderLoop {
    /// Vertices in traversal order; the closing edge back to the first one is implied.
    pub vertices: Vec<VertexId>,
    /// `false` for an open path, or for a walk that ran into an already
    /// visited vertex other than its start.
    pub closed: bool,
}

impl BorderLoop {
    /// Number of border edges on the loop.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        if self.closed {
            self.vertices.len()
        } else {
            self.vertices.len().saturating_sub(1)
        }
    }
}

/// Collects the border into loops by walking successor references.
///
/// Open paths are walked from their ends first so each is reported whole;
/// every remaining border vertex then starts a walk from slot A.
pub struct BorderLoops;

impl Default for BorderLoops {
    fn default() -> Self {
        Self::new()
    }
}

impl BorderLoops {
    /// Creates a new `BorderLoops` query.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes the query.
    ///
    /// # Errors
    ///
    /// Returns an error if a slot dangles.
    pub fn execute(&self, store: &FrontStore) -> Result<Vec<BorderLoop>> {
        let mut ends = Vec::new();
        let mut rest = Vec::new();
        for v in store.vertex_ids() {
            match store.vertex(v)?.filled_slots() {
                0 => {}
                1 => ends.push(v),
                _ => rest.push(v),
            }
        }

        let mut visited: HashSet<VertexId> = HashSet::new();
        let mut loops = Vec::new();
        for start in ends.into_iter().chain(rest) {
            if visited.contains(&start) {
                continue;
            }
            loops.push(walk(store, start, &mut visited)?);
        }
        Ok(loops)
    }
}

fn walk(store: &FrontStore, start: VertexId, visited: &mut HashSet<VertexId>) -> Result<BorderLoop> {
    let mut vertices = vec![start];
    visited.insert(start);
    let mut prev = None;
    let mut at = start;
    let limit = store.vertex_count();

    loop {
        let Some(next) = store.next_along(at, prev)? else {
            return Ok(BorderLoop {
                vertices,
                closed: false,
            });
        };
        if next == start {
            // A single edge seen from both ends is a path, not a loop.
            let closed = vertices.len() > 2;
            return Ok(BorderLoop { vertices, closed });
        }
        if !visited.insert(next) || vertices.len() > limit {
            return Ok(BorderLoop {
                vertices,
                closed: false,
            });
        }
        vertices.push(next);
        prev = Some(at);
        at = next;
        if !store.vertex(at)?.is_on_border() {
            return Err(TopologyError::InvalidTopology(
                "border successor is not on the border".into(),
            )
            .into());
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::topology::{BorderElt, CellId, Edge, IncidentFacet};

    fn elt() -> BorderElt {
        BorderElt::new(0.5, IncidentFacet::new(Edge::new(CellId(0), 0, 1), 0), 0)
    }

    fn ring(store: &mut FrontStore, n: usize) -> Vec<VertexId> {
        let ids: Vec<VertexId> = (0..n)
            .map(|i| {
                #[allow(clippy::cast_precision_loss)]
                let t = i as f64;
                store.add_vertex(Point3::new(t.cos(), t.sin(), 0.0))
            })
            .collect();
        for i in 0..n {
            let _ = store
                .attach_border_edge(ids[i], ids[(i + 1) % n], elt())
                .unwrap();
        }
        ids
    }

    #[test]
    fn closed_ring() {
        let mut store = FrontStore::new();
        let ids = ring(&mut store, 6);
        let loops = BorderLoops::new().execute(&store).unwrap();
        assert_eq!(loops.len(), 1);
        assert!(loops[0].closed);
        assert_eq!(loops[0].vertices.len(), 6);
        assert_eq!(loops[0].edge_count(), 6);
        let seen: HashSet<VertexId> = loops[0].vertices.iter().copied().collect();
        assert_eq!(seen, ids.into_iter().collect());
    }

    #[test]
    fn open_path_starts_at_an_end() {
        let mut store = FrontStore::new();
        let ids: Vec<VertexId> = (0..4)
            .map(|i| store.add_vertex(Point3::new(f64::from(i), 0.0, 0.0)))
            .collect();
        for pair in ids.windows(2) {
            let _ = store.attach_border_edge(pair[0], pair[1], elt()).unwrap();
        }
        let loops = BorderLoops::new().execute(&store).unwrap();
        assert_eq!(loops.len(), 1);
        assert!(!loops[0].closed);
        assert_eq!(loops[0].vertices.len(), 4);
        assert_eq!(loops[0].edge_count(), 3);
        let first = loops[0].vertices[0];
        assert!(first == ids[0] || first == ids[3]);
    }

    #[test]
    fn two_rings_two_loops() {
        let mut store = FrontStore::new();
        ring(&mut store, 3);
        ring(&mut store, 5);
        let mut sizes: Vec<usize> = BorderLoops::new()
            .execute(&store)
            .unwrap()
            .iter()
            .map(|l| l.vertices.len())
            .collect();
        sizes.sort_unstable();
        assert_eq!(sizes, vec![3, 5]);
    }

    #[test]
    fn no_border_no_loops() {
        let mut store = FrontStore::new();
        store.add_vertex(Point3::origin());
        assert!(BorderLoops::new().execute(&store).unwrap().is_empty());
    }
}
