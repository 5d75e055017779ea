use std::collections::{HashMap, VecDeque};

use crate::error::Result;
use crate::topology::{edge_key, FacetId, FrontStore, VertexId};

/// Assigns shell labels to accepted facets and the vertices they touch.
///
/// Facets sharing an edge end up in the same shell. Border vertices that no
/// facet reaches (a duplicate hosting a deferred edge, say) inherit the label
/// of the border they sit on, or start a shell of their own. Labels run from
/// zero in discovery order; previous labels are cleared first.
pub struct LabelShells;

impl Default for LabelShells {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelShells {
    /// Creates a new `LabelShells` operation.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes the labeling and returns the number of shells.
    ///
    /// # Errors
    ///
    /// Returns an error if a facet references a missing vertex or a border
    /// slot dangles.
    pub fn execute(&self, store: &mut FrontStore) -> Result<usize> {
        store.clear_labels();

        let mut by_edge: HashMap<(VertexId, VertexId), Vec<FacetId>> = HashMap::new();
        let facet_ids: Vec<FacetId> = store.facets().map(|(id, _)| id).collect();
        for &id in &facet_ids {
            for (a, b) in store.facet(id)?.edges() {
                by_edge.entry(edge_key(a, b)).or_default().push(id);
            }
        }

        let mut labels: HashMap<FacetId, usize> = HashMap::new();
        let mut shells = 0;
        for &seed in &facet_ids {
            if labels.contains_key(&seed) {
                continue;
            }
            let label = shells;
            shells += 1;
            labels.insert(seed, label);
            let mut queue = VecDeque::from([seed]);

            // BFS flood-fill across shared edges
            while let Some(id) = queue.pop_front() {
                let facet = store.facet(id)?;
                let (vertices, edges) = (facet.vertices, facet.edges());
                store.set_facet_shell(id, label)?;
                for v in vertices {
                    if store.vertex(v)?.post_mark().is_none() {
                        store.set_post_mark(v, label)?;
                    }
                }
                for (a, b) in edges {
                    let Some(neighbors) = by_edge.get(&edge_key(a, b)) else {
                        continue;
                    };
                    for &n in neighbors {
                        if !labels.contains_key(&n) {
                            labels.insert(n, label);
                            queue.push_back(n);
                        }
                    }
                }
            }
        }

        let border: Vec<VertexId> = store
            .vertex_ids()
            .filter(|&v| store.vertex(v).is_ok_and(|d| d.is_on_border()))
            .collect();
        for &v in &border {
            if let Some(label) = store.vertex(v)?.post_mark() {
                spread_along_border(store, v, label)?;
            }
        }
        for &v in &border {
            if store.vertex(v)?.post_mark().is_none() {
                let label = shells;
                shells += 1;
                store.set_post_mark(v, label)?;
                spread_along_border(store, v, label)?;
            }
        }

        tracing::debug!(shells, facets = facet_ids.len(), "labeled shells");
        Ok(shells)
    }
}

/// Labels the unlabeled vertices reachable from `start` over border edges.
fn spread_along_border(store: &mut FrontStore, start: VertexId, label: usize) -> Result<()> {
    let mut queue = VecDeque::from([start]);
    while let Some(v) = queue.pop_front() {
        for w in store.border_neighbors(v)? {
            if store.vertex(w)?.post_mark().is_none() {
                store.set_post_mark(w, label)?;
                queue.push_back(w);
            }
        }
    }
    Ok(())
}
