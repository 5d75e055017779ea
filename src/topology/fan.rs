use crate::error::TopologyError;

use super::{on_vertex, BorderRecord, FacetId, FrontStore, SlotFill, VertexId};

/// The accepted facets around a vertex reached from one of its border edges.
///
/// On a manifold border vertex the walk crosses every interior edge of the
/// vertex and stops at its other border edge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fan {
    /// Facets in the order they were crossed.
    pub facets: Vec<FacetId>,
    /// Far endpoints of the interior edges crossed on the way.
    pub spokes: Vec<VertexId>,
    /// Far endpoint of the edge the walk stopped at. `None` if no facet
    /// uses the starting edge.
    pub end: Option<VertexId>,
}

impl FrontStore {
    /// Walks the facets around `v` starting from edge `(v, w)`, crossing
    /// interior edges of `v` until an edge that is not interior is reached.
    ///
    /// # Errors
    ///
    /// Returns an error if `v` is not found.
    pub fn fan(&self, v: VertexId, w: VertexId) -> Result<Fan, TopologyError> {
        let around: Vec<(FacetId, [VertexId; 3])> = self
            .facets
            .iter()
            .filter(|(_, facet)| facet.vertices.contains(&v))
            .map(|(id, facet)| (id, facet.vertices))
            .collect();

        let mut fan = Fan::default();
        let mut prev = w;
        let mut current = around.iter().find(|(_, corners)| corners.contains(&w));
        while let Some(&(id, corners)) = current {
            fan.facets.push(id);
            let Some(&next) = corners.iter().find(|&&c| c != v && c != prev) else {
                break;
            };
            if !self.is_interior_edge(v, next)? || next == w || fan.spokes.contains(&next) {
                fan.end = Some(next);
                break;
            }
            fan.spokes.push(next);
            prev = next;
            current = around
                .iter()
                .find(|(other, corners)| !fan.facets.contains(other) && corners.contains(&next));
        }
        Ok(fan)
    }

    /// Hands `fan` of `v` over to `to`.
    ///
    /// The fan's facets swap `v` for `to`, its interior edges follow, and so
    /// do the border edges from `v` to each vertex of `border`. Pending
    /// requests of `v` are left alone.
    pub(crate) fn relocate_fan(
        &mut self,
        v: VertexId,
        to: VertexId,
        fan: &Fan,
        border: &[VertexId],
    ) -> Result<(), TopologyError> {
        for &id in &fan.facets {
            let facet = self
                .facets
                .get_mut(id)
                .ok_or_else(|| TopologyError::EntityNotFound("facet".into()))?;
            for corner in &mut facet.vertices {
                if *corner == v {
                    *corner = to;
                }
            }
        }
        for &x in &fan.spokes {
            self.move_interior_edge(v, x, to)?;
        }
        for &w in border {
            self.move_border_edge(v, w, to)?;
        }
        Ok(())
    }

    fn move_interior_edge(
        &mut self,
        v: VertexId,
        x: VertexId,
        to: VertexId,
    ) -> Result<(), TopologyError> {
        for (host, gone, added) in [(v, x, None), (x, v, Some(to)), (to, v, Some(x))] {
            let vertex = self
                .vertices
                .get_mut(host)
                .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))?;
            self.interior.retain(&mut vertex.interior, |_, &other| other != gone);
            if let Some(added) = added {
                self.interior.append(&mut vertex.interior, added);
            }
        }
        Ok(())
    }

    /// Re-roots border edge `(v, w)` at `to`. `w` keeps the slot position.
    fn move_border_edge(
        &mut self,
        v: VertexId,
        w: VertexId,
        to: VertexId,
    ) -> Result<(), TopologyError> {
        let vertex = self
            .vertices
            .get_mut(v)
            .ok_or_else(|| TopologyError::EntityNotFound("vertex".into()))?;
        let Some(id) = vertex
            .remove_border_elt(&self.border, w)
            .map_err(|e| on_vertex(e, v))?
        else {
            return Err(TopologyError::InvalidTopology(
                "edge is not on the border".into(),
            ));
        };
        vertex.dec_mark();
        let elt = self.border.get(id)?.elt;
        let Some(old) = self.border_elt(w, v)? else {
            return Err(TopologyError::InvalidTopology(
                "border edge is missing its reverse record".into(),
            ));
        };

        let forward = self.border.push(BorderRecord { successor: w, elt });
        let backward = self.border.push(BorderRecord { successor: to, elt });
        if !self.vertex_mut(w)?.replace_border_elt(old, backward) {
            return Err(TopologyError::InvalidTopology(
                "reverse record is not in a slot".into(),
            ));
        }
        let dup = self.vertex_mut(to)?;
        match dup.set_next_border_elt(forward) {
            SlotFill::Filled(_) => {
                dup.inc_mark();
                Ok(())
            }
            SlotFill::Overflow => Err(TopologyError::InvalidTopology(format!(
                "vertex {} overflowed while taking over a fan",
                dup.id()
            ))),
        }
    }
}
