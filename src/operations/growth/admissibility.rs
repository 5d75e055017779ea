use crate::error::Result;
use crate::math::{facet_normal, opening_angle};
use crate::topology::{edge_key, VertexId};

use super::{CandidateState, Growth};

/// What to do with a popped candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Verdict {
    /// Accept; carries the candidate edges currently on the border.
    Accept(Vec<(VertexId, VertexId)>),
    /// Not now; the candidate may come back when the front moves.
    Reject(&'static str),
    /// Never acceptable.
    Discard(&'static str),
    /// Admissible except that these full vertices would end with more than
    /// two border edges.
    Overflow(Vec<VertexId>),
}

/// Checks candidate `index` against the current front.
///
/// A seed must have three unvisited vertices; any other candidate must
/// share at least one border edge with the front.
pub(super) fn judge(growth: &Growth<'_>, index: usize, seed: bool) -> Result<Verdict> {
    let store = &*growth.store;
    let candidate = &growth.candidates[index];

    if growth.state[index] != CandidateState::Open {
        return Ok(Verdict::Discard("already settled"));
    }
    if candidate.score.is_nan() || candidate.score > growth.params.radius_ratio_bound {
        return Ok(Verdict::Discard("score above bound"));
    }
    if growth.accepted_keys.contains(&candidate.key()) {
        return Ok(Verdict::Discard("triangle already accepted"));
    }
    let [a, b, c] = candidate.vertices;
    if a == b || b == c || c == a {
        return Ok(Verdict::Discard("repeated vertex"));
    }
    let (pa, pb, pc) = (store.vertex(a)?.point, store.vertex(b)?.point, store.vertex(c)?.point);
    if facet_normal(&pa, &pb, &pc).is_none() {
        return Ok(Verdict::Discard("degenerate triangle"));
    }
    for v in candidate.vertices {
        if !store.vertex(v)?.not_interior() {
            return Ok(Verdict::Discard("interior vertex"));
        }
    }

    if seed {
        for v in candidate.vertices {
            if !store.vertex(v)?.is_exterior() {
                return Ok(Verdict::Reject("seed touches the front"));
            }
        }
        return Ok(Verdict::Accept(Vec::new()));
    }

    let mut shared = Vec::new();
    for (x, y) in candidate.edges() {
        if store.is_interior_edge(x, y)? {
            return Ok(Verdict::Discard("interior edge"));
        }
        if store.is_border_edge(x, y)? {
            shared.push((x, y));
        } else if growth
            .edge_facets
            .get(&edge_key(x, y))
            .is_some_and(|f| !f.is_empty())
        {
            return Ok(Verdict::Reject("edge has a facet but is off the border"));
        }
    }
    if shared.is_empty() {
        return Ok(Verdict::Reject("not adjacent to the front"));
    }

    for &(x, y) in &shared {
        let Some(&neighbor) = growth
            .edge_facets
            .get(&edge_key(x, y))
            .and_then(|f| f.first())
        else {
            continue;
        };
        let Some(p) = store.facet(neighbor)?.apex(x, y) else {
            continue;
        };
        let Some(q) = candidate.vertices.into_iter().find(|&v| v != x && v != y) else {
            continue;
        };
        let angle = opening_angle(
            &store.vertex(x)?.point,
            &store.vertex(y)?.point,
            &store.vertex(p)?.point,
            &store.vertex(q)?.point,
        );
        if !angle.is_some_and(|angle| angle >= growth.params.beta) {
            return Ok(Verdict::Reject("opening angle below beta"));
        }
    }

    let mut overflow = Vec::new();
    for v in candidate.vertices {
        let vertex = store.vertex(v)?;
        let slots = vertex.filled_slots();
        let closing = shared.iter().filter(|(x, y)| *x == v || *y == v).count();
        // Two candidate edges meet at `v`: shared ones leave the border,
        // the others join it.
        let after = slots - closing + (2 - closing);
        if after > 2 {
            if slots < 2 {
                return Ok(Verdict::Reject("would overflow an open path end"));
            }
            overflow.push(v);
        }
    }
    if !overflow.is_empty() {
        return Ok(Verdict::Overflow(overflow));
    }
    Ok(Verdict::Accept(shared))
}
