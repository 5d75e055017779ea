use crate::error::TopologyError;
use crate::math::Point3;

use super::border::{BorderId, BorderPool, BorderRecord};
use super::incidence::{InteriorId, RequestId};
use super::ledger::ChainRange;

slotmap::new_key_type! {
    /// Unique identifier for a vertex in the front store.
    pub struct VertexId;
}

/// Mark of a vertex the front has never reached.
pub const UNVISITED: i32 = -1;

/// One of the two border slots of a vertex. `A` is always filled first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    A,
    B,
}

/// Outcome of offering a border record to a vertex.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotFill {
    /// The record now occupies this slot.
    Filled(Slot),
    /// Both slots were taken; nothing was written.
    Overflow,
}

/// Per-vertex front state.
///
/// `mark` is `-1` while the front has not reached the vertex, `0` once it is
/// interior, and otherwise counts the border edges on the vertex plus the
/// incidence requests still waiting on it. Requests are only queued on a
/// vertex whose two slots are filled, so a mark of 1 or 2 always matches the
/// number of filled slots and a mark above 2 flags a non-manifold point.
///
/// There is no `Clone`: copies with fresh state come from
/// [`FrontStore::duplicate_vertex`](super::FrontStore::duplicate_vertex).
#[derive(Debug)]
pub struct VertexData {
    /// The 3D position of the vertex.
    pub point: Point3,
    id: usize,
    mark: i32,
    post_mark: Option<usize>,
    incident_border: [Option<BorderId>; 2],
    pub(crate) requests: Option<ChainRange<RequestId>>,
    pub(crate) interior: Option<ChainRange<InteriorId>>,
}

impl VertexData {
    /// Creates an unvisited vertex at the given point.
    #[must_use]
    pub fn new(point: Point3, id: usize) -> Self {
        Self {
            point,
            id,
            mark: UNVISITED,
            post_mark: None,
            incident_border: [None, None],
            requests: None,
            interior: None,
        }
    }

    /// A vertex at the same position with identity `id` and none of the
    /// front state of `self`: unvisited, no slots, no ledger runs.
    #[must_use]
    pub(crate) fn duplicate(&self, id: usize) -> Self {
        Self::new(self.point, id)
    }

    /// Stable caller-facing identifier (input index, or a fresh one for duplicates).
    #[must_use]
    pub fn id(&self) -> usize {
        self.id
    }

    /// `true` while at least one border edge or request counts on the vertex.
    #[must_use]
    pub fn is_on_border(&self) -> bool {
        self.mark > 0
    }

    /// `true` while the front has not reached the vertex.
    #[must_use]
    pub fn is_exterior(&self) -> bool {
        self.mark < 0
    }

    /// `true` unless the front has closed around the vertex.
    #[must_use]
    pub fn not_interior(&self) -> bool {
        self.mark != 0
    }

    /// `true` while incidence requests wait on this vertex.
    #[must_use]
    pub fn is_non_manifold(&self) -> bool {
        self.mark > 2
    }

    /// The raw mark; see the type docs for how to read it.
    #[must_use]
    pub fn number_of_incident_border(&self) -> i32 {
        self.mark
    }

    pub(crate) fn inc_mark(&mut self) {
        if self.mark == UNVISITED {
            self.mark = 1;
        } else {
            self.mark += 1;
        }
    }

    /// Drops one border edge or request from the count. Reaching zero makes
    /// the vertex interior.
    pub(crate) fn dec_mark(&mut self) {
        if self.mark > 0 {
            self.mark -= 1;
        }
    }

    /// Slot A, the entry point for walking the border from this vertex.
    #[must_use]
    pub fn first_incident(&self) -> Option<BorderId> {
        self.incident_border[0]
    }

    /// Slot B.
    #[must_use]
    pub fn second_incident(&self) -> Option<BorderId> {
        self.incident_border[1]
    }

    /// Filled slots in order A, B.
    pub fn border_slots(&self) -> impl Iterator<Item = BorderId> + '_ {
        self.incident_border.iter().flatten().copied()
    }

    /// Number of filled slots, 0 to 2. Pending requests are not counted.
    #[must_use]
    pub fn filled_slots(&self) -> usize {
        self.border_slots().count()
    }

    /// The slot whose record belongs to growth front `front`.
    ///
    /// # Errors
    ///
    /// Returns an error if a slot no longer resolves in `pool`.
    pub fn next_on_border(
        &self,
        pool: &BorderPool,
        front: usize,
    ) -> Result<Option<BorderId>, TopologyError> {
        self.find_slot(pool, |rec| rec.elt.front == front)
    }

    /// `true` if one of the slots leads to `other`.
    ///
    /// # Errors
    ///
    /// Returns an error if a slot no longer resolves in `pool`.
    pub fn is_border_edge(&self, pool: &BorderPool, other: VertexId) -> Result<bool, TopologyError> {
        Ok(self.border_elt(pool, other)?.is_some())
    }

    /// The slot whose successor is `other`.
    ///
    /// # Errors
    ///
    /// Returns an error if a slot no longer resolves in `pool`.
    pub fn border_elt(
        &self,
        pool: &BorderPool,
        other: VertexId,
    ) -> Result<Option<BorderId>, TopologyError> {
        self.find_slot(pool, |rec| rec.successor == other)
    }

    fn find_slot(
        &self,
        pool: &BorderPool,
        pred: impl Fn(&BorderRecord) -> bool,
    ) -> Result<Option<BorderId>, TopologyError> {
        for id in self.border_slots() {
            if pred(pool.get(id)?) {
                return Ok(Some(id));
            }
        }
        Ok(None)
    }

    /// Puts `record` in slot A, else slot B. A third record is refused and the
    /// existing slots are left as they were.
    pub(crate) fn set_next_border_elt(&mut self, record: BorderId) -> SlotFill {
        match self.incident_border {
            [None, _] => {
                self.incident_border[0] = Some(record);
                SlotFill::Filled(Slot::A)
            }
            [Some(_), None] => {
                self.incident_border[1] = Some(record);
                SlotFill::Filled(Slot::B)
            }
            [Some(_), Some(_)] => SlotFill::Overflow,
        }
    }

    /// Clears the slot leading to `other`, moving B into A if A was cleared.
    pub(crate) fn remove_border_elt(
        &mut self,
        pool: &BorderPool,
        other: VertexId,
    ) -> Result<Option<BorderId>, TopologyError> {
        let Some(id) = self.border_elt(pool, other)? else {
            return Ok(None);
        };
        if self.incident_border[0] == Some(id) {
            self.incident_border[0] = self.incident_border[1].take();
        } else {
            self.incident_border[1] = None;
        }
        Ok(Some(id))
    }

    /// Points the slot holding `old` at `new`, keeping its position.
    pub(crate) fn replace_border_elt(&mut self, old: BorderId, new: BorderId) -> bool {
        match self.incident_border.iter_mut().find(|slot| **slot == Some(old)) {
            Some(slot) => {
                *slot = Some(new);
                true
            }
            None => false,
        }
    }

    /// Forgets both slots. The records stay in the pool.
    pub(crate) fn delete_border(&mut self) {
        self.incident_border = [None, None];
    }

    /// Turns a vertex that was emptied without ever closing back into an
    /// unvisited one. Returns `false` if it still has edges or requests.
    pub(crate) fn reopen(&mut self) -> bool {
        let emptied = self.mark == 0
            && self.filled_slots() == 0
            && self.requests.is_none()
            && self.interior.is_none();
        if emptied {
            self.mark = UNVISITED;
        }
        emptied
    }

    /// Labels the vertex with shell `label`.
    pub fn set_post_mark(&mut self, label: usize) {
        self.post_mark = Some(label);
    }

    pub(crate) fn clear_post_mark(&mut self) {
        self.post_mark = None;
    }

    /// `true` if the vertex carries shell `label`.
    #[must_use]
    pub fn is_post_marked(&self, label: usize) -> bool {
        self.post_mark == Some(label)
    }

    /// Shell label, or `None` before labeling.
    #[must_use]
    pub fn post_mark(&self) -> Option<usize> {
        self.post_mark
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::topology::border::{BorderElt, CellId, Edge, IncidentFacet};
    use slotmap::SlotMap;

    fn elt(score: f64, front: usize) -> BorderElt {
        BorderElt::new(score, IncidentFacet::new(Edge::new(CellId(7), 0, 1), 2), front)
    }

    fn keys(n: usize) -> Vec<VertexId> {
        let mut map: SlotMap<VertexId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    fn vertex() -> VertexData {
        VertexData::new(Point3::origin(), 0)
    }

    #[test]
    fn fresh_vertex_is_exterior() {
        let v = vertex();
        assert!(v.is_exterior());
        assert!(!v.is_on_border());
        assert!(v.not_interior());
        assert_eq!(v.number_of_incident_border(), UNVISITED);
        assert!(v.first_incident().is_none());
        assert_eq!(v.post_mark(), None);
    }

    #[test]
    fn inc_mark_sequence() {
        let mut v = vertex();
        v.inc_mark();
        assert_eq!(v.number_of_incident_border(), 1);
        v.inc_mark();
        assert_eq!(v.number_of_incident_border(), 2);
        v.inc_mark();
        assert_eq!(v.number_of_incident_border(), 3);
        assert!(v.is_non_manifold());
    }

    #[test]
    fn dec_mark_reaches_interior() {
        let mut v = vertex();
        v.inc_mark();
        v.inc_mark();
        v.dec_mark();
        v.dec_mark();
        assert_eq!(v.number_of_incident_border(), 0);
        assert!(!v.not_interior());
        assert!(!v.is_exterior());
        v.dec_mark();
        assert_eq!(v.number_of_incident_border(), 0);
    }

    #[test]
    fn queries_are_stable() {
        let mut v = vertex();
        v.inc_mark();
        let first = (v.is_on_border(), v.is_exterior());
        let second = (v.is_on_border(), v.is_exterior());
        assert_eq!(first, second);
    }

    #[test]
    fn slots_fill_in_order_and_refuse_third() {
        let ids = keys(3);
        let mut pool = BorderPool::new();
        let recs: Vec<BorderId> = ids
            .iter()
            .map(|&s| {
                pool.push(BorderRecord {
                    successor: s,
                    elt: elt(0.1, 0),
                })
            })
            .collect();

        let mut v = vertex();
        assert_eq!(v.set_next_border_elt(recs[0]), SlotFill::Filled(Slot::A));
        assert_eq!(v.set_next_border_elt(recs[1]), SlotFill::Filled(Slot::B));
        assert_eq!(v.set_next_border_elt(recs[2]), SlotFill::Overflow);

        assert_eq!(v.first_incident(), Some(recs[0]));
        assert_eq!(v.second_incident(), Some(recs[1]));
        assert!(v.is_border_edge(&pool, ids[0]).unwrap());
        assert!(v.is_border_edge(&pool, ids[1]).unwrap());
        assert!(!v.is_border_edge(&pool, ids[2]).unwrap());
    }

    #[test]
    fn border_elt_and_next_on_border() {
        let ids = keys(2);
        let mut pool = BorderPool::new();
        let a = pool.push(BorderRecord {
            successor: ids[0],
            elt: elt(0.1, 4),
        });
        let b = pool.push(BorderRecord {
            successor: ids[1],
            elt: elt(0.2, 9),
        });
        let mut v = vertex();
        let _ = v.set_next_border_elt(a);
        let _ = v.set_next_border_elt(b);

        assert_eq!(v.border_elt(&pool, ids[1]).unwrap(), Some(b));
        assert_eq!(v.next_on_border(&pool, 4).unwrap(), Some(a));
        assert_eq!(v.next_on_border(&pool, 9).unwrap(), Some(b));
        assert_eq!(v.next_on_border(&pool, 1).unwrap(), None);
    }

    #[test]
    fn remove_slot_a_shifts_b() {
        let ids = keys(2);
        let mut pool = BorderPool::new();
        let a = pool.push(BorderRecord {
            successor: ids[0],
            elt: elt(0.1, 0),
        });
        let b = pool.push(BorderRecord {
            successor: ids[1],
            elt: elt(0.2, 0),
        });
        let mut v = vertex();
        let _ = v.set_next_border_elt(a);
        let _ = v.set_next_border_elt(b);

        assert_eq!(v.remove_border_elt(&pool, ids[0]).unwrap(), Some(a));
        assert_eq!(v.first_incident(), Some(b));
        assert_eq!(v.second_incident(), None);
        assert_eq!(v.remove_border_elt(&pool, ids[0]).unwrap(), None);
    }

    #[test]
    fn dangling_slot_is_reported() {
        let ids = keys(1);
        let mut elsewhere = BorderPool::new();
        let stale = elsewhere.push(BorderRecord {
            successor: ids[0],
            elt: elt(0.1, 0),
        });
        let pool = BorderPool::new();
        let mut v = vertex();
        let _ = v.set_next_border_elt(stale);
        assert!(matches!(
            v.border_elt(&pool, ids[0]),
            Err(TopologyError::DanglingBorderReference { .. })
        ));
    }

    #[test]
    fn delete_border_clears_slots() {
        let ids = keys(1);
        let mut pool = BorderPool::new();
        let a = pool.push(BorderRecord {
            successor: ids[0],
            elt: elt(0.1, 0),
        });
        let mut v = vertex();
        let _ = v.set_next_border_elt(a);
        v.delete_border();
        assert_eq!(v.filled_slots(), 0);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn duplicate_starts_fresh() {
        let ids = keys(1);
        let mut pool = BorderPool::new();
        let a = pool.push(BorderRecord {
            successor: ids[0],
            elt: elt(0.1, 0),
        });
        let mut v = VertexData::new(Point3::new(1.0, 2.0, 3.0), 5);
        v.inc_mark();
        let _ = v.set_next_border_elt(a);
        v.set_post_mark(3);

        let d = v.duplicate(11);
        assert_eq!(d.id(), 11);
        assert_eq!(d.point, v.point);
        assert!(d.is_exterior());
        assert_eq!(d.filled_slots(), 0);
        assert_eq!(d.post_mark(), None);
        assert!(d.requests.is_none());
    }

    #[test]
    fn replaced_slot_keeps_its_position() {
        let ids = keys(3);
        let mut pool = BorderPool::new();
        let recs: Vec<BorderId> = ids
            .iter()
            .map(|&s| {
                pool.push(BorderRecord {
                    successor: s,
                    elt: elt(0.1, 0),
                })
            })
            .collect();
        let mut v = vertex();
        let _ = v.set_next_border_elt(recs[0]);
        let _ = v.set_next_border_elt(recs[1]);

        assert!(v.replace_border_elt(recs[0], recs[2]));
        assert_eq!(v.first_incident(), Some(recs[2]));
        assert_eq!(v.second_incident(), Some(recs[1]));
        assert!(!v.replace_border_elt(recs[0], recs[2]));
    }

    #[test]
    fn only_an_emptied_vertex_reopens() {
        let mut v = vertex();
        assert!(!v.reopen());
        v.inc_mark();
        assert!(!v.reopen());
        v.dec_mark();
        assert!(v.reopen());
        assert!(v.is_exterior());
    }

    #[test]
    fn post_mark_compare() {
        let mut v = vertex();
        assert!(!v.is_post_marked(0));
        v.set_post_mark(2);
        assert!(v.is_post_marked(2));
        assert!(!v.is_post_marked(1));
    }
}
