use std::collections::HashMap;

use spade::{DelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation};

use crate::error::{GeometryError, Result};
use crate::math::{radius_edge_ratio, Point3};
use crate::operations::growth::Candidate;
use crate::topology::{CellId, FrontStore, VertexId};

/// Builds growth candidates for a height field.
///
/// The points are added to the store as vertices and their xy projection is
/// triangulated with a 2D Delaunay triangulation. Each triangle becomes one
/// candidate (cell = triangulation face, local facet 0) scored by its 3D
/// radius-edge ratio. Points sharing an xy position collapse onto the first
/// one inserted.
pub struct HeightFieldCandidates {
    points: Vec<Point3>,
}

impl HeightFieldCandidates {
    /// Creates a candidate builder over `points`.
    #[must_use]
    pub fn new(points: Vec<Point3>) -> Self {
        Self { points }
    }

    /// Executes the triangulation.
    ///
    /// Returns the vertex of every input point (in input order) and the
    /// candidates.
    ///
    /// # Errors
    ///
    /// Returns [`GeometryError::Degenerate`] for fewer than three points and
    /// [`GeometryError::Triangulation`] if a point cannot be inserted.
    pub fn execute(&self, store: &mut FrontStore) -> Result<(Vec<VertexId>, Vec<Candidate>)> {
        if self.points.len() < 3 {
            return Err(GeometryError::Degenerate(format!(
                "need at least 3 points, got {}",
                self.points.len()
            ))
            .into());
        }

        let mut dt = DelaunayTriangulation::<SpadePoint2<f64>>::new();
        let mut by_handle: HashMap<usize, VertexId> = HashMap::new();
        let mut ids = Vec::with_capacity(self.points.len());
        for point in &self.points {
            let handle = dt
                .insert(SpadePoint2::new(point.x, point.y))
                .map_err(|e: InsertionError| {
                    GeometryError::Triangulation(format!("Delaunay insert: {e}"))
                })?;
            let id = *by_handle
                .entry(handle.index())
                .or_insert_with(|| store.add_vertex(*point));
            ids.push(id);
        }

        let mut candidates = Vec::new();
        for face in dt.inner_faces() {
            let mut vertices = Vec::with_capacity(3);
            for vh in face.vertices() {
                let Some(&id) = by_handle.get(&vh.fix().index()) else {
                    return Err(GeometryError::Triangulation(
                        "face references an unknown vertex".into(),
                    )
                    .into());
                };
                vertices.push(id);
            }
            let [a, b, c] = [vertices[0], vertices[1], vertices[2]];
            let score = radius_edge_ratio(
                &store.vertex(a)?.point,
                &store.vertex(b)?.point,
                &store.vertex(c)?.point,
            )
            .unwrap_or(f64::INFINITY);
            candidates.push(Candidate::new(
                CellId(face.fix().index()),
                0,
                [a, b, c],
                score,
            ));
        }

        tracing::debug!(
            points = self.points.len(),
            vertices = by_handle.len(),
            candidates = candidates.len(),
            "triangulated height field"
        );
        Ok((ids, candidates))
    }
}
