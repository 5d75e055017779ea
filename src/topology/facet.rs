use super::border::CellId;
use super::vertex::VertexId;

slotmap::new_key_type! {
    /// Unique identifier for an accepted facet.
    pub struct FacetId;
}

/// A triangle accepted into the reconstructed surface.
#[derive(Debug, Clone)]
pub struct FacetData {
    /// Corner vertices, wound consistently with neighbouring facets.
    pub vertices: [VertexId; 3],
    /// Quality score the facet was accepted with.
    pub score: f64,
    /// Triangulation cell and local facet index the triangle came from.
    pub origin: (CellId, u8),
    /// Shell label assigned after growth.
    pub shell: Option<usize>,
}

impl FacetData {
    /// Creates an unlabeled facet.
    #[must_use]
    pub fn new(vertices: [VertexId; 3], score: f64, origin: (CellId, u8)) -> Self {
        Self {
            vertices,
            score,
            origin,
            shell: None,
        }
    }

    /// The three edges in winding order.
    #[must_use]
    pub fn edges(&self) -> [(VertexId, VertexId); 3] {
        let [a, b, c] = self.vertices;
        [(a, b), (b, c), (c, a)]
    }

    /// Returns `true` if the facet traverses `a -> b` in its winding.
    #[must_use]
    pub fn has_directed_edge(&self, a: VertexId, b: VertexId) -> bool {
        self.edges().contains(&(a, b))
    }

    /// The corner opposite edge `(a, b)`, if both are corners of the facet.
    #[must_use]
    pub fn apex(&self, a: VertexId, b: VertexId) -> Option<VertexId> {
        if !self.vertices.contains(&a) || !self.vertices.contains(&b) {
            return None;
        }
        self.vertices.iter().copied().find(|&v| v != a && v != b)
    }
}
