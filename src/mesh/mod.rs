use std::collections::HashMap;

use crate::error::{OperationError, Result};
use crate::math::{facet_normal, Point3, Vector3};
use crate::topology::{FrontStore, VertexId};

/// The reconstructed surface as an indexed triangle mesh.
#[derive(Debug, Clone, Default)]
pub struct TriangleMesh {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Vertex normals (area-weighted average of the incident facets).
    pub normals: Vec<Vector3>,
    /// Triangle indices (each triple defines a triangle).
    pub indices: Vec<[u32; 3]>,
}

impl TriangleMesh {
    /// Number of triangles in the mesh.
    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.indices.len()
    }
}

/// Compacts the accepted facets of a store into a [`TriangleMesh`].
///
/// Only vertices used by a facet are emitted, in order of first use.
/// Duplicate vertices stay separate, so a resolved non-manifold point shows
/// up as coincident mesh vertices.
pub struct ExtractMesh;

impl Default for ExtractMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl ExtractMesh {
    /// Creates a new `ExtractMesh` operation.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Executes the extraction.
    ///
    /// # Errors
    ///
    /// Returns an error if a facet references a missing vertex or the mesh
    /// outgrows `u32` indices.
    pub fn execute(&self, store: &FrontStore) -> Result<TriangleMesh> {
        let mut mesh = TriangleMesh::default();
        let mut index_of: HashMap<VertexId, u32> = HashMap::new();

        for (_, facet) in store.facets() {
            let mut tri = [0u32; 3];
            for (slot, &v) in tri.iter_mut().zip(&facet.vertices) {
                *slot = if let Some(&existing) = index_of.get(&v) {
                    existing
                } else {
                    let next = u32::try_from(mesh.vertices.len()).map_err(|_| {
                        OperationError::Failed("mesh exceeds u32 vertex indices".into())
                    })?;
                    mesh.vertices.push(store.vertex(v)?.point);
                    mesh.normals.push(Vector3::zeros());
                    index_of.insert(v, next);
                    next
                };
            }

            let [a, b, c] = tri.map(|i| mesh.vertices[i as usize]);
            if facet_normal(&a, &b, &c).is_some() {
                // Unnormalized cross product weights by area.
                let weighted = (b - a).cross(&(c - a));
                for i in tri {
                    mesh.normals[i as usize] += weighted;
                }
            }
            mesh.indices.push(tri);
        }

        for normal in &mut mesh.normals {
            let len = normal.norm();
            if len > 0.0 {
                *normal /= len;
            }
        }
        Ok(mesh)
    }
}
