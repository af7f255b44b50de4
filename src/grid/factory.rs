//! Construction-time builder contract and the in-memory implementation.
//!
//! A factory collects macro vertices and elements and produces a level-0
//! mesh on [`GridFactory::finalize`]. Refinement never goes through it.

use crate::mesh_error::MeshIndexError;
use crate::topology::geometry_type::GeometryType;
use crate::topology::hierarchical_mesh::HierarchicalMesh;

/// Parametrized boundary geometry attached to a boundary face.
pub trait BoundarySegment {
    /// Dimension of the segment's local coordinates.
    fn dimension(&self) -> usize;
    /// Map local coordinates on the segment to world coordinates.
    fn evaluate(&self, local: &[f64]) -> Vec<f64>;
}

/// Builder for a level-0 mesh.
pub trait GridFactory {
    type Mesh;

    /// Insert a vertex; returns its insertion index.
    fn insert_vertex(&mut self, coordinates: &[f64]) -> Result<usize, MeshIndexError>;

    /// Insert an element given insertion indices of its corners in
    /// reference order.
    fn insert_element(&mut self, geometry: GeometryType, vertices: &[usize]) -> Result<(), MeshIndexError>;

    /// Attach a parametrized boundary geometry to the face spanned by
    /// `vertices`.
    ///
    /// Backends without parametrized boundaries keep this default.
    fn insert_boundary_segment(
        &mut self,
        vertices: &[usize],
        segment: Box<dyn BoundarySegment>,
    ) -> Result<(), MeshIndexError> {
        let _ = (vertices, segment);
        Err(MeshIndexError::Unsupported("parametrized boundary segments"))
    }

    /// Consume the factory and build the mesh.
    fn finalize(self) -> Result<Self::Mesh, MeshIndexError>;
}

/// Factory for [`HierarchicalMesh`].
#[derive(Clone, Debug, Default)]
pub struct HierarchicalGridFactory {
    vertices: Vec<Vec<f64>>,
    elements: Vec<(GeometryType, Vec<usize>)>,
}

impl HierarchicalGridFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }
}

impl GridFactory for HierarchicalGridFactory {
    type Mesh = HierarchicalMesh;

    fn insert_vertex(&mut self, coordinates: &[f64]) -> Result<usize, MeshIndexError> {
        if let Some(first) = self.vertices.first() {
            if first.len() != coordinates.len() {
                return Err(MeshIndexError::CoordinateMismatch {
                    expected: first.len(),
                    found: coordinates.len(),
                });
            }
        }
        self.vertices.push(coordinates.to_vec());
        Ok(self.vertices.len() - 1)
    }

    fn insert_element(&mut self, geometry: GeometryType, vertices: &[usize]) -> Result<(), MeshIndexError> {
        if geometry == GeometryType::Vertex {
            return Err(MeshIndexError::Unsupported("vertex elements"));
        }
        if let Some((first, _)) = self.elements.first() {
            if first.dimension() != geometry.dimension() {
                return Err(MeshIndexError::DimensionMismatch {
                    expected: first.dimension(),
                    found: geometry.dimension(),
                });
            }
        }
        if vertices.len() != geometry.vertex_count() {
            return Err(MeshIndexError::VertexCountMismatch {
                geometry,
                expected: geometry.vertex_count(),
                found: vertices.len(),
            });
        }
        if let Some(&bad) = vertices.iter().find(|&&v| v >= self.vertices.len()) {
            return Err(MeshIndexError::UnknownVertex {
                vertex: bad,
                count: self.vertices.len(),
            });
        }
        self.elements.push((geometry, vertices.to_vec()));
        Ok(())
    }

    fn finalize(self) -> Result<HierarchicalMesh, MeshIndexError> {
        log::debug!(
            "finalizing grid factory: {} vertices, {} elements",
            self.vertices.len(),
            self.elements.len()
        );
        HierarchicalMesh::from_macro_elements(&self.vertices, &self.elements)
    }
}
