//! Geometry type metadata for mesh entities.

use std::fmt;

/// Reference shapes supported by the indexing subsystem.
#[derive(
    Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub enum GeometryType {
    /// 0D vertex.
    Vertex,
    /// 1D segment/edge.
    Line,
    /// 2D simplex.
    Triangle,
    /// 2D tensor-product cell.
    Quadrilateral,
    /// 3D simplex.
    Tetrahedron,
    /// 3D tensor-product cell.
    Hexahedron,
}

impl Default for GeometryType {
    fn default() -> Self {
        GeometryType::Vertex
    }
}

impl GeometryType {
    /// Topological dimension of the shape.
    pub const fn dimension(self) -> usize {
        match self {
            GeometryType::Vertex => 0,
            GeometryType::Line => 1,
            GeometryType::Triangle | GeometryType::Quadrilateral => 2,
            GeometryType::Tetrahedron | GeometryType::Hexahedron => 3,
        }
    }

    /// Number of corners of the reference element.
    pub const fn vertex_count(self) -> usize {
        match self {
            GeometryType::Vertex => 1,
            GeometryType::Line => 2,
            GeometryType::Triangle => 3,
            GeometryType::Quadrilateral | GeometryType::Tetrahedron => 4,
            GeometryType::Hexahedron => 8,
        }
    }

    /// Vertices and lines count as both simplex and cube.
    pub const fn is_simplex(self) -> bool {
        matches!(
            self,
            GeometryType::Vertex
                | GeometryType::Line
                | GeometryType::Triangle
                | GeometryType::Tetrahedron
        )
    }

    pub const fn is_cube(self) -> bool {
        matches!(
            self,
            GeometryType::Vertex
                | GeometryType::Line
                | GeometryType::Quadrilateral
                | GeometryType::Hexahedron
        )
    }

    /// Simplex of the given dimension, if one is supported.
    pub const fn simplex(dim: usize) -> Option<Self> {
        match dim {
            0 => Some(GeometryType::Vertex),
            1 => Some(GeometryType::Line),
            2 => Some(GeometryType::Triangle),
            3 => Some(GeometryType::Tetrahedron),
            _ => None,
        }
    }

    /// Cube of the given dimension, if one is supported.
    pub const fn cube(dim: usize) -> Option<Self> {
        match dim {
            0 => Some(GeometryType::Vertex),
            1 => Some(GeometryType::Line),
            2 => Some(GeometryType::Quadrilateral),
            3 => Some(GeometryType::Hexahedron),
            _ => None,
        }
    }
}

impl fmt::Display for GeometryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GeometryType::Vertex => "vertex",
            GeometryType::Line => "line",
            GeometryType::Triangle => "triangle",
            GeometryType::Quadrilateral => "quadrilateral",
            GeometryType::Tetrahedron => "tetrahedron",
            GeometryType::Hexahedron => "hexahedron",
        };
        f.write_str(name)
    }
}
