//! Reference red-refinement templates.
//!
//! Each template maps the corners of a parent element plus its inserted
//! points (edge midpoints, face centers, cell center) to the corner lists of
//! the children. Child corner lists follow the same vertex conventions as
//! [`crate::topology::reference`], so a child's sub-entities can be looked up
//! with the parent's reference tables.

use crate::mesh_error::MeshIndexError;
use crate::topology::geometry_type::GeometryType;

/// Corners and inserted points of one element to subdivide.
///
/// `centers[d]` lists the center points of the element's `d`-dimensional
/// sub-entities in reference order (for `d == dim`, the element itself).
/// Only shapes with a center (lines, quads, hexes) contribute entries.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubdivisionNodes<T> {
    pub vertices: Vec<T>,
    pub centers: Vec<Vec<T>>,
}

/// Reference 1→2 subdivision of a line.
pub fn line_subdivision<T: Copy>(vertices: [T; 2], midpoint: T) -> [[T; 2]; 2] {
    let [v0, v1] = vertices;
    [[v0, midpoint], [midpoint, v1]]
}

/// Reference 1→4 subdivision of a triangle given vertices and mid-edge points.
pub fn triangle_subdivision<T: Copy>(vertices: [T; 3], midpoints: [T; 3]) -> [[T; 3]; 4] {
    let [v0, v1, v2] = vertices;
    let [m01, m12, m20] = midpoints;
    [
        [v0, m01, m20],
        [m01, v1, m12],
        [m20, m12, v2],
        [m01, m12, m20],
    ]
}

/// Reference 1→4 subdivision of a quad given vertices, mid-edge points, and a center point.
pub fn quadrilateral_subdivision<T: Copy>(
    vertices: [T; 4],
    midpoints: [T; 4],
    center: T,
) -> [[T; 4]; 4] {
    let [v0, v1, v2, v3] = vertices;
    let [m01, m12, m23, m30] = midpoints;
    [
        [v0, m01, center, m30],
        [m01, v1, m12, center],
        [center, m12, v2, m23],
        [m30, center, m23, v3],
    ]
}

/// Reference 1→8 subdivision of a tetrahedron given vertices and mid-edge points.
pub fn tetrahedron_subdivision<T: Copy>(vertices: [T; 4], midpoints: [T; 6]) -> [[T; 4]; 8] {
    let [v0, v1, v2, v3] = vertices;
    let [m01, m12, m20, m03, m13, m23] = midpoints;
    [
        [v0, m01, m20, m03],
        [v1, m12, m01, m13],
        [v2, m20, m12, m23],
        [v3, m03, m13, m23],
        [m01, m12, m13, m23],
        [m01, m13, m03, m23],
        [m01, m03, m20, m23],
        [m01, m20, m12, m23],
    ]
}

/// Reference 1→8 subdivision of a hex using edge midpoints, face centers, and cell center.
pub fn hexahedron_subdivision<T: Copy>(
    vertices: [T; 8],
    edge_midpoints: [T; 12],
    face_centers: [T; 6],
    center: T,
) -> [[T; 8]; 8] {
    let [v0, v1, v2, v3, v4, v5, v6, v7] = vertices;
    let [m01, m12, m23, m30, m45, m56, m67, m74, m04, m15, m26, m37] = edge_midpoints;
    let [f0123, f4567, f0154, f1265, f2376, f3047] = face_centers;

    // lattice[z][y][x] over the 3x3x3 points of the refined hex
    let lattice = [
        [[v0, m01, v1], [m30, f0123, m12], [v3, m23, v2]],
        [[m04, f0154, m15], [f3047, center, f1265], [m37, f2376, m26]],
        [[v4, m45, v5], [m74, f4567, m56], [v7, m67, v6]],
    ];

    let mut out = [[v0; 8]; 8];
    let offsets = [
        (0usize, 0usize, 0usize),
        (1, 0, 0),
        (1, 1, 0),
        (0, 1, 0),
        (0, 0, 1),
        (1, 0, 1),
        (1, 1, 1),
        (0, 1, 1),
    ];
    for (child, &(ix, iy, iz)) in offsets.iter().enumerate() {
        for (corner, &(dx, dy, dz)) in offsets.iter().enumerate() {
            out[child][corner] = lattice[iz + dz][iy + dy][ix + dx];
        }
    }
    out
}

fn fixed<T: Copy, const N: usize>(
    slice: &[T],
    geometry: GeometryType,
) -> Result<[T; N], MeshIndexError> {
    slice
        .try_into()
        .map_err(|_| MeshIndexError::VertexCountMismatch {
            geometry,
            expected: N,
            found: slice.len(),
        })
}

fn center_list<T>(nodes: &SubdivisionNodes<T>, dim: usize) -> &[T] {
    nodes.centers.get(dim).map(Vec::as_slice).unwrap_or(&[])
}

/// Child corner lists for a red refinement of `geometry`.
pub fn subdivide<T: Copy>(
    geometry: GeometryType,
    nodes: &SubdivisionNodes<T>,
) -> Result<Vec<Vec<T>>, MeshIndexError> {
    let v = nodes.vertices.as_slice();
    let children: Vec<Vec<T>> = match geometry {
        GeometryType::Line => {
            let [m] = fixed::<T, 1>(center_list(nodes, 1), geometry)?;
            line_subdivision(fixed(v, geometry)?, m)
                .iter()
                .map(|c| c.to_vec())
                .collect()
        }
        GeometryType::Triangle => {
            triangle_subdivision(fixed(v, geometry)?, fixed(center_list(nodes, 1), geometry)?)
                .iter()
                .map(|c| c.to_vec())
                .collect()
        }
        GeometryType::Quadrilateral => {
            let [c] = fixed::<T, 1>(center_list(nodes, 2), geometry)?;
            quadrilateral_subdivision(
                fixed(v, geometry)?,
                fixed(center_list(nodes, 1), geometry)?,
                c,
            )
            .iter()
            .map(|c| c.to_vec())
            .collect()
        }
        GeometryType::Tetrahedron => {
            tetrahedron_subdivision(fixed(v, geometry)?, fixed(center_list(nodes, 1), geometry)?)
                .iter()
                .map(|c| c.to_vec())
                .collect()
        }
        GeometryType::Hexahedron => {
            let [c] = fixed::<T, 1>(center_list(nodes, 3), geometry)?;
            hexahedron_subdivision(
                fixed(v, geometry)?,
                fixed(center_list(nodes, 1), geometry)?,
                fixed(center_list(nodes, 2), geometry)?,
                c,
            )
            .iter()
            .map(|c| c.to_vec())
            .collect()
        }
        GeometryType::Vertex => return Err(MeshIndexError::Unsupported("refining a vertex")),
    };
    Ok(children)
}

/// Number of children produced by red refinement.
pub const fn child_count(geometry: GeometryType) -> usize {
    match geometry {
        GeometryType::Vertex => 0,
        GeometryType::Line => 2,
        GeometryType::Triangle | GeometryType::Quadrilateral => 4,
        GeometryType::Tetrahedron | GeometryType::Hexahedron => 8,
    }
}
