//! Reference elements: local sub-entity numbering per geometry type.
//!
//! The local number `i` passed to `sub_index(cell, i, codim)` addresses the
//! `i`-th entry of [`sub_entity_vertices`] for the cell's geometry type.
//!
//! Vertex conventions:
//! - quadrilateral: counter-clockwise `0,1,2,3`;
//! - hexahedron: bottom face `0,1,2,3` counter-clockwise, top face `4,5,6,7`
//!   above it;
//! - tetrahedron: face `i` is opposite vertex `i`.

use crate::mesh_error::MeshIndexError;
use crate::topology::entity::Codim;
use crate::topology::geometry_type::GeometryType;

const LINE_VERTICES: &[&[usize]] = &[&[0], &[1]];

const TRIANGLE_EDGES: &[&[usize]] = &[&[0, 1], &[1, 2], &[2, 0]];
const TRIANGLE_VERTICES: &[&[usize]] = &[&[0], &[1], &[2]];

const QUAD_EDGES: &[&[usize]] = &[&[0, 1], &[1, 2], &[2, 3], &[3, 0]];
const QUAD_VERTICES: &[&[usize]] = &[&[0], &[1], &[2], &[3]];

const TET_FACES: &[&[usize]] = &[&[1, 2, 3], &[0, 2, 3], &[0, 1, 3], &[0, 1, 2]];
const TET_EDGES: &[&[usize]] = &[&[0, 1], &[1, 2], &[2, 0], &[0, 3], &[1, 3], &[2, 3]];
const TET_VERTICES: &[&[usize]] = &[&[0], &[1], &[2], &[3]];

const HEX_FACES: &[&[usize]] = &[
    &[0, 1, 2, 3],
    &[4, 5, 6, 7],
    &[0, 1, 5, 4],
    &[1, 2, 6, 5],
    &[2, 3, 7, 6],
    &[3, 0, 4, 7],
];
const HEX_EDGES: &[&[usize]] = &[
    &[0, 1],
    &[1, 2],
    &[2, 3],
    &[3, 0],
    &[4, 5],
    &[5, 6],
    &[6, 7],
    &[7, 4],
    &[0, 4],
    &[1, 5],
    &[2, 6],
    &[3, 7],
];
const HEX_VERTICES: &[&[usize]] = &[&[0], &[1], &[2], &[3], &[4], &[5], &[6], &[7]];

/// Local vertex lists of all sub-entities of `geometry` with codimension
/// `codim` (relative to `geometry`). Codim 0 yields no entries; callers treat
/// the element itself separately.
pub fn sub_entity_vertices(
    geometry: GeometryType,
    codim: Codim,
) -> Result<&'static [&'static [usize]], MeshIndexError> {
    let dim = geometry.dimension();
    if codim > dim {
        return Err(MeshIndexError::InvalidCodim {
            codim,
            dimension: dim,
        });
    }
    let table: &'static [&'static [usize]] = match (geometry, codim) {
        (_, 0) => &[],
        (GeometryType::Line, 1) => LINE_VERTICES,
        (GeometryType::Triangle, 1) => TRIANGLE_EDGES,
        (GeometryType::Triangle, 2) => TRIANGLE_VERTICES,
        (GeometryType::Quadrilateral, 1) => QUAD_EDGES,
        (GeometryType::Quadrilateral, 2) => QUAD_VERTICES,
        (GeometryType::Tetrahedron, 1) => TET_FACES,
        (GeometryType::Tetrahedron, 2) => TET_EDGES,
        (GeometryType::Tetrahedron, 3) => TET_VERTICES,
        (GeometryType::Hexahedron, 1) => HEX_FACES,
        (GeometryType::Hexahedron, 2) => HEX_EDGES,
        (GeometryType::Hexahedron, 3) => HEX_VERTICES,
        _ => &[],
    };
    Ok(table)
}

/// Number of sub-entities of the given codimension (1 for codim 0).
pub fn sub_entity_count(geometry: GeometryType, codim: Codim) -> Result<usize, MeshIndexError> {
    if codim == 0 {
        return Ok(1);
    }
    Ok(sub_entity_vertices(geometry, codim)?.len())
}

/// Geometry type shared by all sub-entities of the given codimension.
pub fn sub_entity_type(geometry: GeometryType, codim: Codim) -> Result<GeometryType, MeshIndexError> {
    let dim = geometry.dimension();
    if codim > dim {
        return Err(MeshIndexError::InvalidCodim {
            codim,
            dimension: dim,
        });
    }
    let sub_dim = dim - codim;
    let ty = if geometry.is_simplex() {
        GeometryType::simplex(sub_dim)
    } else {
        GeometryType::cube(sub_dim)
    };
    Ok(ty.unwrap_or(geometry))
}

/// Shapes whose red refinement inserts a new vertex at their center.
pub fn has_center(geometry: GeometryType) -> bool {
    matches!(
        geometry,
        GeometryType::Line | GeometryType::Quadrilateral | GeometryType::Hexahedron
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euler_characteristic_of_reference_elements() {
        // V - E + F - C = 1 for any convex reference polytope
        for ty in [
            GeometryType::Line,
            GeometryType::Triangle,
            GeometryType::Quadrilateral,
            GeometryType::Tetrahedron,
            GeometryType::Hexahedron,
        ] {
            let dim = ty.dimension();
            let mut chi = 0i64;
            for codim in 0..=dim {
                let count = sub_entity_count(ty, codim).unwrap() as i64;
                let sub_dim = dim - codim;
                chi += if sub_dim % 2 == 0 { count } else { -count };
            }
            assert_eq!(chi, 1, "{ty}");
        }
    }

    #[test]
    fn sub_entity_vertex_counts_match_types() {
        for ty in [GeometryType::Tetrahedron, GeometryType::Hexahedron] {
            for codim in 1..=3 {
                let sub_ty = sub_entity_type(ty, codim).unwrap();
                for verts in sub_entity_vertices(ty, codim).unwrap() {
                    assert_eq!(verts.len(), sub_ty.vertex_count());
                }
            }
        }
    }

    #[test]
    fn codim_out_of_range() {
        assert!(matches!(
            sub_entity_vertices(GeometryType::Triangle, 3),
            Err(MeshIndexError::InvalidCodim { codim: 3, dimension: 2 })
        ));
    }

    #[test]
    fn centers() {
        assert!(has_center(GeometryType::Line));
        assert!(has_center(GeometryType::Hexahedron));
        assert!(!has_center(GeometryType::Triangle));
        assert!(!has_center(GeometryType::Tetrahedron));
    }
}
